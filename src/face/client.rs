//! HTTP client for the external face recognition provider.
//!
//! Every call is bounded by the configured timeout; a slow or unreachable
//! provider degrades to the local matcher instead of stalling a check-in.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("face service transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct FaceRequest<'a> {
    emp_id: &'a str,
    image: &'a str,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// `/register` response.
#[derive(Debug, Deserialize)]
pub struct ProviderRegistration {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// `/verify` response. `confidence` is a 0-100 percentage.
#[derive(Debug, Deserialize)]
pub struct ProviderVerification {
    #[serde(default)]
    pub success: bool,
    #[serde(rename = "match", default)]
    pub matched: bool,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub distance: Option<f32>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone)]
pub struct FaceServiceClient {
    base_url: String,
    http: reqwest::Client,
}

impl FaceServiceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build face service http client");

        Self {
            base_url: base_url.into(),
            http,
        }
    }

    /// Cheap availability probe. Any transport error or unexpected payload
    /// counts as down so callers move on to the local matcher.
    pub async fn health(&self) -> bool {
        let url = format!("{}/health", self.base_url);

        let resp = match self.http.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "face service unreachable");
                return false;
            }
        };

        match resp.json::<HealthResponse>().await {
            Ok(body) => body.status == "ok",
            Err(e) => {
                warn!(error = %e, "face service health payload unreadable");
                false
            }
        }
    }

    pub async fn register(
        &self,
        emp_id: &str,
        image: &str,
    ) -> Result<ProviderRegistration, ClientError> {
        let url = format!("{}/register", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&FaceRequest { emp_id, image })
            .send()
            .await?;

        Ok(resp.json().await?)
    }

    pub async fn verify(
        &self,
        emp_id: &str,
        image: &str,
    ) -> Result<ProviderVerification, ClientError> {
        let url = format!("{}/verify", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&FaceRequest { emp_id, image })
            .send()
            .await?;

        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_payload_parses_the_match_field() {
        let body = r#"{"success": true, "match": true, "confidence": 87.5, "distance": 0.31}"#;
        let parsed: ProviderVerification = serde_json::from_str(body).unwrap();
        assert!(parsed.success);
        assert!(parsed.matched);
        assert_eq!(parsed.confidence, Some(87.5));
        assert_eq!(parsed.distance, Some(0.31));
    }

    #[test]
    fn verify_payload_tolerates_missing_fields() {
        let body = r#"{"success": false, "message": "No face registered for EMP-001"}"#;
        let parsed: ProviderVerification = serde_json::from_str(body).unwrap();
        assert!(!parsed.success);
        assert!(!parsed.matched);
        assert!(parsed.confidence.is_none());
        assert_eq!(
            parsed.message.as_deref(),
            Some("No face registered for EMP-001")
        );
    }

    #[test]
    fn register_payload_parses() {
        let body = r#"{"success": true, "message": "Face registered"}"#;
        let parsed: ProviderRegistration = serde_json::from_str(body).unwrap();
        assert!(parsed.success);
    }
}
