//! Recognition strategy: external provider first, local matcher as fallback.

use thiserror::Error;
use tracing::{info, warn};

use super::client::FaceServiceClient;
use super::matcher;
use super::{MatchResult, MatchSource};
use crate::model::employee::Employee;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecognizeError {
    /// The recognizer could not answer; a fallback path should run.
    #[error("recognition provider unavailable")]
    Unavailable,
    /// No stored reference photo to compare against; re-registration needed.
    #[error("no reference face data on file")]
    MissingReference,
}

/// A way to decide whether a captured photo belongs to an employee.
#[allow(async_fn_in_trait)]
pub trait Recognizer {
    async fn is_available(&self) -> bool;

    async fn verify(
        &self,
        employee: &Employee,
        captured: &str,
    ) -> Result<MatchResult, RecognizeError>;
}

/// Delegates to the external recognition provider. Transport errors and
/// non-success responses both read as "unavailable" so control falls through
/// to the fallback instead of surfacing a user-facing error.
pub struct ExternalRecognizer {
    client: FaceServiceClient,
}

impl ExternalRecognizer {
    pub fn new(client: FaceServiceClient) -> Self {
        Self { client }
    }
}

impl Recognizer for ExternalRecognizer {
    async fn is_available(&self) -> bool {
        self.client.health().await
    }

    async fn verify(
        &self,
        employee: &Employee,
        captured: &str,
    ) -> Result<MatchResult, RecognizeError> {
        let outcome = self
            .client
            .verify(&employee.emp_id, captured)
            .await
            .map_err(|e| {
                warn!(error = %e, emp_id = %employee.emp_id, "provider verify failed");
                RecognizeError::Unavailable
            })?;

        if !outcome.success {
            warn!(
                emp_id = %employee.emp_id,
                message = ?outcome.message,
                "provider returned non-success verify response"
            );
            return Err(RecognizeError::Unavailable);
        }

        let confidence = outcome.confidence.unwrap_or(0.0);
        Ok(MatchResult {
            matched: outcome.matched,
            similarity: confidence / 100.0,
            confidence: Some(confidence),
            source: MatchSource::External,
        })
    }
}

/// In-process fallback over the stored reference photo.
pub struct LocalRecognizer;

impl Recognizer for LocalRecognizer {
    async fn is_available(&self) -> bool {
        true
    }

    async fn verify(
        &self,
        employee: &Employee,
        captured: &str,
    ) -> Result<MatchResult, RecognizeError> {
        let stored = employee
            .face_photo_data
            .as_deref()
            .filter(|photo| !photo.is_empty())
            .ok_or(RecognizeError::MissingReference)?;

        Ok(matcher::compare_photos(stored, captured))
    }
}

/// Health-gates the primary recognizer and falls through to the fallback when
/// the primary is down or fails mid-call.
pub struct ProviderWithFallback<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> ProviderWithFallback<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: Recognizer, F: Recognizer> Recognizer for ProviderWithFallback<P, F> {
    async fn is_available(&self) -> bool {
        true
    }

    async fn verify(
        &self,
        employee: &Employee,
        captured: &str,
    ) -> Result<MatchResult, RecognizeError> {
        if self.primary.is_available().await {
            match self.primary.verify(employee, captured).await {
                Ok(result) => return Ok(result),
                Err(RecognizeError::Unavailable) => {
                    info!(emp_id = %employee.emp_id, "provider failed mid-call, using local matcher");
                }
                Err(other) => return Err(other),
            }
        } else {
            info!(emp_id = %employee.emp_id, "provider unavailable, using local matcher");
        }

        self.fallback.verify(employee, captured).await
    }
}
