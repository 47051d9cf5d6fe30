use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Employee as seen by the attendance subsystem. The wider HR profile
/// (department, salary, contacts) lives with the directory owner.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "emp_id": "EMP-001",
        "name": "John Doe",
        "status": "active",
        "face_registered": true,
        "face_registered_at": "2026-01-05T09:12:44"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub emp_id: String,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "active")]
    pub status: String,

    #[schema(example = true)]
    pub face_registered: bool,

    /// Base64 reference photo captured at registration. Fallback matching
    /// compares against this when the recognition provider is down.
    #[serde(default, skip_serializing)]
    #[schema(value_type = Option<String>, nullable = true)]
    pub face_photo_data: Option<String>,

    #[schema(example = "2026-01-05T09:12:44", value_type = Option<String>, format = "date-time", nullable = true)]
    pub face_registered_at: Option<NaiveDateTime>,
}
