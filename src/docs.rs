use crate::api::face::{FaceCheckRequest, RegisterFaceRequest};
use crate::model::attendance::{Attendance, AttendanceStatus, GeoPoint, MarkedBy};
use crate::model::employee::Employee;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FaceClock API",
        version = "1.0.0",
        description = r#"
## Face Recognition Attendance

This API powers face-verified employee attendance.

### 🔹 Key Features
- **Face Registration**
  - Capture and store a reference photo per employee
- **Face Check-in / Check-out**
  - One attendance record per employee per day, late status from office hours
- **Office Network Gate**
  - Attendance is accepted from the configured office network only

### 🔎 Recognition
Verification goes to an external recognition provider first; when that
service is unreachable a weak in-process matcher takes over so attendance
keeps working in degraded mode.

### 📦 Response Format
- JSON-based RESTful responses

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::face::face_status,
        crate::api::face::register_face,
        crate::api::face::check_in,
        crate::api::face::check_out
    ),
    components(
        schemas(
            RegisterFaceRequest,
            FaceCheckRequest,
            GeoPoint,
            Employee,
            Attendance,
            AttendanceStatus,
            MarkedBy
        )
    ),
    tags(
        (name = "Face", description = "Face registration APIs"),
        (name = "Attendance", description = "Face-verified attendance APIs"),
    )
)]
pub struct ApiDoc;
