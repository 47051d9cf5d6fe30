use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use utoipa::ToSchema;

use crate::attendance::AppService;
use crate::error::AttendanceError;
use crate::model::attendance::GeoPoint;
use crate::utils::face_filter;
use crate::utils::status_cache::{self, FaceStatus};

#[derive(Deserialize, ToSchema)]
pub struct RegisterFaceRequest {
    #[schema(example = "EMP-001")]
    pub emp_id: String,
    /// Base64 photo from the capture widget.
    #[schema(example = "/9j/4AAQSkZJRg...", value_type = String)]
    pub face_photo_data: String,
}

#[derive(Deserialize, ToSchema)]
pub struct FaceCheckRequest {
    #[schema(example = "EMP-001")]
    pub emp_id: String,
    #[schema(example = "/9j/4AAQSkZJRg...", value_type = String)]
    pub face_photo_data: String,
    pub location: Option<GeoPoint>,
}

/// Client address as the network guard sees it: x-forwarded-for aware, falls
/// back to the peer address.
fn client_ip(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or_default()
        .to_string()
}

fn required_fields_missing(emp_id: &str, photo: &str) -> bool {
    emp_id.trim().is_empty() || photo.is_empty()
}

/// Map a rejection to the wire. `action` names the operation in the
/// admission-denied message ("Attendance" / "Check-out" / "Registration").
fn reject(action: &str, err: AttendanceError) -> HttpResponse {
    match err {
        AttendanceError::AdmissionDenied { reason } => HttpResponse::Forbidden().json(json!({
            "success": false,
            "message": format!("{action} rejected. {reason}. Please connect to Office WiFi."),
        })),
        AttendanceError::EmployeeNotFound => HttpResponse::NotFound().json(json!({
            "success": false,
            "message": "Employee not found",
        })),
        AttendanceError::FaceNotRegistered => HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Face not registered. Please register first.",
        })),
        AttendanceError::FaceDataMissing => HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Face data not found. Please re-register.",
        })),
        AttendanceError::FaceMismatch {
            similarity,
            confidence,
        } => {
            let detail = match confidence {
                Some(c) => format!("Confidence: {c:.1}%"),
                None => format!("Similarity: {:.1}%", similarity * 100.0),
            };
            HttpResponse::Unauthorized().json(json!({
                "success": false,
                "message": format!("Face does not match. {detail}. Please try again."),
                "similarity": similarity,
                "confidence": confidence,
            }))
        }
        AttendanceError::AlreadyCheckedIn { at } => HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Already checked in today",
            "checkInTime": at,
        })),
        AttendanceError::NoCheckIn => HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "No check-in found for today. Please check-in first.",
        })),
        AttendanceError::AlreadyCheckedOut { at } => HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Already checked out today",
            "checkOutTime": at,
        })),
        AttendanceError::Store(e) => {
            error!(error = %e, "attendance storage failure");
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "message": "Internal Server Error",
            }))
        }
    }
}

/// Face registration status
#[utoipa::path(
    get,
    path = "/api/v1/face/status/{emp_id}",
    params(
        ("emp_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Registration status", body = Object, example = json!({
            "success": true,
            "faceRegistered": true,
            "faceRegisteredAt": "2026-01-05T09:12:44"
        })),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Face"
)]
pub async fn face_status(
    service: web::Data<AppService>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let emp_id = path.into_inner();

    if let Some(cached) = status_cache::lookup(&emp_id).await {
        return Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "faceRegistered": cached.registered,
            "faceRegisteredAt": cached.registered_at,
        })));
    }

    match service.face_status(&emp_id).await {
        Ok(status) => {
            // Only registered employees are cached; a pending registration
            // should keep hitting the directory.
            if status.registered {
                status_cache::store(
                    &emp_id,
                    FaceStatus {
                        registered: true,
                        registered_at: status.registered_at,
                    },
                )
                .await;
            }

            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "faceRegistered": status.registered,
                "faceRegisteredAt": status.registered_at,
            })))
        }
        Err(err) => Ok(reject("Status", err)),
    }
}

/// Register employee face photo
#[utoipa::path(
    post,
    path = "/api/v1/face/register",
    request_body = RegisterFaceRequest,
    responses(
        (status = 200, description = "Face registered successfully", body = Object, example = json!({
            "success": true,
            "message": "Face registered successfully",
            "faceRegisteredAt": "2026-08-06T09:12:44",
            "providerEnrolled": true
        })),
        (status = 400, description = "Missing employee id or photo"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Face"
)]
pub async fn register_face(
    service: web::Data<AppService>,
    payload: web::Json<RegisterFaceRequest>,
) -> actix_web::Result<impl Responder> {
    let body = payload.into_inner();

    if required_fields_missing(&body.emp_id, &body.face_photo_data) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Employee ID and face photo are required",
        })));
    }

    match service
        .register_face(&body.emp_id, &body.face_photo_data)
        .await
    {
        Ok(outcome) => {
            face_filter::insert(&body.emp_id);
            status_cache::store(
                &body.emp_id,
                FaceStatus {
                    registered: true,
                    registered_at: Some(outcome.registered_at),
                },
            )
            .await;

            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "message": "Face registered successfully",
                "faceRegisteredAt": outcome.registered_at,
                "providerEnrolled": outcome.provider_enrolled,
            })))
        }
        Err(err) => Ok(reject("Registration", err)),
    }
}

/// Check-in using face recognition
#[utoipa::path(
    post,
    path = "/api/v1/face/check-in",
    request_body = FaceCheckRequest,
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "success": true,
            "message": "Checked in successfully",
            "data": { "checkIn": "2026-08-06T09:10:05", "status": "present", "isLate": false }
        })),
        (status = 400, description = "Already checked in / not registered"),
        (status = 401, description = "Face does not match"),
        (status = 403, description = "Outside the office network"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    service: web::Data<AppService>,
    req: HttpRequest,
    payload: web::Json<FaceCheckRequest>,
) -> actix_web::Result<impl Responder> {
    let body = payload.into_inner();

    if required_fields_missing(&body.emp_id, &body.face_photo_data) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Employee ID and face photo are required",
        })));
    }

    // Cheap pre-screen; a definite "no registered face" skips the
    // recognition round-trip. Confirmed against the directory either way.
    if !face_filter::might_be_registered(&body.emp_id) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Face not registered. Please register first.",
        })));
    }

    let ip = client_ip(&req);
    match service
        .check_in(&body.emp_id, &body.face_photo_data, body.location, &ip)
        .await
    {
        Ok(outcome) => {
            let message = if outcome.is_late {
                "Checked in (Late)"
            } else {
                "Checked in successfully"
            };
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "message": message,
                "data": {
                    "checkIn": outcome.check_in,
                    "status": outcome.status,
                    "isLate": outcome.is_late,
                },
            })))
        }
        Err(err) => Ok(reject("Attendance", err)),
    }
}

/// Check-out using face recognition
#[utoipa::path(
    post,
    path = "/api/v1/face/check-out",
    request_body = FaceCheckRequest,
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "success": true,
            "message": "Checked out successfully",
            "data": { "checkIn": "2026-08-06T09:10:05", "checkOut": "2026-08-06T18:00:00", "workHours": 8.83 }
        })),
        (status = 400, description = "No check-in / already checked out"),
        (status = 401, description = "Face does not match"),
        (status = 403, description = "Outside the office network"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    service: web::Data<AppService>,
    req: HttpRequest,
    payload: web::Json<FaceCheckRequest>,
) -> actix_web::Result<impl Responder> {
    let body = payload.into_inner();

    if required_fields_missing(&body.emp_id, &body.face_photo_data) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Employee ID and face photo are required",
        })));
    }

    if !face_filter::might_be_registered(&body.emp_id) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Face not registered. Please register first.",
        })));
    }

    let ip = client_ip(&req);
    match service
        .check_out(&body.emp_id, &body.face_photo_data, body.location, &ip)
        .await
    {
        Ok(outcome) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Checked out successfully",
            "data": {
                "checkIn": outcome.check_in,
                "checkOut": outcome.check_out,
                "workHours": outcome.work_hours,
            },
        }))),
        Err(err) => Ok(reject("Check-out", err)),
    }
}
