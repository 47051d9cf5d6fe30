use std::env;
use dotenvy::dotenv;
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,

    /// Base URL of the external face recognition provider.
    pub face_service_url: String,
    /// Upper bound for any single provider call (health/register/verify).
    pub face_service_timeout_ms: u64,

    // Rate limiting
    pub rate_register_per_min: u32,
    pub rate_attendance_per_min: u32,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),

            face_service_url: env::var("FACE_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:5001".to_string()),
            face_service_timeout_ms: env::var("FACE_SERVICE_TIMEOUT_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap(),

            rate_register_per_min: env::var("RATE_REGISTER_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_attendance_per_min: env::var("RATE_ATTENDANCE_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),
        }
    }
}
