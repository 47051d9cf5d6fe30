use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

use faceclock::attendance::AttendanceService;
use faceclock::config::Config;
use faceclock::db::init_db;
use faceclock::docs::ApiDoc;
use faceclock::face::client::FaceServiceClient;
use faceclock::face::recognizer::{ExternalRecognizer, LocalRecognizer, ProviderWithFallback};
use faceclock::routes;
use faceclock::store::mysql::{MySqlEmployees, MySqlLedger, MySqlSettings};
use faceclock::utils::{face_filter, status_cache};

use std::time::Duration;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "FaceClock"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;

    let pool_for_filter_warmup = pool.clone();
    let pool_for_cache_warmup = pool.clone();
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    actix_web::rt::spawn(async move {
        if let Err(e) = face_filter::warmup_face_filter(&pool_for_filter_warmup, 100).await {
            eprintln!("Failed to warmup face filter: {:?}", e);
        }
    });

    actix_web::rt::spawn(async move {
        // Warm registered employees into the status cache in batches of 250
        if let Err(e) = status_cache::warmup_status_cache(&pool_for_cache_warmup, 250).await {
            eprintln!("Failed to warmup face status cache: {:?}", e);
        }
    });

    let provider = FaceServiceClient::new(
        config.face_service_url.clone(),
        Duration::from_millis(config.face_service_timeout_ms),
    );
    let recognizer =
        ProviderWithFallback::new(ExternalRecognizer::new(provider.clone()), LocalRecognizer);
    let service = Data::new(AttendanceService::new(
        MySqlEmployees::new(pool.clone()),
        MySqlLedger::new(pool.clone()),
        MySqlSettings::new(pool.clone()),
        recognizer,
        Some(provider),
    ));

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
