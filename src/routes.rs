use crate::{api::face, config::Config};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter config
    fn build_limiter(requests_per_min: u32) -> GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap()
    }

    let register_limiter = build_limiter(config.rate_register_per_min);
    let attendance_limiter = build_limiter(config.rate_attendance_per_min);

    cfg.service(
        web::scope(&config.api_prefix).service(
            web::scope("/face")
                // /face/register
                .service(
                    web::resource("/register")
                        .wrap(Governor::new(&register_limiter))
                        .route(web::post().to(face::register_face)),
                )
                // /face/status/{emp_id}
                .service(
                    web::resource("/status/{emp_id}")
                        .wrap(Governor::new(&register_limiter))
                        .route(web::get().to(face::face_status)),
                )
                // /face/check-in
                .service(
                    web::resource("/check-in")
                        .wrap(Governor::new(&attendance_limiter))
                        .route(web::post().to(face::check_in)),
                )
                // /face/check-out
                .service(
                    web::resource("/check-out")
                        .wrap(Governor::new(&attendance_limiter))
                        .route(web::post().to(face::check_out)),
                ),
        ),
    );
}
