use crate::{
    api::{attendance, employee, leave_request},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));
    // Exports materialize full ranges and render documents; rate them
    // tighter than ordinary reads.
    let export_limiter = Arc::new(build_limiter(config.rate_export_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance/export.csv
                    .service(
                        web::resource("/export.csv")
                            .wrap(export_limiter.clone())
                            .route(web::get().to(attendance::export_attendance_csv)),
                    )
                    // /attendance/summary.pdf
                    .service(
                        web::resource("/summary.pdf")
                            .wrap(export_limiter.clone())
                            .route(web::get().to(attendance::attendance_summary_pdf)),
                    )
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::post().to(attendance::apply_attendance))
                            .route(web::get().to(attendance::list_attendance)),
                    ),
            )
            .service(
                web::scope("/employees")
                    // /employees
                    .service(web::resource("").route(web::get().to(employee::list_employees)))
                    // /employees/{id}
                    .service(web::resource("/{id}").route(web::get().to(employee::get_employee))),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            ),
    );
}
