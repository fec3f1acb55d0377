use crate::{
    api::{leave_request, payroll},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Per-route limiter keyed on the peer address.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst are clamped to non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));
    let payroll_limiter = Arc::new(build_limiter(config.rate_payroll_per_min));

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/leave")
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
            )
            .service(
                web::scope("/payroll")
                    // /payroll/reconcile
                    .service(
                        web::resource("/reconcile")
                            .wrap(payroll_limiter.clone())
                            .route(web::post().to(payroll::reconcile)),
                    )
                    // /payroll/{period}
                    .service(web::resource("/{period}").route(web::get().to(payroll::get_run)))
                    .service(
                        web::resource("/{period}/history")
                            .route(web::get().to(payroll::run_history)),
                    )
                    // state changes share the tighter limiter
                    .service(
                        web::resource("/{period}/draft")
                            .wrap(payroll_limiter.clone())
                            .route(web::post().to(payroll::generate_draft)),
                    )
                    .service(
                        web::resource("/{period}/approve")
                            .wrap(payroll_limiter.clone())
                            .route(web::post().to(payroll::approve)),
                    )
                    .service(
                        web::resource("/{period}/disburse")
                            .wrap(payroll_limiter)
                            .route(web::post().to(payroll::disburse)),
                    ),
            ),
    );
}
