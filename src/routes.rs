use crate::{
    api::{analytics, balance, calendar, department, leave_request, leave_type, user},
    auth::{handlers, middleware::auth_middleware},
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

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter)
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Holiday calendar and the working-day calculator are public, the
    // frontend uses them before login
    cfg.service(
        web::scope("/calendar")
            .service(web::resource("/holidays").route(web::get().to(calendar::holidays)))
            .service(web::resource("/working_days").route(web::post().to(calendar::working_days))),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(web::resource("/me").route(web::get().to(handlers::me)))
            .service(
                web::scope("/departments")
                    // /departments
                    .service(
                        web::resource("")
                            .route(web::get().to(department::list_departments))
                            .route(web::post().to(department::create_department)),
                    )
                    // /departments/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(department::update_department))
                            .route(web::delete().to(department::delete_department)),
                    ),
            )
            .service(
                web::scope("/users")
                    // /users
                    .service(
                        web::resource("")
                            .route(web::post().to(user::create_user))
                            .route(web::get().to(user::list_users)),
                    )
                    // /users/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(user::update_user))
                            .route(web::delete().to(user::delete_user)),
                    )
                    // /users/{id}/reset_password
                    .service(
                        web::resource("/{id}/reset_password")
                            .route(web::post().to(user::reset_password)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::list))
                            .route(web::post().to(leave_request::apply)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_one)))
                    // /leave/{id}/hod_action
                    .service(
                        web::resource("/{id}/hod_action")
                            .route(web::post().to(leave_request::hod_action)),
                    )
                    // /leave/{id}/admin_action
                    .service(
                        web::resource("/{id}/admin_action")
                            .route(web::post().to(leave_request::admin_action)),
                    ),
            )
            .service(
                web::scope("/balances")
                    .service(web::resource("").route(web::get().to(balance::list_balances)))
                    .service(
                        web::resource("/{user_id}/{leave_type_id}")
                            .route(web::put().to(balance::set_balance)),
                    ),
            )
            .service(web::resource("/leave_types").route(web::get().to(leave_type::list_leave_types)))
            .service(
                web::scope("/analytics")
                    .service(
                        web::resource("/departments")
                            .route(web::get().to(analytics::departments_usage)),
                    )
                    .service(web::resource("/types").route(web::get().to(analytics::types_usage))),
            ),
    );
}
