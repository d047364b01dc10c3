use actix_web::{HttpResponse, web};

pub mod alerts;
pub mod auth;
pub mod budget;
pub mod demo;
pub mod devices;
pub mod energy;

/// Logs the failure server-side and returns the generic 500 body.
pub(crate) fn internal_error(context: &str, err: impl std::fmt::Display) -> HttpResponse {
    log::error!("{}: {}", context, err);
    HttpResponse::InternalServerError().json(serde_json::json!({"message": "Internal server error"}))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    // Auth routes (public)
    cfg.service(
        web::scope("/api/auth")
            .service(auth::login)
            .service(auth::register)
            .service(auth::logout),
    );

    // Current user (protected)
    cfg.service(auth::current_user);

    // Energy data routes (protected)
    cfg.service(
        web::scope("/api/energy")
            .service(energy::current_usage)
            .service(energy::history),
    );

    // Device routes (protected)
    cfg.service(
        web::scope("/api/devices")
            .service(devices::list_devices)
            .service(devices::get_device),
    );

    // Budget routes (protected)
    cfg.service(
        web::scope("/api/budget")
            .service(budget::get_budget)
            .service(budget::update_budget),
    );

    // Alert routes (protected)
    cfg.service(
        web::scope("/api/alerts")
            .service(alerts::list_alerts)
            .service(alerts::mark_read),
    );

    // Demo dashboard snapshot (public)
    cfg.service(web::scope("/api/demo").service(demo::demo_data));
}
