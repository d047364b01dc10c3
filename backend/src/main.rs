use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, web};
use std::sync::Arc;
use std::time::Duration;

use backend::api;
use backend::services::seed;
use backend::services::session::SessionStore;
use backend::services::simulator::TelemetrySimulator;
use backend::storage::{MemStorage, Storage};

#[get("/")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "Home Energy Monitor Backend",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let tick_secs: u64 = std::env::var("SIM_TICK_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
    let demo_user_id = match seed::seed_demo_data(storage.as_ref()).await {
        Ok(id) => id,
        Err(e) => {
            log::error!("Failed to seed demo data: {}", e);
            std::process::exit(1);
        }
    };

    let sessions = web::Data::new(SessionStore::new());
    let storage_data: web::Data<dyn Storage> = web::Data::from(storage.clone());

    let simulator =
        TelemetrySimulator::new(storage, demo_user_id, Duration::from_secs(tick_secs));
    let sim_handle = simulator.spawn();
    log::info!("Telemetry simulator ticking every {}s", tick_secs);

    log::info!("Starting Home Energy Monitor Backend at http://{}", bind_addr);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(storage_data.clone())
            .app_data(sessions.clone())
            .service(health_check)
            .configure(api::config)
    })
    .bind(bind_addr.as_str())?
    .run();

    let result = server.await;

    // Stop the simulator before the process exits.
    sim_handle.stop().await;

    result
}
