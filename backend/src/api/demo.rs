use crate::api::internal_error;
use crate::storage::Storage;
use actix_web::{HttpResponse, Responder, get, web};

/// The account the telemetry simulator drives; seeded at startup.
const DEMO_USER_ID: i32 = 1;

/// Unauthenticated aggregate snapshot for the demo dashboard
#[get("/data")]
pub async fn demo_data(storage: web::Data<dyn Storage>) -> impl Responder {
    let energy_usage = match storage.get_current_energy_usage(DEMO_USER_ID).await {
        Ok(u) => u,
        Err(e) => return internal_error("Error fetching demo data", e),
    };
    let devices = match storage.get_devices(DEMO_USER_ID).await {
        Ok(d) => d,
        Err(e) => return internal_error("Error fetching demo data", e),
    };
    let budget = match storage.get_budget(DEMO_USER_ID).await {
        Ok(b) => b,
        Err(e) => return internal_error("Error fetching demo data", e),
    };
    let alerts = match storage.get_alerts(DEMO_USER_ID, Some(4)).await {
        Ok(a) => a,
        Err(e) => return internal_error("Error fetching demo data", e),
    };
    let history = match storage.get_energy_history(DEMO_USER_ID, 1).await {
        Ok(h) => h,
        Err(e) => return internal_error("Error fetching demo data", e),
    };

    // The dashboard chart only needs today's hourly curve.
    let hourly: Vec<f64> = history
        .first()
        .map(|bucket| bucket.hourly_data.clone())
        .unwrap_or_default();

    HttpResponse::Ok().json(serde_json::json!({
        "energyUsage": energy_usage,
        "devices": devices,
        "budget": budget,
        "alerts": alerts,
        "history": hourly,
    }))
}
