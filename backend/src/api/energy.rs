use crate::api::internal_error;
use crate::services::session::SessionUser;
use crate::storage::Storage;
use actix_web::{HttpResponse, Responder, get, web};
use serde::Deserialize;

const DEFAULT_HISTORY_DAYS: i64 = 7;

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub days: Option<i64>,
}

/// Latest usage snapshot for the authenticated user
#[get("/current")]
pub async fn current_usage(storage: web::Data<dyn Storage>, user: SessionUser) -> impl Responder {
    match storage.get_current_energy_usage(user.user_id).await {
        Ok(Some(usage)) => HttpResponse::Ok().json(usage),
        Ok(None) => {
            HttpResponse::NotFound().json(serde_json::json!({"message": "Energy data not found"}))
        }
        Err(e) => internal_error("Error fetching energy usage", e),
    }
}

/// Daily history buckets for the last `days` days (default 7), oldest first
#[get("/history")]
pub async fn history(
    storage: web::Data<dyn Storage>,
    user: SessionUser,
    query: web::Query<HistoryQuery>,
) -> impl Responder {
    let days = query.days.unwrap_or(DEFAULT_HISTORY_DAYS);
    match storage.get_energy_history(user.user_id, days).await {
        Ok(history) => HttpResponse::Ok().json(history),
        Err(e) => internal_error("Error fetching energy history", e),
    }
}
