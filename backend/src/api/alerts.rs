use crate::api::internal_error;
use crate::services::session::SessionUser;
use crate::storage::Storage;
use actix_web::{HttpResponse, Responder, get, post, web};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct AlertsQuery {
    pub limit: Option<usize>,
}

/// Alerts for the authenticated user, newest first
#[get("")]
pub async fn list_alerts(
    storage: web::Data<dyn Storage>,
    user: SessionUser,
    query: web::Query<AlertsQuery>,
) -> impl Responder {
    match storage.get_alerts(user.user_id, query.limit).await {
        Ok(alerts) => HttpResponse::Ok().json(alerts),
        Err(e) => internal_error("Error fetching alerts", e),
    }
}

/// Toggle the read flag; alerts of other users read as missing
#[post("/{alert_id}/read")]
pub async fn mark_read(
    storage: web::Data<dyn Storage>,
    user: SessionUser,
    path: web::Path<i32>,
) -> impl Responder {
    let alert_id = path.into_inner();

    // Ownership is checked before the write so a cross-user request
    // cannot flip someone else's read flag.
    let owned = match storage.get_alert(alert_id).await {
        Ok(Some(alert)) => alert.user_id == user.user_id,
        Ok(None) => false,
        Err(e) => return internal_error("Error fetching alert", e),
    };
    if !owned {
        return HttpResponse::NotFound().json(serde_json::json!({"message": "Alert not found"}));
    }

    match storage.mark_alert_read(alert_id).await {
        Ok(Some(alert)) => HttpResponse::Ok().json(alert),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({"message": "Alert not found"})),
        Err(e) => internal_error("Error updating alert", e),
    }
}
