use crate::api::internal_error;
use crate::services::session::SessionUser;
use crate::storage::Storage;
use actix_web::{HttpResponse, Responder, get, web};

/// List all devices for the authenticated user
#[get("")]
pub async fn list_devices(storage: web::Data<dyn Storage>, user: SessionUser) -> impl Responder {
    match storage.get_devices(user.user_id).await {
        Ok(devices) => HttpResponse::Ok().json(devices),
        Err(e) => internal_error("Error fetching devices", e),
    }
}

/// Get a single device; cross-user ids are indistinguishable from missing ones
#[get("/{device_id}")]
pub async fn get_device(
    storage: web::Data<dyn Storage>,
    user: SessionUser,
    path: web::Path<i32>,
) -> impl Responder {
    let device_id = path.into_inner();
    match storage.get_device(device_id).await {
        Ok(Some(device)) if device.user_id == user.user_id => HttpResponse::Ok().json(device),
        Ok(_) => HttpResponse::NotFound().json(serde_json::json!({"message": "Device not found"})),
        Err(e) => internal_error("Error fetching device", e),
    }
}
