use crate::api::internal_error;
use crate::models::BudgetInput;
use crate::services::session::SessionUser;
use crate::storage::Storage;
use actix_web::{HttpResponse, Responder, get, post, web};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBudgetRequest {
    pub daily_kwh: f64,
    pub monthly_budget: f64,
    pub carbon_target: f64,
}

#[get("")]
pub async fn get_budget(storage: web::Data<dyn Storage>, user: SessionUser) -> impl Responder {
    match storage.get_budget(user.user_id).await {
        Ok(Some(budget)) => HttpResponse::Ok().json(budget),
        Ok(None) => {
            HttpResponse::NotFound().json(serde_json::json!({"message": "Budget not found"}))
        }
        Err(e) => internal_error("Error fetching budget", e),
    }
}

/// Create-or-update the budget; the owning user comes from the session,
/// never the request body.
#[post("")]
pub async fn update_budget(
    storage: web::Data<dyn Storage>,
    user: SessionUser,
    body: web::Json<UpdateBudgetRequest>,
) -> impl Responder {
    match storage
        .upsert_budget(BudgetInput {
            user_id: user.user_id,
            daily_kwh: body.daily_kwh,
            monthly_budget: body.monthly_budget,
            carbon_target: body.carbon_target,
        })
        .await
    {
        Ok(budget) => HttpResponse::Ok().json(budget),
        Err(e) => internal_error("Error saving budget", e),
    }
}
