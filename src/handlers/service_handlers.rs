// handlers/service_handlers.rs
use axum::{
    extract::{Query, State},
    response::Json,
};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use validator::Validate;

use crate::errors::Result;
use crate::models::catalog::{AiServiceView, UserServiceView};
use crate::services::mentor_payments::PaymentOutcome;
use crate::state::AppState;

pub async fn list_services(State(state): State<AppState>) -> Result<Json<Vec<AiServiceView>>> {
    let services = state.catalog.active_services().await?;
    Ok(Json(services))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserScope {
    pub user_id: String,
}

pub async fn my_services(
    State(state): State<AppState>,
    Query(scope): Query<UserScope>,
) -> Result<Json<Vec<UserServiceView>>> {
    let user_id = ObjectId::parse_str(&scope.user_id)?;
    let services = state.catalog.user_services(user_id).await?;
    Ok(Json(services))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDto {
    pub user_id: String,
    pub service_id: String,

    #[validate(length(min = 9, message = "A valid phone number is required"))]
    pub phone_number: String,
}

pub async fn purchase_service(
    State(state): State<AppState>,
    Json(payload): Json<PurchaseDto>,
) -> Result<Json<PaymentOutcome>> {
    payload.validate()?;
    let user_id = ObjectId::parse_str(&payload.user_id)?;
    let service_id = ObjectId::parse_str(&payload.service_id)?;

    let outcome = state
        .catalog
        .purchase(user_id, service_id, payload.phone_number)
        .await?;

    Ok(Json(outcome))
}
