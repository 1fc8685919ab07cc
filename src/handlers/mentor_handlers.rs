// handlers/mentor_handlers.rs
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::errors::Result;
use crate::models::payment_request::PaymentRequestView;
use crate::models::session::SessionView;
use crate::services::mentor_payments::{EarningsStats, PaymentOutcome};
use crate::state::AppState;

/// Mentor scoping for the dashboard reads. Would normally come from the
/// authenticated session; auth lives outside this service.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorScope {
    pub mentor_id: String,
}

pub async fn get_sessions(
    State(state): State<AppState>,
    Query(scope): Query<MentorScope>,
) -> Result<Json<Vec<SessionView>>> {
    let mentor_id = ObjectId::parse_str(&scope.mentor_id)?;
    let sessions = state.payments.mentor_sessions(mentor_id).await?;
    Ok(Json(sessions))
}

pub async fn get_payment_requests(
    State(state): State<AppState>,
    Query(scope): Query<MentorScope>,
) -> Result<Json<Vec<PaymentRequestView>>> {
    let mentor_id = ObjectId::parse_str(&scope.mentor_id)?;
    let requests = state.payments.payment_requests(mentor_id).await?;
    Ok(Json(requests))
}

pub async fn get_earnings(
    State(state): State<AppState>,
    Query(scope): Query<MentorScope>,
) -> Result<Json<EarningsStats>> {
    let mentor_id = ObjectId::parse_str(&scope.mentor_id)?;
    let stats = state.payments.earnings_stats(mentor_id).await?;
    Ok(Json(stats))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequestDto {
    pub mentor_id: String,

    #[validate(length(min = 9, message = "A valid client phone number is required"))]
    pub client_phone: String,

    pub amount: Decimal,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

pub async fn create_payment_request(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentRequestDto>,
) -> Result<Json<PaymentOutcome>> {
    payload.validate()?;
    let mentor_id = ObjectId::parse_str(&payload.mentor_id)?;

    let outcome = state
        .payments
        .create_payment_request(
            mentor_id,
            payload.client_phone,
            payload.amount,
            payload.description,
        )
        .await?;

    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPaymentDto {
    pub mentor_id: String,
}

pub async fn request_session_payment(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<SessionPaymentDto>,
) -> Result<Json<PaymentOutcome>> {
    let mentor_id = ObjectId::parse_str(&payload.mentor_id)?;
    let session_id = ObjectId::parse_str(&session_id)?;

    let outcome = state
        .payments
        .request_session_payment(mentor_id, session_id)
        .await?;

    Ok(Json(outcome))
}
