// handlers/momo_handlers.rs
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::errors::Result;
use crate::services::mentor_payments::PaymentStatusReport;
use crate::services::momo::parse_collection_status;
use crate::state::AppState;

/// Inbound requestToPay callback. The gateway posts back the request
/// descriptor plus a terminal status; depending on deployment either the
/// reference id or only our external id is present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MomoCallback {
    pub reference_id: Option<String>,
    pub external_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub reason: Option<serde_json::Value>,
}

pub async fn momo_callback(
    State(state): State<AppState>,
    Json(payload): Json<MomoCallback>,
) -> Json<serde_json::Value> {
    info!("Received MoMo callback: {:?}", payload);

    let status = parse_collection_status(&payload.status);
    let reason = payload.reason.as_ref().map(|value| value.to_string());

    if let Err(e) = state
        .payments
        .process_callback(
            payload.reference_id.as_deref(),
            payload.external_id.as_deref(),
            status,
            reason.as_deref(),
        )
        .await
    {
        error!("Failed to process MoMo callback: {}", e);
    }

    // Always acknowledge so the provider stops redelivering.
    Json(json!({ "status": "ok" }))
}

pub async fn payment_status(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<PaymentStatusReport>> {
    let report = state.payments.check_payment_status(&transaction_id).await?;
    Ok(Json(report))
}
