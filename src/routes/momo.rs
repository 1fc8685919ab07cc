use axum::{
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use crate::handlers::momo_handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(momo_health))
        .route("/callback", post(momo_handlers::momo_callback))
        .route(
            "/payment-status/:transaction_id",
            get(momo_handlers::payment_status),
        )
}

async fn momo_health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "momo",
        "timestamp": Utc::now().to_rfc3339(),
        "features": ["collections", "payment-status-check", "callback"]
    }))
}
