use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::mentor_handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(mentor_handlers::get_sessions))
        .route("/payment-requests", get(mentor_handlers::get_payment_requests))
        .route("/earnings", get(mentor_handlers::get_earnings))
        .route(
            "/create-payment-request",
            post(mentor_handlers::create_payment_request),
        )
        .route(
            "/request-session-payment/:session_id",
            post(mentor_handlers::request_session_payment),
        )
}
