use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::service_handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(service_handlers::list_services))
        .route("/purchase", post(service_handlers::purchase_service))
        .route("/mine", get(service_handlers::my_services))
}
