use axum::extract::State;
use axum::{http::Method, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod config;
mod database;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod state;
mod store;

use config::{AppConfig, MomoConfig};
use database::connection::get_db_client;
use mongodb::bson::doc;
use services::momo::MomoClient;
use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let app_config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let (client, db) = match get_db_client(&app_config).await {
        Ok(connection) => connection,
        Err(e) => {
            tracing::error!("❌ Failed to connect to MongoDB: {}", e);
            std::process::exit(1);
        }
    };

    let momo = initialize_momo().await;
    let app_state = AppState::new(client, db, momo);

    let app = build_router(app_state);
    start_server(app, &app_config).await;
}

async fn initialize_momo() -> Option<Arc<MomoClient>> {
    tracing::info!("🔧 Attempting to initialize MoMo service...");

    let config = match MomoConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ {}", e);
            tracing::warn!("MoMo service will be disabled");
            return None;
        }
    };

    tracing::info!("✅ MoMo config loaded ({} environment)", config.environment);
    let momo = Arc::new(MomoClient::new(config));

    // Verify credentials before wiring the service in
    match momo.get_access_token().await {
        Ok(_) => {
            tracing::info!("✅ MoMo access token obtained, service ready");
            Some(momo)
        }
        Err(e) => {
            tracing::error!("❌ Failed to get MoMo access token: {}", e);
            tracing::warn!("Payment initiation will be disabled");
            None
        }
    }
}

fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_credentials(false);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/api/health", get(api_health_check))
        .nest("/api/mentor", routes::mentor::routes())
        .nest("/api/momo", routes::momo::routes())
        .nest("/api/services", routes::services::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

async fn start_server(app: Router, config: &AppConfig) {
    let addr = format!("{}:{}", config.host, config.port)
        .parse::<SocketAddr>()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], config.port)));

    tracing::info!("🚀 Server starting on {}", addr);

    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    }
}

async fn root_handler() -> &'static str {
    "🚀 CareerNest Payments API"
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn api_health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match state.db.run_command(doc! {"ping": 1}).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    Json(json!({
        "status": "healthy",
        "database": db_status,
        "momo": state.momo.is_some(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
