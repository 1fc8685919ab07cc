// config.rs
use std::env;

use crate::errors::{AppError, Result};

/// MTN MoMo collections credentials and endpoints.
///
/// Loaded separately from the rest of the environment so the API can still
/// boot (with payment initiation disabled) when the MoMo side is not
/// configured yet.
#[derive(Debug, Clone)]
pub struct MomoConfig {
    pub collections_subscription_key: String,
    pub collections_user_id: String,
    pub collections_api_key: String,
    pub base_url: String,
    pub environment: String,
    pub callback_url: Option<String>,
    pub currency: String,
}

impl MomoConfig {
    pub fn from_env() -> Result<Self> {
        let environment =
            env::var("MOMO_ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string());

        let base_url = env::var("MOMO_BASE_URL").unwrap_or_else(|_| {
            if environment == "production" {
                "https://momodeveloper.mtn.com".to_string()
            } else {
                "https://sandbox.momodeveloper.mtn.com".to_string()
            }
        });

        Ok(MomoConfig {
            collections_subscription_key: require("MOMO_COLLECTIONS_SUBSCRIPTION_KEY")?,
            collections_user_id: require("MOMO_COLLECTIONS_USER_ID")?,
            collections_api_key: require("MOMO_COLLECTIONS_API_KEY")?,
            base_url,
            environment,
            callback_url: env::var("MOMO_CALLBACK_URL").ok(),
            currency: env::var("MOMO_CURRENCY").unwrap_or_else(|_| "ZAR".to_string()),
        })
    }

    pub fn token_url(&self) -> String {
        format!("{}/collection/token/", self.base_url)
    }

    pub fn request_to_pay_url(&self) -> String {
        format!("{}/collection/v1_0/requesttopay", self.base_url)
    }

    pub fn transaction_status_url(&self, reference_id: &str) -> String {
        format!("{}/collection/v1_0/requesttopay/{}", self.base_url, reference_id)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_name: String,
    pub port: u16,
    pub host: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(AppConfig {
            database_url: require("DATABASE_URL")?,
            database_name: env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "careernest".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .map_err(|_| AppError::configuration("PORT must be a number"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
        })
    }
}

fn require(name: &str) -> Result<String> {
    env::var(name).map_err(|_| AppError::configuration(format!("{} must be set", name)))
}
