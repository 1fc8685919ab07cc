// services/momo.rs
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as base64, Engine as _};
use chrono::{DateTime, Utc};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::MomoConfig;
use crate::errors::{AppError, Result};

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payer {
    pub party_id_type: String,
    pub party_id: String,
}

/// Descriptor for a collection request. Built before submission so the
/// caller keeps hold of the external id the gateway deduplicates on.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRequest {
    pub amount: String,
    pub currency: String,
    pub external_id: String,
    pub payer: Payer,
    pub payer_message: String,
    pub payee_note: String,
}

impl CollectionRequest {
    pub fn new(
        amount: String,
        currency: String,
        external_id: String,
        payer_id: &str,
        payer_id_type: &str,
        description: String,
    ) -> Self {
        CollectionRequest {
            amount,
            currency,
            external_id,
            payer: Payer {
                party_id_type: payer_id_type.to_uppercase(),
                party_id: normalize_msisdn(payer_id),
            },
            payer_message: description.clone(),
            payee_note: description,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Pending,
    Successful,
    Failed,
}

#[derive(Debug, Clone)]
pub struct CollectionStatusReport {
    pub status: CollectionStatus,
    pub reason: Option<String>,
}

/// The payment-provider seam: submit a collection request, look up its
/// status. Implemented by [`MomoClient`] in production and by a mock in
/// the service tests.
#[async_trait]
pub trait CollectionGateway: Send + Sync {
    async fn request_to_pay(&self, request: &CollectionRequest) -> Result<String>;

    async fn transaction_status(&self, reference_id: &str) -> Result<CollectionStatusReport>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestToPayResult {
    status: String,
    #[serde(default)]
    reason: Option<serde_json::Value>,
}

#[derive(Debug)]
pub struct MomoClient {
    config: MomoConfig,
    client: Client,
    cached_token: Arc<RwLock<Option<(String, DateTime<Utc>)>>>,
}

impl MomoClient {
    pub fn new(config: MomoConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        MomoClient {
            config,
            client,
            cached_token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    pub async fn get_access_token(&self) -> Result<String> {
        {
            let cached = self.cached_token.read().unwrap();
            if let Some((token, expiry)) = cached.as_ref() {
                if *expiry > Utc::now() + chrono::Duration::minutes(5) {
                    return Ok(token.clone());
                }
            }
        }

        info!("Requesting new MoMo access token");
        let auth_string = format!(
            "{}:{}",
            self.config.collections_user_id, self.config.collections_api_key
        );
        let encoded_auth = base64.encode(auth_string);

        let response = self
            .client
            .post(self.config.token_url())
            .header(header::AUTHORIZATION, format!("Basic {}", encoded_auth))
            .header(
                "Ocp-Apim-Subscription-Key",
                &self.config.collections_subscription_key,
            )
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Failed to get MoMo access token: {} - {}", status, body);
            return Err(AppError::momo(format!("MoMo auth failed: {}", status)));
        }

        let token_response: TokenResponse = response.json().await?;

        {
            let expiry = Utc::now() + chrono::Duration::seconds(token_response.expires_in);
            let mut cached = self.cached_token.write().unwrap();
            *cached = Some((token_response.access_token.clone(), expiry));
        }

        Ok(token_response.access_token)
    }
}

#[async_trait]
impl CollectionGateway for MomoClient {
    async fn request_to_pay(&self, request: &CollectionRequest) -> Result<String> {
        info!(
            "Collection request for {} - {} {}",
            request.payer.party_id, request.currency, request.amount
        );

        let access_token = self.get_access_token().await?;
        let reference_id = Uuid::new_v4().to_string();

        let mut http_request = self
            .client
            .post(self.config.request_to_pay_url())
            .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
            .header("X-Reference-Id", &reference_id)
            .header("X-Target-Environment", &self.config.environment)
            .header(
                "Ocp-Apim-Subscription-Key",
                &self.config.collections_subscription_key,
            )
            .json(request);

        if let Some(callback_url) = &self.config.callback_url {
            http_request = http_request.header("X-Callback-Url", callback_url);
        }

        let response = http_request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("requestToPay rejected: {} - {}", status, body);
            return Err(AppError::momo(format!(
                "Payment request rejected by provider: {}",
                status
            )));
        }

        info!("Collection request accepted: {}", reference_id);
        Ok(reference_id)
    }

    async fn transaction_status(&self, reference_id: &str) -> Result<CollectionStatusReport> {
        let access_token = self.get_access_token().await?;

        let response = self
            .client
            .get(self.config.transaction_status_url(reference_id))
            .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
            .header("X-Target-Environment", &self.config.environment)
            .header(
                "Ocp-Apim-Subscription-Key",
                &self.config.collections_subscription_key,
            )
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("MoMo status lookup failed: {} - {}", status, body);
            return Err(AppError::momo(format!("Status lookup failed: {}", status)));
        }

        let result: RequestToPayResult = response.json().await?;
        Ok(CollectionStatusReport {
            status: parse_collection_status(&result.status),
            reason: result.reason.map(reason_text),
        })
    }
}

pub fn parse_collection_status(status: &str) -> CollectionStatus {
    match status.to_uppercase().as_str() {
        "SUCCESSFUL" => CollectionStatus::Successful,
        "FAILED" | "REJECTED" | "TIMEOUT" => CollectionStatus::Failed,
        "PENDING" | "CREATED" => CollectionStatus::Pending,
        other => {
            warn!("Unrecognized MoMo status {:?}, treating as pending", other);
            CollectionStatus::Pending
        }
    }
}

fn reason_text(reason: serde_json::Value) -> String {
    match reason {
        serde_json::Value::String(text) => text,
        serde_json::Value::Object(ref fields) => fields
            .get("message")
            .and_then(|message| message.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| reason.to_string()),
        other => other.to_string(),
    }
}

/// Strip formatting characters so the gateway always sees a bare MSISDN.
pub fn normalize_msisdn(phone: &str) -> String {
    phone
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect()
}
