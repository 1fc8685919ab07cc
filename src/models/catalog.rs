// models/catalog.rs
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A purchasable platform service (CV generation, cover letters, job
/// alerts, ...) as listed on the checkout page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiService {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub service_type: String,
    pub is_active: bool,
    pub duration: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiServiceView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub service_type: String,
    pub is_active: bool,
    pub duration: Option<String>,
    pub features: Vec<String>,
}

impl From<&AiService> for AiServiceView {
    fn from(service: &AiService) -> Self {
        AiServiceView {
            id: service.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: service.name.clone(),
            description: service.description.clone(),
            price: service.price,
            service_type: service.service_type.clone(),
            is_active: service.is_active,
            duration: service.duration.clone(),
            features: service.features.clone(),
        }
    }
}

/// A service a user has paid for. Written only by reconciliation, once the
/// collection for the purchase completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserService {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: ObjectId,
    pub service_id: ObjectId,
    pub service_type: String,
    pub status: String,
    pub activated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserServiceView {
    pub id: String,
    pub service_id: String,
    pub service_type: String,
    pub status: String,
    pub activated_at: DateTime<Utc>,
}

impl From<&UserService> for UserServiceView {
    fn from(entry: &UserService) -> Self {
        UserServiceView {
            id: entry.id.map(|id| id.to_hex()).unwrap_or_default(),
            service_id: entry.service_id.to_hex(),
            service_type: entry.service_type.clone(),
            status: entry.status.clone(),
            activated_at: entry.activated_at,
        }
    }
}
