// models/transaction.rs
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Collection,
    Disbursement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionPurpose {
    MentorPayment,
    ServicePurchase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

/// Gateway-facing record of money movement.
///
/// `external_id` is generated on our side and handed to the gateway so
/// retries deduplicate; `momo_reference` is the gateway-assigned id used
/// as the join key during reconciliation. Links back to the originating
/// request / session / catalog service are typed fields, not an opaque
/// metadata blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: ObjectId,
    pub external_id: String,
    pub momo_reference: String,

    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub purpose: TransactionPurpose,

    pub amount: Decimal,
    pub currency: String,
    pub status: TransactionStatus,
    pub payer_phone: String,
    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_request_id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<ObjectId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
