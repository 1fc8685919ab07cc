// models/payment_request.rs
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A mentor-initiated ask for money. Status only ever advances
/// (sent -> paid | failed), it never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Sent,
    Paid,
    Failed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Sent => "sent",
            RequestStatus::Paid => "paid",
            RequestStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub mentor_id: ObjectId,
    pub client_phone: String,
    pub amount: Decimal,
    pub description: String,
    pub status: RequestStatus,

    /// Gateway-assigned reference for the collection raised on this request.
    pub transaction_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestView {
    pub id: String,
    pub mentor_id: String,
    pub client_phone: String,
    pub amount: Decimal,
    pub description: String,
    pub status: RequestStatus,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&PaymentRequest> for PaymentRequestView {
    fn from(request: &PaymentRequest) -> Self {
        PaymentRequestView {
            id: request.id.map(|id| id.to_hex()).unwrap_or_default(),
            mentor_id: request.mentor_id.to_hex(),
            client_phone: request.client_phone.clone(),
            amount: request.amount,
            description: request.description.clone(),
            status: request.status,
            transaction_id: request.transaction_id.clone(),
            created_at: request.created_at,
        }
    }
}
