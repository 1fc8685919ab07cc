// models/session.rs
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::user::User;

/// Lifecycle of a scheduled mentorship session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

/// Payment state of a session. Only moves to paid/failed once the session
/// itself is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorshipSession {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub mentor_id: ObjectId,
    pub client_id: ObjectId,
    pub session_type: String,
    pub duration_minutes: i32,
    pub rate: Decimal,
    pub scheduled_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub payment_status: PaymentStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session row as served to the dashboard, joined with the client's
/// display name and phone.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub mentor_id: String,
    pub client_id: String,
    pub session_type: String,
    pub duration: i32,
    pub rate: Decimal,
    pub scheduled_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub payment_status: PaymentStatus,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
}

impl SessionView {
    pub fn from_session(session: &MentorshipSession, client: Option<&User>) -> Self {
        SessionView {
            id: session.id.map(|id| id.to_hex()).unwrap_or_default(),
            mentor_id: session.mentor_id.to_hex(),
            client_id: session.client_id.to_hex(),
            session_type: session.session_type.clone(),
            duration: session.duration_minutes,
            rate: session.rate,
            scheduled_at: session.scheduled_at,
            status: session.status,
            payment_status: session.payment_status,
            client_name: client.map(|c| c.username.clone()),
            client_phone: client.and_then(|c| c.phone.clone()),
        }
    }
}

/// The slice of a session needed to raise a collection request for it.
#[derive(Debug, Clone)]
pub struct EligibleSession {
    pub id: ObjectId,
    pub rate: Decimal,
    pub session_type: String,
    pub client_phone: Option<String>,
}
