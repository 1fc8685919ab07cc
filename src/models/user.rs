// models/user.rs
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Platform user as far as the payments slice needs one: a display name
/// and the mobile-money phone number sessions are billed against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub username: String,
    pub phone: Option<String>,
}
