// store/mod.rs
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::errors::Result;
use crate::models::catalog::{AiService, UserService};
use crate::models::payment_request::PaymentRequest;
use crate::models::session::{EligibleSession, MentorshipSession, SessionView};
use crate::models::transaction::Transaction;

#[cfg(test)]
pub(crate) mod memory;
pub(crate) mod mongo;

/// Terminal outcome reported by the gateway for a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentResult {
    Paid,
    Failed,
}

/// Persistence seam for the payments slice.
///
/// The production implementation is [`mongo::MongoPaymentStore`]; the
/// in-memory implementation backs the service tests.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// All sessions of a mentor, unordered.
    async fn sessions_for_mentor(&self, mentor_id: ObjectId) -> Result<Vec<MentorshipSession>>;

    /// Sessions of a mentor joined with client name/phone, newest
    /// `scheduled_at` first.
    async fn session_views_for_mentor(&self, mentor_id: ObjectId) -> Result<Vec<SessionView>>;

    /// A session that payment may be requested for: owned by the mentor,
    /// completed, and still unpaid. `None` otherwise.
    async fn find_eligible_session(
        &self,
        mentor_id: ObjectId,
        session_id: ObjectId,
    ) -> Result<Option<EligibleSession>>;

    /// Re-stamp a session as payment-pending to record that a collection
    /// request is now in flight for it.
    async fn touch_session_payment_pending(&self, session_id: ObjectId) -> Result<()>;

    /// Payment requests of a mentor, newest first.
    async fn requests_for_mentor(&self, mentor_id: ObjectId) -> Result<Vec<PaymentRequest>>;

    /// Persist a payment request together with its transaction record.
    /// A request must never be left behind without its transaction: the
    /// implementation either writes both or neither.
    async fn insert_request_with_transaction(
        &self,
        request: PaymentRequest,
        transaction: Transaction,
    ) -> Result<()>;

    /// Persist a standalone transaction (service purchases).
    async fn insert_transaction(&self, transaction: Transaction) -> Result<()>;

    async fn find_transaction_by_reference(
        &self,
        momo_reference: &str,
    ) -> Result<Option<Transaction>>;

    async fn find_transaction_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Transaction>>;

    /// Apply a terminal payment outcome to the transaction, its payment
    /// request, its linked session, and (for purchases) the user's service
    /// activation, as one atomic unit. Every update only fires from the
    /// pending/sent states, so re-applying the same outcome is a no-op.
    ///
    /// Returns `false` when no transaction matches the reference.
    async fn reconcile_payment(&self, momo_reference: &str, outcome: PaymentResult)
        -> Result<bool>;

    async fn active_services(&self) -> Result<Vec<AiService>>;

    async fn find_service(&self, service_id: ObjectId) -> Result<Option<AiService>>;

    async fn services_for_user(&self, user_id: ObjectId) -> Result<Vec<UserService>>;
}
