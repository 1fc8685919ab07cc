// store/memory.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::errors::Result;
use crate::models::catalog::{AiService, UserService};
use crate::models::payment_request::{PaymentRequest, RequestStatus};
use crate::models::session::{EligibleSession, MentorshipSession, PaymentStatus, SessionStatus, SessionView};
use crate::models::transaction::{Transaction, TransactionPurpose, TransactionStatus};
use crate::models::user::User;
use crate::store::{PaymentResult, PaymentStore};

#[derive(Default)]
struct Inner {
    users: HashMap<ObjectId, User>,
    sessions: HashMap<ObjectId, MentorshipSession>,
    requests: HashMap<ObjectId, PaymentRequest>,
    transactions: HashMap<ObjectId, Transaction>,
    services: HashMap<ObjectId, AiService>,
    user_services: Vec<UserService>,
}

/// In-memory [`PaymentStore`] backing the service tests. A single lock
/// around all records makes `reconcile_payment` atomic the same way the
/// MongoDB implementation's client-session transaction does.
#[derive(Default)]
pub struct InMemoryPaymentStore {
    inner: RwLock<Inner>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_user(&self, user: User) -> ObjectId {
        let id = user.id.unwrap_or_else(ObjectId::new);
        let mut inner = self.inner.write().await;
        inner.users.insert(id, User { id: Some(id), ..user });
        id
    }

    pub async fn seed_session(&self, session: MentorshipSession) -> ObjectId {
        let id = session.id.unwrap_or_else(ObjectId::new);
        let mut inner = self.inner.write().await;
        inner.sessions.insert(
            id,
            MentorshipSession {
                id: Some(id),
                ..session
            },
        );
        id
    }

    pub async fn seed_service(&self, service: AiService) -> ObjectId {
        let id = service.id.unwrap_or_else(ObjectId::new);
        let mut inner = self.inner.write().await;
        inner.services.insert(
            id,
            AiService {
                id: Some(id),
                ..service
            },
        );
        id
    }

    pub async fn session(&self, session_id: ObjectId) -> Option<MentorshipSession> {
        self.inner.read().await.sessions.get(&session_id).cloned()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn sessions_for_mentor(&self, mentor_id: ObjectId) -> Result<Vec<MentorshipSession>> {
        let inner = self.inner.read().await;
        Ok(inner
            .sessions
            .values()
            .filter(|session| session.mentor_id == mentor_id)
            .cloned()
            .collect())
    }

    async fn session_views_for_mentor(&self, mentor_id: ObjectId) -> Result<Vec<SessionView>> {
        let inner = self.inner.read().await;
        let mut sessions: Vec<&MentorshipSession> = inner
            .sessions
            .values()
            .filter(|session| session.mentor_id == mentor_id)
            .collect();
        sessions.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));

        Ok(sessions
            .into_iter()
            .map(|session| {
                SessionView::from_session(session, inner.users.get(&session.client_id))
            })
            .collect())
    }

    async fn find_eligible_session(
        &self,
        mentor_id: ObjectId,
        session_id: ObjectId,
    ) -> Result<Option<EligibleSession>> {
        let inner = self.inner.read().await;
        let Some(session) = inner.sessions.get(&session_id) else {
            return Ok(None);
        };
        if session.mentor_id != mentor_id
            || session.status != SessionStatus::Completed
            || session.payment_status != PaymentStatus::Pending
        {
            return Ok(None);
        }

        let client_phone = inner
            .users
            .get(&session.client_id)
            .and_then(|client| client.phone.clone());
        Ok(Some(EligibleSession {
            id: session_id,
            rate: session.rate,
            session_type: session.session_type.clone(),
            client_phone,
        }))
    }

    async fn touch_session_payment_pending(&self, session_id: ObjectId) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(session) = inner.sessions.get_mut(&session_id) {
            session.payment_status = PaymentStatus::Pending;
            session.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn requests_for_mentor(&self, mentor_id: ObjectId) -> Result<Vec<PaymentRequest>> {
        let inner = self.inner.read().await;
        let mut requests: Vec<PaymentRequest> = inner
            .requests
            .values()
            .filter(|request| request.mentor_id == mentor_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn insert_request_with_transaction(
        &self,
        request: PaymentRequest,
        transaction: Transaction,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let request_id = request.id.unwrap_or_else(ObjectId::new);
        let transaction_id = transaction.id.unwrap_or_else(ObjectId::new);
        inner.requests.insert(request_id, request);
        inner.transactions.insert(transaction_id, transaction);
        Ok(())
    }

    async fn insert_transaction(&self, transaction: Transaction) -> Result<()> {
        let mut inner = self.inner.write().await;
        let transaction_id = transaction.id.unwrap_or_else(ObjectId::new);
        inner.transactions.insert(transaction_id, transaction);
        Ok(())
    }

    async fn find_transaction_by_reference(
        &self,
        momo_reference: &str,
    ) -> Result<Option<Transaction>> {
        let inner = self.inner.read().await;
        Ok(inner
            .transactions
            .values()
            .find(|transaction| transaction.momo_reference == momo_reference)
            .cloned())
    }

    async fn find_transaction_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Transaction>> {
        let inner = self.inner.read().await;
        Ok(inner
            .transactions
            .values()
            .find(|transaction| transaction.external_id == external_id)
            .cloned())
    }

    async fn reconcile_payment(
        &self,
        momo_reference: &str,
        outcome: PaymentResult,
    ) -> Result<bool> {
        let (transaction_status, payment_status, request_status) = match outcome {
            PaymentResult::Paid => (
                TransactionStatus::Completed,
                PaymentStatus::Paid,
                RequestStatus::Paid,
            ),
            PaymentResult::Failed => (
                TransactionStatus::Failed,
                PaymentStatus::Failed,
                RequestStatus::Failed,
            ),
        };

        let mut inner = self.inner.write().await;
        let now = Utc::now();

        let Some(transaction) = inner
            .transactions
            .values_mut()
            .find(|transaction| transaction.momo_reference == momo_reference)
        else {
            return Ok(false);
        };

        if transaction.status == TransactionStatus::Pending {
            transaction.status = transaction_status;
            transaction.updated_at = now;
        }
        let user_id = transaction.user_id;
        let purpose = transaction.purpose;
        let session_id = transaction.session_id;
        let service_id = transaction.service_id;

        if let Some(request) = inner
            .requests
            .values_mut()
            .find(|request| request.transaction_id.as_deref() == Some(momo_reference))
        {
            if matches!(request.status, RequestStatus::Pending | RequestStatus::Sent) {
                request.status = request_status;
                request.updated_at = now;
            }
        }

        if let Some(session_id) = session_id {
            if let Some(session) = inner.sessions.get_mut(&session_id) {
                if session.payment_status == PaymentStatus::Pending {
                    session.payment_status = payment_status;
                    session.updated_at = now;
                }
            }
        }

        if outcome == PaymentResult::Paid && purpose == TransactionPurpose::ServicePurchase {
            if let Some(service_id) = service_id {
                let already_active = inner
                    .user_services
                    .iter()
                    .any(|entry| entry.user_id == user_id && entry.service_id == service_id);
                if !already_active {
                    let service_type = inner
                        .services
                        .get(&service_id)
                        .map(|service| service.service_type.clone())
                        .unwrap_or_default();
                    inner.user_services.push(UserService {
                        id: Some(ObjectId::new()),
                        user_id,
                        service_id,
                        service_type,
                        status: "active".to_string(),
                        activated_at: now,
                    });
                }
            }
        }

        Ok(true)
    }

    async fn active_services(&self) -> Result<Vec<AiService>> {
        let inner = self.inner.read().await;
        Ok(inner
            .services
            .values()
            .filter(|service| service.is_active)
            .cloned()
            .collect())
    }

    async fn find_service(&self, service_id: ObjectId) -> Result<Option<AiService>> {
        let inner = self.inner.read().await;
        Ok(inner.services.get(&service_id).cloned())
    }

    async fn services_for_user(&self, user_id: ObjectId) -> Result<Vec<UserService>> {
        let inner = self.inner.read().await;
        Ok(inner
            .user_services
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect())
    }
}
