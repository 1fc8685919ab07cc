// store/mongo.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, ClientSession, Collection, Database};
use tracing::warn;

use crate::errors::Result;
use crate::models::catalog::{AiService, UserService};
use crate::models::payment_request::{PaymentRequest, RequestStatus};
use crate::models::session::{EligibleSession, MentorshipSession, PaymentStatus, SessionStatus, SessionView};
use crate::models::transaction::{Transaction, TransactionPurpose, TransactionStatus};
use crate::models::user::User;
use crate::store::{PaymentResult, PaymentStore};

pub struct MongoPaymentStore {
    client: Client,
    db: Database,
}

impl MongoPaymentStore {
    pub fn new(client: Client, db: Database) -> Self {
        MongoPaymentStore { client, db }
    }

    fn sessions(&self) -> Collection<MentorshipSession> {
        self.db.collection("mentorship_sessions")
    }

    fn requests(&self) -> Collection<PaymentRequest> {
        self.db.collection("payment_requests")
    }

    fn transactions(&self) -> Collection<Transaction> {
        self.db.collection("transactions")
    }

    fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    fn ai_services(&self) -> Collection<AiService> {
        self.db.collection("ai_services")
    }

    fn user_services(&self) -> Collection<UserService> {
        self.db.collection("user_services")
    }

    async fn client_for_session(&self, session: &MentorshipSession) -> Result<Option<User>> {
        self.users()
            .find_one(doc! { "_id": session.client_id })
            .await
            .map_err(Into::into)
    }

    async fn apply_outcome(
        &self,
        session: &mut ClientSession,
        transaction: &Transaction,
        outcome: PaymentResult,
    ) -> Result<()> {
        let (transaction_status, payment_status) = match outcome {
            PaymentResult::Paid => (
                TransactionStatus::Completed.as_str(),
                PaymentStatus::Paid.as_str(),
            ),
            PaymentResult::Failed => (
                TransactionStatus::Failed.as_str(),
                PaymentStatus::Failed.as_str(),
            ),
        };
        let now = Utc::now().to_rfc3339();

        self.transactions()
            .update_one(
                doc! {
                    "momo_reference": &transaction.momo_reference,
                    "status": TransactionStatus::Pending.as_str(),
                },
                doc! { "$set": { "status": transaction_status, "updated_at": now.clone() } },
            )
            .session(&mut *session)
            .await?;

        self.requests()
            .update_one(
                doc! {
                    "transaction_id": &transaction.momo_reference,
                    "status": { "$in": [RequestStatus::Pending.as_str(), RequestStatus::Sent.as_str()] },
                },
                doc! { "$set": { "status": payment_status, "updated_at": now.clone() } },
            )
            .session(&mut *session)
            .await?;

        if let Some(session_id) = transaction.session_id {
            self.sessions()
                .update_one(
                    doc! {
                        "_id": session_id,
                        "payment_status": PaymentStatus::Pending.as_str(),
                    },
                    doc! { "$set": { "payment_status": payment_status, "updated_at": now.clone() } },
                )
                .session(&mut *session)
                .await?;
        }

        if outcome == PaymentResult::Paid
            && transaction.purpose == TransactionPurpose::ServicePurchase
        {
            if let Some(service_id) = transaction.service_id {
                let service_type = self
                    .ai_services()
                    .find_one(doc! { "_id": service_id })
                    .session(&mut *session)
                    .await?
                    .map(|service| service.service_type)
                    .unwrap_or_default();

                self.user_services()
                    .update_one(
                        doc! { "user_id": transaction.user_id, "service_id": service_id },
                        doc! { "$setOnInsert": {
                            "user_id": transaction.user_id,
                            "service_id": service_id,
                            "service_type": service_type,
                            "status": "active",
                            "activated_at": now.clone(),
                        } },
                    )
                    .upsert(true)
                    .session(&mut *session)
                    .await?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl PaymentStore for MongoPaymentStore {
    async fn sessions_for_mentor(&self, mentor_id: ObjectId) -> Result<Vec<MentorshipSession>> {
        let cursor = self.sessions().find(doc! { "mentor_id": mentor_id }).await?;
        let sessions: Vec<MentorshipSession> = cursor.try_collect().await?;
        Ok(sessions)
    }

    async fn session_views_for_mentor(&self, mentor_id: ObjectId) -> Result<Vec<SessionView>> {
        let mut sessions = self.sessions_for_mentor(mentor_id).await?;
        sessions.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));

        let client_ids: Vec<ObjectId> = sessions.iter().map(|s| s.client_id).collect();
        let cursor = self
            .users()
            .find(doc! { "_id": { "$in": client_ids } })
            .await?;
        let clients: Vec<User> = cursor.try_collect().await?;
        let clients: HashMap<ObjectId, User> = clients
            .into_iter()
            .filter_map(|user| user.id.map(|id| (id, user)))
            .collect();

        Ok(sessions
            .iter()
            .map(|session| SessionView::from_session(session, clients.get(&session.client_id)))
            .collect())
    }

    async fn find_eligible_session(
        &self,
        mentor_id: ObjectId,
        session_id: ObjectId,
    ) -> Result<Option<EligibleSession>> {
        let session = self
            .sessions()
            .find_one(doc! {
                "_id": session_id,
                "mentor_id": mentor_id,
                "status": SessionStatus::Completed.as_str(),
                "payment_status": PaymentStatus::Pending.as_str(),
            })
            .await?;

        let Some(session) = session else {
            return Ok(None);
        };

        let client = self.client_for_session(&session).await?;
        Ok(Some(EligibleSession {
            id: session_id,
            rate: session.rate,
            session_type: session.session_type,
            client_phone: client.and_then(|c| c.phone),
        }))
    }

    async fn touch_session_payment_pending(&self, session_id: ObjectId) -> Result<()> {
        self.sessions()
            .update_one(
                doc! { "_id": session_id },
                doc! { "$set": {
                    "payment_status": PaymentStatus::Pending.as_str(),
                    "updated_at": Utc::now().to_rfc3339(),
                } },
            )
            .await?;
        Ok(())
    }

    async fn requests_for_mentor(&self, mentor_id: ObjectId) -> Result<Vec<PaymentRequest>> {
        let cursor = self.requests().find(doc! { "mentor_id": mentor_id }).await?;
        let mut requests: Vec<PaymentRequest> = cursor.try_collect().await?;
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn insert_request_with_transaction(
        &self,
        request: PaymentRequest,
        transaction: Transaction,
    ) -> Result<()> {
        self.requests().insert_one(&request).await?;

        if let Err(e) = self.transactions().insert_one(&transaction).await {
            // A request without its transaction is unreconcilable; take the
            // request back out before reporting the failure.
            if let Some(request_id) = request.id {
                if let Err(cleanup) = self.requests().delete_one(doc! { "_id": request_id }).await
                {
                    warn!(
                        "Failed to clean up payment request {} after transaction insert failed: {}",
                        request_id, cleanup
                    );
                }
            }
            return Err(e.into());
        }

        Ok(())
    }

    async fn insert_transaction(&self, transaction: Transaction) -> Result<()> {
        self.transactions().insert_one(&transaction).await?;
        Ok(())
    }

    async fn find_transaction_by_reference(
        &self,
        momo_reference: &str,
    ) -> Result<Option<Transaction>> {
        self.transactions()
            .find_one(doc! { "momo_reference": momo_reference })
            .await
            .map_err(Into::into)
    }

    async fn find_transaction_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Transaction>> {
        self.transactions()
            .find_one(doc! { "external_id": external_id })
            .await
            .map_err(Into::into)
    }

    async fn reconcile_payment(
        &self,
        momo_reference: &str,
        outcome: PaymentResult,
    ) -> Result<bool> {
        let Some(transaction) = self.find_transaction_by_reference(momo_reference).await? else {
            return Ok(false);
        };

        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        match self.apply_outcome(&mut session, &transaction, outcome).await {
            Ok(()) => {
                session.commit_transaction().await?;
                Ok(true)
            }
            Err(e) => {
                if let Err(abort) = session.abort_transaction().await {
                    warn!("Failed to abort reconciliation transaction: {}", abort);
                }
                Err(e)
            }
        }
    }

    async fn active_services(&self) -> Result<Vec<AiService>> {
        let cursor = self.ai_services().find(doc! { "is_active": true }).await?;
        let services: Vec<AiService> = cursor.try_collect().await?;
        Ok(services)
    }

    async fn find_service(&self, service_id: ObjectId) -> Result<Option<AiService>> {
        self.ai_services()
            .find_one(doc! { "_id": service_id })
            .await
            .map_err(Into::into)
    }

    async fn services_for_user(&self, user_id: ObjectId) -> Result<Vec<UserService>> {
        let cursor = self.user_services().find(doc! { "user_id": user_id }).await?;
        let mut services: Vec<UserService> = cursor.try_collect().await?;
        services.sort_by(|a, b| b.activated_at.cmp(&a.activated_at));
        Ok(services)
    }
}
