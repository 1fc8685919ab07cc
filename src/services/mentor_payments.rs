// services/mentor_payments.rs
use std::sync::Arc;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::errors::{AppError, Result};
use crate::models::payment_request::{PaymentRequest, PaymentRequestView, RequestStatus};
use crate::models::session::{MentorshipSession, PaymentStatus, SessionStatus, SessionView};
use crate::models::transaction::{
    Transaction, TransactionKind, TransactionPurpose, TransactionStatus,
};
use crate::services::momo::{CollectionGateway, CollectionRequest, CollectionStatus};
use crate::store::{PaymentResult, PaymentStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsStats {
    pub total_earnings: Decimal,
    pub pending_payments: Decimal,
    pub completed_sessions: u32,
    pub monthly_growth: Decimal,
}

/// Caller-facing result of a payment initiation. Gateway rejections and
/// ineligible sessions land here as `success: false`, they are business
/// outcomes rather than errors.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub message: String,
}

impl PaymentOutcome {
    pub fn sent(transaction_id: String, message: impl Into<String>) -> Self {
        PaymentOutcome {
            success: true,
            transaction_id: Some(transaction_id),
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        PaymentOutcome {
            success: false,
            transaction_id: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatusReport {
    pub status: TransactionStatus,
    pub message: String,
}

/// Earnings reporting and mobile-money collection workflow for mentors,
/// plus the single reconciliation point for asynchronous payment
/// outcomes (webhook or status poll).
pub struct MentorPaymentService {
    store: Arc<dyn PaymentStore>,
    gateway: Option<Arc<dyn CollectionGateway>>,
    currency: String,
}

impl MentorPaymentService {
    pub fn new(
        store: Arc<dyn PaymentStore>,
        gateway: Option<Arc<dyn CollectionGateway>>,
        currency: String,
    ) -> Self {
        MentorPaymentService {
            store,
            gateway,
            currency,
        }
    }

    fn gateway(&self) -> Result<&Arc<dyn CollectionGateway>> {
        self.gateway.as_ref().ok_or_else(|| {
            AppError::ServiceUnavailable("Mobile money service is not available".to_string())
        })
    }

    pub async fn mentor_sessions(&self, mentor_id: ObjectId) -> Result<Vec<SessionView>> {
        self.store.session_views_for_mentor(mentor_id).await
    }

    pub async fn payment_requests(&self, mentor_id: ObjectId) -> Result<Vec<PaymentRequestView>> {
        let requests = self.store.requests_for_mentor(mentor_id).await?;
        Ok(requests.iter().map(PaymentRequestView::from).collect())
    }

    pub async fn earnings_stats(&self, mentor_id: ObjectId) -> Result<EarningsStats> {
        let sessions = self.store.sessions_for_mentor(mentor_id).await?;
        Ok(compute_earnings_stats(&sessions, Utc::now()))
    }

    pub async fn create_payment_request(
        &self,
        mentor_id: ObjectId,
        client_phone: String,
        amount: Decimal,
        description: String,
    ) -> Result<PaymentOutcome> {
        self.create_collection(mentor_id, client_phone, amount, description, None)
            .await
    }

    pub async fn request_session_payment(
        &self,
        mentor_id: ObjectId,
        session_id: ObjectId,
    ) -> Result<PaymentOutcome> {
        let Some(session) = self
            .store
            .find_eligible_session(mentor_id, session_id)
            .await?
        else {
            return Ok(PaymentOutcome::rejected(
                "Session not found or not eligible for payment",
            ));
        };

        let description = format!("Payment for {} session", session.session_type);
        let client_phone = session.client_phone.unwrap_or_default();

        let outcome = self
            .create_collection(
                mentor_id,
                client_phone,
                session.rate,
                description,
                Some(session.id),
            )
            .await?;

        if outcome.success {
            // The status was already pending; the write records that a
            // request is now in flight and stamps the update time.
            self.store.touch_session_payment_pending(session.id).await?;
        }

        Ok(outcome)
    }

    /// Shared collection flow behind both payment-request entry points.
    /// `session_id` carries the typed link reconciliation follows later.
    async fn create_collection(
        &self,
        mentor_id: ObjectId,
        client_phone: String,
        amount: Decimal,
        description: String,
        session_id: Option<ObjectId>,
    ) -> Result<PaymentOutcome> {
        if amount <= Decimal::ZERO {
            return Err(AppError::invalid_data("Amount must be greater than 0"));
        }
        if client_phone.trim().is_empty() {
            return Err(AppError::invalid_data("Client phone number is required"));
        }

        let gateway = self.gateway()?;

        let external_id = format!(
            "mentor_payment_{}_{}",
            mentor_id.to_hex(),
            Utc::now().timestamp_millis()
        );

        let collection = CollectionRequest::new(
            amount.to_string(),
            self.currency.clone(),
            external_id.clone(),
            &client_phone,
            "msisdn",
            description.clone(),
        );

        let reference = match gateway.request_to_pay(&collection).await {
            Ok(reference) => reference,
            Err(e) => {
                error!("MoMo collection request failed: {}", e);
                return Ok(PaymentOutcome::rejected(e.to_string()));
            }
        };

        let now = Utc::now();
        let request_id = ObjectId::new();
        let request = PaymentRequest {
            id: Some(request_id),
            mentor_id,
            client_phone: collection.payer.party_id.clone(),
            amount,
            description: description.clone(),
            status: RequestStatus::Sent,
            transaction_id: Some(reference.clone()),
            created_at: now,
            updated_at: now,
        };
        let transaction = Transaction {
            id: Some(ObjectId::new()),
            user_id: mentor_id,
            external_id,
            momo_reference: reference.clone(),
            kind: TransactionKind::Collection,
            purpose: TransactionPurpose::MentorPayment,
            amount,
            currency: self.currency.clone(),
            status: TransactionStatus::Pending,
            payer_phone: collection.payer.party_id.clone(),
            description,
            payment_request_id: Some(request_id),
            session_id,
            service_id: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self
            .store
            .insert_request_with_transaction(request, transaction)
            .await
        {
            error!("Failed to persist payment request {}: {}", reference, e);
            return Ok(PaymentOutcome::rejected("Failed to create payment request"));
        }

        info!(
            "Payment request {} sent for mentor {}",
            reference,
            mentor_id.to_hex()
        );
        Ok(PaymentOutcome::sent(
            reference,
            "Payment request sent successfully",
        ))
    }

    /// The single reconciliation point for asynchronous payment outcomes.
    /// Safe to invoke repeatedly for the same reference and outcome.
    pub async fn update_payment_status(
        &self,
        momo_reference: &str,
        outcome: PaymentResult,
    ) -> Result<bool> {
        let applied = self
            .store
            .reconcile_payment(momo_reference, outcome)
            .await?;
        if applied {
            info!("Payment {} reconciled as {:?}", momo_reference, outcome);
        } else {
            warn!(
                "Payment status update for unknown transaction {}",
                momo_reference
            );
        }
        Ok(applied)
    }

    /// Resolve an inbound gateway callback to a transaction reference and
    /// reconcile it. Callbacks for unknown transactions are logged and
    /// dropped; the webhook endpoint acknowledges regardless.
    pub async fn process_callback(
        &self,
        reference_id: Option<&str>,
        external_id: Option<&str>,
        status: CollectionStatus,
        reason: Option<&str>,
    ) -> Result<()> {
        let outcome = match status {
            CollectionStatus::Successful => PaymentResult::Paid,
            CollectionStatus::Failed => {
                if let Some(reason) = reason {
                    warn!("Gateway reported failed collection: {}", reason);
                }
                PaymentResult::Failed
            }
            CollectionStatus::Pending => {
                info!("Ignoring non-terminal gateway callback");
                return Ok(());
            }
        };

        let reference = match reference_id {
            Some(reference) => Some(reference.to_string()),
            None => match external_id {
                Some(external_id) => self
                    .store
                    .find_transaction_by_external_id(external_id)
                    .await?
                    .map(|transaction| transaction.momo_reference),
                None => None,
            },
        };

        let Some(reference) = reference else {
            warn!("Gateway callback carried no usable reference");
            return Ok(());
        };

        self.update_payment_status(&reference, outcome).await?;
        Ok(())
    }

    /// Current status of a collection, for the client-side polling loop.
    /// While the stored transaction is still pending, the provider is
    /// consulted directly so a missed webhook cannot strand a request.
    pub async fn check_payment_status(&self, momo_reference: &str) -> Result<PaymentStatusReport> {
        let Some(transaction) = self
            .store
            .find_transaction_by_reference(momo_reference)
            .await?
        else {
            return Err(AppError::DocumentNotFound);
        };

        let mut status = transaction.status;
        let mut failure_reason = None;

        if status == TransactionStatus::Pending {
            if let Some(gateway) = &self.gateway {
                match gateway.transaction_status(momo_reference).await {
                    Ok(report) => match report.status {
                        CollectionStatus::Successful => {
                            self.update_payment_status(momo_reference, PaymentResult::Paid)
                                .await?;
                            status = TransactionStatus::Completed;
                        }
                        CollectionStatus::Failed => {
                            self.update_payment_status(momo_reference, PaymentResult::Failed)
                                .await?;
                            status = TransactionStatus::Failed;
                            failure_reason = report.reason;
                        }
                        CollectionStatus::Pending => {}
                    },
                    Err(e) => {
                        // Fall back to the stored state; the next poll retries.
                        warn!("MoMo status lookup failed for {}: {}", momo_reference, e);
                    }
                }
            }
        }

        let message = match status {
            TransactionStatus::Pending => "Payment is awaiting approval".to_string(),
            TransactionStatus::Completed => "Payment completed successfully".to_string(),
            TransactionStatus::Failed => match failure_reason {
                Some(reason) => format!("Payment failed: {}", reason),
                None => "Payment failed".to_string(),
            },
        };

        Ok(PaymentStatusReport { status, message })
    }
}

/// First instant of the month `at` falls in.
fn month_start(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(at.year(), at.month(), 1, 0, 0, 0)
        .single()
        .expect("first of month is a valid UTC timestamp")
}

/// First instant of the month after the one `at` falls in.
fn next_month_start(at: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if at.month() == 12 {
        (at.year() + 1, 1)
    } else {
        (at.year(), at.month() + 1)
    };
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .expect("first of month is a valid UTC timestamp")
}

/// First instant of the month before the one `at` falls in.
fn previous_month_start(at: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if at.month() == 1 {
        (at.year() - 1, 12)
    } else {
        (at.year(), at.month() - 1)
    };
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .expect("first of month is a valid UTC timestamp")
}

/// Half-open range check: start inclusive, end exclusive. Month filters
/// must never compare timestamps for equality.
fn in_window(at: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    at >= start && at < end
}

pub fn compute_earnings_stats(
    sessions: &[MentorshipSession],
    now: DateTime<Utc>,
) -> EarningsStats {
    let current_start = month_start(now);
    let next_start = next_month_start(now);
    let previous_start = previous_month_start(now);

    let total_earnings: Decimal = sessions
        .iter()
        .filter(|session| session.payment_status == PaymentStatus::Paid)
        .map(|session| session.rate)
        .sum();

    let pending_payments: Decimal = sessions
        .iter()
        .filter(|session| {
            session.status == SessionStatus::Completed
                && session.payment_status == PaymentStatus::Pending
        })
        .map(|session| session.rate)
        .sum();

    let completed_sessions = sessions
        .iter()
        .filter(|session| {
            session.status == SessionStatus::Completed
                && in_window(session.scheduled_at, current_start, next_start)
        })
        .count() as u32;

    let current_month_paid: Decimal = sessions
        .iter()
        .filter(|session| {
            session.payment_status == PaymentStatus::Paid
                && in_window(session.scheduled_at, current_start, next_start)
        })
        .map(|session| session.rate)
        .sum();

    let previous_month_paid: Decimal = sessions
        .iter()
        .filter(|session| {
            session.payment_status == PaymentStatus::Paid
                && in_window(session.scheduled_at, previous_start, current_start)
        })
        .map(|session| session.rate)
        .sum();

    let monthly_growth = if previous_month_paid > Decimal::ZERO {
        ((current_month_paid - previous_month_paid) / previous_month_paid
            * Decimal::ONE_HUNDRED)
            .round_dp(2)
    } else {
        Decimal::ZERO
    };

    EarningsStats {
        total_earnings,
        pending_payments,
        completed_sessions,
        monthly_growth,
    }
}
