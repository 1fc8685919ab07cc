// services/catalog.rs
use std::sync::Arc;

use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use tracing::{error, info};

use crate::errors::{AppError, Result};
use crate::models::catalog::{AiServiceView, UserServiceView};
use crate::models::transaction::{
    Transaction, TransactionKind, TransactionPurpose, TransactionStatus,
};
use crate::services::mentor_payments::PaymentOutcome;
use crate::services::momo::{CollectionGateway, CollectionRequest};
use crate::store::PaymentStore;

/// Catalog of purchasable platform services and the checkout flow that
/// collects their price over mobile money. Activation is not done here:
/// it happens at reconciliation time, once the collection completes.
pub struct CatalogService {
    store: Arc<dyn PaymentStore>,
    gateway: Option<Arc<dyn CollectionGateway>>,
    currency: String,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn PaymentStore>,
        gateway: Option<Arc<dyn CollectionGateway>>,
        currency: String,
    ) -> Self {
        CatalogService {
            store,
            gateway,
            currency,
        }
    }

    pub async fn active_services(&self) -> Result<Vec<AiServiceView>> {
        let services = self.store.active_services().await?;
        Ok(services.iter().map(AiServiceView::from).collect())
    }

    pub async fn user_services(&self, user_id: ObjectId) -> Result<Vec<UserServiceView>> {
        let entries = self.store.services_for_user(user_id).await?;
        Ok(entries.iter().map(UserServiceView::from).collect())
    }

    pub async fn purchase(
        &self,
        user_id: ObjectId,
        service_id: ObjectId,
        phone_number: String,
    ) -> Result<PaymentOutcome> {
        if phone_number.trim().is_empty() {
            return Err(AppError::invalid_data("Phone number is required"));
        }

        let gateway = self.gateway.as_ref().ok_or_else(|| {
            AppError::ServiceUnavailable("Mobile money service is not available".to_string())
        })?;

        let Some(service) = self.store.find_service(service_id).await? else {
            return Ok(PaymentOutcome::rejected("Service not found"));
        };
        if !service.is_active {
            return Ok(PaymentOutcome::rejected("Service is not available"));
        }

        let external_id = format!(
            "service_purchase_{}_{}",
            user_id.to_hex(),
            Utc::now().timestamp_millis()
        );
        let description = format!("Purchase of {}", service.name);

        let collection = CollectionRequest::new(
            service.price.to_string(),
            self.currency.clone(),
            external_id.clone(),
            &phone_number,
            "msisdn",
            description.clone(),
        );

        let reference = match gateway.request_to_pay(&collection).await {
            Ok(reference) => reference,
            Err(e) => {
                error!("MoMo collection request for purchase failed: {}", e);
                return Ok(PaymentOutcome::rejected(e.to_string()));
            }
        };

        let now = Utc::now();
        let transaction = Transaction {
            id: Some(ObjectId::new()),
            user_id,
            external_id,
            momo_reference: reference.clone(),
            kind: TransactionKind::Collection,
            purpose: TransactionPurpose::ServicePurchase,
            amount: service.price,
            currency: self.currency.clone(),
            status: TransactionStatus::Pending,
            payer_phone: collection.payer.party_id.clone(),
            description,
            payment_request_id: None,
            session_id: None,
            service_id: Some(service_id),
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.store.insert_transaction(transaction).await {
            error!("Failed to persist purchase transaction {}: {}", reference, e);
            return Ok(PaymentOutcome::rejected("Failed to initiate purchase"));
        }

        info!(
            "Purchase of {} initiated by user {} ({})",
            service.name,
            user_id.to_hex(),
            reference
        );
        Ok(PaymentOutcome::sent(
            reference,
            "Payment initiated. Approve the prompt on your phone to activate the service.",
        ))
    }
}
