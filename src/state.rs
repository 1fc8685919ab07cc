use std::sync::Arc;

use mongodb::{Client, Database};

use crate::services::catalog::CatalogService;
use crate::services::mentor_payments::MentorPaymentService;
use crate::services::momo::{CollectionGateway, MomoClient};
use crate::store::mongo::MongoPaymentStore;
use crate::store::PaymentStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub payments: Arc<MentorPaymentService>,
    pub catalog: Arc<CatalogService>,
    pub momo: Option<Arc<MomoClient>>,
}

impl AppState {
    pub fn new(client: Client, db: Database, momo: Option<Arc<MomoClient>>) -> Self {
        let currency = momo
            .as_ref()
            .map(|client| client.currency().to_string())
            .unwrap_or_else(|| "ZAR".to_string());

        let store: Arc<dyn PaymentStore> =
            Arc::new(MongoPaymentStore::new(client, db.clone()));
        let gateway: Option<Arc<dyn CollectionGateway>> = momo
            .clone()
            .map(|client| client as Arc<dyn CollectionGateway>);

        AppState {
            db,
            payments: Arc::new(MentorPaymentService::new(
                store.clone(),
                gateway.clone(),
                currency.clone(),
            )),
            catalog: Arc::new(CatalogService::new(store, gateway, currency)),
            momo,
        }
    }
}
