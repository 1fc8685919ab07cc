use mongodb::{Client, Database};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::Result;

pub async fn get_db_client(config: &AppConfig) -> Result<(Client, Database)> {
    let client = Client::with_uri_str(&config.database_url).await?;
    let db = client.database(&config.database_name);

    // Verify the database is reachable by listing collections
    match db.list_collection_names().await {
        Ok(collections) => {
            info!("✅ Connected to database: {}", config.database_name);
            info!("📂 Collections found: {:?}", collections);
        }
        Err(e) => {
            warn!(
                "Database '{}' may not exist or is inaccessible: {}",
                config.database_name, e
            );
        }
    }

    Ok((client, db))
}
