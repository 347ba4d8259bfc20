use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use stockroom_infra::{
    CatalogConfig, CatalogService,
    catalog_store::{CatalogStore, InMemoryCatalogStore, PostgresCatalogStore},
    external::{HttpClassifier, HttpSimilaritySearch},
};

/// Everything request handlers need, shared through an `Extension`.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: CatalogService,
}

impl AppServices {
    pub fn new(catalog: CatalogService) -> Self {
        Self { catalog }
    }
}

/// Wire the store and the external service clients from config.
///
/// Uses Postgres when `database_url` is set (creating the table if needed),
/// otherwise an in-memory store.
pub async fn build_services(config: &CatalogConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn CatalogStore> = match &config.database_url {
        Some(url) => {
            let store = PostgresCatalogStore::connect(url, config.database_max_connections)
                .await
                .context("failed to connect to DATABASE_URL")?;
            store.migrate().await.context("failed to migrate products table")?;
            info!("using postgres catalog store");
            Arc::new(store)
        }
        None => {
            info!("DATABASE_URL not set; using in-memory catalog store");
            Arc::new(InMemoryCatalogStore::new())
        }
    };

    let classifier = HttpClassifier::new(&config.classifier.base_url, config.classifier.timeout)
        .context("failed to build classifier client")?;
    let similarity = HttpSimilaritySearch::new(&config.similarity.base_url, config.similarity.timeout)
        .context("failed to build similarity client")?;

    Ok(AppServices::new(CatalogService::new(
        store,
        Arc::new(classifier),
        Arc::new(similarity),
    )))
}
