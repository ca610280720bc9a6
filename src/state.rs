use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::loaders::{
    LogisticsItemsLoader, PlanningLoader, PlanningRecord, TitleCatalogLoader,
};
use crate::catalog::{Catalog, CatalogHandle};
use crate::config::AppConfig;
use crate::services::notion::NotionClient;
use crate::services::supabase::SupabaseClient;
use crate::services::webhook::WebhookForwarder;

/// Everything the handlers share.
#[derive(Clone)]
pub struct AppState {
    pub supabase: SupabaseClient,
    pub webhooks: WebhookForwarder,
    pub catalogs: Arc<CatalogRegistry>,
}

impl AppState {
    /// Build the services and spawn one sync worker per configured catalog.
    /// Must run inside the tokio runtime.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::from_config(&config.supabase),
            webhooks: WebhookForwarder::new(config.webhooks.timeout_secs),
            catalogs: Arc::new(CatalogRegistry::from_config(config)),
        }
    }
}

/// The Notion-backed catalogs, each behind its own worker. A catalog missing
/// its credentials stays `None` and its endpoint answers 503.
pub struct CatalogRegistry {
    pub logistics_items: Option<CatalogHandle<String>>,
    pub planning: Option<CatalogHandle<PlanningRecord>>,
    pub design_accessories: Option<CatalogHandle<String>>,
    pub sales_clients: Option<CatalogHandle<String>>,
}

impl CatalogRegistry {
    pub fn from_config(config: &AppConfig) -> Self {
        let notion = NotionClient::new(&config.notion.version);
        let interval = Duration::from_secs(config.cache.refresh_interval_secs);

        let logistics_items = config.notion.logistics.clone().map(|source| {
            CatalogHandle::spawn(
                Catalog::new(
                    "logistics-items",
                    Duration::from_secs(config.cache.items_ttl_secs),
                    Arc::new(LogisticsItemsLoader::new(notion.clone(), source)),
                ),
                interval,
            )
        });

        let planning = config.notion.production.clone().map(|source| {
            CatalogHandle::spawn(
                Catalog::new(
                    "production-planning",
                    Duration::from_secs(config.cache.planning_ttl_secs),
                    Arc::new(PlanningLoader::new(notion.clone(), source)),
                ),
                interval,
            )
        });

        let design_accessories = config.notion.design.clone().map(|source| {
            CatalogHandle::spawn(
                Catalog::new(
                    "design-accessories",
                    Duration::from_secs(config.cache.titles_ttl_secs),
                    Arc::new(TitleCatalogLoader::new(notion.clone(), source)),
                ),
                interval,
            )
        });

        let sales_clients = config.notion.sales.clone().map(|source| {
            CatalogHandle::spawn(
                Catalog::new(
                    "sales-clients",
                    Duration::from_secs(config.cache.titles_ttl_secs),
                    Arc::new(TitleCatalogLoader::new(notion.clone(), source)),
                ),
                interval,
            )
        });

        Self {
            logistics_items,
            planning,
            design_accessories,
            sales_clients,
        }
    }

    /// Per-catalog readiness for the health endpoint. `null` means the
    /// catalog is not configured.
    pub fn readiness(&self) -> Value {
        fn entry<T: Clone + Send + Sync + serde::Serialize + 'static>(
            handle: &Option<CatalogHandle<T>>,
        ) -> Value {
            match handle {
                Some(h) => json!(h.is_ready()),
                None => Value::Null,
            }
        }

        json!({
            "logistics_items": entry(&self.logistics_items),
            "production_planning": entry(&self.planning),
            "design_accessories": entry(&self.design_accessories),
            "sales_clients": entry(&self.sales_clients),
        })
    }
}
