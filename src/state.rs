use std::sync::Arc;

use anyhow::Context;
use mongodb::{bson::doc, Client, Collection, Database};
use tracing::{error, info};

use crate::{config::AppConfig, errors::ApiError, users::repo::User};

/// Shared application state. The store handle is established once at
/// startup and never mutated afterward; `None` means the connection
/// attempt failed and every store-touching route answers 503.
#[derive(Clone)]
pub struct AppState {
    db: Option<Database>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Build state from the environment and attempt the one startup
    /// connection. A store that is down is not fatal: the process serves
    /// degraded until restarted.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = match connect(&config).await {
            Ok(db) => {
                info!(db = %config.mongo_db, "connected to document store");
                Some(db)
            }
            Err(e) => {
                error!(error = %e, "document store connection failed");
                None
            }
        };
        Ok(Self { db, config })
    }

    pub fn from_parts(db: Option<Database>, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// The users collection, or `StoreUnavailable` when the startup
    /// connection never came up.
    pub fn users(&self) -> Result<Collection<User>, ApiError> {
        self.db
            .as_ref()
            .map(|db| db.collection("users"))
            .ok_or(ApiError::StoreUnavailable)
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<Database> {
    let client = Client::with_uri_str(&config.mongo_uri)
        .await
        .context("parse document store URI")?;
    let db = client.database(&config.mongo_db);
    // The driver connects lazily; ping so readiness is known up front.
    db.run_command(doc! { "ping": 1 })
        .await
        .context("ping document store")?;
    Ok(db)
}
