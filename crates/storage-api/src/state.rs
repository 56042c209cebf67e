//! Application state

use crate::config::{GatewayConfig, StoreBackend};
use crate::filter::FileFilter;
use anyhow::Context;
use std::sync::Arc;
use storage_api_store::{MemoryObjectStore, ObjectStore, S3ObjectStore};
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Object store backend
    pub store: Arc<dyn ObjectStore>,
    /// Compiled listing filters
    pub filter: FileFilter,
}

impl AppState {
    /// Create the state, connecting the configured backend
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn ObjectStore> = match &config.store {
            StoreBackend::Memory { bucket } => {
                warn!("⚠ Storage mode: In-memory (NOT persistent - for development only)");
                Arc::new(MemoryObjectStore::new(bucket.clone()))
            }
            StoreBackend::S3(s3) => {
                let store = S3ObjectStore::new(s3).context("Error loading object store config")?;
                info!(
                    "✓ Storage mode: S3 bucket {} at {}",
                    store.bucket(),
                    s3.endpoint_url()
                );
                Arc::new(store)
            }
        };

        Self::with_store(config, store)
    }

    /// Create the state around an existing store
    pub fn with_store(config: GatewayConfig, store: Arc<dyn ObjectStore>) -> anyhow::Result<Self> {
        let filter = FileFilter::new(&config.exclude_folders, &config.exclude_files)
            .context("Invalid EXCLUDE_FOLDER or EXCLUDE_FILE pattern")?;

        if config.bypass_whitelist.is_some() {
            warn!("IP allowlist bypass secret is configured");
        }
        if config.trust_proxy {
            info!("Client IPs are taken from X-Forwarded-For / X-Real-IP");
        }

        Ok(Self {
            config,
            store,
            filter,
        })
    }
}
