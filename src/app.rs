use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::catalog::{CatalogLoader, CatalogStore, FallbackDataset, LoadOptions, Provenance, StatusSink};
use crate::config::Config;
use crate::errors::CatalogError;
use crate::matcher::{Constraints, Matcher, ScoredPattern};
use crate::transport::Transport;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: String,
    pub provenance: Option<Provenance>,
    pub count: usize,
    pub loaded_at: Option<DateTime<Local>>,
}

/// Owns the catalog store and drives loads, refreshes and matching.
pub struct App {
    loader: CatalogLoader,
    matcher: Matcher,
    store: RwLock<CatalogStore>,
}

/// Publishes loader phases to the store's status line.
struct StoreStatus<'a>(&'a RwLock<CatalogStore>);

impl StatusSink for StoreStatus<'_> {
    fn status(&self, message: &str) {
        log::info!("{message}");
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_status(message);
    }
}

impl App {
    pub fn new(loader: CatalogLoader, matcher: Matcher) -> Self {
        Self {
            loader,
            matcher,
            store: RwLock::new(CatalogStore::new()),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let transport = Transport::from_config(config)?;
        let loader = CatalogLoader::new(transport, FallbackDataset::from_config(config), config);
        Ok(Self::new(loader, Matcher::from_config(config)))
    }

    fn store(&self) -> RwLockReadGuard<'_, CatalogStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn store_mut(&self) -> RwLockWriteGuard<'_, CatalogStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, message: &str) {
        log::info!("{message}");
        self.store_mut().set_status(message);
    }

    pub fn loader(&self) -> &CatalogLoader {
        &self.loader
    }

    /// Loads a catalog and swaps it in. On error the current catalog stays.
    pub async fn load(&self, opts: LoadOptions) -> Result<usize, CatalogError> {
        let catalog = self.loader.load(opts, &StoreStatus(&self.store)).await?;

        if catalog.is_empty() {
            log::warn!("{} catalog has no patterns", catalog.provenance);
        }

        let count = catalog.len();
        let message = match catalog.provenance {
            Provenance::Live => format!("Loaded {count} patterns from live source."),
            Provenance::Fallback => format!("Loaded {count} patterns from local dataset."),
        };

        let mut store = self.store_mut();
        store.replace(catalog);
        store.set_status(&message);
        log::info!("{}", store.status());

        Ok(count)
    }

    /// First load of the session.
    pub async fn init(&self, prefer_live: bool) -> Result<usize, CatalogError> {
        let opts = LoadOptions {
            prefer_live,
            force_live: false,
        };
        self.load(opts).await.inspect_err(|err| {
            self.set_status(&format!("Startup error: {err}"));
        })
    }

    /// Forced live reload.
    pub async fn refresh(&self) -> Result<usize, CatalogError> {
        let opts = LoadOptions {
            prefer_live: true,
            force_live: true,
        };
        match self.load(opts).await {
            Ok(count) => {
                self.set_status(&format!("Live catalog refreshed ({count} patterns)."));
                Ok(count)
            }
            Err(err) => {
                self.set_status(&format!("Refresh failed: {err}"));
                Err(err)
            }
        }
    }

    pub fn rank(&self, constraints: &Constraints) -> Vec<ScoredPattern> {
        self.matcher.rank(self.store().records(), constraints)
    }

    pub fn yarn_types(&self) -> Vec<String> {
        self.store().yarn_types().to_vec()
    }

    pub fn status(&self) -> StatusReport {
        let store = self.store();
        StatusReport {
            status: store.status().to_string(),
            provenance: store.provenance(),
            count: store.records().len(),
            loaded_at: store.catalog().map(|catalog| catalog.loaded_at),
        }
    }
}
