use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::{CatalogError, ExtractionFailure};
use crate::extract::{degrade, DetailExtractor, LinkExtractor};
use crate::patterns::{dedupe_by_url, PatternLink, PatternRecord};
use crate::transport::Transport;

const BUNDLED_DATASET: &str = include_str!("../data/patterns.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Live,
    Fallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Live => f.write_str("live"),
            Provenance::Fallback => f.write_str("fallback"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub records: Vec<PatternRecord>,
    pub provenance: Provenance,
    pub loaded_at: DateTime<Local>,
}

impl Catalog {
    pub fn new(records: Vec<PatternRecord>, provenance: Provenance) -> Self {
        Self {
            records: dedupe_by_url(records),
            provenance,
            loaded_at: Local::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct non-empty yarn types, sorted, for input suggestions.
    pub fn yarn_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .records
            .iter()
            .map(|record| record.yarn_type.trim().to_string())
            .filter(|yarn_type| !yarn_type.is_empty())
            .collect();
        types.sort();
        types.dedup();
        types
    }
}

/// Process-wide catalog state. The catalog is only ever replaced as a whole.
#[derive(Debug, Default)]
pub struct CatalogStore {
    catalog: Option<Catalog>,
    yarn_types: Vec<String>,
    status: String,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, catalog: Catalog) {
        self.yarn_types = catalog.yarn_types();
        self.catalog = Some(catalog);
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    pub fn records(&self) -> &[PatternRecord] {
        self.catalog
            .as_ref()
            .map(|catalog| catalog.records.as_slice())
            .unwrap_or_default()
    }

    pub fn provenance(&self) -> Option<Provenance> {
        self.catalog.as_ref().map(|catalog| catalog.provenance)
    }

    pub fn yarn_types(&self) -> &[String] {
        &self.yarn_types
    }

    /// Sets the status line, tagged with the provenance of the current catalog.
    pub fn set_status(&mut self, message: &str) {
        self.status = match self.provenance() {
            Some(provenance) => format!("{message} ({provenance})"),
            None => message.to_string(),
        };
    }

    pub fn status(&self) -> &str {
        &self.status
    }
}

/// Receives phase messages while a catalog loads.
pub trait StatusSink: Send + Sync {
    fn status(&self, message: &str);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub prefer_live: bool,
    /// Fail instead of falling back when the live catalog is unusable.
    pub force_live: bool,
}

/// Local dataset used when live retrieval is not good enough.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackDataset {
    Bundled,
    File(PathBuf),
}

impl FallbackDataset {
    pub fn from_config(config: &Config) -> Self {
        match &config.fallback_dataset {
            Some(path) => FallbackDataset::File(path.clone()),
            None => FallbackDataset::Bundled,
        }
    }

    pub async fn load(&self) -> Result<Vec<PatternRecord>, CatalogError> {
        let json = match self {
            FallbackDataset::Bundled => BUNDLED_DATASET.to_string(),
            FallbackDataset::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|err| {
                    CatalogError::FallbackUnavailable(format!("{}: {err}", path.display()))
                })?,
        };

        serde_json::from_str(&json)
            .map_err(|err| CatalogError::FallbackUnavailable(format!("malformed dataset: {err}")))
    }
}

/// Builds catalogs from the live site or the fallback dataset.
pub struct CatalogLoader {
    transport: Transport,
    links: LinkExtractor,
    details: DetailExtractor,
    fallback: FallbackDataset,
    listing_url: String,
    candidate_cap: usize,
    min_live_records: usize,
}

impl CatalogLoader {
    pub fn new(transport: Transport, fallback: FallbackDataset, config: &Config) -> Self {
        Self {
            transport,
            links: LinkExtractor::from_config(config),
            details: DetailExtractor::new(),
            fallback,
            listing_url: config.listing_url.clone(),
            candidate_cap: config.candidate_cap,
            min_live_records: config.min_live_records,
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn link_extractor(&self) -> &LinkExtractor {
        &self.links
    }

    pub async fn load(
        &self,
        opts: LoadOptions,
        status: &dyn StatusSink,
    ) -> Result<Catalog, CatalogError> {
        if opts.prefer_live {
            status.status("Loading live pattern catalog...");

            match self.load_live().await {
                Ok(records) if records.len() >= self.min_live_records => {
                    return Ok(Catalog::new(records, Provenance::Live));
                }
                Ok(records) => {
                    let err = CatalogError::LiveCatalogInsufficient {
                        found: records.len(),
                        required: self.min_live_records,
                    };
                    if opts.force_live {
                        return Err(err);
                    }
                    log::warn!("{err}, using fallback");
                }
                Err(err) => {
                    if opts.force_live {
                        return Err(err.into());
                    }
                    log::warn!("live catalog unavailable: {err}, using fallback");
                }
            }
        }

        status.status("Loading fallback catalog...");
        let records = self.fallback.load().await?;
        Ok(Catalog::new(records, Provenance::Fallback))
    }

    /// Fetches the listing and every capped candidate. Candidate failures are
    /// degraded to placeholders, so only the listing fetch can fail.
    pub async fn load_live(&self) -> Result<Vec<PatternRecord>, crate::errors::FetchExhausted> {
        let listing = self.transport.fetch_text(&self.listing_url).await?;
        let links = self.links.extract(&listing);

        log::info!(
            "found {} pattern links, fetching up to {}",
            links.len(),
            self.candidate_cap
        );

        let candidates = links.into_iter().take(self.candidate_cap);
        let records = join_all(candidates.map(|link| async move {
            let result = self.extract_candidate(&link).await;
            degrade(result, &link)
        }))
        .await;

        Ok(dedupe_by_url(records))
    }

    pub async fn extract_candidate(
        &self,
        link: &PatternLink,
    ) -> Result<PatternRecord, ExtractionFailure> {
        let text = self.transport.fetch_text(&link.url).await?;
        self.details.extract(&text, link)
    }
}
