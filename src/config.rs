use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

const CONFIG_FILE: &str = "config.yaml";

const DEFAULT_LISTING_URL: &str = "https://www.woolandthegang.com/en/free-patterns";
const DEFAULT_PRODUCT_PREFIX: &str = "www.woolandthegang.com/en/products/";
const DEFAULT_SITE_NAME: &str = "Wool and the Gang";

/// Payloads shorter than this are treated as stub or error pages.
const MIN_PAYLOAD_LEN: usize = 500;
/// Bounds the number of detail pages fetched per live load.
const CANDIDATE_CAP: usize = 24;
const MIN_LIVE_RECORDS: usize = 5;
const MAX_RESULTS: usize = 30;
/// Rough wool average: 100g ~= 120m.
const GRAMS_TO_METERS: f64 = 1.2;
const REQUEST_TIMEOUT_SECS: u64 = 20;

/// One way of reaching a remote page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RouteConfig {
    /// Read-through rendering proxy; the scheme of the target is replaced by `http://`.
    Reader { base: String },
    /// CORS relay; the full target URL is appended.
    Relay { base: String },
    /// Plain request to the target.
    Direct,
}

fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::Reader {
            base: "https://r.jina.ai/".to_string(),
        },
        RouteConfig::Relay {
            base: "https://cors.isomorphic-git.org/".to_string(),
        },
    ]
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    /// Product URL prefix without scheme; links must point below it.
    #[serde(default = "default_product_prefix")]
    pub product_prefix: String,

    /// Suffix stripped from titles ("Hat | Wool and the Gang").
    #[serde(default = "default_site_name")]
    pub site_name: String,

    #[serde(default = "default_routes")]
    pub routes: Vec<RouteConfig>,

    #[serde(default = "min_payload_len")]
    pub min_payload_len: usize,

    #[serde(default = "candidate_cap")]
    pub candidate_cap: usize,

    #[serde(default = "min_live_records")]
    pub min_live_records: usize,

    #[serde(default = "max_results")]
    pub max_results: usize,

    #[serde(default = "grams_to_meters")]
    pub grams_to_meters: f64,

    #[serde(default = "request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Replaces the bundled dataset when set.
    #[serde(default)]
    pub fallback_dataset: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            product_prefix: default_product_prefix(),
            site_name: default_site_name(),
            routes: default_routes(),
            min_payload_len: MIN_PAYLOAD_LEN,
            candidate_cap: CANDIDATE_CAP,
            min_live_records: MIN_LIVE_RECORDS,
            max_results: MAX_RESULTS,
            grams_to_meters: GRAMS_TO_METERS,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            fallback_dataset: None,
        }
    }
}

fn default_listing_url() -> String {
    DEFAULT_LISTING_URL.to_string()
}

fn default_product_prefix() -> String {
    DEFAULT_PRODUCT_PREFIX.to_string()
}

fn default_site_name() -> String {
    DEFAULT_SITE_NAME.to_string()
}

fn min_payload_len() -> usize {
    MIN_PAYLOAD_LEN
}

fn candidate_cap() -> usize {
    CANDIDATE_CAP
}

fn min_live_records() -> usize {
    MIN_LIVE_RECORDS
}

fn max_results() -> usize {
    MAX_RESULTS
}

fn grams_to_meters() -> f64 {
    GRAMS_TO_METERS
}

fn request_timeout_secs() -> u64 {
    REQUEST_TIMEOUT_SECS
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if url::Url::parse(&self.listing_url).is_err() {
            return Err(ConfigError::BadUrl {
                field: "listing_url",
                value: self.listing_url.clone(),
            });
        }

        for (field, value) in [
            ("candidate_cap", self.candidate_cap),
            ("min_live_records", self.min_live_records),
            ("max_results", self.max_results),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Zero {
                field: "request_timeout_secs",
            });
        }

        if self.routes.is_empty() {
            return Err(ConfigError::NoRoutes);
        }

        for route in &self.routes {
            let base = match route {
                RouteConfig::Reader { base } | RouteConfig::Relay { base } => base,
                RouteConfig::Direct => continue,
            };
            if url::Url::parse(base).is_err() {
                return Err(ConfigError::BadUrl {
                    field: "routes",
                    value: base.clone(),
                });
            }
        }

        if !self.grams_to_meters.is_finite() || self.grams_to_meters <= 0.0 {
            return Err(ConfigError::BadRatio(self.grams_to_meters));
        }

        Ok(())
    }

    /// Loads `config.yaml` from `base_path`, writing the defaults first if it does not exist.
    pub fn load_with(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref();
        let path = base_path.join(CONFIG_FILE);

        if !path.exists() {
            std::fs::create_dir_all(base_path)
                .with_context(|| format!("failed to create {}", base_path.display()))?;
            Self::default().save_to(&path)?;
        }

        let config_str = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = serde_yml::from_str(&config_str).context("config is malformed")?;

        config.validate()?;

        Ok(config)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        let config_str = serde_yml::to_string(self)?;
        let temp_path = path.with_extension("yaml.tmp");
        std::fs::write(&temp_path, config_str)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }
}

/// Base directory for `config.yaml`: `YARNMATCH_BASE_PATH` or `~/.local/share/yarnmatch`.
pub fn base_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("YARNMATCH_BASE_PATH") {
        return Ok(PathBuf::from(path));
    }

    let home = homedir::my_home()
        .context("could not determine home directory")?
        .context("home directory path is empty")?;
    Ok(home.join(".local/share/yarnmatch"))
}
