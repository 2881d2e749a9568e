/// A single route attempt that did not produce a body.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("could not read body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::Status(status.as_u16());
        }
        if err.is_body() || err.is_decode() {
            return Self::Body(err.to_string());
        }
        Self::Request(err.to_string())
    }
}

/// Every retrieval route failed or returned an undersized payload.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("unable to fetch {url}")]
pub struct FetchExhausted {
    pub url: String,
}

/// Why a single candidate page could not be turned into a record.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExtractionFailure {
    #[error(transparent)]
    Fetch(#[from] FetchExhausted),

    #[error("page has no readable text")]
    EmptyPage,
}

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    FetchExhausted(#[from] FetchExhausted),

    #[error("live source returned too few patterns ({found} of {required} required)")]
    LiveCatalogInsufficient { found: usize, required: usize },

    #[error("could not load fallback dataset: {0}")]
    FallbackUnavailable(String),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be greater than 0")]
    Zero { field: &'static str },

    #[error("at least one retrieval route is required")]
    NoRoutes,

    #[error("grams_to_meters must be a positive finite number, got {0}")]
    BadRatio(f64),

    #[error("invalid url for {field}: {value}")]
    BadUrl { field: &'static str, value: String },
}
