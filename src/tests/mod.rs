mod loader;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::catalog::{CatalogLoader, FallbackDataset, StatusSink};
use crate::config::Config;
use crate::errors::TransportError;
use crate::transport::{routes::DirectRoute, PageClient, Transport};

pub const LISTING_URL: &str = "https://www.woolandthegang.com/en/free-patterns";

/// Serves canned bodies and records every requested url.
#[derive(Default)]
pub struct MockClient {
    pages: HashMap<String, Result<String, TransportError>>,
    requests: Mutex<Vec<String>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), Ok(body.into()));
        self
    }

    pub fn with_error(mut self, url: &str, err: TransportError) -> Self {
        self.pages.insert(url.to_string(), Err(err));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageClient for MockClient {
    async fn get_text(&self, url: &str) -> Result<String, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .unwrap_or(Err(TransportError::Status(404)))
    }
}

/// Collects status messages.
#[derive(Default)]
pub struct Recorder(Mutex<Vec<String>>);

impl Recorder {
    pub fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl StatusSink for Recorder {
    fn status(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

/// Pads a body past the minimum payload length.
pub fn padded(body: &str) -> String {
    format!("{body}\n{}", "-".repeat(600))
}

pub fn product_url(slug: &str) -> String {
    format!("https://www.woolandthegang.com/en/products/{slug}")
}

/// Reader-style listing text linking to every slug.
pub fn listing(slugs: &[&str]) -> String {
    let links: Vec<String> = slugs
        .iter()
        .map(|slug| format!("* [{slug} | Wool and the Gang]({})", product_url(slug)))
        .collect();
    padded(&format!("# Free patterns\n\n{}", links.join("\n")))
}

/// Mock serving a listing and one detail page per slug.
pub fn live_site(slugs: &[&str]) -> MockClient {
    slugs.iter().fold(
        MockClient::new().with_page(LISTING_URL, listing(slugs)),
        |client, slug| {
            client.with_page(
                &product_url(slug),
                padded(&format!("{slug}: knit in chunky wool, aran weight, 200g")),
            )
        },
    )
}

/// Loader that requests urls directly through `client`.
pub fn loader_with(client: Arc<MockClient>, fallback: FallbackDataset) -> CatalogLoader {
    let transport = Transport::new(client, vec![Box::new(DirectRoute)], 500);
    CatalogLoader::new(transport, fallback, &Config::default())
}
