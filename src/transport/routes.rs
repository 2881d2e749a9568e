use crate::config::RouteConfig;

/// Rewrites a target URL into the URL actually requested.
pub trait RetrievalRoute: Send + Sync {
    fn rewrite(&self, url: &str) -> String;

    /// Name of this route for logging
    fn name(&self) -> &'static str;
}

/// Read-through rendering proxy that returns the page as markdown-ish text.
pub struct ReaderRoute {
    base: String,
}

impl ReaderRoute {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

impl RetrievalRoute for ReaderRoute {
    fn rewrite(&self, url: &str) -> String {
        format!("{}http://{}", self.base, strip_scheme(url))
    }

    fn name(&self) -> &'static str {
        "Reader"
    }
}

/// CORS relay that forwards the raw response.
pub struct RelayRoute {
    base: String,
}

impl RelayRoute {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

impl RetrievalRoute for RelayRoute {
    fn rewrite(&self, url: &str) -> String {
        format!("{}{url}", self.base)
    }

    fn name(&self) -> &'static str {
        "Relay"
    }
}

pub struct DirectRoute;

impl RetrievalRoute for DirectRoute {
    fn rewrite(&self, url: &str) -> String {
        url.to_string()
    }

    fn name(&self) -> &'static str {
        "Direct"
    }
}

fn strip_scheme(url: &str) -> &str {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    if lower.starts_with("https://") {
        &url[8..]
    } else if lower.starts_with("http://") {
        &url[7..]
    } else {
        url
    }
}

pub fn build_routes(configs: &[RouteConfig]) -> Vec<Box<dyn RetrievalRoute>> {
    configs
        .iter()
        .map(|config| -> Box<dyn RetrievalRoute> {
            match config {
                RouteConfig::Reader { base } => Box::new(ReaderRoute::new(base.clone())),
                RouteConfig::Relay { base } => Box::new(RelayRoute::new(base.clone())),
                RouteConfig::Direct => Box::new(DirectRoute),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_replaces_scheme() {
        let route = ReaderRoute::new("https://r.jina.ai/");
        assert_eq!(
            route.rewrite("https://www.woolandthegang.com/en/free-patterns"),
            "https://r.jina.ai/http://www.woolandthegang.com/en/free-patterns"
        );
        assert_eq!(
            route.rewrite("HTTP://example.com/a"),
            "https://r.jina.ai/http://example.com/a"
        );
        assert_eq!(route.rewrite("example.com"), "https://r.jina.ai/http://example.com");
    }

    #[test]
    fn test_relay_appends_full_url() {
        let route = RelayRoute::new("https://cors.isomorphic-git.org/");
        assert_eq!(
            route.rewrite("https://example.com/a?b=1"),
            "https://cors.isomorphic-git.org/https://example.com/a?b=1"
        );
    }

    #[test]
    fn test_build_routes_keeps_order() {
        let routes = build_routes(&[
            RouteConfig::Direct,
            RouteConfig::Relay {
                base: "https://relay/".into(),
            },
            RouteConfig::Reader {
                base: "https://reader/".into(),
            },
        ]);
        let names: Vec<_> = routes.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["Direct", "Relay", "Reader"]);
    }
}
