use std::sync::Arc;

use urlcheck_core::{check_for_meta, fix_market_url, normalize_url, DomainRules, RedirectType};
use urlcheck_logging::{check_trace, check_warn};

use crate::Fetcher;

/// Outcome of fetching and inspecting one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Where the chain continues. For a failed fetch this echoes the URL that
    /// failed.
    pub next_url: Option<String>,
    /// `None` means the chain ends cleanly at this hop.
    pub redirect_type: Option<RedirectType>,
    /// Decoded body, absent when the fetch failed.
    pub content: Option<String>,
}

impl Classification {
    fn failed(url: &str) -> Self {
        Self {
            next_url: Some(url.to_string()),
            redirect_type: Some(RedirectType::Error),
            content: None,
        }
    }

    fn settled(content: String) -> Self {
        Self {
            next_url: None,
            redirect_type: None,
            content: Some(content),
        }
    }

    fn redirect(redirect_type: RedirectType, target: &str, content: String) -> Self {
        Self {
            next_url: Some(normalize_url(&fix_market_url(target))),
            redirect_type: Some(redirect_type),
            content: Some(content),
        }
    }
}

/// Decides whether a page redirects, and how.
#[derive(Clone)]
pub struct RedirectClassifier {
    fetcher: Arc<dyn Fetcher>,
    domains: Arc<DomainRules>,
}

impl RedirectClassifier {
    pub fn new(fetcher: Arc<dyn Fetcher>, domains: Arc<DomainRules>) -> Self {
        Self { fetcher, domains }
    }

    pub fn domains(&self) -> &DomainRules {
        &self.domains
    }

    pub async fn classify(&self, url: &str) -> Classification {
        let output = match self.fetcher.fetch(url).await {
            Ok(output) => output,
            Err(err) => {
                check_warn!("Fetch failed url={} kind={} error={}", url, err.kind, err.message);
                return Classification::failed(url);
            }
        };

        if let Some(location) = output.location {
            if self.domains.is_terminal_redirect(&location) {
                check_trace!("Terminal tracker redirect url={} location={}", url, location);
                return Classification::settled(output.content);
            }
            return Classification::redirect(RedirectType::Http, &location, output.content);
        }

        match check_for_meta(&output.content, url) {
            Some(target) => Classification::redirect(RedirectType::Meta, &target, output.content),
            None => Classification::settled(output.content),
        }
    }
}
