use std::sync::Arc;

use urlcheck_core::{normalize, CounterRegistry, RedirectHistory, RedirectType};
use urlcheck_logging::{check_debug, check_info};

use crate::{Classification, RedirectClassifier};

pub const DEFAULT_MAX_HOPS: usize = 30;

/// Follows a redirect chain hop by hop, recording every transition.
#[derive(Clone)]
pub struct HistoryWalker {
    classifier: RedirectClassifier,
    counters: Arc<CounterRegistry>,
    max_hops: usize,
}

impl HistoryWalker {
    pub fn new(
        classifier: RedirectClassifier,
        counters: Arc<CounterRegistry>,
        max_hops: usize,
    ) -> Self {
        Self {
            classifier,
            counters,
            max_hops,
        }
    }

    pub fn max_hops(&self) -> usize {
        self.max_hops
    }

    /// Resolve the chain starting at `start_url`.
    ///
    /// Stops when a hop does not redirect, when a fetch fails (recorded as a
    /// final `ERROR` hop), or after `max_hops` transitions. Blank input and
    /// the service's own domains are returned without fetching anything.
    pub async fn walk(&self, start_url: &str) -> RedirectHistory {
        let Some(url) = normalize(Some(start_url)) else {
            return RedirectHistory::starting_at(start_url);
        };

        let mut history = RedirectHistory::starting_at(url.as_str());
        if self.classifier.domains().is_self_terminal(&url) {
            check_debug!("Self-terminal url={}, not fetching", url);
            return history;
        }

        let mut current = url;
        for _ in 0..self.max_hops {
            let Classification {
                next_url,
                redirect_type,
                content,
            } = self.classifier.classify(&current).await;

            if let Some(content) = content.filter(|content| !content.is_empty()) {
                history.record_counters(self.counters.get_counters(&content));
            }

            let Some(redirect_type) = redirect_type else {
                break;
            };
            let next = next_url.unwrap_or_else(|| current.clone());
            check_debug!("Hop {} {} -> {}", redirect_type, current, next);
            history.push(redirect_type, next.as_str());
            if redirect_type == RedirectType::Error {
                break;
            }
            current = next;
        }

        check_info!(
            "Resolved url={} hops={} final={} counters={:?}",
            history.start_url(),
            history.hops(),
            history.last_url(),
            history.counters()
        );
        history
    }
}
