use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// How one hop of a chain led to the next URL.
///
/// A hop that leads nowhere has no type at all (`Option::None`), so there is
/// no explicit "none" variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RedirectType {
    /// `Location` response header.
    Http,
    /// `<meta http-equiv="refresh">` directive in the page body.
    Meta,
    /// The fetch failed; the chain ends here.
    Error,
}

impl RedirectType {
    pub fn as_str(self) -> &'static str {
        match self {
            RedirectType::Http => "HTTP",
            RedirectType::Meta => "META",
            RedirectType::Error => "ERROR",
        }
    }
}

impl fmt::Display for RedirectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered record of a resolved redirect chain.
///
/// Always holds one more URL than it holds types: `urls[0]` is the starting
/// point and every pushed hop adds a type together with the URL it led to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectHistory {
    types: Vec<RedirectType>,
    urls: Vec<String>,
    counters: BTreeSet<String>,
}

impl RedirectHistory {
    pub fn starting_at(url: impl Into<String>) -> Self {
        Self {
            types: Vec::new(),
            urls: vec![url.into()],
            counters: BTreeSet::new(),
        }
    }

    pub fn push(&mut self, redirect_type: RedirectType, url: impl Into<String>) {
        self.types.push(redirect_type);
        self.urls.push(url.into());
    }

    /// Records counters unless some were already recorded by an earlier hop.
    /// Returns whether the set was taken.
    pub fn record_counters(&mut self, counters: BTreeSet<String>) -> bool {
        if !self.counters.is_empty() {
            return false;
        }
        self.counters = counters;
        true
    }

    pub fn types(&self) -> &[RedirectType] {
        &self.types
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn counters(&self) -> &BTreeSet<String> {
        &self.counters
    }

    pub fn start_url(&self) -> &str {
        &self.urls[0]
    }

    pub fn last_url(&self) -> &str {
        self.urls.last().map(String::as_str).unwrap_or_default()
    }

    pub fn hops(&self) -> usize {
        self.types.len()
    }

    pub fn has_error(&self) -> bool {
        self.types.contains(&RedirectType::Error)
    }

    /// The `[types, urls, counters]` triple reported on the output tube.
    pub fn to_result_value(&self) -> Value {
        json!([self.types, self.urls, self.counters])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pushing_keeps_one_more_url_than_type() {
        let mut history = RedirectHistory::starting_at("http://a.example/");
        assert_eq!(history.urls().len(), history.types().len() + 1);
        history.push(RedirectType::Http, "http://b.example/");
        history.push(RedirectType::Meta, "http://c.example/");
        assert_eq!(history.urls().len(), history.types().len() + 1);
        assert_eq!(history.hops(), 2);
        assert_eq!(history.start_url(), "http://a.example/");
        assert_eq!(history.last_url(), "http://c.example/");
    }

    #[test]
    fn first_recorded_counters_win() {
        let mut history = RedirectHistory::starting_at("http://a.example/");
        assert!(history.record_counters(BTreeSet::new()));
        assert!(history.record_counters(["YA_METRICA".to_string()].into()));
        assert!(!history.record_counters(["VK_COUNTER".to_string()].into()));
        assert_eq!(
            history.counters().iter().collect::<Vec<_>>(),
            vec!["YA_METRICA"]
        );
    }

    #[test]
    fn result_value_uses_upper_case_type_names() {
        let mut history = RedirectHistory::starting_at("http://a.example/");
        history.push(RedirectType::Error, "http://a.example/");
        assert!(history.has_error());
        assert_eq!(
            history.to_result_value(),
            json!([["ERROR"], ["http://a.example/", "http://a.example/"], []])
        );
    }
}
