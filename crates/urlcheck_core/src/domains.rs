use regex::{Regex, RegexBuilder};

use crate::PatternError;

/// Redirect targets that end a chain instead of being expanded.
pub const TERMINAL_REDIRECT_DOMAINS: &[&str] =
    &[r"^https?://(www\.)?odnoklassniki\.ru/.*st\.redirect"];

/// The service's own canonical domains; a chain starting here is never fetched.
pub const SELF_TERMINAL_DOMAINS: &[&str] = &[
    r"^https?://(www\.)?odnoklassniki\.ru/",
    r"^https?://my\.mail\.ru/apps/",
];

/// Case-insensitive URL patterns that stop chain resolution early.
#[derive(Debug, Clone)]
pub struct DomainRules {
    terminal_redirects: Vec<Regex>,
    self_terminal: Vec<Regex>,
}

impl DomainRules {
    pub fn new<S: AsRef<str>>(
        terminal_redirects: &[S],
        self_terminal: &[S],
    ) -> Result<Self, PatternError> {
        Ok(Self {
            terminal_redirects: compile_all("terminal_redirects", terminal_redirects)?,
            self_terminal: compile_all("self_terminal", self_terminal)?,
        })
    }

    /// Compile [`TERMINAL_REDIRECT_DOMAINS`] and [`SELF_TERMINAL_DOMAINS`].
    pub fn builtin() -> Result<Self, PatternError> {
        Self::new(TERMINAL_REDIRECT_DOMAINS, SELF_TERMINAL_DOMAINS)
    }

    /// Rules that match nothing.
    pub fn none() -> Self {
        Self {
            terminal_redirects: Vec::new(),
            self_terminal: Vec::new(),
        }
    }

    /// Whether a redirect target belongs to a tracker whose own redirects are
    /// not worth expanding.
    pub fn is_terminal_redirect(&self, url: &str) -> bool {
        self.terminal_redirects.iter().any(|re| re.is_match(url))
    }

    /// Whether a starting URL is one of the service's own canonical endpoints.
    pub fn is_self_terminal(&self, url: &str) -> bool {
        self.self_terminal.iter().any(|re| re.is_match(url))
    }
}

fn compile_all<S: AsRef<str>>(name: &str, patterns: &[S]) -> Result<Vec<Regex>, PatternError> {
    patterns
        .iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| PatternError {
                    name: name.to_string(),
                    pattern: pattern.to_string(),
                    source,
                })
        })
        .collect()
}
