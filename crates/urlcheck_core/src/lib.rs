//! Urlcheck core: pure URL rewriting, page inspection and task shaping.
mod counters;
mod domains;
mod error;
mod history;
mod market;
mod meta;
mod normalize;
mod payload;

pub use counters::{get_counters, CounterRegistry, CounterSignature, BUILTIN_COUNTERS};
pub use domains::{DomainRules, SELF_TERMINAL_DOMAINS, TERMINAL_REDIRECT_DOMAINS};
pub use error::{PatternError, PayloadError};
pub use history::{RedirectHistory, RedirectType};
pub use market::{fix_market_url, MARKET_WEB_PREFIX};
pub use meta::check_for_meta;
pub use normalize::{join_url, normalize, normalize_url};
pub use payload::{CheckOutcome, CheckRequest, NotificationRequest, CHECK_TYPE_NORMAL};
