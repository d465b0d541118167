//! Process logger setup from the `log` section of a config file.

use log::LevelFilter;
use urlcheck_logging::{check_warn, initialize, parse_level, LogDestination};

use super::config::LogConfig;

/// Unknown level names fall back to `info`.
pub fn init_logging(config: &LogConfig) {
    let level = parse_level(&config.level);
    initialize(destination(config), level.unwrap_or(LevelFilter::Info));
    if level.is_none() {
        check_warn!("Unknown log level {:?}, using info", config.level);
    }
}

fn destination(config: &LogConfig) -> LogDestination {
    match (&config.file, config.terminal) {
        (Some(path), true) => LogDestination::Both(path.clone()),
        (Some(path), false) => LogDestination::File(path.clone()),
        (None, _) => LogDestination::Terminal,
    }
}
