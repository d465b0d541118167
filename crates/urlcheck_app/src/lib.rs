//! Shared plumbing for the `redirect_checker` and `notification_pusher`
//! binaries: config files, logger setup, signals and worker wiring.
mod platform;

pub use platform::config::{
    load_config, CheckerConfig, ConfigError, CounterConfig, DomainConfig, LogConfig,
    PusherConfig, QueueConfig,
};
pub use platform::logging::init_logging;
pub use platform::signals::{listen_for_shutdown, ExitSignal};
pub use platform::workers::{
    build_walker, pusher_settings, run_notification_pusher, run_redirect_checker,
    supervisor_settings,
};
