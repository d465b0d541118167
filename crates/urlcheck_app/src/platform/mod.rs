pub mod config;
pub mod logging;
pub mod signals;
pub mod workers;
