pub mod config;
pub mod logging;
pub mod shutdown;

pub use config::{AppConfig, CliArgs, LoggingConfig, Section, ServerConfig};
