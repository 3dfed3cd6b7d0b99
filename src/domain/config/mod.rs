//! Configuration domain module

mod app_config;

pub use app_config::{AppConfig, ToolsConfig, DEFAULT_CANCEL_GRACE_SECS, DEFAULT_ENCODE_WORKERS};
