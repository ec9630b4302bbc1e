pub mod config;

pub use config::{GraphConfig, DEFAULT_MAX_STEPS};
