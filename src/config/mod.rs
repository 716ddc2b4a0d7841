//! Configuration loading, types, and validation

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{
    BrowserConfig, Config, DatabaseConfig, DrainConfig, LightConfig, PacingConfig, ProxyConfig,
    QueueConfig, RetryConfig, SitesConfig, StorageConfig,
};
pub use validation::validate;
