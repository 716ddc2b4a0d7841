use crate::config::types::{Config, DrainConfig, LightConfig, PacingConfig, RetryConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.queue.url.is_empty() {
        return Err(ConfigError::Validation(
            "queue.url cannot be empty".to_string(),
        ));
    }
    validate_light(&config.light)?;
    validate_retry(&config.retry)?;
    validate_pacing(&config.pacing)?;
    validate_drain(&config.drain)?;
    Ok(())
}

fn validate_light(config: &LightConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "light.batch-size must be >= 1, got {}",
            config.batch_size
        )));
    }
    if config.idle_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "light.idle-timeout-secs must be >= 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_retry(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.base_wait_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "retry.base-wait-secs must be >= 1, got {}",
            config.base_wait_secs
        )));
    }
    Ok(())
}

fn validate_pacing(config: &PacingConfig) -> Result<(), ConfigError> {
    if config.pause_every < 1 {
        return Err(ConfigError::Validation(
            "pacing.pause-every must be >= 1".to_string(),
        ));
    }
    if config.max_urls_before_restart < 1 {
        return Err(ConfigError::Validation(
            "pacing.max-urls-before-restart must be >= 1".to_string(),
        ));
    }
    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "pacing.min-delay-ms ({}) must not exceed pacing.max-delay-ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }
    Ok(())
}

fn validate_drain(config: &DrainConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(
            "drain.batch-size must be >= 1".to_string(),
        ));
    }
    if config.check_interval_secs < 1 {
        return Err(ConfigError::Validation(
            "drain.check-interval-secs must be >= 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::QueueConfig;

    fn base_config() -> Config {
        Config {
            queue: QueueConfig {
                url: "redis://127.0.0.1:6379".to_string(),
                frontier_key: "forager:frontier".to_string(),
                results_key: "forager:results".to_string(),
                metadata_key: "forager:metadata".to_string(),
            },
            database: Default::default(),
            storage: Default::default(),
            sites: Default::default(),
            light: Default::default(),
            retry: Default::default(),
            browser: Default::default(),
            pacing: Default::default(),
            drain: Default::default(),
            proxy: None,
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn empty_queue_url_rejected() {
        let mut config = base_config();
        config.queue.url = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn zero_batch_size_rejected() {
        let mut config = base_config();
        config.light.batch_size = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn inverted_delay_bounds_rejected() {
        let mut config = base_config();
        config.pacing.min_delay_ms = 500;
        config.pacing.max_delay_ms = 100;
        assert!(validate(&config).is_err());
    }
}
