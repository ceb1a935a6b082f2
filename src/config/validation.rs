use crate::callsign::normalize_callsign;
use crate::config::types::{Config, CrawlerConfig, NodeConfig, OutputConfig, TimeoutConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_node_config(&config.node)?;
    validate_crawler_config(&config.crawler)?;
    validate_timeout_config(&config.timeouts)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates local node connection settings
fn validate_node_config(config: &NodeConfig) -> Result<(), ConfigError> {
    if config.host.trim().is_empty() {
        return Err(ConfigError::Validation("node host cannot be empty".to_string()));
    }

    if config.port == 0 {
        return Err(ConfigError::Validation("node port must be > 0".to_string()));
    }

    // The local node is addressed by CALL-SSID on the air
    let callsign = normalize_callsign(&config.callsign)?;
    if !callsign.has_ssid() {
        return Err(ConfigError::Validation(format!(
            "node callsign must include an SSID, got '{}'",
            config.callsign
        )));
    }

    if config.username.is_empty() {
        return Err(ConfigError::Validation(
            "node username cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_hops < 1 {
        return Err(ConfigError::Validation(format!(
            "max_hops must be >= 1, got {}",
            config.max_hops
        )));
    }

    if config.heard_stale_after == 0 {
        return Err(ConfigError::Validation(
            "heard_stale_after must be > 0".to_string(),
        ));
    }

    if let Some(start) = &config.start {
        normalize_callsign(start)?;
    }

    Ok(())
}

/// Validates transport timing
fn validate_timeout_config(config: &TimeoutConfig) -> Result<(), ConfigError> {
    if config.connect_base == 0 {
        return Err(ConfigError::Validation(
            "connect_base must be > 0".to_string(),
        ));
    }

    if config.connect_ceiling < config.connect_base {
        return Err(ConfigError::Validation(format!(
            "connect_ceiling ({}ms) must be >= connect_base ({}ms)",
            config.connect_ceiling, config.connect_base
        )));
    }

    if config.poll_interval == 0 || config.poll_interval >= config.connect_base {
        return Err(ConfigError::Validation(format!(
            "poll_interval must be between 1ms and connect_base, got {}ms",
            config.poll_interval
        )));
    }

    if config.stable_polls < 1 {
        return Err(ConfigError::Validation(
            "stable_polls must be >= 1".to_string(),
        ));
    }

    if config.command == 0 || config.visit_base == 0 {
        return Err(ConfigError::Validation(
            "command and visit_base timeouts must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.topology_path.is_empty() {
        return Err(ConfigError::Validation(
            "topology_path cannot be empty".to_string(),
        ));
    }

    if config.connections_csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "connections_csv_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
