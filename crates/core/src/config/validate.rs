use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Upstream base URL is an http(s) URL
/// - Search thresholds, ceilings and concurrency are non-zero
/// - Cache TTL is non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let base_url = config.upstream.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "upstream.base_url must be an http(s) URL, got '{}'",
            base_url
        )));
    }

    if config.upstream.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "upstream.timeout_secs cannot be 0".to_string(),
        ));
    }

    let search = &config.search;
    let non_zero = [
        ("search.quick_threshold", search.quick_threshold as u64),
        ("search.keyword_scan_pages", search.keyword_scan_pages as u64),
        ("search.filter_scan_pages", search.filter_scan_pages as u64),
        ("search.full_scan_max_pages", search.full_scan_max_pages as u64),
        ("search.batch_concurrency", search.batch_concurrency as u64),
        ("search.default_page_size", search.default_page_size as u64),
        ("cache.ttl_secs", config.cache.ttl_secs),
    ];
    if let Some((key, _)) = non_zero.iter().find(|(_, value)| *value == 0) {
        return Err(ConfigError::ValidationError(format!("{} cannot be 0", key)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SearchConfig, ServerConfig, UpstreamConfig};

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                port: 0,
                ..ServerConfig::default()
            },
            ..Config::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_base_url_must_be_http() {
        let config = Config {
            upstream: UpstreamConfig {
                base_url: "phimapi.com".to_string(),
                ..UpstreamConfig::default()
            },
            ..Config::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("upstream.base_url"));
    }

    #[test]
    fn test_validate_zero_batch_concurrency_fails() {
        let config = Config {
            search: SearchConfig {
                batch_concurrency: 0,
                ..SearchConfig::default()
            },
            ..Config::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("search.batch_concurrency"));
    }

    #[test]
    fn test_validate_zero_ttl_fails() {
        let mut config = Config::default();
        config.cache.ttl_secs = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("cache.ttl_secs"));
    }
}
