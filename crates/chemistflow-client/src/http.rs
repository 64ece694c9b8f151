//! Shared outbound HTTP client construction.

use chemistflow_common::config::ClientConfig;

/// Builds the process-wide client for one upstream.
///
/// Connect and request timeouts plus pool idle settings come from the
/// client configuration; the resulting client is cheap to clone (it
/// shares the pool) and must be threaded through constructors rather
/// than rebuilt per request.
pub fn build_http_client(config: &ClientConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .pool_max_idle_per_host(config.pool_max_connections)
        .pool_idle_timeout(config.pool_max_idle)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_build_with_defaults() {
        let client = build_http_client(&ClientConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_with_tight_timeouts() {
        let config = ClientConfig {
            connect_timeout: Duration::from_millis(1),
            request_timeout: Duration::from_millis(1),
            ..ClientConfig::default()
        };
        assert!(build_http_client(&config).is_ok());
    }
}
