//! Connection pool management for the ERI API

use super::ApiError;
use std::time::Duration;

pub struct ConnectionPoolConfig {
    pub max_idle_connections: usize,
    pub idle_timeout: Duration,
    pub connection_timeout: Duration,
    pub request_timeout: Duration,
    pub tcp_keepalive: Option<Duration>,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_connections: 10,
            idle_timeout: Duration::from_secs(90),
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            tcp_keepalive: Some(Duration::from_secs(30)),
        }
    }
}

/// TLS material for the identity and ERI endpoints
#[derive(Debug, Clone, Default)]
pub struct TlsSettings {
    pub insecure: bool,
    /// PEM bundle trusted in addition to the system roots
    pub ca_cert: Option<Vec<u8>>,
    /// Client certificate followed by its private key, both PEM
    pub identity: Option<Vec<u8>>,
}

/// Builds the pooled HTTP client shared by the identity and ERI calls
pub struct ConnectionPoolManager {
    config: ConnectionPoolConfig,
}

impl ConnectionPoolManager {
    pub fn new(config: ConnectionPoolConfig) -> Self {
        Self { config }
    }

    pub fn build_client(&self, tls: &TlsSettings) -> Result<reqwest::Client, ApiError> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .danger_accept_invalid_certs(tls.insecure)
            .timeout(self.config.request_timeout)
            .connect_timeout(self.config.connection_timeout)
            .pool_idle_timeout(self.config.idle_timeout)
            .pool_max_idle_per_host(self.config.max_idle_connections);

        if let Some(keepalive) = self.config.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        if let Some(pem) = &tls.ca_cert {
            let certs = reqwest::Certificate::from_pem_bundle(pem)
                .map_err(|e| ApiError::Config(format!("error reading CA cert: {}", e)))?;
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        if let Some(pem) = &tls.identity {
            let identity = reqwest::Identity::from_pem(pem)
                .map_err(|e| ApiError::Config(format!("error reading client cert: {}", e)))?;
            builder = builder.identity(identity);
        }

        builder.build().map_err(ApiError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pool_config() {
        let config = ConnectionPoolConfig::default();
        assert_eq!(config.max_idle_connections, 10);
        assert_eq!(config.idle_timeout.as_secs(), 90);
        assert_eq!(config.connection_timeout.as_secs(), 10);
        assert_eq!(config.request_timeout.as_secs(), 30);
        assert_eq!(config.tcp_keepalive, Some(Duration::from_secs(30)));
    }

    #[test]
    fn builds_plain_client() {
        let manager = ConnectionPoolManager::new(ConnectionPoolConfig::default());
        assert!(manager.build_client(&TlsSettings::default()).is_ok());
    }
}
