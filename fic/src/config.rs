//! Provider configuration
//!
//! Every attribute of the provider block can also come from the usual
//! `OS_*` environment variables. Values set in configuration win.

use crate::api::TlsSettings;
use serde::Deserialize;
use tfplug::types::DynamicValue;
use thiserror::Error;

const VALID_ENDPOINT_TYPES: &[&str] = &[
    "internal",
    "internalURL",
    "admin",
    "adminURL",
    "public",
    "publicURL",
    "",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid provider configuration: {0}")]
    Decode(#[from] tfplug::TfplugError),

    #[error("auth_url must be specified (set in provider config or OS_AUTH_URL env var)")]
    MissingAuthUrl,

    #[error("auth_url {url:?} is not a valid URL: {source}")]
    InvalidAuthUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid endpoint type provided: {0:?}")]
    InvalidEndpointType(String),

    #[error("invalid value for insecure: {0:?}")]
    InvalidInsecure(String),

    #[error("error reading {what}: {source}")]
    ReadFile {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProviderConfig {
    pub auth_url: Option<String>,
    pub region: Option<String>,
    pub user_name: Option<String>,
    pub user_id: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub tenant_id: Option<String>,
    pub tenant_name: Option<String>,
    pub user_domain_name: Option<String>,
    pub user_domain_id: Option<String>,
    pub project_domain_name: Option<String>,
    pub project_domain_id: Option<String>,
    pub domain_id: Option<String>,
    pub domain_name: Option<String>,
    pub default_domain: Option<String>,
    pub insecure: Option<bool>,
    pub endpoint_type: Option<String>,
    pub cacert_file: Option<String>,
    pub cert: Option<String>,
    pub key: Option<String>,
    /// Skips the service catalog lookup
    pub endpoint: Option<String>,
}

impl ProviderConfig {
    /// Decodes the provider block and fills unset attributes from the
    /// environment
    pub fn load(config: &DynamicValue) -> Result<Self, ConfigError> {
        let mut loaded: ProviderConfig = if config.is_null() {
            ProviderConfig::default()
        } else {
            config.decode()?
        };
        loaded.apply_env()?;
        loaded.validate()?;
        Ok(loaded)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        fill(&mut self.auth_url, &["OS_AUTH_URL"]);
        fill(&mut self.region, &["OS_REGION_NAME"]);
        fill(&mut self.user_name, &["OS_USERNAME"]);
        fill(&mut self.user_id, &["OS_USER_ID"]);
        fill(&mut self.password, &["OS_PASSWORD"]);
        fill(&mut self.token, &["OS_TOKEN", "OS_AUTH_TOKEN"]);
        fill(&mut self.tenant_id, &["OS_TENANT_ID", "OS_PROJECT_ID"]);
        fill(&mut self.tenant_name, &["OS_TENANT_NAME", "OS_PROJECT_NAME"]);
        fill(&mut self.user_domain_name, &["OS_USER_DOMAIN_NAME"]);
        fill(&mut self.user_domain_id, &["OS_USER_DOMAIN_ID"]);
        fill(&mut self.project_domain_name, &["OS_PROJECT_DOMAIN_NAME"]);
        fill(&mut self.project_domain_id, &["OS_PROJECT_DOMAIN_ID"]);
        fill(&mut self.domain_id, &["OS_DOMAIN_ID"]);
        fill(&mut self.domain_name, &["OS_DOMAIN_NAME"]);
        fill(&mut self.default_domain, &["OS_DEFAULT_DOMAIN"]);
        fill(&mut self.endpoint_type, &["OS_ENDPOINT_TYPE"]);
        fill(&mut self.cacert_file, &["OS_CACERT"]);
        fill(&mut self.cert, &["OS_CERT"]);
        fill(&mut self.key, &["OS_KEY"]);
        fill(&mut self.endpoint, &["FIC_ERI_ENDPOINT"]);

        if self.default_domain.is_none() {
            self.default_domain = Some("default".to_string());
        }

        if self.insecure.is_none() {
            if let Some(raw) = env_first(&["OS_INSECURE"]) {
                self.insecure = Some(match raw.to_ascii_lowercase().as_str() {
                    "true" | "1" => true,
                    "false" | "0" => false,
                    _ => return Err(ConfigError::InvalidInsecure(raw)),
                });
            }
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let auth_url = self.auth_url.as_deref().unwrap_or_default();
        if auth_url.is_empty() {
            return Err(ConfigError::MissingAuthUrl);
        }
        if let Err(source) = url::Url::parse(auth_url) {
            return Err(ConfigError::InvalidAuthUrl {
                url: auth_url.to_string(),
                source,
            });
        }

        let endpoint_type = self.endpoint_type.as_deref().unwrap_or_default();
        if !VALID_ENDPOINT_TYPES.contains(&endpoint_type) {
            return Err(ConfigError::InvalidEndpointType(endpoint_type.to_string()));
        }

        Ok(())
    }

    /// Catalog interface matching `endpoint_type`
    pub fn interface(&self) -> &'static str {
        match self.endpoint_type.as_deref() {
            Some("internal") | Some("internalURL") => "internal",
            Some("admin") | Some("adminURL") => "admin",
            _ => "public",
        }
    }

    pub fn tls_settings(&self) -> Result<TlsSettings, ConfigError> {
        let ca_cert = match &self.cacert_file {
            Some(value) => Some(path_or_contents(value, "CA cert")?),
            None => None,
        };

        let identity = match (&self.cert, &self.key) {
            (Some(cert), Some(key)) => {
                let mut pem = path_or_contents(cert, "client cert")?;
                pem.push(b'\n');
                pem.extend(path_or_contents(key, "client key")?);
                Some(pem)
            }
            _ => None,
        };

        Ok(TlsSettings {
            insecure: self.insecure.unwrap_or(false),
            ca_cert,
            identity,
        })
    }
}

fn env_first(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.is_empty())
}

fn fill(field: &mut Option<String>, names: &[&str]) {
    if field.as_deref().map_or(true, str::is_empty) {
        *field = env_first(names);
    }
}

/// Certificates may be given inline or as a path to a PEM file
fn path_or_contents(value: &str, what: &'static str) -> Result<Vec<u8>, ConfigError> {
    if value.trim_start().starts_with("-----BEGIN") {
        return Ok(value.as_bytes().to_vec());
    }
    std::fs::read(value).map_err(|source| ConfigError::ReadFile { what, source })
}
