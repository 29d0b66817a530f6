//! Identity v3 authentication and ERI endpoint discovery

use super::ApiError;
use crate::config::ProviderConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Service catalog type of the ERI API
const SERVICE_TYPE: &str = "fic-eri";
const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";
/// Header carrying the token on every ERI request
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// A scoped token and the ERI base URL, including the `/v1` version prefix
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub endpoint: String,
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    auth: Auth<'a>,
}

#[derive(Serialize)]
struct Auth<'a> {
    identity: Identity<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<Scope<'a>>,
}

#[derive(Serialize)]
struct Identity<'a> {
    methods: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<PasswordMethod<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<TokenMethod<'a>>,
}

#[derive(Serialize)]
struct PasswordMethod<'a> {
    user: User<'a>,
}

#[derive(Serialize)]
struct User<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<Domain<'a>>,
}

#[derive(Serialize)]
struct TokenMethod<'a> {
    id: &'a str,
}

#[derive(Serialize)]
struct Domain<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
enum Scope<'a> {
    #[serde(rename = "project")]
    Project {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        domain: Option<Domain<'a>>,
    },
    #[serde(rename = "domain")]
    Domain(Domain<'a>),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Deserialize)]
struct CatalogEndpoint {
    interface: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    region_id: Option<String>,
    url: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn domain<'a>(id: Option<&'a str>, name: Option<&'a str>) -> Option<Domain<'a>> {
    if id.is_none() && name.is_none() {
        None
    } else {
        Some(Domain { id, name })
    }
}

fn build_request(config: &ProviderConfig) -> Result<AuthRequest<'_>, ApiError> {
    let default_domain = non_empty(&config.default_domain);

    let identity = match non_empty(&config.token) {
        Some(token) => Identity {
            methods: vec!["token"],
            password: None,
            token: Some(TokenMethod { id: token }),
        },
        None => {
            let password = non_empty(&config.password).ok_or_else(|| {
                ApiError::Config("either token or password must be specified".to_string())
            })?;
            let user_id = non_empty(&config.user_id);
            let user_name = non_empty(&config.user_name);
            if user_id.is_none() && user_name.is_none() {
                return Err(ApiError::Config(
                    "either user_name or user_id must be specified".to_string(),
                ));
            }
            let user_domain = match (
                non_empty(&config.user_domain_id).or(non_empty(&config.domain_id)),
                non_empty(&config.user_domain_name).or(non_empty(&config.domain_name)),
            ) {
                (None, None) if user_id.is_none() => domain(default_domain, None),
                (id, name) => domain(id, name),
            };
            Identity {
                methods: vec!["password"],
                password: Some(PasswordMethod {
                    user: User {
                        id: user_id,
                        name: if user_id.is_some() { None } else { user_name },
                        password,
                        domain: if user_id.is_some() { None } else { user_domain },
                    },
                }),
                token: None,
            }
        }
    };

    let tenant_id = non_empty(&config.tenant_id);
    let tenant_name = non_empty(&config.tenant_name);
    let scope = if tenant_id.is_some() || tenant_name.is_some() {
        let project_domain = match (
            non_empty(&config.project_domain_id),
            non_empty(&config.project_domain_name),
        ) {
            (None, None) if tenant_id.is_none() => domain(default_domain, None),
            (id, name) => domain(id, name),
        };
        Some(Scope::Project {
            id: tenant_id,
            name: if tenant_id.is_some() { None } else { tenant_name },
            domain: if tenant_id.is_some() { None } else { project_domain },
        })
    } else {
        domain(non_empty(&config.domain_id), non_empty(&config.domain_name)).map(Scope::Domain)
    };

    Ok(AuthRequest {
        auth: Auth { identity, scope },
    })
}

/// Finds the ERI endpoint in the catalog for the configured region and
/// interface
fn resolve_endpoint(
    catalog: &[CatalogEntry],
    region: Option<&str>,
    interface: &str,
) -> Result<String, ApiError> {
    let url = catalog
        .iter()
        .filter(|entry| entry.service_type == SERVICE_TYPE)
        .flat_map(|entry| entry.endpoints.iter())
        .filter(|ep| ep.interface == interface)
        .find(|ep| match region {
            Some(region) => {
                ep.region.as_deref() == Some(region) || ep.region_id.as_deref() == Some(region)
            }
            None => true,
        })
        .map(|ep| ep.url.clone())
        .ok_or_else(|| {
            ApiError::Config(format!(
                "no {} endpoint of type {} found in the service catalog for region {}",
                interface,
                SERVICE_TYPE,
                region.unwrap_or("(any)")
            ))
        })?;

    Ok(with_version(&url))
}

/// Appends `/v1` unless the URL already carries it
pub fn with_version(url: &str) -> String {
    let base = url.trim_end_matches('/');
    if base.ends_with("/v1") {
        base.to_string()
    } else {
        format!("{}/v1", base)
    }
}

/// Obtains a token and locates the ERI endpoint.
///
/// With both `token` and `endpoint` configured no request is made at all.
pub async fn authenticate(
    http: &reqwest::Client,
    config: &ProviderConfig,
) -> Result<Session, ApiError> {
    if let (Some(token), Some(endpoint)) = (non_empty(&config.token), non_empty(&config.endpoint))
    {
        debug!("Using configured token and endpoint {}", endpoint);
        return Ok(Session {
            token: token.to_string(),
            endpoint: with_version(endpoint),
        });
    }

    let auth_url = non_empty(&config.auth_url)
        .ok_or_else(|| ApiError::Config("auth_url must be specified".to_string()))?;
    let url = format!("{}/auth/tokens", auth_url.trim_end_matches('/'));
    let body = build_request(config)?;

    debug!("Authenticating against {}", url);
    let response = http.post(&url).json(&body).send().await?;
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(ApiError::AuthError(format!("HTTP {}: {}", status.as_u16(), text)));
    }

    let token = response
        .headers()
        .get(SUBJECT_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| {
            ApiError::AuthError(format!("response did not include {}", SUBJECT_TOKEN_HEADER))
        })?;

    let endpoint = match non_empty(&config.endpoint) {
        Some(endpoint) => with_version(endpoint),
        None => {
            let body: TokenResponse = response
                .json()
                .await
                .map_err(|e| ApiError::ParseError(format!("token response: {}", e)))?;
            resolve_endpoint(
                &body.token.catalog,
                non_empty(&config.region),
                config.interface(),
            )?
        }
    };

    info!("Authenticated, ERI endpoint is {}", endpoint);
    Ok(Session { token, endpoint })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const CATALOG: &str = r#"{
        "token": {
            "catalog": [
                {"type": "identity", "endpoints": [
                    {"interface": "public", "region": "jp1", "url": "https://keystone.example.com/v3"}
                ]},
                {"type": "fic-eri", "endpoints": [
                    {"interface": "public", "region": "jp2", "url": "https://eri-jp2.example.com"},
                    {"interface": "public", "region": "jp1", "url": "https://eri-jp1.example.com/"},
                    {"interface": "internal", "region": "jp1", "url": "https://eri-internal.example.com"}
                ]}
            ]
        }
    }"#;

    fn password_config(auth_url: String) -> ProviderConfig {
        ProviderConfig {
            auth_url: Some(auth_url),
            region: Some("jp1".into()),
            user_name: Some("api-user".into()),
            password: Some("secret".into()),
            tenant_id: Some("0123456789abcdef".into()),
            default_domain: Some("default".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn password_auth_resolves_catalog_endpoint() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v3/auth/tokens")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "auth": {
                    "identity": {
                        "methods": ["password"],
                        "password": {"user": {
                            "name": "api-user",
                            "password": "secret",
                            "domain": {"id": "default"}
                        }}
                    },
                    "scope": {"project": {"id": "0123456789abcdef"}}
                }
            })))
            .with_status(201)
            .with_header("X-Subject-Token", "gAAAAtoken")
            .with_body(CATALOG)
            .create_async()
            .await;

        let http = reqwest::Client::new();
        let session = authenticate(&http, &password_config(format!("{}/v3", server.url())))
            .await
            .unwrap();

        assert_eq!(session.token, "gAAAAtoken");
        assert_eq!(session.endpoint, "https://eri-jp1.example.com/v1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn internal_interface_is_honoured() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth/tokens")
            .with_status(201)
            .with_header("X-Subject-Token", "tok")
            .with_body(CATALOG)
            .create_async()
            .await;

        let mut config = password_config(server.url());
        config.endpoint_type = Some("internalURL".into());

        let session = authenticate(&reqwest::Client::new(), &config).await.unwrap();
        assert_eq!(session.endpoint, "https://eri-internal.example.com/v1");
    }

    #[tokio::test]
    async fn rejected_credentials_are_auth_errors() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth/tokens")
            .with_status(401)
            .with_body(r#"{"error": {"code": 401, "message": "The request you have made requires authentication."}}"#)
            .create_async()
            .await;

        let result = authenticate(&reqwest::Client::new(), &password_config(server.url())).await;
        assert!(matches!(result, Err(ApiError::AuthError(_))));
    }

    #[tokio::test]
    async fn missing_region_in_catalog_is_reported() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth/tokens")
            .with_status(201)
            .with_header("X-Subject-Token", "tok")
            .with_body(CATALOG)
            .create_async()
            .await;

        let mut config = password_config(server.url());
        config.region = Some("jp9".into());

        let result = authenticate(&reqwest::Client::new(), &config).await;
        assert!(matches!(result, Err(ApiError::Config(msg)) if msg.contains("jp9")));
    }

    #[tokio::test]
    async fn token_and_endpoint_skip_identity() {
        let config = ProviderConfig {
            auth_url: Some("http://127.0.0.1:1".into()),
            token: Some("preissued".into()),
            endpoint: Some("https://eri.example.com".into()),
            ..Default::default()
        };

        let session = authenticate(&reqwest::Client::new(), &config).await.unwrap();
        assert_eq!(session.token, "preissued");
        assert_eq!(session.endpoint, "https://eri.example.com/v1");
    }

    #[test]
    fn password_is_required_without_token() {
        let config = ProviderConfig {
            user_name: Some("api-user".into()),
            ..Default::default()
        };
        assert!(matches!(build_request(&config), Err(ApiError::Config(_))));
    }

    #[test]
    fn token_method_is_used_when_token_is_set() {
        let config = ProviderConfig {
            token: Some("abc".into()),
            tenant_name: Some("tenant".into()),
            project_domain_name: Some("Default".into()),
            ..Default::default()
        };
        let body = serde_json::to_value(build_request(&config).unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "auth": {
                    "identity": {"methods": ["token"], "token": {"id": "abc"}},
                    "scope": {"project": {"name": "tenant", "domain": {"name": "Default"}}}
                }
            })
        );
    }

    #[test]
    fn version_suffix_is_not_duplicated() {
        assert_eq!(with_version("https://eri.example.com/v1/"), "https://eri.example.com/v1");
        assert_eq!(with_version("https://eri.example.com"), "https://eri.example.com/v1");
    }
}
