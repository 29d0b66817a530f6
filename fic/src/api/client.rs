use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use reqwest::Method;
use std::sync::Arc;

use super::auth::{self, AUTH_TOKEN_HEADER};
use super::common::{envelope, ApiErrorDetails, ApiErrorResponse, FicApiResource};
use super::error::ApiError;
use super::pool::{ConnectionPoolConfig, ConnectionPoolManager, TlsSettings};
use crate::config::ProviderConfig;

/// ERI API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
    retry_config: RetryConfig,
}

#[derive(Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            timeout_seconds: 30,
        }
    }
}

impl Client {
    /// Create a client for a known endpoint and token
    pub fn new(endpoint: &str, token: &str) -> Result<Self, ApiError> {
        Self::with_config(endpoint, token, &TlsSettings::default(), RetryConfig::default())
    }

    pub fn with_config(
        endpoint: &str,
        token: &str,
        tls: &TlsSettings,
        retry_config: RetryConfig,
    ) -> Result<Self, ApiError> {
        let pool_manager = ConnectionPoolManager::new(Self::pool_config(&retry_config));
        let http_client = pool_manager.build_client(tls)?;
        Ok(Self::from_parts(
            http_client,
            endpoint,
            token,
            retry_config,
        ))
    }

    /// Authenticate with the identity service and build a client for the
    /// ERI endpoint found in the catalog
    pub async fn connect(config: &ProviderConfig) -> Result<Self, ApiError> {
        let tls = config
            .tls_settings()
            .map_err(|e| ApiError::Config(e.to_string()))?;
        let retry_config = RetryConfig::default();
        let pool_manager = ConnectionPoolManager::new(Self::pool_config(&retry_config));
        let http_client = pool_manager.build_client(&tls)?;

        let session = auth::authenticate(&http_client, config).await?;

        Ok(Self::from_parts(
            http_client,
            &session.endpoint,
            &session.token,
            retry_config,
        ))
    }

    fn pool_config(retry_config: &RetryConfig) -> ConnectionPoolConfig {
        ConnectionPoolConfig {
            request_timeout: std::time::Duration::from_secs(retry_config.timeout_seconds),
            ..Default::default()
        }
    }

    fn from_parts(
        http_client: reqwest::Client,
        endpoint: &str,
        token: &str,
        retry_config: RetryConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: endpoint.trim_end_matches('/').to_string(),
                token: token.to_string(),
                retry_config,
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Execute a GET request with retry logic
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute_with_retry(
            Method::GET,
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                tracing::debug!("GET request to: {}", url);

                self.inner
                    .http_client
                    .get(&url)
                    .header(AUTH_TOKEN_HEADER, &self.inner.token)
                    .send()
                    .await
            },
            path,
        )
        .await
    }

    /// Execute a POST request. Creates are not idempotent, so a failed
    /// attempt is never repeated.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.log_body("POST", path, body);
        self.execute_with_retry(
            Method::POST,
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                self.inner
                    .http_client
                    .post(&url)
                    .header(AUTH_TOKEN_HEADER, &self.inner.token)
                    .json(body)
                    .send()
                    .await
            },
            path,
        )
        .await
    }

    /// Execute a PUT request with retry logic
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.log_body("PUT", path, body);
        self.execute_with_retry(
            Method::PUT,
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                self.inner
                    .http_client
                    .put(&url)
                    .header(AUTH_TOKEN_HEADER, &self.inner.token)
                    .json(body)
                    .send()
                    .await
            },
            path,
        )
        .await
    }

    /// Execute a DELETE request with retry logic. Any response body is
    /// ignored.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute_with_retry::<_, _, serde_json::Value>(
            Method::DELETE,
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                tracing::debug!("DELETE request to: {}", url);

                self.inner
                    .http_client
                    .delete(&url)
                    .header(AUTH_TOKEN_HEADER, &self.inner.token)
                    .send()
                    .await
            },
            path,
        )
        .await
        .map(|_| ())
    }

    /// GET a single resource wrapped in its root key
    pub async fn get_resource<T: FicApiResource>(&self, path: &str) -> Result<T, ApiError> {
        let body: HashMap<String, T> = self.get(path).await?;
        Self::take_root(body)
    }

    /// POST a body under `T::ROOT_KEY` and unwrap the response the same way
    pub async fn post_resource<T: FicApiResource, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response: HashMap<String, T> = self.post(path, &envelope(T::ROOT_KEY, body)).await?;
        Self::take_root(response)
    }

    /// PUT a body under `T::ROOT_KEY` and unwrap the response the same way
    pub async fn put_resource<T: FicApiResource, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response: HashMap<String, T> = self.put(path, &envelope(T::ROOT_KEY, body)).await?;
        Self::take_root(response)
    }

    /// POST without a body, as used by the activate endpoints
    pub async fn post_action<T: FicApiResource>(&self, path: &str) -> Result<T, ApiError> {
        let response: HashMap<String, T> = self
            .execute_with_retry(
                Method::POST,
                || async {
                    let url = format!("{}{}", self.inner.base_url, path);

                    tracing::debug!("POST request to: {}", url);

                    self.inner
                        .http_client
                        .post(&url)
                        .header(AUTH_TOKEN_HEADER, &self.inner.token)
                        .send()
                        .await
                },
                path,
            )
            .await?;
        Self::take_root(response)
    }

    fn take_root<T: FicApiResource>(mut body: HashMap<String, T>) -> Result<T, ApiError> {
        body.remove(T::ROOT_KEY).ok_or_else(|| {
            ApiError::ParseError(format!("response is missing the {:?} key", T::ROOT_KEY))
        })
    }

    /// Router operations
    pub fn routers(&self) -> crate::api::routers::RoutersApi<'_> {
        crate::api::routers::RoutersApi::new(self)
    }

    /// Port operations
    pub fn ports(&self) -> crate::api::ports::PortsApi<'_> {
        crate::api::ports::PortsApi::new(self)
    }

    /// NAT component operations on one router
    pub fn nats<'a>(&'a self, router_id: &'a str) -> crate::api::nats::NatsApi<'a> {
        crate::api::nats::NatsApi::new(self, router_id)
    }

    /// Firewall component operations on one router
    pub fn firewalls<'a>(&'a self, router_id: &'a str) -> crate::api::firewalls::FirewallsApi<'a> {
        crate::api::firewalls::FirewallsApi::new(self, router_id)
    }

    /// Global IP address sets of one NAT component
    pub fn global_ip_address_sets<'a>(
        &'a self,
        router_id: &'a str,
        nat_id: &'a str,
    ) -> crate::api::global_ip_address_sets::GlobalIpAddressSetsApi<'a> {
        crate::api::global_ip_address_sets::GlobalIpAddressSetsApi::new(self, router_id, nat_id)
    }

    /// Switch listing
    pub fn switches(&self) -> crate::api::switches::SwitchesApi<'_> {
        crate::api::switches::SwitchesApi::new(self)
    }

    /// Connection operations for one connection kind
    pub fn connections<T: crate::api::connections::ConnectionKind>(
        &self,
    ) -> crate::api::connections::ConnectionsApi<'_, T> {
        crate::api::connections::ConnectionsApi::new(self)
    }

    fn log_body<B: Serialize>(&self, method: &str, path: &str, body: &B) {
        if tracing::enabled!(tracing::Level::DEBUG) {
            match serde_json::to_string(body) {
                Ok(json) => tracing::debug!("{} request to: {}{} body: {}", method, self.inner.base_url, path, json),
                Err(e) => tracing::debug!("{} request to: {}{} (unserializable body: {})", method, self.inner.base_url, path, e),
            }
        }
    }

    /// Execute request with retry logic. Only idempotent methods are sent
    /// again after a 5xx, 429 or connection failure.
    async fn execute_with_retry<F, Fut, T>(
        &self,
        method: Method,
        request_fn: F,
        path: &str,
    ) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
        T: DeserializeOwned,
    {
        let max_retries = if method.is_idempotent() {
            self.inner.retry_config.max_retries
        } else {
            0
        };
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= max_retries {
            if attempt > 0 {
                let backoff = std::cmp::min(
                    self.inner.retry_config.initial_backoff_ms * (2_u64.pow(attempt - 1)),
                    self.inner.retry_config.max_backoff_ms,
                );
                tracing::debug!(
                    "Retrying request to {} after {}ms (attempt {})",
                    path,
                    backoff,
                    attempt
                );
                tokio::time::sleep(tokio::time::Duration::from_millis(backoff)).await;
            }

            match request_fn().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return self.parse_success_response(response).await;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        let text = response.text().await.unwrap_or_default();
                        return Err(ApiError::AuthError(text));
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ApiError::RateLimited);
                    } else if status.is_server_error() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return self.handle_error_response(response).await;
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error =
                            Some(ApiError::Timeout(self.inner.retry_config.timeout_seconds));
                    } else if e.is_connect() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return Err(ApiError::RequestError(e));
                    }
                }
            }

            attempt += 1;
        }

        if max_retries == 0 {
            tracing::debug!("Not retrying {} {}", method, path);
        }
        Err(last_error.unwrap_or(ApiError::ServiceUnavailable))
    }

    /// Parse successful response. An empty body reads as JSON null.
    async fn parse_success_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        tracing::debug!("API response body: {}", text);

        let text = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str::<T>(text).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
            ApiError::ParseError(format!("Failed to parse response: {}", e))
        })
    }

    /// Handle error response
    async fn handle_error_response<T>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let details = serde_json::from_str::<ApiErrorResponse>(&text)
            .ok()
            .filter(|resp| resp.code.is_some() || resp.message.is_some())
            .map(|resp| {
                Box::new(ApiErrorDetails {
                    code: resp.code,
                    message: resp.message,
                })
            });

        Err(ApiError::ApiError {
            status,
            message: text,
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::{create_test_client, mock_json};
    use mockito::{Matcher, Server};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Thing {
        id: String,
    }

    impl FicApiResource for Thing {
        const ROOT_KEY: &'static str = "thing";
    }

    #[test]
    fn retry_config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_backoff_ms, 100);
        assert_eq!(config.max_backoff_ms, 10000);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn strips_trailing_slash() {
        let client = create_test_client("https://eri.example.com/v1/");
        assert_eq!(client.base_url(), "https://eri.example.com/v1");
    }

    #[tokio::test]
    async fn sends_auth_token_header() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/things/F1")
            .match_header("x-auth-token", "test-token")
            .with_status(200)
            .with_body(r#"{"thing": {"id": "F1"}}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let thing: Thing = client.get_resource("/things/F1").await.unwrap();
        assert_eq!(thing.id, "F1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn post_wraps_body_in_root_key() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/things")
            .match_body(Matcher::Json(serde_json::json!({"thing": {"name": "a"}})))
            .with_status(202)
            .with_body(r#"{"thing": {"id": "F2"}}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let thing: Thing = client
            .post_resource("/things", &serde_json::json!({"name": "a"}))
            .await
            .unwrap();
        assert_eq!(thing.id, "F2");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_root_key_is_a_parse_error() {
        let mut server = Server::new_async().await;
        let _m = mock_json(&mut server, "GET", "/things/F1", 200, r#"{"other": {"id": "F1"}}"#).await;

        let client = create_test_client(&server.url());
        let result: Result<Thing, _> = client.get_resource("/things/F1").await;
        assert!(matches!(result, Err(ApiError::ParseError(_))));
    }

    #[tokio::test]
    async fn delete_accepts_empty_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/things/F1")
            .with_status(202)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        client.delete("/things/F1").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn not_found_and_conflict_are_not_retried() {
        let mut server = Server::new_async().await;
        let not_found = server
            .mock("GET", "/things/F1")
            .with_status(404)
            .with_body(r#"{"code": "FIC-ERI-404", "message": "not found"}"#)
            .expect(1)
            .create_async()
            .await;
        let conflict = server
            .mock("DELETE", "/things/F1")
            .with_status(409)
            .expect(1)
            .create_async()
            .await;

        let client = create_test_client(&server.url());

        let err = client.get::<serde_json::Value>("/things/F1").await.unwrap_err();
        assert!(err.is_not_found());
        match err {
            ApiError::ApiError { details, .. } => {
                let details = details.unwrap();
                assert_eq!(details.message.as_deref(), Some("not found"));
            }
            other => panic!("unexpected error {:?}", other),
        }

        let err = client.delete("/things/F1").await.unwrap_err();
        assert_eq!(err.classify(), crate::api::FailureKind::Conflict);

        not_found.assert_async().await;
        conflict.assert_async().await;
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/things/F1")
            .with_status(503)
            .expect(4)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let result = client.get::<serde_json::Value>("/things/F1").await;
        assert!(matches!(result, Err(ApiError::ServiceUnavailable)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_is_an_auth_error() {
        let mut server = Server::new_async().await;
        let _m = mock_json(&mut server, "GET", "/things/F1", 401, r#"{"message": "token expired"}"#).await;

        let client = create_test_client(&server.url());
        let result = client.get::<serde_json::Value>("/things/F1").await;
        assert!(matches!(result, Err(ApiError::AuthError(msg)) if msg.contains("token expired")));
    }

    #[tokio::test]
    async fn failed_creates_are_not_sent_twice() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/things")
            .with_status(502)
            .expect(1)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let result = client
            .post_resource::<Thing, _>("/things", &serde_json::json!({"name": "r1"}))
            .await;
        assert!(matches!(result, Err(ApiError::ServiceUnavailable)));
        create.assert_async().await;
    }

    #[tokio::test]
    async fn updates_are_retried() {
        let mut server = Server::new_async().await;
        let update = server
            .mock("PUT", "/things/F1")
            .with_status(503)
            .expect(4)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let result = client
            .put_resource::<Thing, _>("/things/F1", &serde_json::json!({"name": "r1"}))
            .await;
        assert!(result.is_err());
        update.assert_async().await;
    }
}
