//! Test helpers for the ERI API

#[cfg(test)]
pub fn create_test_client(url: &str) -> super::Client {
    super::Client::with_config(
        url,
        "test-token",
        &super::TlsSettings::default(),
        super::RetryConfig {
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            ..Default::default()
        },
    )
    .unwrap()
}

/// Registers a mock answering `method path` with a JSON body
#[cfg(test)]
pub async fn mock_json(
    server: &mut mockito::ServerGuard,
    method: &str,
    path: &str,
    status: usize,
    body: &str,
) -> mockito::Mock {
    server
        .mock(method, path)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

/// Provider data with poll timings short enough for mockito round trips
#[cfg(test)]
pub fn create_test_provider_data(url: &str) -> crate::provider_data::FicProviderData {
    crate::provider_data::FicProviderData::new(create_test_client(url)).with_timings(
        crate::operation::PollTimings {
            timeout: std::time::Duration::from_secs(5),
            delay: std::time::Duration::ZERO,
            min_interval: std::time::Duration::from_millis(1),
        },
    )
}
