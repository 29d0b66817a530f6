use crate::api::Client;
use crate::lock::KeyedLock;
use crate::operation::PollTimings;
use std::fmt;
use std::sync::Arc;

/// Shared state handed from the provider to every resource and data source
#[derive(Clone)]
pub struct FicProviderData {
    pub client: Arc<Client>,
    pub locks: Arc<KeyedLock>,
    pub timings: PollTimings,
}

impl FicProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
            locks: Arc::new(KeyedLock::new()),
            timings: PollTimings::default(),
        }
    }

    pub fn with_timings(mut self, timings: PollTimings) -> Self {
        self.timings = timings;
        self
    }
}

impl fmt::Debug for FicProviderData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FicProviderData")
            .field("endpoint", &self.client.base_url())
            .field("timings", &self.timings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_shows_endpoint_but_not_token() {
        let client = Client::new("https://api.ntt.com/eri/v1", "secret-token").unwrap();
        let data = FicProviderData::new(client);
        let shown = format!("{:?}", data);
        assert!(shown.contains("https://api.ntt.com/eri/v1"));
        assert!(!shown.contains("secret-token"));
    }
}
