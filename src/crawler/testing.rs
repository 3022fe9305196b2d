//! In-memory transport for crawler unit tests

use crate::crawler::fetcher::{FetchError, FetchedPage, Transport};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Serves fixed pages keyed by request URL; unknown URLs fail like a dead host
#[derive(Default)]
pub(crate) struct StaticTransport {
    pages: HashMap<String, String>,
    redirects: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    gates: HashMap<String, Arc<Semaphore>>,
    panics: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl StaticTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    /// Reports `to` as the final URL when `from` is fetched
    pub(crate) fn redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    pub(crate) fn delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    /// Blocks fetches of `url` until the semaphore hands out a permit
    pub(crate) fn gate(mut self, url: &str, gate: Arc<Semaphore>) -> Self {
        self.gates.insert(url.to_string(), gate);
        self
    }

    pub(crate) fn panic_on(mut self, url: &str) -> Self {
        self.panics.insert(url.to_string());
        self
    }

    /// Requested URLs, in call order
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let key = url.as_str();
        self.calls.lock().unwrap().push(key.to_string());

        if self.panics.contains(key) {
            panic!("transport blew up on {}", key);
        }

        if let Some(gate) = self.gates.get(key) {
            gate.acquire().await.unwrap().forget();
        }

        if let Some(delay) = self.delays.get(key) {
            tokio::time::sleep(*delay).await;
        }

        let Some(body) = self.pages.get(key) else {
            return Err(FetchError::AllRoutesExhausted {
                url: key.to_string(),
                attempts: 1,
            });
        };

        let final_url = match self.redirects.get(key) {
            Some(target) => Url::parse(target).unwrap(),
            None => url.clone(),
        };

        Ok(FetchedPage {
            body: body.clone(),
            final_url,
        })
    }
}
