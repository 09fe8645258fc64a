use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};

/// Retrieves the raw bytes behind a source URL.
///
/// The loader only ever talks to the network through this trait, so tests
/// substitute in-memory fixtures.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> PipelineResult<Vec<u8>>;
}

/// Blocking HTTP fetcher with a single overall timeout per request.
///
/// Redirects are followed. A timeout, connection failure or non-success
/// status is reported once as [`PipelineError::Fetch`]; there are no retries.
#[cfg(feature = "remote-fetch")]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "remote-fetch")]
impl HttpFetcher {
    pub fn new(timeout: Duration) -> PipelineResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                PipelineError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self { client })
    }
}

#[cfg(feature = "remote-fetch")]
impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> PipelineResult<Vec<u8>> {
        let fetch_error = |message: String| PipelineError::Fetch {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_error(e.to_string()))?
            .error_for_status()
            .map_err(|e| fetch_error(e.to_string()))?;

        let body = response.bytes().map_err(|e| fetch_error(e.to_string()))?;
        Ok(body.to_vec())
    }
}

/// Fetcher for builds without network support; every request fails.
pub struct OfflineFetcher;

impl Fetcher for OfflineFetcher {
    fn fetch(&self, url: &str) -> PipelineResult<Vec<u8>> {
        Err(PipelineError::Fetch {
            url: url.to_string(),
            message: "network fetching is disabled in this build".to_string(),
        })
    }
}

/// The fetcher a run should use: HTTP when compiled in, offline otherwise.
pub fn default_fetcher(timeout: Duration) -> PipelineResult<Box<dyn Fetcher>> {
    #[cfg(feature = "remote-fetch")]
    {
        Ok(Box::new(HttpFetcher::new(timeout)?))
    }
    #[cfg(not(feature = "remote-fetch"))]
    {
        let _ = timeout;
        Ok(Box::new(OfflineFetcher))
    }
}
