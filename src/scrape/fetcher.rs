use std::future::Future;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, ClientBuilder};

use crate::config::Config;
use crate::error::{AppError, Result};

/// Source of post pages. The tracker only ever asks for a URL's HTML.
pub trait DocumentSource: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = client_builder(config)?.build()?;
        Ok(Self { client })
    }
}

fn client_builder(config: &Config) -> Result<ClientBuilder> {
    let mut headers = HeaderMap::new();
    let user_agent = HeaderValue::from_str(&config.user_agent)
        .map_err(|e| AppError::Config(format!("invalid user_agent: {e}")))?;
    headers.insert(USER_AGENT, user_agent);

    Ok(Client::builder()
        .timeout(config.request_timeout())
        .default_headers(headers))
}

impl DocumentSource for PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let failure = |reason: String| AppError::FetchFailure {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| failure(e.to_string()))?;

        if !response.status().is_success() {
            tracing::debug!("Failed to fetch {}: {}", url, response.status());
            return Err(failure(format!("HTTP {}", response.status())));
        }

        response.text().await.map_err(|e| failure(e.to_string()))
    }
}
