use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::app::Result;
use crate::domain::{FeedKind, RawItem};
use crate::fetcher::Fetcher;

pub const API_BASE: &str = "https://hacker-news.firebaseio.com/v0/";

pub struct HttpFetcher {
    client: Client,
    base: Url,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let base = Url::parse(API_BASE).expect("API base URL is valid");
        Self::with_base(base)
    }

    /// Point the fetcher at an alternate API root.
    pub fn with_base(base: Url) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("kindling/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");

        Self { client, base }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base.join(path)?;
        let response = self.client.get(url).send().await?;
        response.error_for_status_ref()?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn listing(&self, kind: FeedKind) -> Result<Vec<u64>> {
        self.get_json(&format!("{}.json", kind.path())).await
    }

    async fn item(&self, id: u64) -> Result<RawItem> {
        self.get_json(&format!("item/{id}.json")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        let base = Url::parse(API_BASE).unwrap();
        assert_eq!(
            base.join("newstories.json").unwrap().as_str(),
            "https://hacker-news.firebaseio.com/v0/newstories.json"
        );
        assert_eq!(
            base.join("item/126809.json").unwrap().as_str(),
            "https://hacker-news.firebaseio.com/v0/item/126809.json"
        );
    }
}
