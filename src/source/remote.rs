use async_trait::async_trait;
use reqwest::{Client, Url, header::CACHE_CONTROL};

use crate::{prelude::*, source::Fetch};

/// Data directory served over HTTP.
pub struct Remote {
    client: Client,
    base_url: Url,
}

impl Remote {
    pub fn new(mut base_url: Url) -> Result<Self> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { client: Client::builder().build()?, base_url })
    }

    /// Resolve the file path against the base URL, percent-encoding as needed.
    pub fn url_of(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).with_context(|| format!("invalid path `{path}`"))
    }
}

#[async_trait(?Send)]
impl Fetch for Remote {
    #[instrument(skip_all, fields(path = path))]
    async fn fetch_text(&self, path: &str) -> Result<String> {
        let url = self.url_of(path)?;
        self.client
            .get(url.clone())
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .with_context(|| format!("failed to request `{url}`"))?
            .error_for_status()
            .with_context(|| format!("failed to fetch `{url}`"))?
            .text()
            .await
            .with_context(|| format!("failed to read the response from `{url}`"))
    }
}
