pub mod attachment;
pub mod conversation;

use reqwest::{Url, header::CACHE_CONTROL};
use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};

use self::conversation::Message;
use crate::prelude::*;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum Mode {
    /// Plain question answering.
    #[default]
    Chat,

    /// The assistant may write a file block into the data directory.
    Agent,
}

impl Mode {
    const fn endpoint(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Agent => "agent",
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [Message],
    temperature: f64,
    max_tokens: u32,
}

#[serde_as]
#[must_use]
#[derive(Debug, Default, Deserialize)]
pub struct ChatResponse {
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub text: String,

    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub saved: bool,

    #[serde(default)]
    pub filename: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

/// What happened to the file block in agent mode.
#[derive(Debug, Eq, PartialEq)]
pub enum WriteOutcome<'a> {
    Saved(&'a str),
    Failed(&'a str),
    NoFileBlock,
}

impl ChatResponse {
    #[must_use]
    pub fn reply(&self) -> &str {
        if self.text.is_empty() { "(no reply)" } else { &self.text }
    }

    #[must_use]
    pub fn write_outcome(&self) -> WriteOutcome<'_> {
        match (self.saved, self.filename.as_deref(), self.error.as_deref()) {
            (true, Some(filename), _) => WriteOutcome::Saved(filename),
            (_, _, Some(error)) => WriteOutcome::Failed(error),
            _ => WriteOutcome::NoFileBlock,
        }
    }
}

pub struct Client {
    inner: reqwest::Client,
    base_url: Url,
}

impl Client {
    pub fn new(mut base_url: Url) -> Result<Self> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { inner: reqwest::Client::builder().build()?, base_url })
    }

    fn url(&self, endpoint: &str) -> Result<Url> {
        self.base_url.join(endpoint).with_context(|| format!("invalid endpoint `{endpoint}`"))
    }

    #[instrument(skip_all, fields(mode = ?mode, n_messages = messages.len()))]
    pub async fn send(&self, mode: Mode, messages: &[Message]) -> Result<ChatResponse> {
        let url = self.url(mode.endpoint())?;
        info!(%url, "asking…");
        let response = self
            .inner
            .post(url.clone())
            .json(&ChatRequest { messages, temperature: 0.7, max_tokens: 512 })
            .send()
            .await
            .with_context(|| format!("failed to reach the assistant at `{url}`"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("HTTP {status}: {body}");
        }
        response.json().await.context("failed to deserialize the assistant response")
    }

    #[instrument(skip_all)]
    pub async fn check_health(&self) -> Result {
        let url = self.url("health")?;
        self.inner
            .get(url.clone())
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .with_context(|| format!("failed to reach `{url}`"))?
            .error_for_status()?;
        Ok(())
    }
}
