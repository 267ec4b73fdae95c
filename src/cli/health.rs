use clap::Parser;
use reqwest::Url;

use crate::{
    api::assistant::{Client, DEFAULT_BASE_URL},
    prelude::*,
};

#[derive(Parser)]
pub struct AssistantArgs {
    /// Base URL of the chat assistant service.
    #[clap(long = "assistant-url", env = "VPP_ASSISTANT_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: Url,
}

impl AssistantArgs {
    pub fn client(&self) -> Result<Client> {
        Client::new(self.base_url.clone())
    }
}

#[derive(Parser)]
pub struct HealthArgs {
    #[clap(flatten)]
    assistant: AssistantArgs,
}

impl HealthArgs {
    #[instrument(skip_all, fields(url = %self.assistant.base_url))]
    pub async fn run(self) -> Result {
        self.assistant.client()?.check_health().await?;
        info!("the assistant is up");
        Ok(())
    }
}
