use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, stdin};

use crate::{
    api::assistant::{
        ChatResponse,
        Mode,
        WriteOutcome,
        attachment::{Attachment, validate_data_path},
        conversation::{AgentTarget, Conversation},
    },
    cli::health::AssistantArgs,
    prelude::*,
    source,
};

#[derive(Parser)]
pub struct AskArgs {
    #[clap(flatten)]
    assistant: AssistantArgs,

    #[clap(long, env = "VPP_ASSISTANT_MODE", value_enum, default_value_t)]
    mode: Mode,

    /// File the agent must write into. Implies the agent mode.
    #[clap(long, value_enum)]
    target: Option<AgentTarget>,

    /// Local file to attach, may be repeated.
    #[clap(long = "file")]
    files: Vec<PathBuf>,

    /// Data file to attach, for example `data/output/Load_forecast_24h.csv`. May be repeated.
    #[clap(long = "attach")]
    data_paths: Vec<String>,

    /// Data root which `data/` paths are read from.
    #[clap(long = "data", env = "VPP_DATA", default_value = "data")]
    data_location: String,

    /// Question to ask. Without it, questions are read from stdin line by line.
    question: Option<String>,
}

impl AskArgs {
    const fn mode(&self) -> Mode {
        if self.target.is_some() { Mode::Agent } else { self.mode }
    }

    #[instrument(skip_all, fields(mode = ?self.mode()))]
    pub async fn run(self) -> Result {
        let client = self.assistant.client()?;
        let mut conversation = Conversation::default();
        for attachment in self.attachments().await? {
            info!(name = %attachment.name, truncated = attachment.truncated, "attached");
            conversation.attach(attachment);
        }

        if let Some(question) = &self.question {
            let question = question.trim();
            ensure!(!question.is_empty(), "the question is empty");
            let payload = conversation.payload(self.target, question);
            print_response(&client.send(self.mode(), &payload).await?);
            return Ok(());
        }

        let mut lines = BufReader::new(stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let question = line.trim();
            match question {
                "" => continue,
                "/exit" => break,
                "/clear" => {
                    conversation.clear();
                    info!("the conversation is cleared");
                    continue;
                }
                _ => {}
            }
            let payload = conversation.payload(self.target, question);
            match client.send(self.mode(), &payload).await {
                Ok(response) => {
                    print_response(&response);
                    conversation.record(question, response.reply());
                }
                Err(error) => warn!("failed to ask: {error:#}"),
            }
        }
        Ok(())
    }

    async fn attachments(&self) -> Result<Vec<Attachment>> {
        let mut attachments = Vec::with_capacity(self.files.len() + self.data_paths.len());
        for path in &self.files {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read `{}`", path.display()))?;
            let name = path.file_name().map_or_else(
                || path.display().to_string(),
                |name| name.to_string_lossy().into_owned(),
            );
            attachments.push(Attachment::new(name, "local upload", &text));
        }
        if !self.data_paths.is_empty() {
            let source = source::open(&self.data_location)?;
            for path in &self.data_paths {
                let path = validate_data_path(path)?;
                let relative = path.strip_prefix("data/").unwrap_or(&path);
                let text = source.fetch_text(relative).await?;
                let name = relative.rsplit('/').next().unwrap_or(relative).to_owned();
                attachments.push(Attachment::new(name, path.as_str(), &text));
            }
        }
        Ok(attachments)
    }
}

fn print_response(response: &ChatResponse) {
    println!("{}", response.reply());
    match response.write_outcome() {
        WriteOutcome::Saved(filename) => info!(filename, "the agent saved the file"),
        WriteOutcome::Failed(error) => warn!("the agent failed to write the file: {error}"),
        WriteOutcome::NoFileBlock => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_implies_agent() -> Result {
        let args = AskArgs::try_parse_from(["ask", "--target", "plan6h", "why?"])?;
        assert_eq!(args.mode(), Mode::Agent);
        let args = AskArgs::try_parse_from(["ask", "why?"])?;
        assert_eq!(args.mode(), Mode::Chat);
        assert_eq!(args.question.as_deref(), Some("why?"));
        Ok(())
    }

    #[tokio::test]
    async fn data_attachments_ok() -> Result {
        let root = tempfile::tempdir()?;
        std::fs::create_dir(root.path().join("output"))?;
        std::fs::write(root.path().join("output/a.csv"), "Datetime,Load_MW\n")?;
        let data = root.path().display().to_string();
        let args = AskArgs::try_parse_from([
            "ask",
            "--data",
            data.as_str(),
            "--attach",
            r"data\output\a.csv",
            "hi",
        ])?;
        let attachments = args.attachments().await?;
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].name, "a.csv");
        assert_eq!(attachments[0].source, "data/output/a.csv");
        assert_eq!(attachments[0].text, "Datetime,Load_MW\n");
        Ok(())
    }

    #[tokio::test]
    async fn data_attachment_outside_data_fails() -> Result {
        let args = AskArgs::try_parse_from(["ask", "--attach", "../secret.csv", "hi"])?;
        assert!(args.attachments().await.is_err());
        Ok(())
    }
}
