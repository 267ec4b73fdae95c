use serde::{Deserialize, Serialize};

use crate::api::assistant::attachment::{Attachment, build_context};

pub const SYSTEM_PROMPT: &str = "You are a concise assistant focused on data analysis.";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[must_use]
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Files the agent is allowed to write, relative to the data root.
#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum AgentTarget {
    Observations,
    LoadForecast,
    PvForecast,
    WindForecast,
    Plan1h,
    Plan6h,
    Plan12h,
    Plan24h,
}

impl AgentTarget {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Observations => "VPP一年优化数据_agent.csv",
            Self::LoadForecast => "output/Load_forecast_24h_agent.csv",
            Self::PvForecast => "output/PV_forecast_24h_agent.csv",
            Self::WindForecast => "output/Wind_forecast_24h_agent.csv",
            Self::Plan1h => "output/ES_decision_1h_agent.csv",
            Self::Plan6h => "output/ES_decision_6h_agent.csv",
            Self::Plan12h => "output/ES_decision_12h_agent.csv",
            Self::Plan24h => "output/ES_decision_24h_agent.csv",
        }
    }
}

/// Message history plus the attached files.
#[must_use]
pub struct Conversation {
    history: Vec<Message>,
    attachments: Vec<Attachment>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self { history: vec![Message::system(SYSTEM_PROMPT)], attachments: Vec::new() }
    }
}

impl Conversation {
    pub fn attach(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    /// Messages to send: the history, the attachments, the forced write target, and the question.
    pub fn payload(&self, target: Option<AgentTarget>, question: &str) -> Vec<Message> {
        let mut messages = self.history.clone();
        if let Some(context) = build_context(&self.attachments) {
            messages.push(Message::system(format!(
                "The user has uploaded or loaded the following files, use them only to answer \
                 the question:\n\n{context}",
            )));
        }
        if let Some(target) = target {
            messages.push(Message::system(format!(
                "Write the final result into the fixed target file, strictly using the following \
                 file block format:\n```file:{}\nCSV content\n```\n",
                target.path(),
            )));
        }
        messages.push(Message::user(question));
        messages
    }

    /// Remember the exchange once the reply has arrived.
    pub fn record(&mut self, question: &str, reply: &str) {
        self.history.push(Message::user(question));
        self.history.push(Message::assistant(reply));
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
