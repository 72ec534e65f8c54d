//! Adaptateur Slack Web API et sous-ensemble Block Kit posté par le pont.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

pub const SLACK_API_URL: &str = "https://slack.com/api";

// ===== Block Kit =====

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    PlainText { text: String },
    #[serde(rename = "mrkdwn")]
    Markdown { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        TextObject::PlainText { text: text.into() }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        TextObject::Markdown { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            TextObject::PlainText { text } | TextObject::Markdown { text } => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionObject {
    pub text: TextObject,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    StaticSelect {
        action_id: String,
        placeholder: TextObject,
        options: Vec<OptionObject>,
    },
    Button {
        action_id: String,
        text: TextObject,
        value: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        style: Option<ButtonStyle>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { text: TextObject },
    Actions { block_id: String, elements: Vec<Element> },
}

/// Texte de repli + blocs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub text: String,
    pub blocks: Vec<Block>,
}

impl Message {
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self { blocks: vec![Block::Section { text: TextObject::markdown(text.clone()) }], text }
    }

    /// Tous les éléments interactifs, dans l'ordre d'envoi.
    pub fn elements(&self) -> impl Iterator<Item = (&str, &Element)> {
        self.blocks.iter().flat_map(|b| match b {
            Block::Actions { block_id, elements } => elements.iter().map(move |e| (block_id.as_str(), e)).collect::<Vec<_>>(),
            Block::Section { .. } => Vec::new(),
        })
    }
}

/// Sort du message à l'origine d'une interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseUpdate {
    Replace(Message),
    Delete,
}

// ===== API =====

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn post_ephemeral(&self, channel: &str, user: &str, message: &Message) -> Result<()>;

    async fn respond(&self, response_url: &str, update: &ResponseUpdate) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct PostEphemeralRequest<'a> {
    channel: &'a str,
    user: &'a str,
    text: &'a str,
    blocks: &'a [Block],
}

#[derive(Debug, Serialize)]
struct ReplaceOriginal<'a> {
    replace_original: bool,
    text: &'a str,
    blocks: &'a [Block],
}

#[derive(Debug, Serialize)]
struct DeleteOriginal {
    delete_original: bool,
}

pub struct SlackClient {
    token: String,
    api_base: String,
    http: reqwest::Client,
}

impl SlackClient {
    pub fn new(token: impl Into<String>, api_base: &str) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            token: token.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }
}

#[async_trait]
impl ChatApi for SlackClient {
    async fn post_ephemeral(&self, channel: &str, user: &str, message: &Message) -> Result<()> {
        let body = PostEphemeralRequest { channel, user, text: &message.text, blocks: &message.blocks };
        let resp: SlackResponse = self
            .http
            .post(self.api_url("chat.postEphemeral"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;
        if !resp.ok {
            return Err(Error::RemoteCall(format!(
                "chat.postEphemeral: {}",
                resp.error.unwrap_or_else(|| "unknown error".into())
            )));
        }
        debug!(channel, user, "ephemeral message posted");
        Ok(())
    }

    async fn respond(&self, response_url: &str, update: &ResponseUpdate) -> Result<()> {
        let req = self.http.post(response_url);
        let req = match update {
            ResponseUpdate::Replace(m) => req.json(&ReplaceOriginal { replace_original: true, text: &m.text, blocks: &m.blocks }),
            ResponseUpdate::Delete => req.json(&DeleteOriginal { delete_original: true }),
        };
        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(Error::RemoteCall(format!("response_url: HTTP {}", resp.status())));
        }
        Ok(())
    }
}
