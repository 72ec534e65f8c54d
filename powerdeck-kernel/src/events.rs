//! Réception Events API : handshake url_verification et commandes `app_mention`.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::hosts::{select_options, HostResolver};
use crate::models::ActionKind;
use crate::prompts::selection_prompt;
use crate::slack::ChatApi;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    UrlVerification { challenge: String },
    EventCallback { event: InnerEvent },
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InnerEvent {
    AppMention {
        #[serde(default)]
        user: String,
        #[serde(default)]
        channel: String,
        #[serde(default)]
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Jeton renvoyé tel quel en `text/plain`.
    Challenge(String),
    Prompted(ActionKind),
    Ignored,
}

/// Deuxième mot de la mention (`<@U123> shutdown`).
pub fn parse_command(text: &str) -> Option<ActionKind> {
    match text.split_whitespace().nth(1)? {
        "shutdown" => Some(ActionKind::Shutdown),
        "boot" => Some(ActionKind::Boot),
        _ => None,
    }
}

#[derive(Clone)]
pub struct EventRouter {
    resolver: HostResolver,
    chat: Arc<dyn ChatApi>,
}

impl EventRouter {
    pub fn new(resolver: HostResolver, chat: Arc<dyn ChatApi>) -> Self {
        Self { resolver, chat }
    }

    pub async fn route(&self, body: &[u8]) -> Result<RouteOutcome> {
        let envelope: Envelope = serde_json::from_slice(body)?;
        match envelope {
            Envelope::UrlVerification { challenge } => {
                info!("url verification handshake");
                Ok(RouteOutcome::Challenge(challenge))
            }
            Envelope::EventCallback { event: InnerEvent::AppMention { user, channel, text } } => {
                let Some(kind) = parse_command(&text) else {
                    debug!(%text, "mention without a known command");
                    return Ok(RouteOutcome::Ignored);
                };
                self.prompt(kind, &channel, &user).await?;
                Ok(RouteOutcome::Prompted(kind))
            }
            Envelope::EventCallback { event: InnerEvent::Other } | Envelope::Unrecognized => {
                debug!("event ignored");
                Ok(RouteOutcome::Ignored)
            }
        }
    }

    async fn prompt(&self, kind: ActionKind, channel: &str, user: &str) -> Result<()> {
        let hosts = self.resolver.hosts_for(kind).await.map_err(|e| {
            warn!(action = %kind, "host listing failed: {e}");
            e
        })?;
        let message = selection_prompt(kind, select_options(&hosts));
        self.chat.post_ephemeral(channel, user, &message).await.map_err(|e| {
            warn!(action = %kind, channel, user, "posting selection menu failed: {e}");
            e
        })?;
        info!(action = %kind, channel, user, hosts = hosts.len(), "selection menu posted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("<@U0BOT> shutdown"), Some(ActionKind::Shutdown));
        assert_eq!(parse_command("@bot   boot now"), Some(ActionKind::Boot));
        assert_eq!(parse_command("@bot reboot"), None);
        assert_eq!(parse_command("@bot"), None);
        assert_eq!(parse_command("@bot Shutdown"), None);
    }

    #[test]
    fn test_envelope_kinds() {
        let e: Envelope = serde_json::from_str(r#"{"type":"url_verification","challenge":"abc123","token":"x"}"#).unwrap();
        assert!(matches!(e, Envelope::UrlVerification { challenge } if challenge == "abc123"));

        let e: Envelope = serde_json::from_str(
            r#"{"type":"event_callback","team_id":"T1","event":{"type":"app_mention","user":"U1","channel":"C1","text":"<@B> boot","ts":"1.2"}}"#,
        )
        .unwrap();
        assert!(matches!(e, Envelope::EventCallback { event: InnerEvent::AppMention { .. } }));

        let e: Envelope = serde_json::from_str(r#"{"type":"event_callback","event":{"type":"reaction_added","user":"U1"}}"#).unwrap();
        assert!(matches!(e, Envelope::EventCallback { event: InnerEvent::Other }));

        let e: Envelope = serde_json::from_str(r#"{"type":"app_rate_limited","minute_rate_limited":1}"#).unwrap();
        assert!(matches!(e, Envelope::Unrecognized));
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(serde_json::from_slice::<Envelope>(b"{not json").is_err());
        let err: Error = serde_json::from_slice::<Envelope>(b"[]").unwrap_err().into();
        assert!(matches!(err, Error::MalformedInput(_)));
    }
}
