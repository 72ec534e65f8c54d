/*!
Mock du client Slack

Implémente `ChatApi` en mémoire. Chaque post éphémère et chaque mise à jour
response_url est conservé pour les assertions ; les échecs s'activent à la
demande pour tester les chemins d'erreur.
*/

use async_trait::async_trait;
use parking_lot::Mutex;
use powerdeck_kernel::slack::{ChatApi, Element, Message, ResponseUpdate};
use powerdeck_kernel::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PostedMessage {
    pub channel: String,
    pub user: String,
    pub message: Message,
}

#[derive(Debug, Clone)]
pub struct ResponseRecord {
    pub url: String,
    pub update: ResponseUpdate,
}

#[derive(Clone, Default)]
pub struct MockChatApi {
    posted: Arc<Mutex<Vec<PostedMessage>>>,
    responses: Arc<Mutex<Vec<ResponseRecord>>>,
    fail_posts: Arc<AtomicBool>,
    fail_responses: Arc<AtomicBool>,
}

impl MockChatApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_posts(&self, fail: bool) {
        self.fail_posts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_responses(&self, fail: bool) {
        self.fail_responses.store(fail, Ordering::SeqCst);
    }

    pub fn posted(&self) -> Vec<PostedMessage> {
        self.posted.lock().clone()
    }

    pub fn responses(&self) -> Vec<ResponseRecord> {
        self.responses.lock().clone()
    }

    pub fn last_response(&self) -> Option<ResponseRecord> {
        self.responses.lock().last().cloned()
    }

    /// Valeurs proposées par le menu du dernier post.
    pub fn last_menu_options(&self) -> Vec<String> {
        let posted = self.posted.lock();
        let Some(last) = posted.last() else { return Vec::new() };
        last.message
            .elements()
            .flat_map(|(_, e)| match e {
                Element::StaticSelect { options, .. } => options.iter().map(|o| o.value.clone()).collect::<Vec<_>>(),
                _ => Vec::new(),
            })
            .collect()
    }

    pub fn clear(&self) {
        self.posted.lock().clear();
        self.responses.lock().clear();
    }
}

#[async_trait]
impl ChatApi for MockChatApi {
    async fn post_ephemeral(&self, channel: &str, user: &str, message: &Message) -> Result<()> {
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(Error::RemoteCall("chat.postEphemeral: channel_not_found".into()));
        }
        tracing::debug!(channel, user, "[MOCK] ephemeral posted");
        self.posted.lock().push(PostedMessage {
            channel: channel.into(),
            user: user.into(),
            message: message.clone(),
        });
        Ok(())
    }

    async fn respond(&self, response_url: &str, update: &ResponseUpdate) -> Result<()> {
        if self.fail_responses.load(Ordering::SeqCst) {
            return Err(Error::RemoteCall("response_url: HTTP 404 Not Found".into()));
        }
        tracing::debug!(response_url, "[MOCK] response_url update");
        self.responses.lock().push(ResponseRecord { url: response_url.into(), update: update.clone() });
        Ok(())
    }
}
