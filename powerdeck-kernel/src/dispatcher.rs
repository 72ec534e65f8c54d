/**
 * DISPATCHER - sélection → confirmation → exécution
 *
 * FONCTIONNEMENT :
 * - Aucun état entre deux allers-retours : l'action en attente voyage dans
 *   la valeur des contrôles postés et se reconstruit depuis le payload
 * - Confirm lance l'actionneur sur sa propre tâche (indépendante de la
 *   requête HTTP) et supprime aussitôt le message de confirmation
 * - Un échec revient à l'opérateur sous forme de notice éphémère
 */

use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::hosts::HostResolver;
use crate::models::{ActionKind, BlockAction, Control, InteractionPayload, PendingAction};
use crate::power::PowerController;
use crate::prompts::{confirmation_prompt, failure_notice};
use crate::slack::{ChatApi, ResponseUpdate};
use crate::wol::WakeSender;

pub const BLOCK_ACTIONS: &str = "block_actions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Sélection → Confirmation : le menu est remplacé par Confirm/Cancel.
    Confirm(PendingAction),
    /// Confirmation → Exécutée.
    Execute(PendingAction),
    /// Confirmation → Annulée.
    Cancel(PendingAction),
    /// Contrôle inconnu : acquitté puis ignoré.
    Ignore,
}

pub fn transition(action: &BlockAction) -> Transition {
    let (Some(control), Some(value)) = (action.control(), action.selected_value()) else {
        return Transition::Ignore;
    };
    let pending = PendingAction { kind: control.kind(), target: value.to_string() };
    match control {
        Control::Select(_) => Transition::Confirm(pending),
        Control::Confirm(_) => Transition::Execute(pending),
        Control::Cancel(_) => Transition::Cancel(pending),
    }
}

#[derive(Debug)]
pub struct ActionReport {
    pub ticket: Uuid,
    pub action: PendingAction,
    pub outcome: Result<()>,
}

/// Poignée sur un actionneur lancé. La lâcher détache la tâche.
#[derive(Debug)]
pub struct ActionTask {
    pub ticket: Uuid,
    handle: JoinHandle<ActionReport>,
}

impl ActionTask {
    pub async fn join(self) -> std::result::Result<ActionReport, JoinError> {
        self.handle.await
    }
}

#[derive(Debug)]
pub struct Dispatched {
    pub transition: Transition,
    pub task: Option<ActionTask>,
}

#[derive(Clone)]
pub struct InteractionDispatcher {
    chat: Arc<dyn ChatApi>,
    resolver: HostResolver,
    power: PowerController,
    wake: WakeSender,
}

impl InteractionDispatcher {
    pub fn new(chat: Arc<dyn ChatApi>, resolver: HostResolver, power: PowerController, wake: WakeSender) -> Self {
        Self { chat, resolver, power, wake }
    }

    pub async fn dispatch(&self, payload: &InteractionPayload) -> Result<Dispatched> {
        if payload.kind != BLOCK_ACTIONS {
            return Ok(Dispatched { transition: Transition::Ignore, task: None });
        }
        let action = payload.actions.first().ok_or(Error::NoActions)?;
        let transition = transition(action);
        if transition != Transition::Ignore && payload.response_url.is_empty() {
            return Err(Error::MalformedInput("interaction without response_url".into()));
        }

        let mut task = None;
        match &transition {
            Transition::Confirm(pending) => {
                let prompt = confirmation_prompt(pending);
                self.chat.respond(&payload.response_url, &ResponseUpdate::Replace(prompt)).await?;
                info!(action = %pending.kind, host = %pending.target, "confirmation requested");
            }
            Transition::Execute(pending) => {
                let notify = match (payload.channel_id(), payload.user_id()) {
                    (Some(c), Some(u)) => Some((c.to_string(), u.to_string())),
                    _ => None,
                };
                task = Some(self.launch(pending.clone(), notify));
                self.chat.respond(&payload.response_url, &ResponseUpdate::Delete).await?;
            }
            Transition::Cancel(pending) => {
                self.chat.respond(&payload.response_url, &ResponseUpdate::Delete).await?;
                info!(action = %pending.kind, host = %pending.target, "cancelled");
            }
            Transition::Ignore => {
                info!(action_id = %action.action_id, block_id = %action.block_id, "unknown control ignored");
            }
        }
        Ok(Dispatched { transition, task })
    }

    fn launch(&self, action: PendingAction, notify: Option<(String, String)>) -> ActionTask {
        let ticket = Uuid::new_v4();
        let this = self.clone();
        info!(%ticket, action = %action.kind, host = %action.target, "actuator launched");

        let handle = tokio::spawn(async move {
            let outcome = this.execute(&action).await;
            match &outcome {
                Ok(()) => info!(%ticket, action = %action.kind, host = %action.target, "action completed"),
                Err(e) => {
                    warn!(%ticket, action = %action.kind, host = %action.target, "action failed: {e}");
                    if let Some((channel, user)) = &notify {
                        let notice = failure_notice(&action, e);
                        if let Err(post_err) = this.chat.post_ephemeral(channel, user, &notice).await {
                            warn!(%ticket, "failure notice not delivered: {post_err}");
                        }
                    }
                }
            }
            ActionReport { ticket, action, outcome }
        });
        ActionTask { ticket, handle }
    }

    /// Exécute l'actionneur de `action`, une seule tentative distante.
    pub async fn execute(&self, action: &PendingAction) -> Result<()> {
        match action.kind {
            ActionKind::Shutdown => self.power.shutdown(&action.target).await.map(|_| ()),
            ActionKind::Boot => {
                let host = self.resolver.boot_target(&action.target)?;
                self.wake.wake(&host.mac).await.map(|_| ())
            }
        }
    }
}
