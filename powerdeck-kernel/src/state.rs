use std::sync::Arc;

use crate::config::BridgeConfig;
use crate::dispatcher::InteractionDispatcher;
use crate::events::EventRouter;
use crate::hosts::HostResolver;
use crate::power::PowerController;
use crate::signature::SignatureVerifier;
use crate::slack::ChatApi;
use crate::vsphere::ManagementPlane;
use crate::wol::{WakeSender, WakeTransport};

/// Clients vivant aussi longtemps que le processus, partagés en lecture seule.
#[derive(Clone)]
pub struct Collaborators {
    pub chat: Arc<dyn ChatApi>,
    pub inventory: Arc<dyn ManagementPlane>,
    pub wake: Arc<dyn WakeTransport>,
}

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<SignatureVerifier>,
    pub events: EventRouter,
    pub dispatcher: InteractionDispatcher,
}

impl AppState {
    pub fn new(cfg: &BridgeConfig, deps: Collaborators) -> Self {
        let resolver = HostResolver::new(deps.inventory.clone(), cfg.esxi_hosts.clone());
        let power = PowerController::new(deps.inventory, cfg.shutdown_timeout());
        let wake = WakeSender::new(deps.wake, cfg.wol.broadcast, cfg.wol.port, cfg.wake_timeout());

        Self {
            verifier: Arc::new(SignatureVerifier::new(cfg.slack_signing_secret.clone(), cfg.signature_tolerance())),
            events: EventRouter::new(resolver.clone(), deps.chat.clone()),
            dispatcher: InteractionDispatcher::new(deps.chat, resolver, power, wake),
        }
    }
}
