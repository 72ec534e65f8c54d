/*!
Harness de test du kernel

Monte le vrai routeur axum sur les mocks, signe les requêtes avec le secret
configuré et les envoie via `tower::ServiceExt::oneshot`.
*/

use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use powerdeck_kernel::config::{BridgeConfig, HostConf};
use powerdeck_kernel::dispatcher::Dispatched;
use powerdeck_kernel::http::build_router;
use powerdeck_kernel::signature::{SignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use powerdeck_kernel::models::InteractionPayload;
use powerdeck_kernel::state::{AppState, Collaborators};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use tower::ServiceExt;
use tracing_subscriber::EnvFilter;

use crate::chat_stub::MockChatApi;
use crate::inventory_stub::MockInventory;
use crate::payloads;
use crate::wake_stub::RecordingTransport;

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub fn test_config(boot_targets: Vec<HostConf>) -> BridgeConfig {
    let mut cfg = BridgeConfig {
        vcenter_url: "https://vcsa.test".into(),
        auth_id: "administrator@vsphere.local".into(),
        auth_pass: "pass".into(),
        slack_signing_secret: SIGNING_SECRET.into(),
        slack_token: "xoxb-test".into(),
        esxi_hosts: boot_targets,
        ..Default::default()
    };
    cfg.timeouts.shutdown_secs = 2;
    cfg.timeouts.wake_secs = 2;
    cfg
}

pub struct TestHarness {
    pub chat: MockChatApi,
    pub inventory: MockInventory,
    pub wake: RecordingTransport,
    pub config: BridgeConfig,
    verifier: SignatureVerifier,
    state: AppState,
    router: Router,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(test_config(Vec::new()))
    }

    pub fn with_boot_targets(targets: &[(&str, &str)]) -> Self {
        let targets = targets
            .iter()
            .map(|(name, mac)| HostConf { name: name.to_string(), mac: mac.to_string() })
            .collect();
        Self::with_config(test_config(targets))
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("powerdeck_kernel=debug,powerdeck_devkit=debug"))
            .with_test_writer()
            .try_init()
            .ok();

        let chat = MockChatApi::new();
        let inventory = MockInventory::new();
        let wake = RecordingTransport::new();
        let state = AppState::new(
            &config,
            Collaborators {
                chat: Arc::new(chat.clone()),
                inventory: Arc::new(inventory.clone()),
                wake: Arc::new(wake.clone()),
            },
        );

        Self {
            verifier: SignatureVerifier::new(config.slack_signing_secret.clone(), config.signature_tolerance()),
            router: build_router(state.clone()),
            state,
            chat,
            inventory,
            wake,
            config,
        }
    }

    /// POST signé valablement pour l'instant présent.
    pub fn signed_request(&self, path: &str, content_type: &str, body: Vec<u8>) -> Request<Body> {
        let ts = OffsetDateTime::now_utc().unix_timestamp();
        self.request_signed_at(path, content_type, body, ts)
    }

    pub fn request_signed_at(&self, path: &str, content_type: &str, body: Vec<u8>, ts: i64) -> Request<Body> {
        let signature = self.verifier.sign(ts, &body);
        Request::builder()
            .method("POST")
            .uri(path)
            .header(CONTENT_TYPE, content_type)
            .header(TIMESTAMP_HEADER, ts.to_string())
            .header(SIGNATURE_HEADER, signature)
            .body(Body::from(body))
            .expect("static request parts are valid")
    }

    pub async fn send_raw(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.expect("router is infallible")
    }

    /// Passe par le routeur, renvoie le statut et le corps texte.
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, String) {
        let resp = self.send_raw(req).await;
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("readable body");
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn post_event(&self, envelope: &Value) -> (StatusCode, String) {
        let req = self.signed_request("/slack/events", "application/json", envelope.to_string().into_bytes());
        self.send(req).await
    }

    pub async fn post_action(&self, payload: &Value) -> (StatusCode, String) {
        let body = payloads::form_encode(payload).into_bytes();
        let req = self.signed_request("/slack/actions", FORM_CONTENT_TYPE, body);
        self.send(req).await
    }

    /// Appel direct du dispatcher, sans HTTP ni signature : donne accès à la tâche lancée.
    pub async fn dispatch(&self, payload: &Value) -> powerdeck_kernel::Result<Dispatched> {
        let payload: InteractionPayload = serde_json::from_value(payload.clone())?;
        self.state.dispatcher.dispatch(&payload).await
    }

    /// `@bot <commande>` de U1 dans C1.
    pub async fn mention(&self, command: &str) -> (StatusCode, String) {
        self.post_event(&payloads::app_mention("U1", "C1", &format!("<@U0BOT> {command}"))).await
    }

    pub async fn select(&self, block_id: &str, host: &str) -> (StatusCode, String) {
        self.post_action(&payloads::block_actions("U1", "C1", vec![payloads::select_action(block_id, host)])).await
    }

    pub async fn press(&self, action_id: &str, block_id: &str, host: &str) -> (StatusCode, String) {
        self.post_action(&payloads::block_actions("U1", "C1", vec![payloads::button_action(action_id, block_id, host)]))
            .await
    }

    /// Sonde `cond` jusqu'à ce qu'elle soit vraie ou que `timeout_ms` soit écoulé.
    pub async fn wait_for<F>(&self, timeout_ms: u64, cond: F) -> bool
    where
        F: Fn(&Self) -> bool,
    {
        let start = Instant::now();
        while start.elapsed() < Duration::from_millis(timeout_ms) {
            if cond(self) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cond(self)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
