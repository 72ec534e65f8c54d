/**
 * POWERDECK KERNEL - point d'entrée
 *
 * RÔLE :
 * Charge env.yaml (+ .env), construit une seule fois les clients Slack et
 * vCenter, les branche sur le routeur et sert jusqu'au Ctrl-C.
 */

use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use powerdeck_kernel::config::load_config;
use powerdeck_kernel::http::build_router;
use powerdeck_kernel::slack::SlackClient;
use powerdeck_kernel::state::{AppState, Collaborators};
use powerdeck_kernel::vsphere::VsphereClient;
use powerdeck_kernel::wol::UdpBroadcast;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env facultatif
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("powerdeck_kernel=info,powerdeck=info,tower_http=info")),
        )
        .init();

    let cfg = load_config().await.context("loading configuration")?;

    let chat = SlackClient::new(cfg.slack_token.clone(), &cfg.server.slack_api_base)
        .context("building Slack client")?;
    let inventory = VsphereClient::new(&cfg.vcenter_url, &cfg.auth_id, &cfg.auth_pass, cfg.server.insecure_tls)
        .context("building vCenter client")?;

    let app_state = AppState::new(
        &cfg,
        Collaborators { chat: Arc::new(chat), inventory: Arc::new(inventory), wake: Arc::new(UdpBroadcast) },
    );
    let app = build_router(app_state);

    let addr = cfg.server.listen;
    let listener = TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    info!("listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutting down");
        })
        .await
        .context("http server")?;
    Ok(())
}
