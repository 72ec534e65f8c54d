use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::slack::SLACK_API_URL;
use crate::wol::{MacAddress, WAKE_PORT};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("invalid config {path}: {source}")]
    Parse { path: String, source: serde_yaml::Error },
    #[error("missing required setting {0}")]
    Missing(&'static str),
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct BridgeConfig {
    #[serde(default)]
    pub vcenter_url: String,
    #[serde(default)]
    pub auth_id: String,
    #[serde(default)]
    pub auth_pass: String,
    #[serde(default)]
    pub slack_signing_secret: String,
    #[serde(default)]
    pub slack_token: String,
    #[serde(default)]
    pub esxi_hosts: Vec<HostConf>,
    #[serde(default)]
    pub server: ServerConf,
    #[serde(default)]
    pub wol: WolConf,
    #[serde(default)]
    pub timeouts: TimeoutConf,
}

/// Cible de boot : un hôte éteint n'apparaît pas dans l'inventaire vivant.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HostConf {
    pub name: String,
    pub mac: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConf {
    pub listen: SocketAddr,
    pub slack_api_base: String,
    pub signature_tolerance_secs: u64,
    /// L'appliance vCenter sert souvent un certificat auto-signé.
    pub insecure_tls: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct WolConf {
    pub broadcast: Ipv4Addr,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TimeoutConf {
    pub shutdown_secs: u64,
    pub wake_secs: u64,
}

impl Default for ServerConf {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            slack_api_base: SLACK_API_URL.into(),
            signature_tolerance_secs: 300,
            insecure_tls: true,
        }
    }
}

impl Default for WolConf {
    fn default() -> Self {
        Self { broadcast: Ipv4Addr::BROADCAST, port: WAKE_PORT }
    }
}

impl Default for TimeoutConf {
    fn default() -> Self {
        Self { shutdown_secs: 30, wake_secs: 5 }
    }
}

impl BridgeConfig {
    pub fn signature_tolerance(&self) -> Duration {
        Duration::from_secs(self.server.signature_tolerance_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.shutdown_secs)
    }

    pub fn wake_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.wake_secs)
    }

    pub fn from_yaml(path: &str, txt: &str) -> Result<Self, ConfigError> {
        if txt.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(txt).map_err(|source| ConfigError::Parse { path: path.into(), source })
    }

    /// Les variables non vides l'emportent sur le fichier.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields: [(&str, &mut String); 5] = [
            ("VCENTER_URL", &mut self.vcenter_url),
            ("AUTH_ID", &mut self.auth_id),
            ("AUTH_PASS", &mut self.auth_pass),
            ("SLACK_SIGNING_SECRET", &mut self.slack_signing_secret),
            ("SLACK_TOKEN", &mut self.slack_token),
        ];
        for (var, slot) in fields {
            if let Some(v) = lookup(var).filter(|v| !v.is_empty()) {
                *slot = v;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slack_signing_secret.is_empty() {
            return Err(ConfigError::Missing("slack_signing_secret"));
        }
        if self.slack_token.is_empty() {
            return Err(ConfigError::Missing("slack_token"));
        }
        if self.vcenter_url.is_empty() {
            return Err(ConfigError::Missing("vcenter_url"));
        }
        for h in &self.esxi_hosts {
            if h.mac.parse::<MacAddress>().is_err() {
                warn!(host = %h.name, mac = %h.mac, "boot target has an unparseable MAC, waking it will fail");
            }
        }
        Ok(())
    }
}

/// Lit `POWERDECK_CONFIG` (défaut `env.yaml`), puis les surcharges d'environnement.
pub async fn load_config() -> Result<BridgeConfig, ConfigError> {
    let path = std::env::var("POWERDECK_CONFIG").unwrap_or_else(|_| "env.yaml".into());
    let mut cfg = if Path::new(&path).exists() {
        let txt = fs::read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
        BridgeConfig::from_yaml(&path, &txt)?
    } else {
        warn!(%path, "no config file, relying on environment");
        BridgeConfig::default()
    };
    cfg.apply_env(|k| std::env::var(k).ok());
    cfg.validate()?;
    info!(%path, boot_targets = cfg.esxi_hosts.len(), "config loaded");
    Ok(cfg)
}
