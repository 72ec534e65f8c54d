use async_trait::async_trait;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub const WAKE_PORT: u16 = 9;
pub const MAGIC_PACKET_LEN: usize = 102;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid MAC address {0:?}")]
pub struct MacParseError(pub String);

impl From<MacParseError> for Error {
    fn from(e: MacParseError) -> Self {
        Error::MalformedInput(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddress(pub [u8; 6]);

impl FromStr for MacAddress {
    type Err = MacParseError;

    /// Formats acceptés : `aa:bb:cc:dd:ee:ff`, `aa-bb-cc-dd-ee-ff` et `aabb.ccdd.eeff`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bad = || MacParseError(s.to_string());

        let groups: Vec<&str> = if s.contains(':') {
            s.split(':').collect()
        } else if s.contains('-') {
            s.split('-').collect()
        } else {
            s.split('.').collect()
        };
        let group_len = match groups.len() {
            6 => 2,
            3 => 4,
            _ => return Err(bad()),
        };
        if groups.len() == 3 && !s.contains('.') {
            return Err(bad());
        }

        let mut out = [0u8; 6];
        let mut i = 0;
        for g in groups {
            if g.len() != group_len || !g.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(bad());
            }
            for pair in g.as_bytes().chunks(2) {
                // deux chiffres hexa ASCII
                let txt = std::str::from_utf8(pair).map_err(|_| bad())?;
                out[i] = u8::from_str_radix(txt, 16).map_err(|_| bad())?;
                i += 1;
            }
        }
        Ok(MacAddress(out))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// 6 x 0xFF puis 16 fois l'adresse MAC.
pub fn magic_packet(mac: &MacAddress) -> [u8; MAGIC_PACKET_LEN] {
    let mut pkt = [0xFFu8; MAGIC_PACKET_LEN];
    for chunk in pkt[6..].chunks_exact_mut(6) {
        chunk.copy_from_slice(&mac.0);
    }
    pkt
}

/// Point de sortie des datagrammes. Remplacé dans les tests.
#[async_trait]
pub trait WakeTransport: Send + Sync {
    async fn send(&self, payload: &[u8], target: SocketAddr) -> Result<()>;
}

/// Vrai broadcast UDP depuis un port éphémère. Socket fermée après l'envoi.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpBroadcast;

#[async_trait]
impl WakeTransport for UdpBroadcast {
    async fn send(&self, payload: &[u8], target: SocketAddr) -> Result<()> {
        let sock = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(|e| Error::Transport(format!("bind error: {e}")))?;
        sock.set_broadcast(true)
            .map_err(|e| Error::Transport(format!("broadcast off: {e}")))?;
        let sent = sock
            .send_to(payload, target)
            .await
            .map_err(|e| Error::Transport(format!("send to {target} failed: {e}")))?;
        if sent != payload.len() {
            return Err(Error::Transport(format!("short send ({sent}/{} bytes)", payload.len())));
        }
        Ok(())
    }
}

/// Construit et envoie les magic packets vers l'adresse de broadcast configurée.
#[derive(Clone)]
pub struct WakeSender {
    transport: Arc<dyn WakeTransport>,
    target: SocketAddrV4,
    timeout: Duration,
}

impl WakeSender {
    pub fn new(transport: Arc<dyn WakeTransport>, broadcast: Ipv4Addr, port: u16, timeout: Duration) -> Self {
        Self { transport, target: SocketAddrV4::new(broadcast, port), timeout }
    }

    /// Parse `mac`, envoie un magic packet. Sans réponse : personne n'acquitte.
    pub async fn wake(&self, mac: &str) -> Result<MacAddress> {
        let mac: MacAddress = mac.parse()?;
        let pkt = magic_packet(&mac);
        debug!(%mac, target = %self.target, "sending magic packet");

        tokio::time::timeout(self.timeout, self.transport.send(&pkt, SocketAddr::V4(self.target)))
            .await
            .map_err(|_| Error::Timeout { operation: "wake packet send", after: self.timeout })??;

        info!(%mac, target = %self.target, "magic packet sent");
        Ok(mac)
    }
}
