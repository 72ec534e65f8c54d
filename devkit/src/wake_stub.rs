use async_trait::async_trait;
use parking_lot::Mutex;
use powerdeck_kernel::wol::WakeTransport;
use powerdeck_kernel::{Error, Result};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentDatagram {
    pub payload: Vec<u8>,
    pub target: SocketAddr,
}

/// Capture les datagrammes de réveil au lieu de les émettre.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<SentDatagram>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentDatagram> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl WakeTransport for RecordingTransport {
    async fn send(&self, payload: &[u8], target: SocketAddr) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Transport("send failed: Network is unreachable (os error 101)".into()));
        }
        self.sent.lock().push(SentDatagram { payload: payload.to_vec(), target });
        Ok(())
    }
}
