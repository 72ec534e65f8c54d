/*!
Mock du vCenter

`ManagementPlane` en mémoire : liste d'hôtes modifiable, journal des arrêts,
échecs optionnels et délai optionnel sur l'arrêt (pour provoquer les timeouts).
*/

use async_trait::async_trait;
use parking_lot::Mutex;
use powerdeck_kernel::vsphere::{InventoryHost, ManagementPlane};
use powerdeck_kernel::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Default)]
pub struct MockInventory {
    hosts: Arc<Mutex<Vec<InventoryHost>>>,
    shutdowns: Arc<Mutex<Vec<InventoryHost>>>,
    list_error: Arc<Mutex<Option<String>>>,
    shutdown_error: Arc<Mutex<Option<String>>>,
    shutdown_delay: Arc<Mutex<Duration>>,
}

impl MockInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remplace l'inventaire ; références attribuées `host-1`, `host-2`, ...
    pub fn set_paths(&self, paths: &[&str]) {
        *self.hosts.lock() = paths
            .iter()
            .enumerate()
            .map(|(i, p)| InventoryHost { reference: format!("host-{}", i + 1), inventory_path: p.to_string() })
            .collect();
    }

    pub fn fail_listing(&self, msg: Option<&str>) {
        *self.list_error.lock() = msg.map(Into::into);
    }

    pub fn fail_shutdown(&self, msg: Option<&str>) {
        *self.shutdown_error.lock() = msg.map(Into::into);
    }

    pub fn delay_shutdown(&self, delay: Duration) {
        *self.shutdown_delay.lock() = delay;
    }

    /// Hôtes ayant reçu un arrêt, dans l'ordre des appels.
    pub fn shutdowns(&self) -> Vec<InventoryHost> {
        self.shutdowns.lock().clone()
    }
}

#[async_trait]
impl ManagementPlane for MockInventory {
    async fn list_hosts(&self) -> Result<Vec<InventoryHost>> {
        if let Some(msg) = self.list_error.lock().clone() {
            return Err(Error::RemoteCall(msg));
        }
        Ok(self.hosts.lock().clone())
    }

    async fn shutdown_host(&self, host: &InventoryHost, _force: bool) -> Result<()> {
        let delay = *self.shutdown_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(msg) = self.shutdown_error.lock().clone() {
            return Err(Error::RemoteCall(msg));
        }
        self.shutdowns.lock().push(host.clone());
        tracing::debug!(host = %host.inventory_path, "[MOCK] shutdown issued");
        Ok(())
    }
}
