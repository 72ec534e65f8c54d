use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::hosts::resolve_live;
use crate::vsphere::{InventoryHost, ManagementPlane};

/// Arrêt forcé à distance d'un hôte désigné par son nom.
#[derive(Clone)]
pub struct PowerController {
    inventory: Arc<dyn ManagementPlane>,
    timeout: Duration,
}

impl PowerController {
    pub fn new(inventory: Arc<dyn ManagementPlane>, timeout: Duration) -> Self {
        Self { inventory, timeout }
    }

    /// Résout à nouveau `name` dans l'inventaire vivant puis émet un unique
    /// appel d'arrêt. L'ensemble est borné par le timeout configuré.
    pub async fn shutdown(&self, name: &str) -> Result<InventoryHost> {
        tokio::time::timeout(self.timeout, self.shutdown_inner(name))
            .await
            .map_err(|_| Error::Timeout { operation: "host shutdown", after: self.timeout })?
    }

    async fn shutdown_inner(&self, name: &str) -> Result<InventoryHost> {
        let hosts = self.inventory.list_hosts().await?;
        let target = resolve_live(&hosts, name)?.clone();

        info!(host = name, reference = %target.reference, "issuing forced shutdown");
        if let Err(e) = self.inventory.shutdown_host(&target, true).await {
            warn!(host = name, "shutdown call failed: {e}");
            return Err(e);
        }
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolutionError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        hosts: Vec<InventoryHost>,
        calls: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl ManagementPlane for Counting {
        async fn list_hosts(&self) -> Result<Vec<InventoryHost>> {
            Ok(self.hosts.clone())
        }
        async fn shutdown_host(&self, host: &InventoryHost, force: bool) -> Result<()> {
            assert!(force);
            assert_eq!(host.reference, "host-1");
            tokio::time::sleep(self.delay).await;
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn plane(paths: &[&str], delay: Duration) -> Arc<Counting> {
        Arc::new(Counting {
            hosts: paths
                .iter()
                .enumerate()
                .map(|(i, p)| InventoryHost { reference: format!("host-{}", i + 1), inventory_path: p.to_string() })
                .collect(),
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    #[tokio::test]
    async fn test_single_match_shut_down_once() {
        let p = plane(&["/DC/host/esxi01", "/DC/host/esxi02"], Duration::ZERO);
        let pc = PowerController::new(p.clone(), Duration::from_secs(5));
        let target = pc.shutdown("esxi01").await.unwrap();
        assert_eq!(target.inventory_path, "/DC/host/esxi01");
        assert_eq!(p.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ambiguous_match_issues_no_call() {
        let p = plane(&["/DC/host/esxi01", "/DC/host/esxi01-old"], Duration::ZERO);
        let pc = PowerController::new(p.clone(), Duration::from_secs(5));
        let err = pc.shutdown("esxi01").await.unwrap_err();
        assert!(matches!(err, Error::Resolution(ResolutionError::Ambiguous { .. })));
        assert_eq!(p.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_absent_target_issues_no_call() {
        let p = plane(&["/DC/host/esxi01"], Duration::ZERO);
        let pc = PowerController::new(p.clone(), Duration::from_secs(5));
        let err = pc.shutdown("esxi07").await.unwrap_err();
        assert!(matches!(err, Error::Resolution(ResolutionError::NotFound { .. })));
        assert_eq!(p.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_timeout_is_distinct_failure() {
        let p = plane(&["/DC/host/esxi01"], Duration::from_secs(3600));
        let pc = PowerController::new(p, Duration::from_millis(20));
        let err = pc.shutdown("esxi01").await.unwrap_err();
        assert!(matches!(err, Error::Timeout { operation: "host shutdown", .. }));
    }
}
