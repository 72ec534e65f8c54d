use std::sync::Arc;

use crate::config::HostConf;
use crate::error::{ResolutionError, Result};
use crate::models::{ActionKind, Host};
use crate::slack::{OptionObject, TextObject};
use crate::vsphere::{InventoryHost, ManagementPlane};

/// Hôtes sélectionnables : inventaire vivant pour shutdown, catalogue statique pour boot.
#[derive(Clone)]
pub struct HostResolver {
    inventory: Arc<dyn ManagementPlane>,
    catalog: Arc<[HostConf]>,
}

impl HostResolver {
    pub fn new(inventory: Arc<dyn ManagementPlane>, catalog: Vec<HostConf>) -> Self {
        Self { inventory, catalog: catalog.into() }
    }

    pub async fn live_hosts(&self) -> Result<Vec<Host>> {
        let hosts = self.inventory.list_hosts().await?;
        Ok(hosts
            .into_iter()
            .map(|h| Host { name: h.name().to_string(), inventory_path: h.inventory_path, mac_address: None })
            .collect())
    }

    pub fn static_hosts(&self) -> Vec<Host> {
        self.catalog
            .iter()
            .map(|h| Host { name: h.name.clone(), inventory_path: h.name.clone(), mac_address: Some(h.mac.clone()) })
            .collect()
    }

    pub async fn hosts_for(&self, kind: ActionKind) -> Result<Vec<Host>> {
        match kind {
            ActionKind::Shutdown => self.live_hosts().await,
            ActionKind::Boot => Ok(self.static_hosts()),
        }
    }

    /// Cible de boot par nom configuré exact.
    pub fn boot_target(&self, name: &str) -> std::result::Result<&HostConf, ResolutionError> {
        let mut hits = self.catalog.iter().filter(|h| h.name == name);
        match (hits.next(), hits.next()) {
            (Some(h), None) => Ok(h),
            (None, _) => Err(ResolutionError::NotFound { name: name.into() }),
            (Some(_), Some(_)) => Err(ResolutionError::Ambiguous {
                name: name.into(),
                matches: self.catalog.iter().filter(|h| h.name == name).map(|h| h.mac.clone()).collect(),
            }),
        }
    }
}

/// Options du menu ; la valeur est le nom de l'hôte, inchangé.
pub fn select_options(hosts: &[Host]) -> Vec<OptionObject> {
    hosts
        .iter()
        .map(|h| OptionObject { text: TextObject::plain(&h.name), value: h.name.clone() })
        .collect()
}

/// Tout chemin contenant `name` est candidat ; plusieurs candidats = erreur,
/// et le candidat unique doit porter exactement ce nom.
pub fn resolve_live<'a>(hosts: &'a [InventoryHost], name: &str) -> std::result::Result<&'a InventoryHost, ResolutionError> {
    let candidates: Vec<&InventoryHost> = hosts.iter().filter(|h| h.inventory_path.contains(name)).collect();
    match candidates.as_slice() {
        [one] if one.name() == name => Ok(*one),
        [] | [_] => Err(ResolutionError::NotFound { name: name.into() }),
        many => Err(ResolutionError::Ambiguous {
            name: name.into(),
            matches: many.iter().map(|h| h.inventory_path.clone()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;

    struct Fixed(Vec<InventoryHost>);

    #[async_trait]
    impl ManagementPlane for Fixed {
        async fn list_hosts(&self) -> Result<Vec<InventoryHost>> {
            Ok(self.0.clone())
        }
        async fn shutdown_host(&self, _: &InventoryHost, _: bool) -> Result<()> {
            Ok(())
        }
    }

    struct Down;

    #[async_trait]
    impl ManagementPlane for Down {
        async fn list_hosts(&self) -> Result<Vec<InventoryHost>> {
            Err(Error::RemoteCall("connection refused".into()))
        }
        async fn shutdown_host(&self, _: &InventoryHost, _: bool) -> Result<()> {
            Ok(())
        }
    }

    fn inv(path: &str) -> InventoryHost {
        InventoryHost { reference: format!("host-{}", path.len()), inventory_path: path.into() }
    }

    #[tokio::test]
    async fn test_live_hosts_keep_inventory_order() {
        let r = HostResolver::new(
            Arc::new(Fixed(vec![inv("/DC/host/esxi02"), inv("/DC/host/c1/esxi01")])),
            vec![],
        );
        let hosts = r.hosts_for(ActionKind::Shutdown).await.unwrap();
        let names: Vec<&str> = hosts.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["esxi02", "esxi01"]);

        let opts = select_options(&hosts);
        assert_eq!(opts[1].value, "esxi01");
        assert_eq!(opts[1].text.text(), "esxi01");
    }

    #[tokio::test]
    async fn test_live_failure_propagates() {
        let r = HostResolver::new(Arc::new(Down), vec![]);
        assert!(matches!(r.live_hosts().await, Err(Error::RemoteCall(_))));
    }

    #[tokio::test]
    async fn test_static_catalog_for_boot() {
        let r = HostResolver::new(
            Arc::new(Down),
            vec![HostConf { name: "esxi03".into(), mac: "AA:BB:CC:DD:EE:FF".into() }],
        );
        let hosts = r.hosts_for(ActionKind::Boot).await.unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].mac_address.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
        assert_eq!(r.boot_target("esxi03").unwrap().mac, "AA:BB:CC:DD:EE:FF");
        // pas de normalisation
        assert!(matches!(r.boot_target("ESXI03"), Err(ResolutionError::NotFound { .. })));
    }

    #[test]
    fn test_boot_target_duplicate_names_ambiguous() {
        let r = HostResolver::new(
            Arc::new(Down),
            vec![
                HostConf { name: "esxi03".into(), mac: "AA:BB:CC:DD:EE:01".into() },
                HostConf { name: "esxi03".into(), mac: "AA:BB:CC:DD:EE:02".into() },
            ],
        );
        assert!(matches!(r.boot_target("esxi03"), Err(ResolutionError::Ambiguous { .. })));
    }

    #[test]
    fn test_resolve_live() {
        let hosts = vec![inv("/DC/host/esxi01"), inv("/DC/host/esxi010"), inv("/DC/host/esxi02")];
        assert_eq!(resolve_live(&hosts, "esxi02").unwrap().inventory_path, "/DC/host/esxi02");
        assert!(matches!(resolve_live(&hosts, "esxi01"), Err(ResolutionError::Ambiguous { matches, .. }) if matches.len() == 2));
        assert!(matches!(resolve_live(&hosts, "esxi09"), Err(ResolutionError::NotFound { .. })));
        // contenu dans le chemin sans être le nom de l'hôte
        assert!(matches!(resolve_live(&hosts, "DC"), Err(ResolutionError::Ambiguous { .. })));
        assert!(matches!(resolve_live(&hosts, "esxi0"), Err(ResolutionError::Ambiguous { .. })));
        assert!(matches!(resolve_live(&hosts[2..], "esxi0"), Err(ResolutionError::NotFound { .. })));
    }
}
