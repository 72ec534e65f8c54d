//! Client vCenter.
//!
//! Inventaire via l'API REST vSphere Automation, arrêt forcé via l'endpoint
//! SOAP vim25 (`ShutdownHost_Task` n'a pas d'équivalent REST). Chaque appel
//! ouvre et ferme sa propre session : le client ne porte aucun état.

use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Hôte tel qu'énuméré par le vCenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryHost {
    /// Identifiant d'objet géré, ex. `host-42`.
    pub reference: String,
    /// Emplacement séparé par des `/`, ex. `/DC1/host/esxi01`.
    pub inventory_path: String,
}

impl InventoryHost {
    /// Nom affiché : dernier segment du chemin.
    pub fn name(&self) -> &str {
        self.inventory_path.rsplit('/').next().unwrap_or(&self.inventory_path)
    }
}

#[async_trait]
pub trait ManagementPlane: Send + Sync {
    /// Hôtes actuellement énumérables, dans l'ordre de l'inventaire.
    async fn list_hosts(&self) -> Result<Vec<InventoryHost>>;

    async fn shutdown_host(&self, host: &InventoryHost, force: bool) -> Result<()>;
}

#[derive(Clone)]
pub struct VsphereClient {
    base: String,
    username: String,
    password: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct DatacenterSummary {
    datacenter: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct HostSummary {
    host: String,
    name: String,
}

const SOAP_ACTION: &str = "urn:vim25/7.0";
const SESSION_HEADER: &str = "vmware-api-session-id";

impl VsphereClient {
    pub fn new(base: &str, username: &str, password: &str, insecure_tls: bool) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure_tls)
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            http,
        })
    }

    async fn rest_login(&self) -> Result<String> {
        let resp = self
            .http
            .post(format!("{}/api/session", self.base))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::RemoteCall(format!("vcenter login failed: HTTP {}", resp.status())));
        }
        Ok(resp.json::<String>().await?)
    }

    async fn rest_logout(&self, token: &str) {
        let res = self
            .http
            .delete(format!("{}/api/session", self.base))
            .header(SESSION_HEADER, token)
            .send()
            .await;
        if let Err(e) = res {
            warn!("vcenter logout failed: {e}");
        }
    }

    async fn rest_get<T: for<'de> Deserialize<'de>>(&self, token: &str, path: &str) -> Result<T> {
        let resp = self
            .http
            .get(format!("{}{}", self.base, path))
            .header(SESSION_HEADER, token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::RemoteCall(format!("GET {path}: HTTP {}", resp.status())));
        }
        Ok(resp.json::<T>().await?)
    }

    async fn list_with(&self, token: &str) -> Result<Vec<InventoryHost>> {
        let dcs: Vec<DatacenterSummary> = self.rest_get(token, "/api/vcenter/datacenter").await?;
        let mut out = Vec::new();
        for dc in dcs {
            let path = format!("/api/vcenter/host?datacenters={}", dc.datacenter);
            let hosts: Vec<HostSummary> = self.rest_get(token, &path).await?;
            out.extend(hosts.into_iter().map(|h| InventoryHost {
                reference: h.host,
                inventory_path: format!("/{}/host/{}", dc.name, h.name),
            }));
        }
        Ok(out)
    }

    async fn soap(&self, body: String, cookie: Option<&str>) -> Result<reqwest::Response> {
        let mut req = self
            .http
            .post(format!("{}/sdk", self.base))
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", SOAP_ACTION)
            .body(body);
        if let Some(c) = cookie {
            req = req.header(COOKIE, c);
        }
        let resp = req.send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::RemoteCall(format!(
                "SOAP HTTP {status}: {}",
                fault_string(&text).unwrap_or("no fault detail")
            )));
        }
        Ok(resp)
    }

    async fn soap_login(&self) -> Result<String> {
        let body = envelope(&format!(
            r#"<Login xmlns="urn:vim25"><_this type="SessionManager">SessionManager</_this><userName>{}</userName><password>{}</password></Login>"#,
            xml_escape(&self.username),
            xml_escape(&self.password)
        ));
        let resp = self.soap(body, None).await?;
        resp.headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("vmware_soap_session"))
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
            .ok_or_else(|| Error::RemoteCall("SOAP login returned no session cookie".into()))
    }

    async fn soap_logout(&self, cookie: &str) {
        let body = envelope(r#"<Logout xmlns="urn:vim25"><_this type="SessionManager">SessionManager</_this></Logout>"#);
        if let Err(e) = self.soap(body, Some(cookie)).await {
            warn!("SOAP logout failed: {e}");
        }
    }
}

#[async_trait]
impl ManagementPlane for VsphereClient {
    async fn list_hosts(&self) -> Result<Vec<InventoryHost>> {
        let token = self.rest_login().await?;
        let res = self.list_with(&token).await;
        self.rest_logout(&token).await;
        if let Ok(hosts) = &res {
            debug!(count = hosts.len(), "vcenter inventory listed");
        }
        res
    }

    async fn shutdown_host(&self, host: &InventoryHost, force: bool) -> Result<()> {
        let cookie = self.soap_login().await?;
        let body = envelope(&format!(
            r#"<ShutdownHost_Task xmlns="urn:vim25"><_this type="HostSystem">{}</_this><force>{force}</force></ShutdownHost_Task>"#,
            xml_escape(&host.reference)
        ));
        let res = self.soap(body, Some(&cookie)).await.map(|_| ());
        self.soap_logout(&cookie).await;
        res
    }
}

fn envelope(inner: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body>{inner}</soapenv:Body></soapenv:Envelope>"#
    )
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn fault_string(body: &str) -> Option<&str> {
    let start = body.find("<faultstring>")? + "<faultstring>".len();
    let end = body[start..].find("</faultstring>")? + start;
    Some(body[start..end].trim())
}
