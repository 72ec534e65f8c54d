/**
 * SIGNATURE SLACK - vérification des requêtes entrantes (schéma v0)
 *
 * FONCTIONNEMENT :
 * - `X-Slack-Signature` = `v0=` + HMAC-SHA256 hexadécimal (minuscules) de
 *   `v0:{X-Slack-Request-Timestamp}:{corps brut}`, clé = signing secret
 * - Timestamp hors fenêtre de tolérance : requête refusée (anti-rejeu)
 * - Comparaison du digest en temps constant
 */

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";
const VERSION: &str = "v0";
const DIGEST_HEX_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing header {0}")]
    MissingHeader(&'static str),
    #[error("malformed header {0}")]
    MalformedHeader(&'static str),
    #[error("stale request (timestamp {timestamp}, now {now})")]
    Stale { timestamp: i64, now: i64 },
    #[error("signature mismatch")]
    Mismatch,
}

#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
    tolerance: Duration,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("tolerance", &self.tolerance)
            .finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>, tolerance: Duration) -> Self {
        Self { secret: secret.into(), tolerance }
    }

    /// Vérifie contre l'horloge courante.
    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), SignatureError> {
        self.verify_at(headers, body, OffsetDateTime::now_utc().unix_timestamp())
    }

    pub fn verify_at(&self, headers: &HeaderMap, body: &[u8], now: i64) -> Result<(), SignatureError> {
        let timestamp = header_str(headers, TIMESTAMP_HEADER)?;
        let signature = header_str(headers, SIGNATURE_HEADER)?;

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| SignatureError::MalformedHeader(TIMESTAMP_HEADER))?;
        if now.abs_diff(ts) > self.tolerance.as_secs() {
            return Err(SignatureError::Stale { timestamp: ts, now });
        }

        let provided = signature
            .strip_prefix("v0=")
            .filter(|hex_sig| is_lower_hex_digest(hex_sig))
            .and_then(|hex_sig| hex::decode(hex_sig).ok())
            .ok_or(SignatureError::MalformedHeader(SIGNATURE_HEADER))?;

        // verify_slice compare en temps constant
        self.mac(timestamp, body)
            .verify_slice(&provided)
            .map_err(|_| SignatureError::Mismatch)
    }

    /// Valeur d'en-tête que Slack enverrait pour `body` à `timestamp`.
    pub fn sign(&self, timestamp: i64, body: &[u8]) -> String {
        let digest = self.mac(&timestamp.to_string(), body).finalize().into_bytes();
        format!("{VERSION}={}", hex::encode(digest))
    }

    fn mac(&self, timestamp: &str, body: &[u8]) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(VERSION.as_bytes());
        mac.update(b":");
        mac.update(timestamp.as_bytes());
        mac.update(b":");
        mac.update(body);
        mac
    }
}

/// Slack n'émet que de l'hexadécimal minuscule : toute autre casse est une altération.
fn is_lower_hex_digest(s: &str) -> bool {
    s.len() == DIGEST_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, SignatureError> {
    headers
        .get(name)
        .ok_or(SignatureError::MissingHeader(name))?
        .to_str()
        .map_err(|_| SignatureError::MalformedHeader(name))
}
