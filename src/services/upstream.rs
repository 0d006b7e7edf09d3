use log::{debug, warn};
use reqwest::header::CACHE_CONTROL;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::models::{Spread, SpreadResponse};
use crate::utils::clean_image_url;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("could not reach the spread service: {0}")]
    Network(String),
    #[error("spread service answered HTTP {0}")]
    Status(u16),
    #[error("spread service refused the draw: {0}")]
    Refused(String),
    #[error("spread service sent an unusable body: {0}")]
    Malformed(String),
}

impl UpstreamError {
    /// Stable key for the error taxonomy the page switches on.
    pub fn key(&self) -> &'static str {
        match self {
            UpstreamError::Network(_) => "network_failure",
            UpstreamError::Status(_) | UpstreamError::Refused(_) => "upstream_error",
            UpstreamError::Malformed(_) => "malformed_response",
        }
    }
}

/// Client for the external spread API. Intentionally a pure relay: no
/// retries, no timeout override, no auth.
#[derive(Clone)]
pub struct SpreadClient {
    http: Client,
    base_url: String,
}

impl SpreadClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn spread_url(&self, product_id: &str) -> String {
        format!("{}/api/products/{}/spread", self.base_url, product_id)
    }

    /// Fetch one draw for verbatim relay: the upstream's own status code
    /// and decoded JSON body, untouched. Only 2xx answers produce a body;
    /// everything else is classified for the caller's error envelope.
    pub async fn fetch_raw(&self, product_id: &str) -> Result<(u16, Value), UpstreamError> {
        let url = self.spread_url(product_id);
        debug!("Relaying spread request to {}", url);
        let response = self
            .http
            .get(&url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            warn!("Upstream answered {} for {}", status, url);
            return Err(UpstreamError::Status(status.as_u16()));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        Ok((status.as_u16(), body))
    }

    /// Typed draw for the reveal path. On top of `fetch_raw`'s checks this
    /// rejects `ok: false` bodies and empty result lists.
    pub async fn fetch_spread(&self, product_id: &str) -> Result<Spread, UpstreamError> {
        let url = self.spread_url(product_id);
        debug!("Drawing spread from {}", url);
        let response = self
            .http
            .get(&url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            warn!("Upstream answered {} for {}", status, url);
            return Err(UpstreamError::Status(status.as_u16()));
        }
        let body: SpreadResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        into_spread(body)
    }
}

/// Validate a decoded upstream body and normalize it into a held spread.
/// The only rewrite applied is trimming image URLs; card data is kept
/// exactly as sent.
pub fn into_spread(body: SpreadResponse) -> Result<Spread, UpstreamError> {
    if !body.ok {
        let reason = body.error.unwrap_or_else(|| "unspecified".to_string());
        return Err(UpstreamError::Refused(reason));
    }
    let mut result = match body.result {
        Some(entries) if !entries.is_empty() => entries,
        _ => return Err(UpstreamError::Malformed("missing or empty result list".to_string())),
    };
    for entry in &mut result {
        entry.card.image = clean_image_url(entry.card.image.take());
    }
    Ok(Spread {
        product_id: body.product_id,
        spread: body.spread,
        deck: body.deck,
        seed: body.seed,
        timestamp: body.timestamp,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(json: &str) -> SpreadResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_into_spread_accepts_good_body() {
        let body = decoded(
            r#"{
                "ok": true,
                "product_id": "angeles_12",
                "spread": "angeles",
                "deck": {"slug": "angeles", "name": "Mensaje de los Angeles"},
                "seed": "abc",
                "timestamp": "2025-03-02T10:00:00Z",
                "result": [
                    {"position": "Presente", "positionIndex": 0,
                     "card": {"id": "c1", "name": "El Sol", "meaning": "Luz."}}
                ]
            }"#,
        );
        let spread = into_spread(body).unwrap();
        assert_eq!(spread.product_id.as_deref(), Some("angeles_12"));
        assert_eq!(spread.result.len(), 1);
        assert_eq!(spread.result[0].card.name, "El Sol");
    }

    #[test]
    fn test_into_spread_trims_image_urls() {
        let body = decoded(
            r#"{
                "ok": true,
                "result": [
                    {"position": "Presente", "positionIndex": 0,
                     "card": {"id": "c1", "name": "El Sol", "meaning": "Luz.",
                              "image": "  https://cards.example/sol.jpg "}},
                    {"position": "Futuro", "positionIndex": 1,
                     "card": {"id": "c2", "name": "La Luna", "meaning": "Sombra.",
                              "image": "   "}}
                ]
            }"#,
        );
        let spread = into_spread(body).unwrap();
        assert_eq!(
            spread.result[0].card.image.as_deref(),
            Some("https://cards.example/sol.jpg")
        );
        // Whitespace-only URL collapses to absent
        assert_eq!(spread.result[1].card.image, None);
        // Everything else is untouched
        assert_eq!(spread.result[1].card.meaning, "Sombra.");
    }

    #[test]
    fn test_into_spread_rejects_refusal() {
        let body = decoded(r#"{"ok": false, "error": "deck_unavailable"}"#);
        let err = into_spread(body).unwrap_err();
        assert!(matches!(&err, UpstreamError::Refused(reason) if reason == "deck_unavailable"));
        assert_eq!(err.key(), "upstream_error");
    }

    #[test]
    fn test_into_spread_rejects_missing_or_empty_result() {
        let missing = decoded(r#"{"ok": true}"#);
        assert_eq!(into_spread(missing).unwrap_err().key(), "malformed_response");

        let empty = decoded(r#"{"ok": true, "result": []}"#);
        assert_eq!(into_spread(empty).unwrap_err().key(), "malformed_response");
    }

    #[test]
    fn test_error_keys_match_taxonomy() {
        assert_eq!(UpstreamError::Network("timed out".to_string()).key(), "network_failure");
        assert_eq!(UpstreamError::Status(503).key(), "upstream_error");
        assert_eq!(UpstreamError::Malformed("bad json".to_string()).key(), "malformed_response");
    }

    #[test]
    fn test_spread_url_joins_cleanly() {
        let client = SpreadClient::new("https://tarot-api.example/");
        assert_eq!(
            client.spread_url("angeles_12"),
            "https://tarot-api.example/api/products/angeles_12/spread"
        );
    }
}
