use serde::{Deserialize, Serialize};

use crate::services::reading::ReadingSnapshot;
use crate::services::sessions::SessionStore;
use crate::services::upstream::SpreadClient;

/// Application state shared across all handlers
pub struct AppState {
    pub draw: DrawConfig,
    pub upstream: SpreadClient,
    pub sessions: SessionStore,
}

/// Static draw parameters the page is rendered against
#[derive(Clone)]
pub struct DrawConfig {
    pub product_id: String,
    pub deck_size: usize,
    pub pick_limit: usize,
}

#[derive(Serialize)]
pub struct ConfigResponse {
    pub product_id: String,
    pub deck_size: usize,
    pub pick_limit: usize,
}

/// One positioned card of a drawn spread, exactly as the upstream shapes it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpreadEntry {
    pub position: String,
    #[serde(rename = "positionIndex")]
    pub position_index: i64,
    pub card: SpreadCard,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpreadCard {
    pub id: String,
    pub name: String,
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeckInfo {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A complete draw held by a revealed reading. Stored verbatim; nothing
/// here reorders or rewrites what the upstream returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Spread {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub spread: Option<String>,
    #[serde(default)]
    pub deck: Option<DeckInfo>,
    #[serde(default)]
    pub seed: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    pub result: Vec<SpreadEntry>,
}

/// Envelope of the upstream spread endpoint
#[derive(Debug, Deserialize)]
pub struct SpreadResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub spread: Option<String>,
    #[serde(default)]
    pub deck: Option<DeckInfo>,
    #[serde(default)]
    pub seed: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub result: Option<Vec<SpreadEntry>>,
}

/// Body of POST /api/reading/{id}/action
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default)]
    pub slot: Option<usize>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Standard response for every reading endpoint
#[derive(Serialize)]
pub struct ReadingEnvelope {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading: Option<ReadingSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mailto: Option<String>,
}

impl ReadingEnvelope {
    pub fn state(reading: ReadingSnapshot) -> Self {
        Self {
            ok: true,
            error: None,
            message: None,
            id: None,
            reading: Some(reading),
            mailto: None,
        }
    }

    pub fn created(id: String, reading: ReadingSnapshot) -> Self {
        Self {
            id: Some(id),
            ..Self::state(reading)
        }
    }

    pub fn mail(url: String, reading: ReadingSnapshot) -> Self {
        Self {
            mailto: Some(url),
            ..Self::state(reading)
        }
    }

    pub fn rejected(error: &str, message: String, reading: Option<ReadingSnapshot>) -> Self {
        Self {
            ok: false,
            error: Some(error.to_string()),
            message: Some(message),
            id: None,
            reading,
            mailto: None,
        }
    }
}
