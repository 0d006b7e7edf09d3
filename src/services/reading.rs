use serde::Serialize;
use thiserror::Error;

use crate::models::Spread;
use crate::services::upstream::UpstreamError;

/// Lifecycle of one reading. A reading moves forward only; the single way
/// back is `reset`.
#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Idle,
    Selecting,
    Loading,
    Revealed(Spread),
    Errored { error: String, message: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum ReadingError {
    #[error("slot {0} is outside the deck")]
    SlotOutOfRange(usize),
    #[error("selection has {have} of {need} cards")]
    SelectionIncomplete { have: usize, need: usize },
}

/// One card-selection flow: a bounded set of distinct slot picks that,
/// once full, is exchanged for a drawn spread.
#[derive(Debug, Clone)]
pub struct Reading {
    deck_size: usize,
    pick_limit: usize,
    picked: Vec<usize>,
    phase: Phase,
}

impl Reading {
    pub fn new(deck_size: usize, pick_limit: usize) -> Self {
        Self {
            deck_size,
            pick_limit,
            picked: Vec::with_capacity(pick_limit),
            phase: Phase::Idle,
        }
    }

    /// Append a slot to the selection. Returns Ok(false) when the pick is
    /// ignored: slot already selected, selection full, fetch in flight, or
    /// spread already revealed.
    pub fn pick(&mut self, slot: usize) -> Result<bool, ReadingError> {
        if slot >= self.deck_size {
            return Err(ReadingError::SlotOutOfRange(slot));
        }
        match self.phase {
            Phase::Loading | Phase::Revealed(_) => return Ok(false),
            Phase::Idle | Phase::Selecting | Phase::Errored { .. } => {}
        }
        if self.picked.contains(&slot) || self.picked.len() >= self.pick_limit {
            return Ok(false);
        }
        self.picked.push(slot);
        if matches!(self.phase, Phase::Idle) {
            self.phase = Phase::Selecting;
        }
        Ok(true)
    }

    pub fn reached_limit(&self) -> bool {
        self.picked.len() == self.pick_limit
    }

    /// Gate for the upstream call. Ok(true) means the reading is now
    /// `Loading` and the caller owns the fetch; Ok(false) means a fetch is
    /// already in flight or the spread is already revealed, so no new call
    /// may be issued. Retrying after a failed draw keeps the selection.
    pub fn begin_fetch(&mut self) -> Result<bool, ReadingError> {
        if !self.reached_limit() {
            return Err(ReadingError::SelectionIncomplete {
                have: self.picked.len(),
                need: self.pick_limit,
            });
        }
        match self.phase {
            Phase::Loading | Phase::Revealed(_) => Ok(false),
            Phase::Idle | Phase::Selecting | Phase::Errored { .. } => {
                self.phase = Phase::Loading;
                Ok(true)
            }
        }
    }

    /// Apply a fetch outcome. Only a `Loading` reading accepts one; a late
    /// result arriving after a reset is dropped. Returns whether the
    /// outcome was applied.
    pub fn resolve(&mut self, outcome: Result<Spread, UpstreamError>) -> bool {
        if !matches!(self.phase, Phase::Loading) {
            return false;
        }
        self.phase = match outcome {
            Ok(spread) => Phase::Revealed(spread),
            Err(err) => Phase::Errored {
                error: err.key().to_string(),
                message: err.to_string(),
            },
        };
        true
    }

    pub fn reset(&mut self) {
        self.picked.clear();
        self.phase = Phase::Idle;
    }

    /// The revealed spread, if there is one.
    pub fn spread(&self) -> Option<&Spread> {
        match &self.phase {
            Phase::Revealed(spread) => Some(spread),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> ReadingSnapshot {
        let (phase, spread, error, message) = match &self.phase {
            Phase::Idle => ("idle", None, None, None),
            Phase::Selecting => ("selecting", None, None, None),
            Phase::Loading => ("loading", None, None, None),
            Phase::Revealed(spread) => ("revealed", Some(spread.clone()), None, None),
            Phase::Errored { error, message } => {
                ("errored", None, Some(error.clone()), Some(message.clone()))
            }
        };
        ReadingSnapshot {
            phase: phase.to_string(),
            picked: self.picked.clone(),
            pick_limit: self.pick_limit,
            deck_size: self.deck_size,
            spread,
            error,
            message,
        }
    }
}

/// Serializable view of a reading, shipped to the page as-is.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReadingSnapshot {
    pub phase: String,
    pub picked: Vec<usize>,
    pub pick_limit: usize,
    pub deck_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread: Option<Spread>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
