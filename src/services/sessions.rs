use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::{debug, info};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::services::reading::Reading;

const ID_LEN: usize = 16;
const IDLE_EXPIRY: Duration = Duration::from_secs(60 * 60);

struct Session {
    reading: Reading,
    touched: Instant,
}

struct Inner {
    sessions: HashMap<String, Session>,
    // Creation order, for oldest-first eviction under the cap
    order: Vec<String>,
}

/// In-memory map of open readings. This is view lifetime, not persistence:
/// the map dies with the process and nothing in it identifies a user.
pub struct SessionStore {
    cap: usize,
    inner: Mutex<Inner>,
}

impl SessionStore {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            inner: Mutex::new(Inner {
                sessions: HashMap::new(),
                order: Vec::new(),
            }),
        }
    }

    /// Open a fresh reading and hand back its id.
    pub fn create(&self, deck_size: usize, pick_limit: usize) -> String {
        let mut inner = self.inner.lock().unwrap();
        let now = Instant::now();
        prune_idle(&mut inner, now);
        while inner.order.len() >= self.cap {
            let oldest = inner.order.remove(0);
            inner.sessions.remove(&oldest);
            info!("Evicted reading {} to stay under the session cap", oldest);
        }
        let mut id = random_id();
        while inner.sessions.contains_key(&id) {
            id = random_id();
        }
        inner.sessions.insert(
            id.clone(),
            Session {
                reading: Reading::new(deck_size, pick_limit),
                touched: now,
            },
        );
        inner.order.push(id.clone());
        debug!("Opened reading {} ({} live)", id, inner.sessions.len());
        id
    }

    /// Run a closure against one reading, refreshing its idle clock.
    /// Returns None when the id is unknown, expired, or evicted.
    pub fn with_reading<F, T>(&self, id: &str, f: F) -> Option<T>
    where
        F: FnOnce(&mut Reading) -> T,
    {
        let mut inner = self.inner.lock().unwrap();
        let now = Instant::now();
        prune_idle(&mut inner, now);
        let session = inner.sessions.get_mut(id)?;
        session.touched = now;
        Some(f(&mut session.reading))
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap().sessions.len()
    }
}

fn prune_idle(inner: &mut Inner, now: Instant) {
    let before = inner.sessions.len();
    inner
        .sessions
        .retain(|_, session| now.duration_since(session.touched) < IDLE_EXPIRY);
    if inner.sessions.len() < before {
        inner.order.retain(|id| inner.sessions.contains_key(id));
        debug!("Pruned {} idle readings", before - inner.sessions.len());
    }
}

fn random_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}
