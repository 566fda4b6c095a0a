use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::Actor;

/// Per-actor rate limiting between lookups.
pub trait CooldownTracker: Send + Sync {
    fn is_active(&self, actor: &Actor) -> bool;
    fn remaining_millis(&self, actor: &Actor) -> i64;
    fn arm(&self, actor: &Actor);
}

/// In-memory cooldowns keyed by actor id.
#[derive(Debug)]
pub struct Cooldowns {
    length: Option<Duration>,
    expiry: Mutex<HashMap<Uuid, DateTime<Utc>>>,
}

impl Cooldowns {
    /// A negative length disables the cooldown entirely.
    pub fn new(length_millis: i64) -> Self {
        Self {
            length: (length_millis >= 0).then(|| Duration::milliseconds(length_millis)),
            expiry: Mutex::new(HashMap::new()),
        }
    }

    fn expiry_of(&self, actor: &Actor) -> Option<DateTime<Utc>> {
        let expiry = self.expiry.lock().unwrap_or_else(|e| e.into_inner());
        expiry.get(&actor.id).copied()
    }
}

impl CooldownTracker for Cooldowns {
    fn is_active(&self, actor: &Actor) -> bool {
        self.remaining_millis(actor) > 0
    }

    fn remaining_millis(&self, actor: &Actor) -> i64 {
        self.expiry_of(actor)
            .map(|until| (until - Utc::now()).num_milliseconds().max(0))
            .unwrap_or(0)
    }

    fn arm(&self, actor: &Actor) {
        let Some(length) = self.length else {
            return;
        };
        let mut expiry = self.expiry.lock().unwrap_or_else(|e| e.into_inner());
        expiry.insert(actor.id, Utc::now() + length);
    }
}
