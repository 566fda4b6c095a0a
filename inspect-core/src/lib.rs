pub mod config;
pub mod cooldown;
pub mod dispatch;
pub mod error;
pub mod hooks;
pub mod lookup;

// Re-export the main struct so callers can just use `inspect_core::Inspector`
pub use dispatch::{InspectEvent, Inspector, LookupTicket, Presentation};

pub use config::Settings;
pub use error::{FetchError, LookupError, QueryError};
pub use lookup::{
    FilterPolicy, LogLineParser, LookupEvent, LookupKind, LookupOutcome, PageFetcher,
    PaginationEngine, ParsedRecord, TargetIdentity,
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The moderator running a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
}

impl Actor {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A block coordinate inside a named world.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}

/// The block at a position, frozen at the time the lookup was requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub pos: BlockPos,
    pub material: String,
}
