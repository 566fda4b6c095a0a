//! Lookup request/result model.
//!
//! Everything here is request-scoped: built when a lookup starts,
//! handed to the worker by value, dropped once the outcome is delivered.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{BlockPos, BlockSnapshot};

/// Which log-source query to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookupKind {
    InteractionLookup,
    BlockLookup,
    ChestTransactions,
}

impl LookupKind {
    pub fn label(self) -> &'static str {
        match self {
            LookupKind::InteractionLookup => "interactions",
            LookupKind::BlockLookup => "blocks",
            LookupKind::ChestTransactions => "chest transactions",
        }
    }
}

/// What the lookup is scoped to. Captured once, before the worker handoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetIdentity {
    Location(BlockPos),
    Snapshot(BlockSnapshot),
}

impl TargetIdentity {
    pub fn pos(&self) -> &BlockPos {
        match self {
            TargetIdentity::Location(pos) => pos,
            TargetIdentity::Snapshot(snapshot) => &snapshot.pos,
        }
    }

    pub fn snapshot(&self) -> Option<&BlockSnapshot> {
        match self {
            TargetIdentity::Location(_) => None,
            TargetIdentity::Snapshot(snapshot) => Some(snapshot),
        }
    }
}

/// Request-time filters applied on top of the log source's own output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPolicy {
    pub max_age_hours: f64,
    pub excluded_actors: HashSet<String>,
    pub exclusion_enabled: bool,
}

impl FilterPolicy {
    pub fn new(max_age_hours: f64) -> Self {
        Self {
            max_age_hours,
            excluded_actors: HashSet::new(),
            exclusion_enabled: false,
        }
    }

    pub fn excluding<I, S>(mut self, actors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_actors = actors.into_iter().map(Into::into).collect();
        self.exclusion_enabled = true;
        self
    }

    /// Unknown ages never pass.
    pub fn admits_age(&self, age_hours: Option<f64>) -> bool {
        matches!(age_hours, Some(age) if age <= self.max_age_hours)
    }

    pub fn excludes_actor(&self, actor: &str) -> bool {
        self.exclusion_enabled && self.excluded_actors.contains(actor)
    }
}

/// The three "nothing found" messages the log source knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoDataCategory {
    Interactions,
    BlockData,
    ContainerTransactions,
}

impl NoDataCategory {
    /// Maps the log source's category wording. Anything else is `None`.
    pub fn from_source(category: &str) -> Option<Self> {
        match category {
            "player interactions" => Some(NoDataCategory::Interactions),
            "block data" => Some(NoDataCategory::BlockData),
            "container transactions" => Some(NoDataCategory::ContainerTransactions),
            _ => None,
        }
    }
}

/// One renderable unit of a lookup result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LookupEvent {
    NoData {
        category: NoDataCategory,
        target: String,
    },
    Header {
        x: String,
        y: String,
        z: String,
    },
    Row {
        time: String,
        actor: String,
        action: String,
        block: String,
    },
    Footer {
        page: i64,
        max_page: u32,
    },
    /// Replaces everything when no row survived filtering.
    EmptyPage,
}

/// The final, caller-owned result of a lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupOutcome {
    pub events: Vec<LookupEvent>,
    pub final_page: u32,
    pub final_max_page: u32,
    pub is_empty: bool,
}

impl LookupOutcome {
    pub fn rows(&self) -> impl Iterator<Item = &LookupEvent> {
        self.events
            .iter()
            .filter(|ev| matches!(ev, LookupEvent::Row { .. }))
    }
}
