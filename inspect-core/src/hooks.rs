//! Collaborator seams: claims/roles and the operator list.

use std::collections::HashSet;

use crate::{Actor, BlockPos};

/// A protected region the lookup location falls in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClaimHandle {
    pub id: String,
}

impl ClaimHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Answers "may this actor inspect here?".
pub trait PermissionOracle: Send + Sync {
    fn resolve_claim(&self, actor: &Actor, pos: &BlockPos) -> Option<ClaimHandle>;

    /// True if the actor holds any of `required` in `claim`.
    fn has_role(
        &self,
        claim: &ClaimHandle,
        actor: &Actor,
        pos: &BlockPos,
        required: &[String],
    ) -> bool;
}

/// Names whose rows are hidden when `hide_ops` is on.
pub trait OperatorRoster: Send + Sync {
    fn operator_names(&self) -> HashSet<String>;
}

impl OperatorRoster for HashSet<String> {
    fn operator_names(&self) -> HashSet<String> {
        self.clone()
    }
}

impl OperatorRoster for Vec<String> {
    fn operator_names(&self) -> HashSet<String> {
        self.iter().cloned().collect()
    }
}

/// Ordered roles, lowest first. Holding a role grants every role below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleLadder {
    ranks: Vec<String>,
}

impl RoleLadder {
    pub fn new<I, S>(ranks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ranks: ranks.into_iter().map(Into::into).collect(),
        }
    }

    /// The usual faction ranks.
    pub fn factions() -> Self {
        Self::new(["RECRUIT", "MEMBER", "OFFICER", "LEADER"])
    }

    pub fn rank(&self, role: &str) -> Option<usize> {
        self.ranks.iter().position(|r| r.eq_ignore_ascii_case(role))
    }

    /// Unknown roles never match.
    pub fn permits(&self, held: &str, required: &[String]) -> bool {
        let Some(held) = self.rank(held) else {
            return false;
        };
        required
            .iter()
            .filter_map(|role| self.rank(role))
            .any(|needed| held >= needed)
    }
}
