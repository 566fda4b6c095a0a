use std::sync::Arc;
use tracing::debug;

use crate::error::{FetchError, QueryError};
use crate::lookup::model::{LookupKind, TargetIdentity};
use crate::{BlockPos, BlockSnapshot};

/// A held connection to the external log store.
///
/// Each call returns one page of already-rendered text lines; the page size
/// belongs to the store. Dropping the connection releases it.
pub trait LogConnection {
    fn interaction_lookup(&mut self, pos: &BlockPos, page: u32) -> Result<Vec<String>, QueryError>;

    fn block_lookup(&mut self, block: &BlockSnapshot, page: u32)
    -> Result<Vec<String>, QueryError>;

    fn container_lookup(&mut self, pos: &BlockPos, page: u32) -> Result<Vec<String>, QueryError>;
}

/// The external log store.
pub trait LogSource: Send + Sync {
    /// `Ok(None)` means "not right now"; the request should be retried.
    fn connect(&self) -> Result<Option<Box<dyn LogConnection + '_>>, FetchError>;
}

impl<T: LogSource + ?Sized> LogSource for Arc<T> {
    fn connect(&self) -> Result<Option<Box<dyn LogConnection + '_>>, FetchError> {
        (**self).connect()
    }
}

/// One page of raw lines, handed over by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    pub lines: Vec<String>,
    pub page_index_requested: u32,
}

enum Query<'a> {
    Interaction(&'a BlockPos),
    Block(&'a BlockSnapshot),
    Container(&'a BlockPos),
}

impl<'a> Query<'a> {
    fn select(kind: LookupKind, target: &'a TargetIdentity) -> Result<Self, FetchError> {
        match kind {
            LookupKind::InteractionLookup => Ok(Query::Interaction(target.pos())),
            LookupKind::ChestTransactions => Ok(Query::Container(target.pos())),
            LookupKind::BlockLookup => target
                .snapshot()
                .map(Query::Block)
                .ok_or(FetchError::TargetShape("a block snapshot")),
        }
    }
}

/// Adapter that turns (kind, target, page) into exactly one store query.
#[derive(Debug)]
pub struct PageFetcher<S> {
    source: S,
}

impl<S: LogSource> PageFetcher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn fetch(
        &self,
        kind: LookupKind,
        target: &TargetIdentity,
        page: u32,
    ) -> Result<PageResult, FetchError> {
        // Shape is checked before we take a connection we would not use.
        let query = Query::select(kind, target)?;

        let mut conn = self.source.connect()?.ok_or(FetchError::Unavailable)?;
        let lines = match query {
            Query::Interaction(pos) => conn.interaction_lookup(pos, page),
            Query::Block(block) => conn.block_lookup(block, page),
            Query::Container(pos) => conn.container_lookup(pos, page),
        };
        drop(conn);

        let lines = lines?;
        debug!(kind = ?kind, page, lines = lines.len(), "fetched page");

        Ok(PageResult {
            lines,
            page_index_requested: page,
        })
    }
}
