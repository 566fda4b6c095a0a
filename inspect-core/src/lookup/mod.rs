//! Lookup pipeline.
//!
//! - `parser`: one raw log-source line -> `ParsedRecord`
//! - `fetcher`: one page of raw lines from the log source
//! - `engine`: filter-aware page discovery + render pass
//!
//! The log source paginates *before* our filters run, so its own page
//! footer cannot be trusted. The engine re-derives the page count itself.

pub mod engine;
pub mod fetcher;
pub mod model;
pub mod parser;

pub use engine::PaginationEngine;
pub use fetcher::{LogConnection, LogSource, PageFetcher, PageResult};
pub use model::{
    FilterPolicy, LookupEvent, LookupKind, LookupOutcome, NoDataCategory, TargetIdentity,
};
pub use parser::{ActionSymbol, FormatVersion, LogLineParser, ParsedRecord};
