//! # Inspect Probe
//!
//! Replays a captured log-source dump through the lookup engine.
//! A dump is a directory of `page-<n>.txt` files, one raw line per line.

use anyhow::{Context, Result, anyhow, bail};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use inspect_core::hooks::{ClaimHandle, PermissionOracle};
use inspect_core::lookup::{LogConnection, LogSource, LookupEvent, LookupKind, NoDataCategory};
use inspect_core::{
    Actor, BlockPos, BlockSnapshot, FetchError, LookupError, LookupOutcome, Presentation,
    QueryError, TargetIdentity,
};

pub mod util;

// ════════════════════════════════════════════════════════════════════
// Dump source
// ════════════════════════════════════════════════════════════════════

/// A `LogSource` backed by a dump directory.
///
/// An `unavailable` file holding a number N makes the first N connects
/// fail, which is handy for watching the retry path.
#[derive(Debug)]
pub struct DumpSource {
    dir: PathBuf,
    refusals: AtomicU32,
}

impl DumpSource {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            bail!("Dump directory {} does not exist", dir.display());
        }

        let marker = dir.join("unavailable");
        let refusals = if marker.exists() {
            let raw = std::fs::read_to_string(&marker)
                .with_context(|| format!("Failed to read {}", marker.display()))?;
            raw.trim()
                .parse::<u32>()
                .with_context(|| format!("{} must hold a number", marker.display()))?
        } else {
            0
        };

        Ok(Self {
            dir,
            refusals: AtomicU32::new(refusals),
        })
    }

    fn read_page(&self, page: u32) -> Result<Vec<String>, QueryError> {
        let path = self.dir.join(format!("page-{}.txt", page));
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(text.lines().map(str::to_string).collect()),
            // Past the end of the dump.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(QueryError::Execution(format!("{}: {}", path.display(), e))),
        }
    }
}

struct DumpConnection<'a> {
    source: &'a DumpSource,
}

impl LogConnection for DumpConnection<'_> {
    fn interaction_lookup(&mut self, _pos: &BlockPos, page: u32) -> Result<Vec<String>, QueryError> {
        self.source.read_page(page)
    }

    fn block_lookup(
        &mut self,
        _block: &BlockSnapshot,
        page: u32,
    ) -> Result<Vec<String>, QueryError> {
        self.source.read_page(page)
    }

    fn container_lookup(&mut self, _pos: &BlockPos, page: u32) -> Result<Vec<String>, QueryError> {
        self.source.read_page(page)
    }
}

impl LogSource for DumpSource {
    fn connect(&self) -> Result<Option<Box<dyn LogConnection + '_>>, FetchError> {
        let refused = self
            .refusals
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            tracing::debug!("dump source refusing connection");
            return Ok(None);
        }
        Ok(Some(Box::new(DumpConnection { source: self })))
    }
}

/// The probe runs as a trusted operator: every location is claimed and
/// every role is held.
#[derive(Debug, Default)]
pub struct OpenOracle;

impl PermissionOracle for OpenOracle {
    fn resolve_claim(&self, _actor: &Actor, pos: &BlockPos) -> Option<ClaimHandle> {
        Some(ClaimHandle::new(pos.world.clone()))
    }

    fn has_role(&self, _: &ClaimHandle, _: &Actor, _: &BlockPos, _: &[String]) -> bool {
        true
    }
}

// ════════════════════════════════════════════════════════════════════
// Arguments
// ════════════════════════════════════════════════════════════════════

pub const USAGE: &str = "usage: inspect-probe <dump-dir> <interaction|block|chest> <page> \
[--config <file.toml>] [--at <world>,<x>,<y>,<z>] [--material <name>] [--ops <a,b,..>] [--json]";

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeArgs {
    pub dump_dir: PathBuf,
    pub kind: LookupKind,
    pub page: u32,
    pub config: Option<PathBuf>,
    pub pos: BlockPos,
    pub material: String,
    pub operators: HashSet<String>,
    pub json: bool,
}

impl ProbeArgs {
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut positional = Vec::new();
        let mut config = None;
        let mut pos = BlockPos::new("world", 0, 0, 0);
        let mut material = "UNKNOWN".to_string();
        let mut operators = HashSet::new();
        let mut json = false;

        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{} needs a value\n{}", flag, USAGE))
            };
            match arg.as_str() {
                "--json" => json = true,
                "--config" => config = Some(PathBuf::from(value("--config")?)),
                "--at" => pos = parse_pos(&value("--at")?)?,
                "--material" => material = value("--material")?,
                "--ops" => {
                    operators = value("--ops")?
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                }
                flag if flag.starts_with("--") => bail!("Unknown flag {}\n{}", flag, USAGE),
                other => positional.push(other.to_string()),
            }
        }

        let [dump_dir, kind, page] = <[String; 3]>::try_from(positional)
            .map_err(|_| anyhow!("Expected exactly three arguments\n{}", USAGE))?;

        let kind = match kind.as_str() {
            "interaction" => LookupKind::InteractionLookup,
            "block" => LookupKind::BlockLookup,
            "chest" => LookupKind::ChestTransactions,
            other => bail!("Unknown lookup kind {:?}\n{}", other, USAGE),
        };
        let page = page
            .parse::<u32>()
            .with_context(|| format!("Page must be a number, got {:?}", page))?;

        Ok(Self {
            dump_dir: PathBuf::from(dump_dir),
            kind,
            page,
            config,
            pos,
            material,
            operators,
            json,
        })
    }

    /// Block lookups get a snapshot, the rest a bare location.
    pub fn target(&self) -> TargetIdentity {
        match self.kind {
            LookupKind::BlockLookup => TargetIdentity::Snapshot(BlockSnapshot {
                pos: self.pos.clone(),
                material: self.material.clone(),
            }),
            _ => TargetIdentity::Location(self.pos.clone()),
        }
    }
}

fn parse_pos(raw: &str) -> Result<BlockPos> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let &[world, x, y, z] = parts.as_slice() else {
        bail!("--at expects <world>,<x>,<y>,<z>, got {:?}", raw);
    };
    let coord = |s: &str| {
        s.parse::<i32>()
            .with_context(|| format!("Bad coordinate {:?}", s))
    };
    Ok(BlockPos::new(world, coord(x)?, coord(y)?, coord(z)?))
}

// ════════════════════════════════════════════════════════════════════
// Rendering
// ════════════════════════════════════════════════════════════════════

fn category_label(category: NoDataCategory) -> &'static str {
    match category {
        NoDataCategory::Interactions => "player interactions",
        NoDataCategory::BlockData => "block data",
        NoDataCategory::ContainerTransactions => "container transactions",
    }
}

/// Plain-text lines for one outcome.
pub fn render_plain(outcome: &LookupOutcome) -> Vec<String> {
    outcome
        .events
        .iter()
        .map(|event| match event {
            LookupEvent::NoData { category, target } => {
                format!("No {} found for {}.", category_label(*category), target)
            }
            LookupEvent::Header { x, y, z } => format!("----- Inspect ----- (x{}/y{}/z{})", x, y, z),
            LookupEvent::Row {
                time,
                actor,
                action,
                block,
            } => format!("{} - {} {} {}", time, actor, action, block),
            LookupEvent::Footer { page, max_page } => format!("Page {}/{}", page, max_page),
            LookupEvent::EmptyPage => "No block data found for that page.".to_string(),
        })
        .collect()
}

/// Prints outcomes to stdout, as text or JSON.
#[derive(Debug, Default)]
pub struct StdoutPresentation {
    pub json: bool,
}

impl StdoutPresentation {
    pub fn format_outcome(&self, outcome: &LookupOutcome) -> String {
        if self.json {
            serde_json::to_string_pretty(outcome).unwrap_or_else(|e| {
                tracing::error!("failed to encode outcome: {}", e);
                "{}".to_string()
            })
        } else {
            render_plain(outcome).join("\n")
        }
    }

    pub fn format_notice(&self, notice: &LookupError) -> String {
        if self.json {
            serde_json::json!({ "error": notice.to_string() }).to_string()
        } else {
            format!("✗ {}", notice)
        }
    }
}

impl Presentation for StdoutPresentation {
    fn render_and_send(&self, actor: &Actor, outcome: &LookupOutcome) {
        tracing::debug!(actor = %actor.name, rows = outcome.rows().count(), "rendering outcome");
        println!("{}", self.format_outcome(outcome));
    }

    fn send_notice(&self, actor: &Actor, notice: &LookupError) {
        tracing::debug!(actor = %actor.name, "sending notice");
        println!("{}", self.format_notice(notice));
    }
}
