// inspect-probe/src/main.rs

use anyhow::{Context, Result};
use std::sync::Arc;
use uuid::Uuid;

use inspect_core::cooldown::Cooldowns;
use inspect_core::dispatch::drain;
use inspect_core::{Actor, Inspector, Presentation, Settings};
use inspect_probe::util::{init_tracing, install_panic_hook};
use inspect_probe::{DumpSource, OpenOracle, ProbeArgs, StdoutPresentation};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    install_panic_hook();

    let args = ProbeArgs::parse(std::env::args().skip(1))?;

    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    tracing::info!(
        dump = %args.dump_dir.display(),
        kind = args.kind.label(),
        page = args.page,
        "probe starting"
    );

    let source = DumpSource::open(&args.dump_dir).context("DumpSource::open failed")?;
    let (inspector, event_rx) = Inspector::start(
        settings,
        source,
        Arc::new(OpenOracle),
        Arc::new(Cooldowns::new(-1)),
        Arc::new(args.operators.clone()),
    );

    let presentation = StdoutPresentation { json: args.json };
    let actor = Actor::new(Uuid::new_v4(), "probe");

    if let Err(notice) = inspector.request(&actor, args.kind, args.target(), args.page) {
        presentation.send_notice(&actor, &notice);
        return Ok(());
    }

    // Once the inspector is gone the channel closes after the last worker reports.
    drop(inspector);
    drain(event_rx, &presentation).await;

    Ok(())
}
