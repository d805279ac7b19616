use anyhow::{Context, Result};
use calsync_core::sync::{EngineOptions, SyncEngine};
use calsync_core::{CalendarAdapter, SyncConfig, TimeWindow};
use tracing::debug;

use crate::render::SummaryRender;
use crate::utils::tui;

pub async fn run<A: CalendarAdapter>(
    adapter: A,
    config: &SyncConfig,
    days: Option<u32>,
    dry_run: bool,
    verbose: bool,
) -> Result<()> {
    config.validate()?;

    let window = TimeWindow::from_now(days.unwrap_or(config.sync_days));
    let engine = SyncEngine::new(adapter, EngineOptions::from(config))?;
    debug!(%window, dry_run, "Sync window");

    let message = format!("Syncing {} calendars", config.calendars.len());
    let summary = tui::with_spinner(message, engine.run(&window, dry_run))
        .await
        .context("Sync aborted before any change was made")?;
    println!("{}", summary.render(config, verbose));

    if summary.has_failures() {
        anyhow::bail!(
            "{} of {} changes failed; run sync again to retry",
            summary.failed,
            summary.records.len()
        );
    }

    Ok(())
}
