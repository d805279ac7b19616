use anyhow::{Context, Result};
use calsync_core::{CalendarAdapter, CalendarRef, SyncConfig};
use dialoguer::MultiSelect;

use crate::utils::tui;

pub async fn run<A: CalendarAdapter>(adapter: &A, mut config: SyncConfig) -> Result<()> {
    let calendars = tui::with_spinner("Fetching calendars", adapter.list_calendars()).await?;

    let writable: Vec<_> = calendars.into_iter().filter(|c| c.writable).collect();
    if writable.len() < 2 {
        anyhow::bail!(
            "Found {} writable calendar(s); at least 2 are needed to sync.",
            writable.len()
        );
    }

    let items: Vec<String> = writable
        .iter()
        .map(|c| match &c.source {
            Some(source) => format!("{} ({source})", c.name),
            None => c.name.clone(),
        })
        .collect();

    // Preselect whatever participates today
    let defaults: Vec<bool> = writable
        .iter()
        .map(|c| config.calendars.iter().any(|r| r.id == c.id))
        .collect();

    let selections = MultiSelect::new()
        .with_prompt("Select calendars to keep in sync (space to toggle, enter to confirm)")
        .items(&items)
        .defaults(&defaults)
        .interact()?;

    if selections.len() < 2 {
        anyhow::bail!("Select at least 2 calendars.");
    }

    config.calendars = selections
        .iter()
        .map(|&idx| CalendarRef {
            id: writable[idx].id.clone(),
            name: writable[idx].name.clone(),
        })
        .collect();
    config.validate()?;
    config.save().context("Could not save configuration")?;

    println!();
    for calendar in &config.calendars {
        println!("  {}", calendar.name);
    }
    println!("\nSaved to {}", SyncConfig::config_path()?.display());

    Ok(())
}
