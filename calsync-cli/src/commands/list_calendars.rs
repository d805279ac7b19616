use anyhow::Result;
use calsync_core::{CalendarAdapter, SyncConfig};
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::tui;

pub async fn run<A: CalendarAdapter>(adapter: &A, config: &SyncConfig) -> Result<()> {
    let calendars = tui::with_spinner("Fetching calendars", adapter.list_calendars()).await?;
    if calendars.is_empty() {
        println!("No calendars found.");
        return Ok(());
    }

    for calendar in &calendars {
        let participating = config.calendars.iter().any(|c| c.id == calendar.id);
        let marker = if participating { "*" } else { " " };
        println!("{} {}", marker.green(), calendar.render());
    }

    if config.is_configured() {
        println!("\n{}", "* participating".dimmed());
    }

    Ok(())
}
