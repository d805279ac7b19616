use anyhow::Result;
use calsync_core::SyncConfig;
use owo_colors::OwoColorize;

pub fn run(config: &SyncConfig) -> Result<()> {
    let config_path = SyncConfig::config_path()?;

    println!("{}", "Settings".bold());
    println!("  Config:       {}", config_path.display());
    println!("  Provider:     calsync-provider-{}", config.provider);
    println!("  Window:       next {} days", config.sync_days);
    println!("  Placeholder:  \"{}\"", config.placeholder_title);

    println!("\n{}", "Calendars".bold());
    if !config.is_configured() {
        println!("  {}", "None configured. Run `calsync configure`.".dimmed());
        return Ok(());
    }

    for calendar in &config.calendars {
        println!("  {} {}", calendar.name, calendar.id.dimmed());
    }

    if let Err(e) = config.validate() {
        println!("\n{}", e.to_string().red());
    }

    Ok(())
}
