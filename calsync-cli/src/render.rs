//! TUI rendering traits for calsync types.
//!
//! Extension traits that add colored terminal rendering to calsync-core
//! types using owo_colors.

use calsync_core::sync::{ActionKind, ActionRecord, PlanAction, RunSummary};
use calsync_core::{CalendarInfo, SyncConfig};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for ActionKind {
    fn render(&self) -> String {
        colorize(*self, self.symbol())
    }
}

impl Render for CalendarInfo {
    fn render(&self) -> String {
        let access = if self.writable { "[rw]" } else { "[ro]" };
        let source = self
            .source
            .as_deref()
            .map(|s| format!(" ({s})"))
            .unwrap_or_default();

        format!("{} {}{} {}", access.dimmed(), self.name, source, self.id.dimmed())
    }
}

impl Render for PlanAction {
    fn render(&self) -> String {
        let detail = match self {
            PlanAction::Create { mirror, .. } | PlanAction::Update { mirror, .. } => {
                mirror.decision.to_string()
            }
            PlanAction::Delete { reason, .. } => reason.to_string(),
        };

        format!(
            "{} {} {}",
            self.kind().render(),
            colorize(self.kind(), &self.window().to_string()),
            detail.dimmed()
        )
    }
}

fn colorize(kind: ActionKind, text: &str) -> String {
    match kind {
        ActionKind::Create => text.green().to_string(),
        ActionKind::Update => text.yellow().to_string(),
        ActionKind::Delete => text.red().to_string(),
    }
}

/// Show counts instead of individual actions above this many per calendar pair
const COMPACT_THRESHOLD: usize = 5;

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

/// Records grouped by (source, target), in first-seen order.
fn by_pair(records: &[ActionRecord]) -> Vec<((&str, &str), Vec<&ActionRecord>)> {
    let mut groups: Vec<((&str, &str), Vec<&ActionRecord>)> = Vec::new();

    for record in records {
        let pair = (
            record.action.source_calendar_id(),
            record.action.target_calendar_id(),
        );
        match groups.iter_mut().find(|(p, _)| *p == pair) {
            Some((_, group)) => group.push(record),
            None => groups.push((pair, vec![record])),
        }
    }

    groups
}

fn render_records(records: &[&ActionRecord], verbose: bool, lines: &mut Vec<String>) {
    if verbose || records.len() <= COMPACT_THRESHOLD {
        for record in records {
            let mut line = format!("   {}", record.action.render());
            if record.is_failed() {
                line.push_str(&format!(" {}", "(failed)".red()));
            }
            lines.push(line);
        }
        return;
    }

    for (kind, label) in [
        (ActionKind::Create, "new"),
        (ActionKind::Update, "changed"),
        (ActionKind::Delete, "removed"),
    ] {
        let count = records.iter().filter(|r| r.action.kind() == kind).count();
        if count > 0 {
            let text = format!("({count} {label} {})", pluralize("placeholder", count));
            lines.push(format!("   {} {}", kind.render(), colorize(kind, &text)));
        }
    }
}

/// Rendering for a run summary, with calendar names resolved from config
pub trait SummaryRender {
    fn render(&self, config: &SyncConfig, verbose: bool) -> String;
}

impl SummaryRender for RunSummary {
    fn render(&self, config: &SyncConfig, verbose: bool) -> String {
        let mut lines = Vec::new();

        if self.records.is_empty() {
            lines.push("Everything is in sync".dimmed().to_string());
        }

        for ((source, target), records) in by_pair(&self.records) {
            lines.push(format!(
                "📅 {} → {}",
                config.calendar_name(source),
                config.calendar_name(target)
            ));
            render_records(&records, verbose, &mut lines);
        }

        if self.total_changes() > 0 {
            let (create, update, delete) = if self.dry_run {
                ("Would create", "update", "delete")
            } else {
                ("Created", "updated", "deleted")
            };
            lines.push(format!(
                "\n{create} {}, {update} {}, {delete} {}",
                self.created, self.updated, self.deleted
            ));
        }

        lines.push(
            format!(
                "{} up to date, {} skipped (free, pending or declined)",
                self.unchanged, self.skipped
            )
            .dimmed()
            .to_string(),
        );

        if self.dry_run {
            lines.push("Dry run: nothing was written".yellow().to_string());
        }

        if self.has_failures() {
            lines.push(format!(
                "\n{}",
                format!("{} {} failed:", self.failed, pluralize("change", self.failed)).red()
            ));
            for failure in &self.failures {
                lines.push(format!("   {}", failure.to_string().red()));
            }
        }

        lines.join("\n")
    }
}
