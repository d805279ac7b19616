//! One reconciliation cycle: fetch, plan, apply, summarize.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::adapter::CalendarAdapter;
use crate::config::SyncConfig;
use crate::error::{CalSyncError, CalSyncResult};
use crate::event::Occurrence;
use crate::placeholder::ManagedEvent;
use crate::sync::differ;
use crate::sync::plan::{PlanAction, ReconciliationPlan};
use crate::sync::summary::{ActionRecord, RunSummary};
use crate::tracker;
use crate::window::TimeWindow;

/// What the engine needs from configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Participating calendars, in order.
    pub calendar_ids: Vec<String>,
    pub placeholder_title: String,
}

impl From<&SyncConfig> for EngineOptions {
    fn from(config: &SyncConfig) -> Self {
        EngineOptions {
            calendar_ids: config.calendar_ids(),
            placeholder_title: config.placeholder_title.clone(),
        }
    }
}

/// Everything read from the adapter for one run. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub occurrences: HashMap<String, Vec<Occurrence>>,
    pub placeholders: HashMap<String, Vec<ManagedEvent>>,
}

pub struct SyncEngine<A> {
    adapter: A,
    options: EngineOptions,
}

impl<A: CalendarAdapter> SyncEngine<A> {
    pub fn new(adapter: A, options: EngineOptions) -> CalSyncResult<Self> {
        let mut unique = options.calendar_ids.clone();
        unique.sort();
        unique.dedup();
        if unique.len() < 2 {
            return Err(CalSyncError::NotEnoughCalendars(unique.len()));
        }

        Ok(SyncEngine { adapter, options })
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Run one cycle over `window`.
    ///
    /// Returns `Err` only for fatal problems, all of which surface before any
    /// write. Failed writes are recorded in the summary and the run carries on.
    pub async fn run(&self, window: &TimeWindow, dry_run: bool) -> CalSyncResult<RunSummary> {
        info!(
            calendars = self.options.calendar_ids.len(),
            from = %window.start,
            to = %window.end,
            dry_run,
            "Starting sync"
        );

        self.verify_calendars().await?;
        let snapshot = self.snapshot(window).await?;
        let plan = self.plan(&snapshot);

        let (created, updated, deleted) = plan.counts();
        info!(created, updated, deleted, "Plan ready");

        let mut records = Vec::with_capacity(plan.len());
        for action in plan.actions.iter().cloned() {
            let mut record = ActionRecord::planned(action);
            if !dry_run {
                record.start();
                let result = self.apply(&record.action).await;
                if let Err(e) = &result {
                    warn!(action = %record.action, error = %e, "Action failed");
                }
                record.finish(result);
            }
            records.push(record);
        }

        let summary = RunSummary::new(&plan, dry_run, records);
        info!(
            created = summary.created,
            updated = summary.updated,
            deleted = summary.deleted,
            failed = summary.failed,
            "Sync finished"
        );

        Ok(summary)
    }

    /// Fail closed when a configured calendar is missing or read-only.
    async fn verify_calendars(&self) -> CalSyncResult<()> {
        let available = self.adapter.list_calendars().await?;

        for id in &self.options.calendar_ids {
            let calendar = available
                .iter()
                .find(|c| &c.id == id)
                .ok_or_else(|| CalSyncError::CalendarNotFound(id.clone()))?;

            if !calendar.writable {
                return Err(CalSyncError::AccessDenied(format!(
                    "calendar '{}' is read-only",
                    calendar.name
                )));
            }
        }

        Ok(())
    }

    /// Read occurrences and existing events of every participating calendar.
    pub async fn snapshot(&self, window: &TimeWindow) -> CalSyncResult<Snapshot> {
        let mut snapshot = Snapshot::default();

        for id in &self.options.calendar_ids {
            if snapshot.occurrences.contains_key(id) {
                continue;
            }

            let occurrences = self.adapter.fetch_occurrences(id, window).await?;
            let placeholders = self.adapter.fetch_managed_events(id, window).await?;

            debug!(
                calendar = %id,
                occurrences = occurrences.len(),
                managed = placeholders.iter().filter(|e| e.is_managed()).count(),
                unmanaged = placeholders.iter().filter(|e| !e.is_managed()).count(),
                "Fetched calendar"
            );

            snapshot.occurrences.insert(id.clone(), occurrences);
            snapshot.placeholders.insert(id.clone(), placeholders);
        }

        Ok(snapshot)
    }

    pub fn plan(&self, snapshot: &Snapshot) -> ReconciliationPlan {
        differ::plan(
            &snapshot.occurrences,
            &snapshot.placeholders,
            &self.options.calendar_ids,
        )
    }

    async fn apply(&self, action: &PlanAction) -> CalSyncResult<()> {
        debug!(action = %action, "Applying");
        let title = &self.options.placeholder_title;

        match action {
            PlanAction::Create {
                target_calendar_id,
                mirror,
            } => {
                let placeholder = mirror.placeholder(title, tracker::new_tracking_id())?;
                let id = self
                    .adapter
                    .create_event(target_calendar_id, &placeholder)
                    .await?;
                debug!(placeholder = %id, calendar = %target_calendar_id, "Created placeholder");
            }
            PlanAction::Update {
                placeholder_id,
                tracking_id,
                mirror,
                ..
            } => {
                let placeholder = mirror.placeholder(title, tracking_id.clone())?;
                self.adapter
                    .update_event(placeholder_id, &placeholder)
                    .await?;
            }
            PlanAction::Delete { placeholder_id, .. } => {
                self.adapter.delete_event(placeholder_id).await?;
            }
        }

        Ok(())
    }
}
