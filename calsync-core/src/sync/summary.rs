//! Per-action results and the aggregated run summary.

use std::fmt;

use serde::Serialize;

use crate::error::CalSyncResult;
use crate::sync::plan::{ActionKind, PlanAction, ReconciliationPlan, count_by_kind};

/// Lifecycle of one plan action within a run.
///
/// `Planned -> Executing -> Applied | Failed`. There is no retry inside a run;
/// re-running recomputes the plan from current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ActionState {
    Planned,
    Executing,
    Applied,
    Failed { cause: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    pub action: PlanAction,
    pub state: ActionState,
}

impl ActionRecord {
    pub fn planned(action: PlanAction) -> Self {
        ActionRecord {
            action,
            state: ActionState::Planned,
        }
    }

    pub(crate) fn start(&mut self) {
        debug_assert_eq!(self.state, ActionState::Planned);
        self.state = ActionState::Executing;
    }

    pub(crate) fn finish(&mut self, result: CalSyncResult<()>) {
        debug_assert_eq!(self.state, ActionState::Executing);
        self.state = match result {
            Ok(()) => ActionState::Applied,
            Err(e) => ActionState::Failed {
                cause: e.to_string(),
            },
        };
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, ActionState::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionFailure {
    /// Human-readable description of the action.
    pub action: String,
    pub cause: String,
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action, self.cause)
    }
}

/// Changes between one source calendar and one target calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairSummary {
    pub source_calendar_id: String,
    pub target_calendar_id: String,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// Outcome of one reconciliation run.
///
/// Same shape with or without dry-run; in dry-run the counts describe the
/// plan and nothing was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub dry_run: bool,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub failures: Vec<ActionFailure>,
    pub records: Vec<ActionRecord>,
}

impl RunSummary {
    pub fn new(plan: &ReconciliationPlan, dry_run: bool, records: Vec<ActionRecord>) -> Self {
        let succeeded = records
            .iter()
            .filter(|r| !r.is_failed())
            .map(|r| r.action.kind());
        let (created, updated, deleted) = count_by_kind(succeeded);

        let failures: Vec<_> = records
            .iter()
            .filter_map(|r| match &r.state {
                ActionState::Failed { cause } => Some(ActionFailure {
                    action: r.action.to_string(),
                    cause: cause.clone(),
                }),
                _ => None,
            })
            .collect();

        RunSummary {
            dry_run,
            created,
            updated,
            deleted,
            skipped: plan.skipped,
            unchanged: plan.unchanged,
            failed: failures.len(),
            failures,
            records,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    /// Successful (or, in dry-run, planned) changes per source/target pair,
    /// in the order the pairs first appear in the plan.
    pub fn pairs(&self) -> Vec<PairSummary> {
        let mut pairs: Vec<PairSummary> = Vec::new();

        for record in self.records.iter().filter(|r| !r.is_failed()) {
            let source = record.action.source_calendar_id();
            let target = record.action.target_calendar_id();

            let index = match pairs
                .iter()
                .position(|p| p.source_calendar_id == source && p.target_calendar_id == target)
            {
                Some(index) => index,
                None => {
                    pairs.push(PairSummary {
                        source_calendar_id: source.to_string(),
                        target_calendar_id: target.to_string(),
                        created: 0,
                        updated: 0,
                        deleted: 0,
                    });
                    pairs.len() - 1
                }
            };

            let pair = &mut pairs[index];
            match record.action.kind() {
                ActionKind::Create => pair.created += 1,
                ActionKind::Update => pair.updated += 1,
                ActionKind::Delete => pair.deleted += 1,
            }
        }

        pairs
    }
}
