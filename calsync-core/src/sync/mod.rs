//! Reconciliation: decisions, plans, and the engine that applies them.

mod decision;
pub mod differ;
mod engine;
mod plan;
mod summary;

pub use decision::SyncDecision;
pub use engine::{EngineOptions, Snapshot, SyncEngine};
pub use plan::{ActionKind, DeleteReason, Mirror, PlanAction, ReconciliationPlan};
pub use summary::{ActionFailure, ActionRecord, ActionState, PairSummary, RunSummary};
