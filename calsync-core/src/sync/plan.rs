//! Reconciliation plan types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CalSyncResult;
use crate::event::OccurrenceKey;
use crate::placeholder::{PlaceholderWrite, TrackingMarker};
use crate::sync::SyncDecision;
use crate::tracker;
use crate::window::TimeWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl ActionKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            ActionKind::Create => "+",
            ActionKind::Update => "~",
            ActionKind::Delete => "-",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The placeholder a live occurrence should have in some target calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mirror {
    pub key: OccurrenceKey,
    pub window: TimeWindow,
    pub decision: SyncDecision,
    pub content_hash: String,
}

impl Mirror {
    pub fn marker(&self, tracking_id: String) -> TrackingMarker {
        TrackingMarker {
            tracking_id,
            source_event_id: self.key.source_event_id.clone(),
            source_calendar_id: self.key.source_calendar_id.clone(),
            content_hash: self.content_hash.clone(),
            occurrence_start: self.key.start,
        }
    }

    /// Build the adapter payload: title, window, availability and encoded marker.
    pub fn placeholder(&self, title: &str, tracking_id: String) -> CalSyncResult<PlaceholderWrite> {
        let notes = tracker::encode(&self.marker(tracking_id))?;

        Ok(PlaceholderWrite {
            title: title.to_string(),
            window: self.window,
            availability: self.decision.placeholder_availability().unwrap_or_default(),
            notes,
        })
    }
}

/// Why a placeholder is being removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteReason {
    /// Source occurrence is gone, moved out of the window, or now skipped.
    Stale,
    /// Another placeholder in the same calendar already mirrors this occurrence.
    Duplicate,
}

impl fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteReason::Stale => write!(f, "source no longer blocks time"),
            DeleteReason::Duplicate => write!(f, "duplicate placeholder"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanAction {
    Create {
        target_calendar_id: String,
        mirror: Mirror,
    },
    Update {
        target_calendar_id: String,
        placeholder_id: String,
        /// Preserved from the existing marker.
        tracking_id: String,
        previous_hash: String,
        mirror: Mirror,
    },
    Delete {
        target_calendar_id: String,
        placeholder_id: String,
        key: OccurrenceKey,
        window: TimeWindow,
        reason: DeleteReason,
    },
}

impl PlanAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            PlanAction::Create { .. } => ActionKind::Create,
            PlanAction::Update { .. } => ActionKind::Update,
            PlanAction::Delete { .. } => ActionKind::Delete,
        }
    }

    pub fn target_calendar_id(&self) -> &str {
        match self {
            PlanAction::Create {
                target_calendar_id, ..
            }
            | PlanAction::Update {
                target_calendar_id, ..
            }
            | PlanAction::Delete {
                target_calendar_id, ..
            } => target_calendar_id,
        }
    }

    /// Source occurrence the action is about.
    pub fn key(&self) -> &OccurrenceKey {
        match self {
            PlanAction::Create { mirror, .. } | PlanAction::Update { mirror, .. } => &mirror.key,
            PlanAction::Delete { key, .. } => key,
        }
    }

    pub fn source_calendar_id(&self) -> &str {
        &self.key().source_calendar_id
    }

    /// Window the placeholder will have (or had, for deletes).
    pub fn window(&self) -> TimeWindow {
        match self {
            PlanAction::Create { mirror, .. } | PlanAction::Update { mirror, .. } => mirror.window,
            PlanAction::Delete { window, .. } => *window,
        }
    }

    pub fn placeholder_id(&self) -> Option<&str> {
        match self {
            PlanAction::Create { .. } => None,
            PlanAction::Update { placeholder_id, .. }
            | PlanAction::Delete { placeholder_id, .. } => Some(placeholder_id),
        }
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanAction::Create {
                target_calendar_id,
                mirror,
            } => write!(
                f,
                "{} {} {} -> {} ({})",
                self.kind(),
                mirror.window,
                mirror.key.source_calendar_id,
                target_calendar_id,
                mirror.decision
            ),
            PlanAction::Update {
                target_calendar_id,
                previous_hash,
                mirror,
                ..
            } => write!(
                f,
                "{} {} {} -> {} ({}, hash {} -> {})",
                self.kind(),
                mirror.window,
                mirror.key.source_calendar_id,
                target_calendar_id,
                mirror.decision,
                previous_hash,
                mirror.content_hash
            ),
            PlanAction::Delete {
                target_calendar_id,
                key,
                window,
                reason,
                ..
            } => write!(
                f,
                "{} {} {} -> {} ({})",
                self.kind(),
                window,
                key.source_calendar_id,
                target_calendar_id,
                reason
            ),
        }
    }
}

/// Ordered create/update/delete actions plus counts of what was left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationPlan {
    pub actions: Vec<PlanAction>,
    /// Occurrences whose decision is `Skip`.
    pub skipped: usize,
    /// Placeholders that already match their source.
    pub unchanged: usize,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// (created, updated, deleted)
    pub fn counts(&self) -> (usize, usize, usize) {
        count_by_kind(self.actions.iter().map(PlanAction::kind))
    }
}

pub(crate) fn count_by_kind(kinds: impl Iterator<Item = ActionKind>) -> (usize, usize, usize) {
    let mut created = 0;
    let mut updated = 0;
    let mut deleted = 0;

    for kind in kinds {
        match kind {
            ActionKind::Create => created += 1,
            ActionKind::Update => updated += 1,
            ActionKind::Delete => deleted += 1,
        }
    }

    (created, updated, deleted)
}
