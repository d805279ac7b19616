//! Mapping from availability and participant status to a mirroring decision.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::{Availability, Occurrence, ParticipantStatus};

/// What to do with one occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDecision {
    Skip,
    MirrorAsUnavailable,
    MirrorAsTentative,
    MirrorAsBusy,
}

impl SyncDecision {
    /// Resolve the decision for an occurrence.
    ///
    /// First match wins: Out of Office > Free > Tentative > Busy. Availability
    /// set on the event is authoritative over the invitation response.
    pub fn classify(availability: Availability, status: ParticipantStatus) -> Self {
        match (availability, status) {
            (Availability::Unavailable, _) => SyncDecision::MirrorAsUnavailable,
            (Availability::Free, _) => SyncDecision::Skip,
            (_, ParticipantStatus::Tentative) => SyncDecision::MirrorAsTentative,
            (_, ParticipantStatus::Accepted) => SyncDecision::MirrorAsBusy,
            (_, ParticipantStatus::Pending | ParticipantStatus::Declined) => SyncDecision::Skip,
            (_, ParticipantStatus::None) => SyncDecision::MirrorAsBusy,
        }
    }

    pub fn for_occurrence(occurrence: &Occurrence) -> Self {
        Self::classify(occurrence.availability, occurrence.self_status)
    }

    pub fn is_mirrored(self) -> bool {
        self != SyncDecision::Skip
    }

    /// How strongly a mirrored occurrence blocks time.
    ///
    /// Resolves occurrences that share an identity; Skip never blocks.
    pub fn strength(self) -> u8 {
        match self {
            SyncDecision::Skip => 0,
            SyncDecision::MirrorAsTentative => 1,
            SyncDecision::MirrorAsBusy => 2,
            SyncDecision::MirrorAsUnavailable => 3,
        }
    }

    /// Availability the placeholder carries in the target calendar.
    pub fn placeholder_availability(self) -> Option<Availability> {
        match self {
            SyncDecision::Skip => None,
            SyncDecision::MirrorAsUnavailable => Some(Availability::Unavailable),
            SyncDecision::MirrorAsTentative => Some(Availability::Tentative),
            SyncDecision::MirrorAsBusy => Some(Availability::Busy),
        }
    }

    /// Stable token used in content hashes. Never change these.
    pub fn as_str(self) -> &'static str {
        match self {
            SyncDecision::Skip => "skip",
            SyncDecision::MirrorAsUnavailable => "unavailable",
            SyncDecision::MirrorAsTentative => "tentative",
            SyncDecision::MirrorAsBusy => "busy",
        }
    }
}

impl fmt::Display for SyncDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
