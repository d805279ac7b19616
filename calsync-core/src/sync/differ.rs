//! Plan computation: which placeholders to create, update, or delete.
//!
//! Pure function of its inputs. Iteration follows the participating calendar
//! order and sorted occurrence keys, never hash map order, so the same
//! snapshot always yields the same plan.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};

use crate::event::{Occurrence, OccurrenceKey};
use crate::placeholder::{ManagedEvent, TrackingMarker};
use crate::sync::plan::{DeleteReason, Mirror, PlanAction, ReconciliationPlan};
use crate::sync::SyncDecision;
use crate::tracker;

type Indexed<'a> = (&'a ManagedEvent, &'a TrackingMarker);

/// (source calendar, source event id): all occurrences of one source event.
type SeriesKey = (String, String);

fn series_key(key: &OccurrenceKey) -> SeriesKey {
    (key.source_calendar_id.clone(), key.source_event_id.clone())
}

/// Existing placeholders in one target calendar, indexed by source identity.
struct PlaceholderIndex<'a> {
    by_key: BTreeMap<OccurrenceKey, Indexed<'a>>,
    duplicates: Vec<Indexed<'a>>,
}

impl<'a> PlaceholderIndex<'a> {
    /// Events without a marker are unmanaged and never enter the index.
    fn build(events: &'a [ManagedEvent]) -> Self {
        let mut managed: Vec<_> = events
            .iter()
            .filter_map(|event| event.marker.as_ref().map(|marker| (event, marker)))
            .collect();

        // Keep the lowest placeholder id when an identity is mirrored twice
        managed.sort_by(|(a, am), (b, bm)| {
            am.key()
                .cmp(&bm.key())
                .then_with(|| a.placeholder_id.cmp(&b.placeholder_id))
        });

        let mut by_key = BTreeMap::new();
        let mut duplicates = Vec::new();

        for (event, marker) in managed {
            match by_key.entry(marker.key()) {
                Entry::Vacant(slot) => {
                    slot.insert((event, marker));
                }
                Entry::Occupied(_) => duplicates.push((event, marker)),
            }
        }

        PlaceholderIndex { by_key, duplicates }
    }
}

/// Compute the reconciliation plan for one snapshot.
///
/// `occurrences_by_calendar` and `placeholders_by_calendar` are keyed by
/// calendar id. Calendars not listed in `participating` are ignored entirely,
/// both as sources and as targets.
pub fn plan(
    occurrences_by_calendar: &HashMap<String, Vec<Occurrence>>,
    placeholders_by_calendar: &HashMap<String, Vec<ManagedEvent>>,
    participating: &[String],
) -> ReconciliationPlan {
    let calendars = unique_in_order(participating);
    let mut plan = ReconciliationPlan::default();

    let live = live_mirrors(
        occurrences_by_calendar,
        placeholders_by_calendar,
        &calendars,
        &mut plan.skipped,
    );

    for &target in &calendars {
        let events = placeholders_by_calendar
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let index = PlaceholderIndex::build(events);

        let mut upserts = Vec::new();
        let mut stale = Vec::new();
        let mut unmatched_live: BTreeMap<SeriesKey, Vec<&Mirror>> = BTreeMap::new();
        let mut unmatched_placeholders: BTreeMap<SeriesKey, Vec<Indexed<'_>>> = BTreeMap::new();

        for (key, mirror) in &live {
            if key.source_calendar_id == target {
                continue;
            }

            match index.by_key.get(key) {
                None => unmatched_live.entry(series_key(key)).or_default().push(mirror),
                Some((_, marker)) if marker.content_hash == mirror.content_hash => {
                    plan.unchanged += 1;
                }
                Some(&(event, marker)) => upserts.push(update_action(target, event, marker, mirror)),
            }
        }

        for (key, &(event, marker)) in &index.by_key {
            // A placeholder pointing at its own calendar is never expected
            if key.source_calendar_id == target {
                stale.push(delete_action(target, event, key, DeleteReason::Stale));
            } else if !live.contains_key(key) {
                unmatched_placeholders
                    .entry(series_key(key))
                    .or_default()
                    .push((event, marker));
            }
        }

        // A moved event changes its start and so its identity: rewrite the
        // placeholder of the same source event instead of delete + create.
        for (series, mirrors) in unmatched_live {
            let mut orphans = unmatched_placeholders
                .remove(&series)
                .unwrap_or_default()
                .into_iter();

            for mirror in mirrors {
                match orphans.next() {
                    Some((event, marker)) => {
                        upserts.push(update_action(target, event, marker, mirror));
                    }
                    None => upserts.push(PlanAction::Create {
                        target_calendar_id: target.to_string(),
                        mirror: mirror.clone(),
                    }),
                }
            }

            for (event, marker) in orphans {
                stale.push(delete_action(target, event, &marker.key(), DeleteReason::Stale));
            }
        }

        for (event, marker) in unmatched_placeholders.into_values().flatten() {
            stale.push(delete_action(target, event, &marker.key(), DeleteReason::Stale));
        }

        upserts.sort_by(|a, b| a.key().cmp(b.key()));
        stale.sort_by(|a, b| a.key().cmp(b.key()));
        plan.actions.extend(upserts);
        plan.actions.extend(stale);

        for (event, marker) in &index.duplicates {
            warn!(
                calendar = target,
                placeholder = %event.placeholder_id,
                source = %marker.key(),
                "Duplicate placeholder"
            );
            plan.actions.push(delete_action(
                target,
                event,
                &marker.key(),
                DeleteReason::Duplicate,
            ));
        }
    }

    let (created, updated, deleted) = plan.counts();
    debug!(
        created,
        updated,
        deleted,
        unchanged = plan.unchanged,
        skipped = plan.skipped,
        "Computed plan"
    );

    plan
}

/// Every occurrence that should be mirrored, keyed by identity.
fn live_mirrors(
    occurrences_by_calendar: &HashMap<String, Vec<Occurrence>>,
    placeholders_by_calendar: &HashMap<String, Vec<ManagedEvent>>,
    calendars: &[&str],
    skipped: &mut usize,
) -> BTreeMap<OccurrenceKey, Mirror> {
    let mut live = BTreeMap::new();

    for &calendar_id in calendars {
        let Some(occurrences) = occurrences_by_calendar.get(calendar_id) else {
            continue;
        };

        // Placeholders that a backend also reports as ordinary events
        let own_placeholders: HashSet<&str> = placeholders_by_calendar
            .get(calendar_id)
            .into_iter()
            .flatten()
            .filter(|event| event.is_managed())
            .map(|event| event.placeholder_id.as_str())
            .collect();

        for occurrence in occurrences {
            if own_placeholders.contains(occurrence.source_event_id.as_str()) {
                debug!(
                    calendar = calendar_id,
                    event = %occurrence.source_event_id,
                    "Ignoring placeholder reported as occurrence"
                );
                continue;
            }

            let decision = SyncDecision::for_occurrence(occurrence);
            if !decision.is_mirrored() {
                *skipped += 1;
                continue;
            }

            let key = OccurrenceKey {
                start: occurrence.start,
                source_calendar_id: calendar_id.to_string(),
                source_event_id: occurrence.source_event_id.clone(),
            };

            let mirror = Mirror {
                key: key.clone(),
                window: occurrence.window(),
                decision,
                content_hash: tracker::content_hash(occurrence, decision),
            };

            match live.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(mirror);
                }
                Entry::Occupied(mut slot) => {
                    if outranks(&mirror, slot.get()) {
                        slot.insert(mirror);
                    }
                }
            }
        }
    }

    live
}

/// Between two occurrences with one identity, the stronger decision wins,
/// then the later end. Ties are identical mirrors.
fn outranks(candidate: &Mirror, current: &Mirror) -> bool {
    (candidate.decision.strength(), candidate.window.end)
        > (current.decision.strength(), current.window.end)
}

fn update_action(
    target: &str,
    event: &ManagedEvent,
    marker: &TrackingMarker,
    mirror: &Mirror,
) -> PlanAction {
    PlanAction::Update {
        target_calendar_id: target.to_string(),
        placeholder_id: event.placeholder_id.clone(),
        tracking_id: marker.tracking_id.clone(),
        previous_hash: marker.content_hash.clone(),
        mirror: mirror.clone(),
    }
}

fn delete_action(
    target: &str,
    event: &ManagedEvent,
    key: &OccurrenceKey,
    reason: DeleteReason,
) -> PlanAction {
    PlanAction::Delete {
        target_calendar_id: target.to_string(),
        placeholder_id: event.placeholder_id.clone(),
        key: key.clone(),
        window: event.window,
        reason,
    }
}

fn unique_in_order(ids: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(String::as_str)
        .filter(|id| seen.insert(*id))
        .collect()
}
