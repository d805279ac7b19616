//! Tracking marker encoding and content hashing.
//!
//! A placeholder's notes field holds `[CALSYNC:{json}]`. Everything that reads
//! or writes that text goes through this module; the rest of the crate only
//! sees [`TrackingMarker`] values.

use std::io;

use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::ser::Formatter;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{CalSyncError, CalSyncResult};
use crate::event::Occurrence;
use crate::placeholder::TrackingMarker;
use crate::sync::SyncDecision;

pub const MARKER_PREFIX: &str = "[CALSYNC:";
pub const MARKER_SUFFIX: &str = "]";

/// Number of hex characters kept from the SHA-256 digest.
pub const HASH_LEN: usize = 16;

const TRACKING_ID_LEN: usize = 8;

/// JSON formatting with `", "` and `": "` separators and ASCII-only output,
/// the layout markers have always been written with.
struct MarkerFormatter;

impl Formatter for MarkerFormatter {
    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    /// Non-ASCII characters are written as `\uXXXX` escapes (UTF-16 units).
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        for (i, c) in fragment.char_indices() {
            if c.is_ascii() {
                writer.write_all(&fragment.as_bytes()[i..i + 1])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

/// Produce the exact notes payload for a placeholder.
pub fn encode(marker: &TrackingMarker) -> CalSyncResult<String> {
    let mut json = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut json, MarkerFormatter);
    marker
        .serialize(&mut serializer)
        .map_err(|e| CalSyncError::Serialization(e.to_string()))?;

    let json = String::from_utf8(json).map_err(|e| CalSyncError::Serialization(e.to_string()))?;

    Ok(format!("{MARKER_PREFIX}{json}{MARKER_SUFFIX}"))
}

/// Extract a marker from a notes field.
///
/// Returns `None` for anything that is not a well-formed marker: such events
/// are unmanaged and must be left alone.
pub fn decode(notes: &str) -> Option<TrackingMarker> {
    let start = notes.find(MARKER_PREFIX)? + MARKER_PREFIX.len();
    let rest = &notes[start..];

    // Parse exactly one JSON value so a `]` inside a string can't cut it short
    let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<TrackingMarker>();
    let marker = stream.next()?.ok()?;
    let tail = &rest[stream.byte_offset()..];

    tail.trim_start().starts_with(MARKER_SUFFIX).then_some(marker)
}

/// Whether a notes field carries a well-formed marker.
pub fn is_managed(notes: Option<&str>) -> bool {
    notes.and_then(decode).is_some()
}

/// Whether a notes field was written by us at all, decodable or not.
///
/// Events with a marker never count as real occurrences, even when the
/// marker is from an older layout or was edited by hand.
pub fn has_marker(notes: Option<&str>) -> bool {
    notes.is_some_and(|n| n.contains(MARKER_PREFIX))
}

/// Digest over the fields whose change must rewrite a placeholder.
///
/// Hashes the resolved decision rather than raw availability/status, so two
/// source states that mirror the same way never cause an update.
pub fn content_hash(occurrence: &Occurrence, decision: SyncDecision) -> String {
    let canonical = format!(
        "{}|{}|{}",
        occurrence.start.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        occurrence.end.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        decision.as_str()
    );

    let digest = Sha256::digest(canonical.as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(HASH_LEN);
    hash
}

/// Fresh identifier for a new placeholder.
pub fn new_tracking_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(TRACKING_ID_LEN);
    id
}
