//! Represents an event — the top-level grouping guests upload media into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sub-events used when the creation form omits the field entirely.
pub const DEFAULT_SUBEVENTS_INPUT: &str = "mehndi,nikkah,reception";

/// Sub-event used when every entry of the submitted list is blank.
pub const FALLBACK_SUBEVENT: &str = "main";

/// Display name used when the creation form omits it.
pub const DEFAULT_EVENT_NAME: &str = "event";

/// Name of the empty object that marks a "directory" as existing.
pub const PLACEHOLDER_NAME: &str = ".init";

const EVENT_ID_LEN: usize = 8;

/// Event metadata persisted at `events/{event_id}/event.json`.
///
/// Sub-events are not stored entities of their own; they only exist as path
/// segments below the event prefix and as entries in this list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Event {
    /// Display name chosen by the organiser.
    pub name: String,

    /// Ordered, non-empty list of sub-event names.
    pub subevents: Vec<String>,

    /// Creation time. Older metadata blobs do not carry it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(name: impl Into<String>, subevents: Vec<String>) -> Self {
        Self {
            name: name.into(),
            subevents,
            created_at: Some(Utc::now()),
        }
    }
}

/// Split a free-text, comma-separated sub-event list.
///
/// Entries are trimmed, blanks and repeats are dropped. An input with no
/// usable entry yields exactly one [`FALLBACK_SUBEVENT`].
pub fn parse_subevents(raw: &str) -> Vec<String> {
    let mut subevents: Vec<String> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !subevents.iter().any(|existing| existing == entry) {
            subevents.push(entry.to_string());
        }
    }
    if subevents.is_empty() {
        subevents.push(FALLBACK_SUBEVENT.to_string());
    }
    subevents
}

/// Generate a fresh opaque event identifier (8 lowercase hex characters).
pub fn new_event_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(EVENT_ID_LEN);
    id
}

/// Prefix under which every object of an event lives.
pub fn event_prefix(event_id: &str) -> String {
    format!("events/{}/", event_id)
}

pub fn event_metadata_path(event_id: &str) -> String {
    format!("events/{}/event.json", event_id)
}

pub fn subevent_prefix(event_id: &str, subevent: &str) -> String {
    format!("events/{}/{}/", event_id, subevent)
}

pub fn media_path(event_id: &str, subevent: &str, filename: &str) -> String {
    format!("events/{}/{}/{}", event_id, subevent, filename)
}

/// True if `path` names a placeholder marker rather than real content.
pub fn is_placeholder(path: &str) -> bool {
    path.rsplit('/').next() == Some(PLACEHOLDER_NAME)
}
