//! Join-code lookup and joined-event listing.
//!
//! Both lookups have an index-backed path (`codes/` and `memberships/`) and a
//! full-scan path over `events/`. Index hits are always re-verified against the
//! event itself, so a stale index entry degrades to a miss, never a wrong answer.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::code;
use crate::error::{EventlyError, EventlyResult};
use crate::event::Event;
use crate::path;
use crate::store::{DocumentStore, WriteBatch};

/// Value stored at `codes/{code}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeIndexEntry {
    pub owner_id: String,
    pub event_id: String,
}

/// Counts written by [`JoinResolver::rebuild_indexes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexReport {
    pub codes: usize,
    pub memberships: usize,
}

pub struct JoinResolver {
    store: Arc<dyn DocumentStore>,
    use_indexes: bool,
}

impl JoinResolver {
    pub fn new(store: Arc<dyn DocumentStore>, use_indexes: bool) -> Self {
        JoinResolver { store, use_indexes }
    }

    pub fn uses_indexes(&self) -> bool {
        self.use_indexes
    }

    /// Read one event, `None` if nothing is stored there.
    pub async fn fetch(&self, owner_id: &str, event_id: &str) -> EventlyResult<Option<Event>> {
        let snapshot = self.store.get(&path::event(owner_id, event_id)?).await?;
        match snapshot.value {
            Some(value) => event_at(owner_id, event_id, value).map(Some),
            None => Ok(None),
        }
    }

    /// Every event of every owner, in owner-key then event-key order.
    pub async fn scan_all(&self) -> EventlyResult<Vec<Event>> {
        let snapshot = self.store.get(&path::all_events()?).await?;
        let events = snapshot.value.as_ref().map(events_from_tree).unwrap_or_default();
        debug!(count = events.len(), "scanned all events");
        Ok(events)
    }

    pub async fn find_by_code(&self, code: &str) -> EventlyResult<Event> {
        let code = code::normalize(code);
        if code.is_empty() {
            return Err(EventlyError::Validation("Please enter an event code".into()));
        }

        if self.use_indexes {
            if let Some(event) = self.find_by_code_indexed(&code).await? {
                return Ok(event);
            }
        }
        self.find_by_code_scan(&code).await
    }

    async fn find_by_code_indexed(&self, code: &str) -> EventlyResult<Option<Event>> {
        // Codes with characters that cannot be path segments were never indexed.
        let Ok(index_path) = path::code(code) else {
            return Ok(None);
        };
        let entry = match self.store.get(&index_path).await?.deserialize::<CodeIndexEntry>() {
            Ok(Some(entry)) => entry,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!(code, error = %e, "malformed join code index entry");
                return Ok(None);
            }
        };

        match self.fetch(&entry.owner_id, &entry.event_id).await {
            Ok(Some(event)) if event.code == code => Ok(Some(event)),
            Ok(_) | Err(EventlyError::Serialization(_)) => {
                warn!(
                    code,
                    owner_id = %entry.owner_id,
                    event_id = %entry.event_id,
                    "stale join code index entry, falling back to scan"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// First event carrying `code` in store enumeration order.
    pub async fn find_by_code_scan(&self, code: &str) -> EventlyResult<Event> {
        self.scan_all()
            .await?
            .into_iter()
            .find(|event| event.code == code)
            .ok_or_else(|| EventlyError::NotFound(format!("No event found with code {}", code)))
    }

    /// True if `code` is claimed in the index (or, without indexes, by any event).
    pub async fn code_in_use(&self, code: &str) -> EventlyResult<bool> {
        if self.store.get(&path::code(code)?).await?.exists() {
            return Ok(true);
        }
        if self.use_indexes {
            return Ok(false);
        }
        Ok(self.scan_all().await?.iter().any(|event| event.code == code))
    }

    /// Events `uid` attends but does not own.
    pub async fn list_joined_events(&self, uid: &str) -> EventlyResult<Vec<Event>> {
        if !self.use_indexes {
            return Ok(joined_from(&self.scan_all().await?, uid));
        }

        let snapshot = self.store.get(&path::memberships(uid)?).await?;
        let mut joined = Vec::new();
        for (event_id, owner) in snapshot.children() {
            let Some(owner_id) = owner.as_str() else {
                warn!(uid, event_id, "membership entry is not an owner id");
                continue;
            };
            match self.fetch(owner_id, event_id).await? {
                Some(event) if event.has_attendee(uid) && !event.is_owned_by(uid) => {
                    joined.push(event)
                }
                Some(_) => {}
                None => debug!(uid, event_id, owner_id, "membership points at a missing event"),
            }
        }
        Ok(joined)
    }

    /// Rewrite `codes/` and `memberships/` from a full scan.
    ///
    /// Needed once for trees written before the indexes existed.
    pub async fn rebuild_indexes(&self) -> EventlyResult<IndexReport> {
        let events = self.scan_all().await?;
        let mut report = IndexReport::default();
        let mut claimed = HashSet::new();

        let mut batch = WriteBatch::new()
            .remove(path::StorePath::root().child("codes")?)
            .remove(path::StorePath::root().child("memberships")?);

        for event in &events {
            if !event.code.is_empty() && claimed.insert(event.code.clone()) {
                match path::code(&event.code) {
                    Ok(index_path) => {
                        let entry = CodeIndexEntry {
                            owner_id: event.owner_id.clone(),
                            event_id: event.id.clone(),
                        };
                        batch = batch.set(index_path, serde_json::to_value(entry)?);
                        report.codes += 1;
                    }
                    Err(e) => warn!(event_id = %event.id, error = %e, "join code cannot be indexed"),
                }
            }
            for uid in event.attendees.keys() {
                batch = batch.set(
                    path::membership(uid, &event.id)?,
                    Value::String(event.owner_id.clone()),
                );
                report.memberships += 1;
            }
        }

        self.store.update(batch).await?;
        info!(codes = report.codes, memberships = report.memberships, "rebuilt indexes");
        Ok(report)
    }
}

/// Build an event read from `events/{owner_id}/{event_id}`.
///
/// Legacy nodes without an `ownerId` field take it from their path.
pub(crate) fn event_at(owner_id: &str, event_id: &str, value: Value) -> EventlyResult<Event> {
    let mut event = Event::from_value(event_id, value)?;
    if event.owner_id.is_empty() {
        event.owner_id = owner_id.to_string();
    }
    Ok(event)
}

/// Flatten the `events/` subtree. Nodes that do not parse as events are skipped.
pub fn events_from_tree(tree: &Value) -> Vec<Event> {
    let Some(owners) = tree.as_object() else {
        return Vec::new();
    };

    let mut events = Vec::new();
    for (owner_id, owned) in owners {
        let Some(owned) = owned.as_object() else {
            continue;
        };
        for (event_id, value) in owned {
            match event_at(owner_id, event_id, value.clone()) {
                Ok(event) => events.push(event),
                Err(e) => warn!(owner_id, event_id, error = %e, "skipping malformed event"),
            }
        }
    }
    events
}

/// Events in `events` that `uid` attends without owning.
pub fn joined_from(events: &[Event], uid: &str) -> Vec<Event> {
    events
        .iter()
        .filter(|event| event.has_attendee(uid) && !event.is_owned_by(uid))
        .cloned()
        .collect()
}
