//! Event, sub-event, attendee and review types.
//!
//! Field names follow the persisted tree (camelCase). Ids are never stored
//! inside a node: they are the node's key and are filled in when reading.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::constants::MISSING_EMAIL;
use crate::error::{EventlyError, EventlyResult};
use crate::path::unsanitize_email;

/// A top-level planning container, stored at `events/{ownerId}/{id}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub owner_id: String,
    /// Keyed by user id.
    #[serde(
        default,
        deserialize_with = "lenient_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub attendees: BTreeMap<String, EventAttendee>,
    #[serde(
        default,
        rename = "events",
        deserialize_with = "lenient_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sub_events: BTreeMap<String, SubEvent>,
    #[serde(
        default,
        deserialize_with = "lenient_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub reviews: BTreeMap<String, Review>,
}

impl Event {
    /// Build from a stored node, filling in ids from the node keys.
    pub fn from_value(id: &str, value: Value) -> EventlyResult<Self> {
        let mut event: Event = serde_json::from_value(value)?;
        event.id = id.to_string();
        for (sub_id, sub_event) in event.sub_events.iter_mut() {
            sub_event.id = sub_id.clone();
        }
        Ok(event)
    }

    pub fn is_owned_by(&self, uid: &str) -> bool {
        self.owner_id == uid
    }

    pub fn has_attendee(&self, uid: &str) -> bool {
        self.attendees.contains_key(uid)
    }

    /// `(uid, email)` pairs for the attendee list.
    pub fn attendee_list(&self) -> Vec<(String, String)> {
        self.attendees
            .iter()
            .map(|(uid, attendee)| {
                let email = attendee
                    .email
                    .clone()
                    .unwrap_or_else(|| MISSING_EMAIL.to_string());
                (uid.clone(), email)
            })
            .collect()
    }

    /// Sub-events in key (creation) order.
    pub fn sub_event_list(&self) -> Vec<SubEvent> {
        self.sub_events.values().cloned().collect()
    }
}

/// A participant of a top-level event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventAttendee {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A dated activity inside an event, stored at `.../events/{id}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubEvent {
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// ISO date, inclusive.
    #[serde(default)]
    pub start_date: String,
    /// ISO date, inclusive.
    #[serde(default)]
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default)]
    pub details: String,
    /// Image as a data URL.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub photo: Option<String>,
    #[serde(default)]
    pub owner_id: String,
    /// Keyed by sanitized email.
    #[serde(
        default,
        deserialize_with = "lenient_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub attendees: BTreeMap<String, SubEventAttendee>,
    #[serde(
        default,
        deserialize_with = "lenient_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub reviews: BTreeMap<String, Review>,
}

impl SubEvent {
    pub fn from_value(id: &str, value: Value) -> EventlyResult<Self> {
        let mut sub_event: SubEvent = serde_json::from_value(value)?;
        sub_event.id = id.to_string();
        Ok(sub_event)
    }

    /// Status of `email`, `None` when pending or not invited.
    pub fn status_of(&self, email: &str) -> Option<AttendanceStatus> {
        self.attendees
            .get(&crate::path::sanitize_email(email))
            .and_then(|a| a.status)
    }

    /// Attendees with their real email addresses, in key order.
    pub fn attendee_list(&self) -> Vec<(String, Option<AttendanceStatus>)> {
        self.attendees
            .iter()
            .map(|(key, attendee)| (unsanitize_email(key), attendee.status))
            .collect()
    }
}

/// Attendance of one person on a sub-event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubEventAttendee {
    /// Absent while the invitation is pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AttendanceStatus>,
    /// Written when seeding from the parent event; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[serde(rename = "attending")]
    Attending,
    #[serde(rename = "not attending")]
    NotAttending,
    #[serde(rename = "not sure")]
    NotSure,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Attending => "attending",
            AttendanceStatus::NotAttending => "not attending",
            AttendanceStatus::NotSure => "not sure",
        }
    }

    /// Clicking the current status again resets it to "not sure".
    pub fn toggled(current: Option<AttendanceStatus>, requested: AttendanceStatus) -> Self {
        if current == Some(requested) {
            AttendanceStatus::NotSure
        } else {
            requested
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = EventlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "attending" | "yes" => Ok(AttendanceStatus::Attending),
            "not attending" | "no" => Ok(AttendanceStatus::NotAttending),
            "not sure" | "maybe" => Ok(AttendanceStatus::NotSure),
            other => Err(EventlyError::Validation(format!(
                "Unknown attendance status '{}'. Expected attending, not attending or not sure",
                other
            ))),
        }
    }
}

/// A review left on a sub-event. Reviews are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub user_email: String,
    pub comment: String,
    /// Written as an integer; fractional ratings from older data are rounded.
    #[serde(deserialize_with = "whole_rating")]
    pub rating: i64,
    /// RFC 3339, captured when the review was submitted.
    pub timestamp: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub photo: Option<String>,
}

impl Review {
    fn parsed_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.timestamp).ok()
    }
}

/// A review together with its key.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewEntry {
    pub id: String,
    pub review: Review,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewSort {
    /// Newest first.
    #[default]
    DateDesc,
    DateAsc,
    /// By reviewer email.
    Alpha,
}

impl FromStr for ReviewSort {
    type Err = EventlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dateDesc" | "date-desc" | "newest" => Ok(ReviewSort::DateDesc),
            "dateAsc" | "date-asc" | "oldest" => Ok(ReviewSort::DateAsc),
            "alpha" => Ok(ReviewSort::Alpha),
            other => Err(EventlyError::Validation(format!(
                "Unknown review sort '{}'",
                other
            ))),
        }
    }
}

/// Reviews in the requested order. Ties keep key order; unparsable timestamps
/// sort as the oldest.
pub fn sorted_reviews(reviews: &BTreeMap<String, Review>, sort: ReviewSort) -> Vec<ReviewEntry> {
    let mut entries: Vec<ReviewEntry> = reviews
        .iter()
        .map(|(id, review)| ReviewEntry {
            id: id.clone(),
            review: review.clone(),
        })
        .collect();

    let by_date = |a: &ReviewEntry, b: &ReviewEntry| -> Ordering {
        a.review.parsed_timestamp().cmp(&b.review.parsed_timestamp())
    };

    match sort {
        ReviewSort::DateAsc => entries.sort_by(by_date),
        ReviewSort::DateDesc => entries.sort_by(|a, b| by_date(b, a)),
        ReviewSort::Alpha => entries.sort_by(|a, b| {
            a.review
                .user_email
                .to_lowercase()
                .cmp(&b.review.user_email.to_lowercase())
        }),
    }
    entries
}

/// Fields the owner fills in when adding a sub-event.
#[derive(Debug, Clone, Default)]
pub struct SubEventDraft {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub start_time: Option<String>,
    pub details: String,
    pub photo: Option<String>,
}

/// A review as submitted, before the timestamp is attached.
#[derive(Debug, Clone, Default)]
pub struct ReviewDraft {
    pub comment: String,
    pub rating: i64,
    pub photo: Option<String>,
}

/// Result of creating an event.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedEvent {
    pub event_id: String,
    pub code: String,
}

/// Result of a join attempt that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    Joined(Event),
    /// The caller was already an attendee; nothing was written.
    AlreadyJoined(Event),
}

impl JoinOutcome {
    pub fn event(&self) -> &Event {
        match self {
            JoinOutcome::Joined(event) | JoinOutcome::AlreadyJoined(event) => event,
        }
    }
}

/// Photos are data URLs; anything but an image is rejected.
pub fn validate_photo(photo: Option<&str>) -> EventlyResult<()> {
    match photo {
        Some(p) if !p.is_empty() && !p.starts_with("data:image/") => Err(
            EventlyError::Validation("Please select a valid image file".into()),
        ),
        _ => Ok(()),
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// A keyed map whose unreadable entries are skipped instead of failing the parent.
fn lenient_map<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Object(entries) => entries,
        Value::Null => return Ok(BTreeMap::new()),
        other => {
            warn!(found = %other, "expected a keyed map, ignoring");
            return Ok(BTreeMap::new());
        }
    };

    Ok(entries
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value(value) {
            Ok(entry) => Some((key, entry)),
            Err(e) => {
                warn!(key = %key, error = %e, "skipping unreadable entry");
                None
            }
        })
        .collect())
}

fn whole_rating<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    number
        .as_i64()
        .or_else(|| number.as_f64().map(|n| n.round() as i64))
        .ok_or_else(|| serde::de::Error::custom(format!("rating {} is out of range", number)))
}
