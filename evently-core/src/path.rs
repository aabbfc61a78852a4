//! Store paths and the persisted tree layout.
//!
//! Every node lives at a `/`-separated path. The layout is:
//!
//! ```text
//! users/{uid}
//! events/{ownerId}/{eventId}
//! events/{ownerId}/{eventId}/attendees/{uid}
//! events/{ownerId}/{eventId}/events/{subEventId}
//! events/{ownerId}/{eventId}/events/{subEventId}/attendees/{sanitizedEmail}
//! events/{ownerId}/{eventId}/events/{subEventId}/reviews/{reviewId}
//! codes/{code}
//! memberships/{uid}/{eventId}
//! transfers/{eventId}
//! ```

use std::fmt;

use crate::error::{EventlyError, EventlyResult};

/// Characters the store refuses inside a single path segment.
const FORBIDDEN: &[char] = &['.', '#', '$', '[', ']', '/'];

/// A validated, absolute path into the document tree. The empty path is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    pub fn root() -> Self {
        StorePath::default()
    }

    /// Parse a `/`-separated path. Leading and trailing slashes are ignored.
    pub fn parse(path: &str) -> EventlyResult<Self> {
        let mut parsed = StorePath::root();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            parsed = parsed.child(segment)?;
        }
        Ok(parsed)
    }

    pub fn child(&self, segment: &str) -> EventlyResult<Self> {
        validate_segment(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(StorePath { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, i.e. the key this node is stored under.
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn parent(&self) -> Option<StorePath> {
        if self.is_root() {
            return None;
        }
        Some(StorePath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// True if `self` equals `other` or lies underneath it.
    pub fn starts_with(&self, other: &StorePath) -> bool {
        self.segments.len() >= other.segments.len()
            && self.segments[..other.segments.len()] == other.segments[..]
    }

    /// True if one path is an ancestor of (or equal to) the other.
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

fn validate_segment(segment: &str) -> EventlyResult<()> {
    if segment.is_empty() {
        return Err(EventlyError::InvalidPath("empty path segment".into()));
    }
    if let Some(c) = segment.chars().find(|c| FORBIDDEN.contains(c) || c.is_control()) {
        return Err(EventlyError::InvalidPath(format!(
            "segment '{}' contains forbidden character '{}'",
            segment, c
        )));
    }
    Ok(())
}

/// Make an email usable as a path segment by replacing every `.` with `,`.
///
/// Emails that already contain a literal comma do not survive the round trip.
pub fn sanitize_email(email: &str) -> String {
    email.replace('.', ",")
}

/// Reverse of [`sanitize_email`].
pub fn unsanitize_email(key: &str) -> String {
    key.replace(',', ".")
}

// PATH BUILDERS:

pub fn user(uid: &str) -> EventlyResult<StorePath> {
    StorePath::root().child("users")?.child(uid)
}

pub fn all_events() -> EventlyResult<StorePath> {
    StorePath::root().child("events")
}

pub fn owner_events(owner_id: &str) -> EventlyResult<StorePath> {
    all_events()?.child(owner_id)
}

pub fn event(owner_id: &str, event_id: &str) -> EventlyResult<StorePath> {
    owner_events(owner_id)?.child(event_id)
}

pub fn event_attendees(owner_id: &str, event_id: &str) -> EventlyResult<StorePath> {
    event(owner_id, event_id)?.child("attendees")
}

pub fn event_attendee(owner_id: &str, event_id: &str, uid: &str) -> EventlyResult<StorePath> {
    event_attendees(owner_id, event_id)?.child(uid)
}

pub fn sub_events(owner_id: &str, event_id: &str) -> EventlyResult<StorePath> {
    event(owner_id, event_id)?.child("events")
}

pub fn sub_event(owner_id: &str, event_id: &str, sub_event_id: &str) -> EventlyResult<StorePath> {
    sub_events(owner_id, event_id)?.child(sub_event_id)
}

pub fn sub_event_attendees(
    owner_id: &str,
    event_id: &str,
    sub_event_id: &str,
) -> EventlyResult<StorePath> {
    sub_event(owner_id, event_id, sub_event_id)?.child("attendees")
}

/// Attendance record of `email` on a sub-event. The email is sanitized here.
pub fn sub_event_attendee(
    owner_id: &str,
    event_id: &str,
    sub_event_id: &str,
    email: &str,
) -> EventlyResult<StorePath> {
    sub_event_attendees(owner_id, event_id, sub_event_id)?.child(&sanitize_email(email))
}

pub fn reviews(owner_id: &str, event_id: &str, sub_event_id: &str) -> EventlyResult<StorePath> {
    sub_event(owner_id, event_id, sub_event_id)?.child("reviews")
}

pub fn code(code: &str) -> EventlyResult<StorePath> {
    StorePath::root().child("codes")?.child(code)
}

pub fn memberships(uid: &str) -> EventlyResult<StorePath> {
    StorePath::root().child("memberships")?.child(uid)
}

pub fn membership(uid: &str, event_id: &str) -> EventlyResult<StorePath> {
    memberships(uid)?.child(event_id)
}

pub fn transfers() -> EventlyResult<StorePath> {
    StorePath::root().child("transfers")
}

pub fn transfer(event_id: &str) -> EventlyResult<StorePath> {
    transfers()?.child(event_id)
}
