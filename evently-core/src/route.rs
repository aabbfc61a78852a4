//! Navigation parameters identifying the active event.

use std::fmt;
use std::str::FromStr;

use crate::error::{EventlyError, EventlyResult};

/// The `(uid, eid)` pair a view is opened with: owner id and event id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventRoute {
    pub owner_id: String,
    pub event_id: String,
}

impl EventRoute {
    /// Build from optional route parameters; either one missing is an error.
    pub fn from_params(uid: Option<&str>, eid: Option<&str>) -> EventlyResult<Self> {
        let owner_id = uid
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| EventlyError::InvalidRoute("missing owner id".into()))?;
        let event_id = eid
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| EventlyError::InvalidRoute("missing event id".into()))?;

        Ok(EventRoute {
            owner_id: owner_id.to_string(),
            event_id: event_id.to_string(),
        })
    }
}

impl fmt::Display for EventRoute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.owner_id, self.event_id)
    }
}

impl FromStr for EventRoute {
    type Err = EventlyError;

    /// Parse `{uid}/{eid}`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().trim_matches('/').splitn(2, '/');
        let route = EventRoute::from_params(parts.next(), parts.next())?;
        if route.event_id.contains('/') {
            return Err(EventlyError::InvalidRoute(format!(
                "'{}' has too many segments, expected <owner>/<event>",
                s
            )));
        }
        Ok(route)
    }
}
