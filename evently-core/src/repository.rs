//! Event repository: creating, joining and editing events, sub-events,
//! attendance and reviews.
//!
//! Every operation resolves the signed-in user first and fails with
//! [`EventlyError::NotAuthenticated`] when there is none. Owner-only operations
//! compare the caller against the `ownerId` stored on the event.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::code;
use crate::constants::{JOIN_CODE_ATTEMPTS, MAX_RATING};
use crate::error::{EventlyError, EventlyResult};
use crate::event::{
    AttendanceStatus, CreatedEvent, Event, EventAttendee, JoinOutcome, Review, ReviewDraft, ReviewEntry,
    ReviewSort, SubEvent, SubEventDraft, sorted_reviews, validate_photo,
};
use crate::identity::{IdentityProvider, UserHandle, require_user};
use crate::path::{self, sanitize_email};
use crate::resolver::{CodeIndexEntry, JoinResolver, event_at};
use crate::store::{DocumentStore, WriteBatch};

/// Record left at `transfers/{eventId}` while ownership moves between paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferMarker {
    pub from_owner: String,
    pub to_owner: String,
    pub started_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// The event had reached its new path; the old copy was removed.
    RolledForward,
    /// The event never left its old path; only the marker was dropped.
    RolledBack,
    /// Neither path holds the event any more.
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecovery {
    pub event_id: String,
    pub marker: TransferMarker,
    pub outcome: RecoveryOutcome,
}

pub struct EventRepository {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    resolver: JoinResolver,
}

impl EventRepository {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        use_indexes: bool,
    ) -> Self {
        let resolver = JoinResolver::new(store.clone(), use_indexes);
        EventRepository {
            store,
            identity,
            resolver,
        }
    }

    pub fn resolver(&self) -> &JoinResolver {
        &self.resolver
    }

    fn current_user(&self) -> EventlyResult<UserHandle> {
        require_user(self.identity.as_ref())
    }

    async fn load_event(&self, owner_id: &str, event_id: &str) -> EventlyResult<Event> {
        self.resolver
            .fetch(owner_id, event_id)
            .await?
            .ok_or_else(|| EventlyError::NotFound(format!("Event {} not found", event_id)))
    }

    /// Load the event and check the caller owns it.
    async fn load_owned(&self, owner_id: &str, event_id: &str) -> EventlyResult<(UserHandle, Event)> {
        let user = self.current_user()?;
        let event = self.load_event(owner_id, event_id).await?;
        if !event.is_owned_by(&user.uid) {
            return Err(EventlyError::NotOwner);
        }
        Ok((user, event))
    }

    async fn unused_code(&self) -> EventlyResult<String> {
        for _ in 0..JOIN_CODE_ATTEMPTS {
            let candidate = code::generate();
            if !self.resolver.code_in_use(&candidate).await? {
                return Ok(candidate);
            }
            debug!(code = %candidate, "join code already taken, retrying");
        }
        Err(EventlyError::StoreUnavailable(format!(
            "No unused join code after {} attempts",
            JOIN_CODE_ATTEMPTS
        )))
    }

    // EVENTS:

    /// Create an event owned by the caller and return its id and join code.
    ///
    /// Adding the owner as an attendee is a second write. If it fails the event
    /// still exists and the call succeeds; the failure is only logged.
    pub async fn create_event(&self, name: &str) -> EventlyResult<CreatedEvent> {
        let user = self.current_user()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(EventlyError::Validation("Please enter an event name".into()));
        }

        let code = self.unused_code().await?;
        let event_id = self.store.generate_key();
        let index = CodeIndexEntry {
            owner_id: user.uid.clone(),
            event_id: event_id.clone(),
        };

        let batch = WriteBatch::new()
            .set(
                path::event(&user.uid, &event_id)?,
                json!({ "name": name, "code": code, "ownerId": user.uid }),
            )
            .set(path::code(&code)?, serde_json::to_value(index)?);
        self.store.update(batch).await?;
        info!(event_id = %event_id, code = %code, "created event");

        if let Err(e) = self.add_attendee(&user, &user.uid, &event_id).await {
            warn!(event_id = %event_id, error = %e, "event created but owner was not added as attendee");
        }

        Ok(CreatedEvent { event_id, code })
    }

    /// Attendee record plus membership index entry, in one write.
    async fn add_attendee(&self, user: &UserHandle, owner_id: &str, event_id: &str) -> EventlyResult<()> {
        let batch = WriteBatch::new()
            .set(
                path::event_attendee(owner_id, event_id, &user.uid)?,
                json!({ "email": user.email }),
            )
            .set(
                path::membership(&user.uid, event_id)?,
                Value::String(owner_id.to_string()),
            );
        self.store.update(batch).await
    }

    pub async fn join_event(&self, code: &str) -> EventlyResult<JoinOutcome> {
        let user = self.current_user()?;
        let mut event = self.resolver.find_by_code(code).await?;

        if event.is_owned_by(&user.uid) {
            return Err(EventlyError::OwnerCannotJoin);
        }
        if event.has_attendee(&user.uid) {
            debug!(event_id = %event.id, "already joined");
            return Ok(JoinOutcome::AlreadyJoined(event));
        }

        self.add_attendee(&user, &event.owner_id, &event.id).await?;
        info!(event_id = %event.id, uid = %user.uid, "joined event");

        event.attendees.insert(
            user.uid.clone(),
            EventAttendee {
                email: Some(user.email.clone()),
            },
        );
        Ok(JoinOutcome::Joined(event))
    }

    /// Delete one of the caller's events together with its index entries.
    ///
    /// Works on the raw node, so an event with unreadable fields can still be removed.
    pub async fn delete_event(&self, event_id: &str) -> EventlyResult<()> {
        let user = self.current_user()?;
        let event_path = path::event(&user.uid, event_id)?;
        let tree = self
            .store
            .get(&event_path)
            .await?
            .value
            .ok_or_else(|| EventlyError::NotFound(format!("Event {} not found", event_id)))?;

        let mut batch = WriteBatch::new().remove(event_path);
        let code = tree.get("code").and_then(Value::as_str).unwrap_or_default();
        if let Ok(code_path) = path::code(code) {
            let entry = self.store.get(&code_path).await?.deserialize::<CodeIndexEntry>();
            if let Ok(Some(entry)) = entry {
                if entry.owner_id == user.uid && entry.event_id == event_id {
                    batch = batch.remove(code_path);
                }
            }
        }
        if let Some(attendees) = tree.get("attendees").and_then(Value::as_object) {
            for uid in attendees.keys() {
                match path::membership(uid, event_id) {
                    Ok(membership) => batch = batch.remove(membership),
                    Err(e) => warn!(event_id, error = %e, "attendee key cannot be a membership path"),
                }
            }
        }

        self.store.update(batch).await?;
        info!(event_id, "deleted event");
        Ok(())
    }

    pub async fn fetch_event(&self, owner_id: &str, event_id: &str) -> EventlyResult<Event> {
        self.current_user()?;
        self.load_event(owner_id, event_id).await
    }

    /// The caller's own events, in creation order.
    pub async fn owned_events(&self) -> EventlyResult<Vec<Event>> {
        let user = self.current_user()?;
        let snapshot = self.store.get(&path::owner_events(&user.uid)?).await?;

        let mut events = Vec::new();
        for (event_id, value) in snapshot.children() {
            match event_at(&user.uid, event_id, value.clone()) {
                Ok(event) => events.push(event),
                Err(e) => warn!(event_id, error = %e, "skipping malformed event"),
            }
        }
        Ok(events)
    }

    /// Events the caller attends but does not own.
    pub async fn joined_events(&self) -> EventlyResult<Vec<Event>> {
        let user = self.current_user()?;
        self.resolver.list_joined_events(&user.uid).await
    }

    // SUB-EVENTS:

    /// Add a sub-event and invite everyone currently attending the event.
    pub async fn add_sub_event(
        &self,
        owner_id: &str,
        event_id: &str,
        draft: SubEventDraft,
    ) -> EventlyResult<SubEvent> {
        let (user, event) = self.load_owned(owner_id, event_id).await?;
        if draft.name.trim().is_empty() {
            return Err(EventlyError::Validation("Please enter a name".into()));
        }
        validate_photo(draft.photo.as_deref())?;

        let mut sub_event = SubEvent {
            id: String::new(),
            name: draft.name.trim().to_string(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            start_time: draft.start_time.filter(|t| !t.is_empty()),
            details: draft.details,
            photo: draft.photo.filter(|p| !p.is_empty()),
            owner_id: user.uid.clone(),
            ..Default::default()
        };
        sub_event.id = self
            .store
            .push(&path::sub_events(owner_id, event_id)?, serde_json::to_value(&sub_event)?)
            .await?;

        // Snapshot of the attendees right now; later joiners are not added.
        let mut invited = Map::new();
        for attendee in event.attendees.values() {
            if let Some(email) = &attendee.email {
                invited.insert(sanitize_email(email), json!({ "email": email }));
            }
        }
        if !invited.is_empty() {
            self.store
                .set(
                    &path::sub_event_attendees(owner_id, event_id, &sub_event.id)?,
                    Value::Object(invited.clone()),
                )
                .await?;
            sub_event.attendees = serde_json::from_value(Value::Object(invited))?;
        }

        info!(event_id, sub_event_id = %sub_event.id, "added sub-event");
        Ok(sub_event)
    }

    /// Overwrite a sub-event with `sub_event`, attendees and reviews included.
    pub async fn update_sub_event(
        &self,
        owner_id: &str,
        event_id: &str,
        sub_event: &SubEvent,
    ) -> EventlyResult<()> {
        self.load_owned(owner_id, event_id).await?;
        if sub_event.id.is_empty() {
            return Err(EventlyError::Validation("Sub-event has no id".into()));
        }
        validate_photo(sub_event.photo.as_deref())?;

        let target = path::sub_event(owner_id, event_id, &sub_event.id)?;
        if !self.store.get(&target).await?.exists() {
            return Err(EventlyError::NotFound(format!(
                "Sub-event {} not found",
                sub_event.id
            )));
        }

        self.store.set(&target, serde_json::to_value(sub_event)?).await?;
        info!(event_id, sub_event_id = %sub_event.id, "updated sub-event");
        Ok(())
    }

    pub async fn delete_sub_event(
        &self,
        owner_id: &str,
        event_id: &str,
        sub_event_id: &str,
    ) -> EventlyResult<()> {
        self.load_owned(owner_id, event_id).await?;
        self.store
            .remove(&path::sub_event(owner_id, event_id, sub_event_id)?)
            .await?;
        info!(event_id, sub_event_id, "deleted sub-event");
        Ok(())
    }

    pub async fn list_sub_events(&self, owner_id: &str, event_id: &str) -> EventlyResult<Vec<SubEvent>> {
        self.current_user()?;
        let snapshot = self.store.get(&path::sub_events(owner_id, event_id)?).await?;

        let mut sub_events = Vec::new();
        for (id, value) in snapshot.children() {
            match SubEvent::from_value(id, value.clone()) {
                Ok(sub_event) => sub_events.push(sub_event),
                Err(e) => warn!(sub_event_id = %id, error = %e, "skipping malformed sub-event"),
            }
        }
        Ok(sub_events)
    }

    async fn load_sub_event(
        &self,
        owner_id: &str,
        event_id: &str,
        sub_event_id: &str,
    ) -> EventlyResult<SubEvent> {
        let snapshot = self
            .store
            .get(&path::sub_event(owner_id, event_id, sub_event_id)?)
            .await?;
        match snapshot.value {
            Some(value) => SubEvent::from_value(sub_event_id, value),
            None => Err(EventlyError::NotFound(format!(
                "Sub-event {} not found",
                sub_event_id
            ))),
        }
    }

    // ATTENDANCE:

    /// Write `status` for `email`, whether or not they were invited.
    /// The sub-event itself must exist.
    pub async fn set_attendance_status(
        &self,
        owner_id: &str,
        event_id: &str,
        sub_event_id: &str,
        email: &str,
        status: AttendanceStatus,
    ) -> EventlyResult<()> {
        self.current_user()?;
        self.load_sub_event(owner_id, event_id, sub_event_id).await?;
        self.store
            .set(
                &path::sub_event_attendee(owner_id, event_id, sub_event_id, email)?,
                json!({ "status": status }),
            )
            .await?;
        info!(sub_event_id, status = %status, "attendance updated");
        Ok(())
    }

    /// The caller's status on `sub_event`, `None` while pending.
    pub fn current_status(&self, sub_event: &SubEvent) -> EventlyResult<Option<AttendanceStatus>> {
        let user = self.current_user()?;
        Ok(sub_event.status_of(&user.email))
    }

    /// Set the caller's status, or reset it to "not sure" if it already is `status`.
    ///
    /// The current status is re-read from the store, not taken from a cached view.
    pub async fn toggle_own_status(
        &self,
        owner_id: &str,
        event_id: &str,
        sub_event_id: &str,
        status: AttendanceStatus,
    ) -> EventlyResult<AttendanceStatus> {
        let user = self.current_user()?;
        let record = path::sub_event_attendee(owner_id, event_id, sub_event_id, &user.email)?;
        let current = self
            .store
            .get(&record.child("status")?)
            .await?
            .deserialize::<AttendanceStatus>()
            .unwrap_or_else(|e| {
                warn!(sub_event_id, error = %e, "unreadable attendance status, treating as pending");
                None
            });

        let next = AttendanceStatus::toggled(current, status);
        self.set_attendance_status(owner_id, event_id, sub_event_id, &user.email, next)
            .await?;
        Ok(next)
    }

    /// `(email, status)` for each invited person.
    pub fn attendees(&self, sub_event: &SubEvent) -> Vec<(String, Option<AttendanceStatus>)> {
        sub_event.attendee_list()
    }

    /// `(uid, email)` for each participant of the event.
    pub async fn event_attendees(&self, owner_id: &str, event_id: &str) -> EventlyResult<Vec<(String, String)>> {
        self.current_user()?;
        Ok(self.load_event(owner_id, event_id).await?.attendee_list())
    }

    /// Remove a participant from the event and, best-effort, from every sub-event.
    pub async fn delete_participant(
        &self,
        owner_id: &str,
        event_id: &str,
        uid: &str,
        email: &str,
    ) -> EventlyResult<()> {
        let user = self.current_user()?;
        let event = self.load_event(owner_id, event_id).await?;
        if uid == event.owner_id {
            return Err(EventlyError::CannotRemoveOwner);
        }
        if !event.is_owned_by(&user.uid) {
            return Err(EventlyError::NotOwner);
        }

        let batch = WriteBatch::new()
            .remove(path::event_attendee(owner_id, event_id, uid)?)
            .remove(path::membership(uid, event_id)?);
        self.store.update(batch).await?;
        info!(event_id, uid, "removed participant");

        for sub_event_id in event.sub_events.keys() {
            let removed = match path::sub_event_attendee(owner_id, event_id, sub_event_id, email) {
                Ok(record) => self.store.remove(&record).await,
                Err(e) => Err(e),
            };
            if let Err(e) = removed {
                warn!(event_id, sub_event_id = %sub_event_id, error = %e, "could not remove participant from sub-event");
            }
        }
        Ok(())
    }

    // OWNERSHIP:

    /// Hand one of the caller's events to `new_owner`, one of its participants,
    /// moving it to `events/{new_owner}/{event_id}`.
    ///
    /// A transfer marker is written before the move. The move itself (new
    /// path, old path, code and membership indexes, marker) is one atomic
    /// update, so an interrupted transfer is left with only the marker for
    /// [`EventRepository::recover_transfers`] to resolve.
    pub async fn promote_to_owner(&self, event_id: &str, new_owner: &str) -> EventlyResult<()> {
        let user = self.current_user()?;
        let old_path = path::event(&user.uid, event_id)?;
        let mut tree = self
            .store
            .get(&old_path)
            .await?
            .value
            .ok_or_else(|| EventlyError::NotFound(format!("Event {} not found", event_id)))?;

        let stored_owner = tree
            .get("ownerId")
            .and_then(Value::as_str)
            .unwrap_or(&user.uid)
            .to_string();
        if stored_owner != user.uid {
            return Err(EventlyError::NotOwner);
        }
        if new_owner == stored_owner {
            return Err(EventlyError::AlreadyOwner);
        }
        let is_participant = tree
            .get("attendees")
            .and_then(Value::as_object)
            .is_some_and(|attendees| attendees.contains_key(new_owner));
        if !is_participant {
            return Err(EventlyError::NotFound(format!(
                "{} is not a participant of event {}",
                new_owner, event_id
            )));
        }
        reassign_owner(&mut tree, &user.uid, new_owner);

        let marker = TransferMarker {
            from_owner: user.uid.clone(),
            to_owner: new_owner.to_string(),
            started_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        self.store
            .set(&path::transfer(event_id)?, serde_json::to_value(&marker)?)
            .await?;

        let batch = WriteBatch::new()
            .set(path::event(new_owner, event_id)?, tree.clone())
            .remove(old_path);
        let batch = repoint_indexes(batch, &tree, new_owner, event_id)?
            .remove(path::transfer(event_id)?);
        self.store.update(batch).await?;

        info!(event_id, from = %user.uid, to = new_owner, "transferred ownership");
        Ok(())
    }

    /// Resolve transfers left behind by an interrupted [`promote_to_owner`].
    ///
    /// [`promote_to_owner`]: EventRepository::promote_to_owner
    pub async fn recover_transfers(&self) -> EventlyResult<Vec<TransferRecovery>> {
        let markers = self.store.get(&path::transfers()?).await?;
        let mut recovered = Vec::new();

        for (event_id, value) in markers.children() {
            let marker: TransferMarker = match serde_json::from_value(value.clone()) {
                Ok(marker) => marker,
                Err(e) => {
                    warn!(event_id, error = %e, "dropping unreadable transfer marker");
                    self.store.remove(&path::transfer(event_id)?).await?;
                    continue;
                }
            };

            let old_path = path::event(&marker.from_owner, event_id)?;
            let new_path = path::event(&marker.to_owner, event_id)?;
            let marker_path = path::transfer(event_id)?;

            let outcome = match self.store.get(&new_path).await?.value {
                Some(tree) => {
                    let batch = WriteBatch::new().remove(old_path);
                    let batch = repoint_indexes(batch, &tree, &marker.to_owner, event_id)?
                        .remove(marker_path);
                    self.store.update(batch).await?;
                    RecoveryOutcome::RolledForward
                }
                None => {
                    let outcome = if self.store.get(&old_path).await?.exists() {
                        RecoveryOutcome::RolledBack
                    } else {
                        RecoveryOutcome::Abandoned
                    };
                    self.store.remove(&marker_path).await?;
                    outcome
                }
            };

            warn!(event_id, ?outcome, "recovered interrupted ownership transfer");
            recovered.push(TransferRecovery {
                event_id: event_id.clone(),
                marker,
                outcome,
            });
        }
        Ok(recovered)
    }

    // REVIEWS:

    /// Append a review by the caller and return its key.
    pub async fn add_review(
        &self,
        owner_id: &str,
        event_id: &str,
        sub_event_id: &str,
        draft: ReviewDraft,
    ) -> EventlyResult<String> {
        let user = self.current_user()?;

        let comment = draft.comment.trim();
        if comment.is_empty() || draft.rating <= 0 {
            return Err(EventlyError::Validation(
                "Please provide both a comment and a rating".into(),
            ));
        }
        if draft.rating > MAX_RATING {
            return Err(EventlyError::Validation(format!(
                "Rating must be between 1 and {}",
                MAX_RATING
            )));
        }
        validate_photo(draft.photo.as_deref())?;
        self.load_sub_event(owner_id, event_id, sub_event_id).await?;

        let review = Review {
            user_email: user.email.clone(),
            comment: comment.to_string(),
            rating: draft.rating,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            photo: draft.photo.filter(|p| !p.is_empty()),
        };
        let key = self
            .store
            .push(
                &path::reviews(owner_id, event_id, sub_event_id)?,
                serde_json::to_value(review)?,
            )
            .await?;

        info!(sub_event_id, review_id = %key, "added review");
        Ok(key)
    }

    pub async fn reviews(
        &self,
        owner_id: &str,
        event_id: &str,
        sub_event_id: &str,
        sort: ReviewSort,
    ) -> EventlyResult<Vec<ReviewEntry>> {
        self.current_user()?;
        let sub_event = self.load_sub_event(owner_id, event_id, sub_event_id).await?;
        Ok(sorted_reviews(&sub_event.reviews, sort))
    }
}

/// Set `ownerId` to `to` on the event and on every sub-event owned by `from`.
fn reassign_owner(tree: &mut Value, from: &str, to: &str) {
    let Some(event) = tree.as_object_mut() else {
        return;
    };
    event.insert("ownerId".into(), Value::String(to.to_string()));

    if let Some(sub_events) = event.get_mut("events").and_then(Value::as_object_mut) {
        for sub_event in sub_events.values_mut().filter_map(Value::as_object_mut) {
            let owned_by_old = sub_event
                .get("ownerId")
                .and_then(Value::as_str)
                .is_some_and(|owner| owner == from);
            if owned_by_old {
                sub_event.insert("ownerId".into(), Value::String(to.to_string()));
            }
        }
    }
}

/// Point the code and membership indexes of `tree` at `owner_id`.
fn repoint_indexes(
    mut batch: WriteBatch,
    tree: &Value,
    owner_id: &str,
    event_id: &str,
) -> EventlyResult<WriteBatch> {
    if let Some(code) = tree.get("code").and_then(Value::as_str).filter(|c| !c.is_empty()) {
        let entry = CodeIndexEntry {
            owner_id: owner_id.to_string(),
            event_id: event_id.to_string(),
        };
        match path::code(code) {
            Ok(index_path) => batch = batch.set(index_path, serde_json::to_value(entry)?),
            Err(e) => warn!(event_id, error = %e, "join code cannot be indexed"),
        }
    }
    if let Some(attendees) = tree.get("attendees").and_then(Value::as_object) {
        for uid in attendees.keys() {
            batch = batch.set(
                path::membership(uid, event_id)?,
                Value::String(owner_id.to_string()),
            );
        }
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::LocalIdentity;
    use crate::path::StorePath;
    use crate::store::{MemoryStore, Snapshot, Subscription};
    use async_trait::async_trait;

    struct Harness {
        store: Arc<MemoryStore>,
        identity: Arc<LocalIdentity>,
        repo: EventRepository,
        u1: UserHandle,
        u2: UserHandle,
    }

    impl Harness {
        async fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let identity = Arc::new(LocalIdentity::in_memory());
            let u2 = identity.sign_up("bob@example.com", "secret2").await.unwrap();
            let u1 = identity.sign_up("alice@example.com", "secret1").await.unwrap();
            let repo = EventRepository::new(store.clone(), identity.clone(), true);
            Harness {
                store,
                identity,
                repo,
                u1,
                u2,
            }
        }

        async fn as_alice(&self) {
            self.identity.sign_in("alice@example.com", "secret1").await.unwrap();
        }

        async fn as_bob(&self) {
            self.identity.sign_in("bob@example.com", "secret2").await.unwrap();
        }

        async fn value(&self, path: StorePath) -> Option<Value> {
            self.store.get(&path).await.unwrap().value
        }
    }

    fn draft(name: &str, start: &str, end: &str) -> SubEventDraft {
        SubEventDraft {
            name: name.into(),
            start_date: start.into(),
            end_date: end.into(),
            details: "details".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_signed_out_calls_fail() {
        let h = Harness::new().await;
        h.identity.sign_out().await.unwrap();

        assert!(matches!(
            h.repo.create_event("Trip").await,
            Err(EventlyError::NotAuthenticated)
        ));
        assert!(matches!(
            h.repo.join_event("AAAAAA").await,
            Err(EventlyError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_create_join_and_owner_cannot_join() {
        let h = Harness::new().await;
        let created = h.repo.create_event("Trip").await.unwrap();
        assert!(code::is_well_formed(&created.code));

        let event = h.repo.fetch_event(&h.u1.uid, &created.event_id).await.unwrap();
        assert_eq!(event.name, "Trip");
        assert_eq!(event.owner_id, h.u1.uid);
        assert_eq!(
            event.attendees[&h.u1.uid].email.as_deref(),
            Some("alice@example.com")
        );

        h.as_bob().await;
        let outcome = h.repo.join_event(&created.code).await.unwrap();
        assert!(matches!(outcome, JoinOutcome::Joined(_)));
        assert!(outcome.event().has_attendee(&h.u2.uid));
        assert_eq!(
            h.value(path::membership(&h.u2.uid, &created.event_id).unwrap()).await,
            Some(json!(h.u1.uid))
        );

        h.as_alice().await;
        assert!(matches!(
            h.repo.join_event(&created.code).await,
            Err(EventlyError::OwnerCannotJoin)
        ));
    }

    #[tokio::test]
    async fn test_join_twice_reports_already_joined() {
        let h = Harness::new().await;
        let created = h.repo.create_event("Trip").await.unwrap();

        h.as_bob().await;
        h.repo.join_event(&created.code).await.unwrap();
        let before = h.store.export();

        let again = h.repo.join_event(&created.code).await.unwrap();
        assert!(matches!(again, JoinOutcome::AlreadyJoined(_)));
        assert_eq!(again.event().attendees.len(), 2);
        assert_eq!(h.store.export(), before);
    }

    #[tokio::test]
    async fn test_unknown_code_is_not_found() {
        let h = Harness::new().await;
        assert!(matches!(
            h.repo.join_event("nope00").await,
            Err(EventlyError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_owner_never_listed_as_joined() {
        let h = Harness::new().await;
        let created = h.repo.create_event("Trip").await.unwrap();

        assert!(h.repo.joined_events().await.unwrap().is_empty());
        assert!(h.repo.resolver().list_joined_events(&h.u1.uid).await.unwrap().is_empty());

        h.as_bob().await;
        h.repo.join_event(&created.code).await.unwrap();
        let joined = h.repo.joined_events().await.unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].id, created.event_id);
    }

    #[tokio::test]
    async fn test_codes_already_indexed_are_not_reused() {
        let h = Harness::new().await;
        let mut codes = std::collections::HashSet::new();
        for i in 0..20 {
            let created = h.repo.create_event(&format!("Event {}", i)).await.unwrap();
            assert!(codes.insert(created.code.clone()));
            let entry: CodeIndexEntry = h
                .store
                .get(&path::code(&created.code).unwrap())
                .await
                .unwrap()
                .deserialize()
                .unwrap()
                .unwrap();
            assert_eq!(entry.event_id, created.event_id);
        }
    }

    /// Fails every write that touches an `attendees` node.
    struct NoAttendeeWrites(MemoryStore);

    impl NoAttendeeWrites {
        fn check<'a>(mut paths: impl Iterator<Item = &'a StorePath>) -> EventlyResult<()> {
            if paths.any(|p| p.segments().iter().any(|s| s == "attendees")) {
                return Err(EventlyError::StoreUnavailable("write rejected".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DocumentStore for NoAttendeeWrites {
        async fn get(&self, path: &StorePath) -> EventlyResult<Snapshot> {
            self.0.get(path).await
        }
        async fn set(&self, path: &StorePath, value: Value) -> EventlyResult<()> {
            Self::check(std::iter::once(path))?;
            self.0.set(path, value).await
        }
        async fn update(&self, batch: WriteBatch) -> EventlyResult<()> {
            Self::check(batch.paths())?;
            self.0.update(batch).await
        }
        async fn remove(&self, path: &StorePath) -> EventlyResult<()> {
            self.0.remove(path).await
        }
        fn generate_key(&self) -> String {
            self.0.generate_key()
        }
        async fn push(&self, path: &StorePath, value: Value) -> EventlyResult<String> {
            self.0.push(path, value).await
        }
        async fn subscribe(&self, path: &StorePath) -> EventlyResult<Subscription> {
            self.0.subscribe(path).await
        }
    }

    #[tokio::test]
    async fn test_create_survives_failed_attendee_write() {
        let store = Arc::new(NoAttendeeWrites(MemoryStore::new()));
        let identity = Arc::new(LocalIdentity::in_memory());
        let user = identity.sign_up("alice@example.com", "secret1").await.unwrap();
        let repo = EventRepository::new(store.clone(), identity, true);

        let created = repo.create_event("Trip").await.unwrap();
        let event = repo.fetch_event(&user.uid, &created.event_id).await.unwrap();
        assert_eq!(event.code, created.code);
        assert!(event.attendees.is_empty());
    }

    #[tokio::test]
    async fn test_delete_event_clears_indexes() {
        let h = Harness::new().await;
        let created = h.repo.create_event("Trip").await.unwrap();
        h.as_bob().await;
        h.repo.join_event(&created.code).await.unwrap();

        h.as_alice().await;
        h.repo.delete_event(&created.event_id).await.unwrap();
        assert!(h.value(path::event(&h.u1.uid, &created.event_id).unwrap()).await.is_none());
        assert!(h.value(path::code(&created.code).unwrap()).await.is_none());
        assert!(h.value(path::memberships(&h.u2.uid).unwrap()).await.is_none());

        assert!(matches!(
            h.repo.delete_event(&created.event_id).await,
            Err(EventlyError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sub_event_seeds_attendees_from_snapshot() {
        let h = Harness::new().await;
        let created = h.repo.create_event("Trip").await.unwrap();
        h.as_bob().await;
        h.repo.join_event(&created.code).await.unwrap();

        assert!(matches!(
            h.repo
                .add_sub_event(&h.u1.uid, &created.event_id, draft("Hike", "2025-06-10", "2025-06-12"))
                .await,
            Err(EventlyError::NotOwner)
        ));

        h.as_alice().await;
        let sub_event = h
            .repo
            .add_sub_event(&h.u1.uid, &created.event_id, draft("Hike", "2025-06-10", "2025-06-12"))
            .await
            .unwrap();
        assert_eq!(sub_event.owner_id, h.u1.uid);

        let listed = h.repo.list_sub_events(&h.u1.uid, &created.event_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, sub_event.id);
        assert_eq!(
            h.repo.attendees(&listed[0]),
            vec![
                ("alice@example.com".to_string(), None),
                ("bob@example.com".to_string(), None),
            ]
        );
        assert!(
            h.value(
                path::sub_event_attendee(&h.u1.uid, &created.event_id, &sub_event.id, "bob@example.com")
                    .unwrap()
            )
            .await
            .is_some()
        );
    }

    #[tokio::test]
    async fn test_add_sub_event_to_missing_event_is_not_found() {
        let h = Harness::new().await;
        assert!(matches!(
            h.repo.add_sub_event(&h.u1.uid, "missing", draft("Hike", "", "")).await,
            Err(EventlyError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete_sub_event() {
        let h = Harness::new().await;
        let created = h.repo.create_event("Trip").await.unwrap();
        let mut sub_event = h
            .repo
            .add_sub_event(&h.u1.uid, &created.event_id, draft("Hike", "2025-06-10", "2025-06-12"))
            .await
            .unwrap();

        sub_event.name = "Long hike".into();
        h.repo
            .update_sub_event(&h.u1.uid, &created.event_id, &sub_event)
            .await
            .unwrap();
        let listed = h.repo.list_sub_events(&h.u1.uid, &created.event_id).await.unwrap();
        assert_eq!(listed[0].name, "Long hike");
        assert_eq!(listed[0].attendees.len(), 1);

        h.repo
            .delete_sub_event(&h.u1.uid, &created.event_id, &sub_event.id)
            .await
            .unwrap();
        assert!(h.repo.list_sub_events(&h.u1.uid, &created.event_id).await.unwrap().is_empty());
        assert!(matches!(
            h.repo.update_sub_event(&h.u1.uid, &created.event_id, &sub_event).await,
            Err(EventlyError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_own_status() {
        let h = Harness::new().await;
        let created = h.repo.create_event("Trip").await.unwrap();
        let sub_event = h
            .repo
            .add_sub_event(&h.u1.uid, &created.event_id, draft("Hike", "2025-06-10", "2025-06-12"))
            .await
            .unwrap();
        let (owner, event, sub) = (&h.u1.uid, &created.event_id, &sub_event.id);

        let first = h
            .repo
            .toggle_own_status(owner, event, sub, AttendanceStatus::Attending)
            .await
            .unwrap();
        assert_eq!(first, AttendanceStatus::Attending);

        let second = h
            .repo
            .toggle_own_status(owner, event, sub, AttendanceStatus::Attending)
            .await
            .unwrap();
        assert_eq!(second, AttendanceStatus::NotSure);

        let listed = h.repo.list_sub_events(owner, event).await.unwrap();
        assert_eq!(
            h.repo.current_status(&listed[0]).unwrap(),
            Some(AttendanceStatus::NotSure)
        );
    }

    #[tokio::test]
    async fn test_set_status_for_uninvited_email() {
        let h = Harness::new().await;
        let created = h.repo.create_event("Trip").await.unwrap();
        let sub_event = h
            .repo
            .add_sub_event(&h.u1.uid, &created.event_id, draft("Hike", "", ""))
            .await
            .unwrap();

        h.repo
            .set_attendance_status(
                &h.u1.uid,
                &created.event_id,
                &sub_event.id,
                "guest@mail.example.org",
                AttendanceStatus::NotAttending,
            )
            .await
            .unwrap();
        assert_eq!(
            h.value(
                path::sub_event_attendees(&h.u1.uid, &created.event_id, &sub_event.id)
                    .unwrap()
                    .child("guest@mail,example,org")
                    .unwrap()
            )
            .await,
            Some(json!({"status": "not attending"}))
        );
    }

    #[tokio::test]
    async fn test_owner_cannot_be_removed() {
        let h = Harness::new().await;
        let created = h.repo.create_event("Trip").await.unwrap();

        let err = h
            .repo
            .delete_participant(&h.u1.uid, &created.event_id, &h.u1.uid, &h.u1.email)
            .await
            .unwrap_err();
        assert!(matches!(err, EventlyError::CannotRemoveOwner));

        h.as_bob().await;
        let err = h
            .repo
            .delete_participant(&h.u1.uid, &created.event_id, &h.u1.uid, &h.u1.email)
            .await
            .unwrap_err();
        assert!(matches!(err, EventlyError::CannotRemoveOwner));
    }

    #[tokio::test]
    async fn test_delete_participant_removes_everywhere() {
        let h = Harness::new().await;
        let created = h.repo.create_event("Trip").await.unwrap();
        h.as_bob().await;
        h.repo.join_event(&created.code).await.unwrap();
        h.as_alice().await;
        let sub_event = h
            .repo
            .add_sub_event(&h.u1.uid, &created.event_id, draft("Hike", "", ""))
            .await
            .unwrap();

        h.repo
            .delete_participant(&h.u1.uid, &created.event_id, &h.u2.uid, &h.u2.email)
            .await
            .unwrap();

        let attendees = h.repo.event_attendees(&h.u1.uid, &created.event_id).await.unwrap();
        assert_eq!(attendees, vec![(h.u1.uid.clone(), h.u1.email.clone())]);
        let listed = h.repo.list_sub_events(&h.u1.uid, &created.event_id).await.unwrap();
        assert!(listed[0].status_of(&h.u2.email).is_none());
        assert!(!listed[0].attendees.contains_key(&sanitize_email(&h.u2.email)));
        assert_eq!(listed[0].id, sub_event.id);

        h.as_bob().await;
        assert!(h.repo.joined_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_review_validation_and_sorting() {
        let h = Harness::new().await;
        let created = h.repo.create_event("Trip").await.unwrap();
        let sub_event = h
            .repo
            .add_sub_event(&h.u1.uid, &created.event_id, draft("Hike", "", ""))
            .await
            .unwrap();
        let (owner, event, sub) = (&h.u1.uid, &created.event_id, &sub_event.id);

        let empty = ReviewDraft {
            comment: "".into(),
            rating: 0,
            photo: None,
        };
        assert!(matches!(
            h.repo.add_review(owner, event, sub, empty).await,
            Err(EventlyError::Validation(_))
        ));
        let too_high = ReviewDraft {
            comment: "Wow".into(),
            rating: 6,
            photo: None,
        };
        assert!(matches!(
            h.repo.add_review(owner, event, sub, too_high).await,
            Err(EventlyError::Validation(_))
        ));
        let not_image = ReviewDraft {
            comment: "Wow".into(),
            rating: 4,
            photo: Some("data:text/plain;base64,AAAA".into()),
        };
        assert!(matches!(
            h.repo.add_review(owner, event, sub, not_image).await,
            Err(EventlyError::Validation(_))
        ));

        let good = ReviewDraft {
            comment: "Great!".into(),
            rating: 5,
            photo: None,
        };
        let key = h.repo.add_review(owner, event, sub, good).await.unwrap();

        for sort in [ReviewSort::DateDesc, ReviewSort::DateAsc, ReviewSort::Alpha] {
            let reviews = h.repo.reviews(owner, event, sub, sort).await.unwrap();
            assert_eq!(reviews.len(), 1);
            assert_eq!(reviews[0].id, key);
            assert_eq!(reviews[0].review.comment, "Great!");
            assert_eq!(reviews[0].review.user_email, "alice@example.com");
        }
    }

    #[tokio::test]
    async fn test_review_on_missing_sub_event_is_not_found() {
        let h = Harness::new().await;
        let created = h.repo.create_event("Trip").await.unwrap();
        let review = ReviewDraft {
            comment: "Great!".into(),
            rating: 5,
            photo: None,
        };
        assert!(matches!(
            h.repo.add_review(&h.u1.uid, &created.event_id, "missing", review).await,
            Err(EventlyError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_promote_moves_whole_subtree() {
        let h = Harness::new().await;
        let created = h.repo.create_event("Trip").await.unwrap();
        h.as_bob().await;
        h.repo.join_event(&created.code).await.unwrap();
        h.as_alice().await;
        let sub_event = h
            .repo
            .add_sub_event(&h.u1.uid, &created.event_id, draft("Hike", "2025-06-10", "2025-06-12"))
            .await
            .unwrap();
        h.repo
            .add_review(
                &h.u1.uid,
                &created.event_id,
                &sub_event.id,
                ReviewDraft {
                    comment: "Great!".into(),
                    rating: 5,
                    photo: None,
                },
            )
            .await
            .unwrap();

        let original = h
            .value(path::event(&h.u1.uid, &created.event_id).unwrap())
            .await
            .unwrap();

        assert!(matches!(
            h.repo.promote_to_owner(&created.event_id, &h.u1.uid).await,
            Err(EventlyError::AlreadyOwner)
        ));
        h.repo.promote_to_owner(&created.event_id, &h.u2.uid).await.unwrap();

        assert!(h.value(path::event(&h.u1.uid, &created.event_id).unwrap()).await.is_none());
        let moved = h
            .value(path::event(&h.u2.uid, &created.event_id).unwrap())
            .await
            .unwrap();
        assert_eq!(moved["ownerId"], json!(h.u2.uid));
        assert_eq!(moved["events"][&sub_event.id]["ownerId"], json!(h.u2.uid));

        let mut expected = original.clone();
        expected["ownerId"] = json!(h.u2.uid);
        expected["events"][&sub_event.id]["ownerId"] = json!(h.u2.uid);
        assert_eq!(moved, expected);

        assert!(h.value(path::transfers().unwrap()).await.is_none());
        let entry: CodeIndexEntry =
            serde_json::from_value(h.value(path::code(&created.code).unwrap()).await.unwrap())
                .unwrap();
        assert_eq!(entry.owner_id, h.u2.uid);

        // The code still resolves, and the previous owner now shows up as a joiner.
        h.as_alice().await;
        let joined = h.repo.joined_events().await.unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].owner_id, h.u2.uid);
    }

    #[tokio::test]
    async fn test_recover_rolls_forward_when_new_path_exists() {
        let h = Harness::new().await;
        let event = json!({"name": "Trip", "code": "ABCDEF", "ownerId": "u2",
                           "attendees": {"u2": {"email": "b@x.com"}}});
        let marker = json!({"fromOwner": "u1", "toOwner": "u2", "startedAt": "2025-06-01T00:00:00Z"});
        h.store
            .update(
                WriteBatch::new()
                    .set(path::event("u1", "e1").unwrap(), event.clone())
                    .set(path::event("u2", "e1").unwrap(), event)
                    .set(path::transfer("e1").unwrap(), marker),
            )
            .await
            .unwrap();

        let recovered = h.repo.recover_transfers().await.unwrap();
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].outcome, RecoveryOutcome::RolledForward);
        assert!(h.value(path::event("u1", "e1").unwrap()).await.is_none());
        assert!(h.value(path::event("u2", "e1").unwrap()).await.is_some());
        assert!(h.value(path::transfers().unwrap()).await.is_none());
        assert_eq!(
            h.value(path::code("ABCDEF").unwrap()).await,
            Some(json!({"ownerId": "u2", "eventId": "e1"}))
        );
    }

    #[tokio::test]
    async fn test_recover_rolls_back_when_only_old_path_exists() {
        let h = Harness::new().await;
        let event = json!({"name": "Trip", "code": "ABCDEF", "ownerId": "u1"});
        let marker = json!({"fromOwner": "u1", "toOwner": "u2", "startedAt": "2025-06-01T00:00:00Z"});
        h.store
            .update(
                WriteBatch::new()
                    .set(path::event("u1", "e1").unwrap(), event.clone())
                    .set(path::transfer("e1").unwrap(), marker),
            )
            .await
            .unwrap();

        let recovered = h.repo.recover_transfers().await.unwrap();
        assert_eq!(recovered[0].outcome, RecoveryOutcome::RolledBack);
        assert_eq!(h.value(path::event("u1", "e1").unwrap()).await, Some(event));
        assert!(h.value(path::transfers().unwrap()).await.is_none());
        assert!(h.repo.recover_transfers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_on_missing_sub_event_writes_nothing() {
        let h = Harness::new().await;
        let created = h.repo.create_event("Trip").await.unwrap();
        let before = h.store.export();

        assert!(matches!(
            h.repo
                .set_attendance_status(
                    &h.u1.uid,
                    &created.event_id,
                    "typo",
                    "guest@example.com",
                    AttendanceStatus::Attending,
                )
                .await,
            Err(EventlyError::NotFound(_))
        ));
        assert!(matches!(
            h.repo
                .toggle_own_status(&h.u1.uid, "no-such-event", "typo", AttendanceStatus::Attending)
                .await,
            Err(EventlyError::NotFound(_))
        ));

        assert_eq!(h.store.export(), before);
        assert!(h.repo.list_sub_events(&h.u1.uid, &created.event_id).await.unwrap().is_empty());
        assert_eq!(h.repo.owned_events().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_event_with_unreadable_review_stays_usable() {
        let h = Harness::new().await;
        let created = h.repo.create_event("Trip").await.unwrap();
        let sub_event = h
            .repo
            .add_sub_event(&h.u1.uid, &created.event_id, draft("Hike", "", ""))
            .await
            .unwrap();
        let reviews = path::reviews(&h.u1.uid, &created.event_id, &sub_event.id).unwrap();
        h.store
            .set(
                &reviews.child("r1").unwrap(),
                json!({"userEmail": "a@x.com", "comment": "Nice", "rating": 4.5,
                       "timestamp": "2025-06-01T00:00:00Z"}),
            )
            .await
            .unwrap();
        h.store
            .set(
                &reviews.child("r2").unwrap(),
                json!({"userEmail": "b@x.com", "comment": "Odd", "rating": {"stars": 3},
                       "timestamp": "2025-06-02T00:00:00Z"}),
            )
            .await
            .unwrap();

        let event = h.repo.fetch_event(&h.u1.uid, &created.event_id).await.unwrap();
        assert_eq!(event.sub_events[&sub_event.id].reviews.len(), 1);
        assert_eq!(h.repo.owned_events().await.unwrap().len(), 1);
        assert_eq!(
            h.repo.resolver().find_by_code(&created.code).await.unwrap().id,
            created.event_id
        );
        let listed = h
            .repo
            .reviews(&h.u1.uid, &created.event_id, &sub_event.id, ReviewSort::DateDesc)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].review.rating, 5);

        h.repo.delete_event(&created.event_id).await.unwrap();
        assert!(h.value(path::event(&h.u1.uid, &created.event_id).unwrap()).await.is_none());
        assert!(h.value(path::code(&created.code).unwrap()).await.is_none());
    }

    #[tokio::test]
    async fn test_delete_event_with_unparsable_fields() {
        let h = Harness::new().await;
        let created = h.repo.create_event("Trip").await.unwrap();
        h.store
            .set(
                &path::event(&h.u1.uid, &created.event_id).unwrap().child("name").unwrap(),
                json!({"not": "a string"}),
            )
            .await
            .unwrap();
        assert!(h.repo.fetch_event(&h.u1.uid, &created.event_id).await.is_err());

        h.repo.delete_event(&created.event_id).await.unwrap();
        assert!(h.value(path::event(&h.u1.uid, &created.event_id).unwrap()).await.is_none());
        assert!(h.value(path::code(&created.code).unwrap()).await.is_none());
        assert!(h.value(path::memberships(&h.u1.uid).unwrap()).await.is_none());
    }

    #[tokio::test]
    async fn test_promote_only_to_a_participant() {
        let h = Harness::new().await;
        let created = h.repo.create_event("Trip").await.unwrap();
        h.as_bob().await;
        h.repo.join_event(&created.code).await.unwrap();

        assert!(matches!(
            h.repo.promote_to_owner(&created.event_id, &h.u2.uid).await,
            Err(EventlyError::NotFound(_))
        ));

        h.as_alice().await;
        assert!(matches!(
            h.repo.promote_to_owner(&created.event_id, "nobody-typo").await,
            Err(EventlyError::NotFound(_))
        ));
        assert!(h.value(path::event(&h.u1.uid, &created.event_id).unwrap()).await.is_some());
        assert!(h.value(path::transfers().unwrap()).await.is_none());
        assert_eq!(h.repo.owned_events().await.unwrap().len(), 1);

        h.repo.promote_to_owner(&created.event_id, &h.u2.uid).await.unwrap();

        // The previous owner no longer holds the event under their own path.
        assert!(matches!(
            h.repo.promote_to_owner(&created.event_id, &h.u1.uid).await,
            Err(EventlyError::NotFound(_))
        ));

        h.as_bob().await;
        assert!(matches!(
            h.repo.promote_to_owner(&created.event_id, &h.u2.uid).await,
            Err(EventlyError::AlreadyOwner)
        ));
        h.repo.promote_to_owner(&created.event_id, &h.u1.uid).await.unwrap();

        h.as_alice().await;
        let owned = h.repo.owned_events().await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].owner_id, h.u1.uid);
    }

    #[tokio::test]
    async fn test_promote_checks_ownership_before_target() {
        let h = Harness::new().await;
        let event = json!({"name": "Trip", "code": "ABCDEF", "ownerId": "someone-else",
                           "attendees": {"someone-else": {"email": "s@x.com"}}});
        h.store
            .set(&path::event(&h.u1.uid, "e1").unwrap(), event)
            .await
            .unwrap();

        assert!(matches!(
            h.repo.promote_to_owner("e1", &h.u1.uid).await,
            Err(EventlyError::NotOwner)
        ));
        assert!(matches!(
            h.repo.promote_to_owner("e1", "someone-else").await,
            Err(EventlyError::NotOwner)
        ));
    }
}
