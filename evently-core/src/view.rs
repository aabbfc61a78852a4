//! View state for the dashboard and event pages.
//!
//! Views never mutate their state from listener callbacks directly. Every
//! remote change arrives as a value on one ordered channel ([`ViewFeed`]) and is
//! folded into the state with `apply`, one change at a time.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::calendar::{self, CalendarMonth, DayBucket};
use crate::event::{Event, SubEvent};
use crate::identity::UserHandle;
use crate::resolver::{event_at, events_from_tree, joined_from};
use crate::route::EventRoute;
use crate::store::{Snapshot, Subscription};

// DASHBOARD:

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardState {
    pub user: Option<UserHandle>,
    pub owned: Vec<Event>,
    pub joined: Vec<Event>,
}

#[derive(Debug, Clone)]
pub enum DashboardChange {
    /// New value of `events/{uid}`.
    OwnedSnapshot(Snapshot),
    /// New value of `events/`.
    AllEventsSnapshot(Snapshot),
    SignedOut,
}

impl DashboardState {
    pub fn new(user: UserHandle) -> Self {
        DashboardState {
            user: Some(user),
            ..Default::default()
        }
    }

    pub fn apply(self, change: DashboardChange) -> Self {
        let Some(user) = self.user else {
            return DashboardState::default();
        };

        match change {
            DashboardChange::OwnedSnapshot(snapshot) => {
                let owned = snapshot
                    .children()
                    .filter_map(|(event_id, value)| {
                        event_at(&user.uid, event_id, value.clone())
                            .inspect_err(|e| warn!(event_id, error = %e, "skipping malformed event"))
                            .ok()
                    })
                    .collect();
                DashboardState {
                    owned,
                    user: Some(user),
                    ..self
                }
            }
            DashboardChange::AllEventsSnapshot(snapshot) => {
                let all = snapshot.value.as_ref().map(events_from_tree).unwrap_or_default();
                let joined = joined_from(&all, &user.uid);
                debug!(joined = joined.len(), "dashboard joined events refreshed");
                DashboardState {
                    joined,
                    user: Some(user),
                    ..self
                }
            }
            DashboardChange::SignedOut => DashboardState::default(),
        }
    }
}

// EVENT PAGE:

#[derive(Debug, Clone, PartialEq)]
pub struct EventPageState {
    pub route: EventRoute,
    pub viewer_uid: String,
    /// `None` until the first snapshot, or once the event is gone.
    pub event: Option<Event>,
    pub sub_events: Vec<SubEvent>,
    pub month: CalendarMonth,
    pub days: Vec<DayBucket>,
    pub is_owner: bool,
}

#[derive(Debug, Clone)]
pub enum EventPageChange {
    /// New value of `events/{uid}/{eid}`.
    EventSnapshot(Snapshot),
    /// Move the calendar by this many months.
    ChangeMonth(i32),
    Cleared,
}

impl EventPageState {
    pub fn new(route: EventRoute, viewer_uid: &str, month: CalendarMonth) -> Self {
        EventPageState {
            route,
            viewer_uid: viewer_uid.to_string(),
            event: None,
            sub_events: Vec::new(),
            month,
            days: Vec::new(),
            is_owner: false,
        }
        .recompute()
    }

    pub fn apply(mut self, change: EventPageChange) -> Self {
        match change {
            EventPageChange::EventSnapshot(snapshot) => {
                self.event = snapshot.value.and_then(|value| {
                    event_at(&self.route.owner_id, &self.route.event_id, value)
                        .inspect_err(|e| warn!(route = %self.route, error = %e, "unreadable event snapshot"))
                        .ok()
                });
                self.sub_events = self
                    .event
                    .as_ref()
                    .map(Event::sub_event_list)
                    .unwrap_or_default();
            }
            EventPageChange::ChangeMonth(delta) => {
                self.month = self.month.change_month(delta);
            }
            EventPageChange::Cleared => {
                self.event = None;
                self.sub_events.clear();
            }
        }
        self.recompute()
    }

    /// Sub-events covering day `day` (1-based) of the shown month.
    pub fn sub_events_on(&self, day: u32) -> Vec<&SubEvent> {
        let Some(bucket) = self.days.get(day.saturating_sub(1) as usize) else {
            return Vec::new();
        };
        self.sub_events
            .iter()
            .filter(|s| bucket.sub_event_ids.contains(&s.id))
            .collect()
    }

    fn recompute(mut self) -> Self {
        self.days = calendar::project(self.month, &self.sub_events);
        self.is_owner = self
            .event
            .as_ref()
            .is_some_and(|event| event.is_owned_by(&self.viewer_uid));
        self
    }
}

// FEED:

/// Funnels any number of subscriptions, plus locally raised changes, into one
/// ordered stream.
///
/// Dropping the feed stops the forwarding tasks, which drops their
/// subscriptions and releases the listeners.
pub struct ViewFeed<C> {
    sender: mpsc::UnboundedSender<C>,
    receiver: mpsc::UnboundedReceiver<C>,
    tasks: Vec<JoinHandle<()>>,
}

impl<C: Send + 'static> ViewFeed<C> {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        ViewFeed {
            sender,
            receiver,
            tasks: Vec::new(),
        }
    }

    /// Forward every snapshot from `subscription`, wrapped by `tag`.
    pub fn attach<F>(&mut self, mut subscription: Subscription, tag: F)
    where
        F: Fn(Snapshot) -> C + Send + 'static,
    {
        let sender = self.sender.clone();
        self.tasks.push(tokio::spawn(async move {
            while let Some(snapshot) = subscription.next().await {
                if sender.send(tag(snapshot)).is_err() {
                    break;
                }
            }
            debug!(path = %subscription.path(), "view subscription closed");
        }));
    }

    /// Queue a change raised by the view itself, such as month navigation.
    pub fn push(&self, change: C) {
        let _ = self.sender.send(change);
    }

    pub async fn next(&mut self) -> Option<C> {
        self.receiver.recv().await
    }

    pub fn try_next(&mut self) -> Option<C> {
        self.receiver.try_recv().ok()
    }
}

impl<C: Send + 'static> Default for ViewFeed<C> {
    fn default() -> Self {
        ViewFeed::new()
    }
}

impl<C> Drop for ViewFeed<C> {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
