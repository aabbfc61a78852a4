//! Core library for evently.
//!
//! Events are named containers joined by a short code. Each holds dated
//! sub-events with their own attendance and reviews, all kept in a keyed
//! document store:
//! - `store`: the document store trait with in-memory, file-backed and timed implementations
//! - `repository`: every event, sub-event, attendance and review operation
//! - `resolver`: join-code lookup and joined-event listing
//! - `calendar`: month navigation and day projection of sub-events
//! - `view`: reducers for the dashboard and event pages

pub mod calendar;
pub mod code;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod identity;
mod lockfile;
pub mod path;
pub mod repository;
pub mod resolver;
pub mod route;
pub mod store;
pub mod users;
pub mod view;

pub use error::{EventlyError, EventlyResult};
pub use event::*;
