//! Shared constants.

use std::time::Duration;

/// Length of an event join code.
pub const JOIN_CODE_LENGTH: usize = 6;

/// Alphabet join codes are drawn from (URL-safe).
pub const JOIN_CODE_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// How many fresh codes to try before giving up on a collision-free one.
pub const JOIN_CODE_ATTEMPTS: usize = 8;

/// Applied to every store call unless configured otherwise.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Highest accepted review rating.
pub const MAX_RATING: i64 = 5;

/// Shown for top-level attendees whose record has no email.
pub const MISSING_EMAIL: &str = "No email";
