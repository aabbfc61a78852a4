//! Chronologically sortable push keys.

use std::sync::Mutex;

use chrono::Utc;
use rand::Rng;

/// Alphabet in ASCII order so that keys compare the same as their timestamps.
const PUSH_CHARS: &[u8] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

/// Generates 20-character keys: 8 characters of millisecond timestamp followed by
/// 12 random characters. Keys generated within the same millisecond increment the
/// random suffix, so they still sort in generation order.
#[derive(Debug, Default)]
pub struct PushKeyGenerator {
    state: Mutex<KeyState>,
}

#[derive(Debug, Default)]
struct KeyState {
    last_millis: i64,
    last_random: [u8; RANDOM_CHARS],
}

impl PushKeyGenerator {
    pub fn new() -> Self {
        PushKeyGenerator::default()
    }

    pub fn next_key(&self) -> String {
        self.key_at(Utc::now().timestamp_millis())
    }

    fn key_at(&self, now: i64) -> String {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if now == state.last_millis {
            increment(&mut state.last_random);
        } else {
            let mut rng = rand::thread_rng();
            for digit in state.last_random.iter_mut() {
                *digit = rng.gen_range(0..PUSH_CHARS.len() as u8);
            }
        }
        state.last_millis = now;

        let mut time_part = [0u8; TIME_CHARS];
        let mut remaining = now.max(0) as u64;
        for slot in time_part.iter_mut().rev() {
            *slot = PUSH_CHARS[(remaining % 64) as usize];
            remaining /= 64;
        }

        let mut key = String::with_capacity(TIME_CHARS + RANDOM_CHARS);
        key.extend(time_part.iter().map(|&b| b as char));
        key.extend(state.last_random.iter().map(|&d| PUSH_CHARS[d as usize] as char));
        key
    }
}

/// Add one to a base-64 digit string, carrying from the right.
fn increment(digits: &mut [u8; RANDOM_CHARS]) {
    for digit in digits.iter_mut().rev() {
        if *digit as usize == PUSH_CHARS.len() - 1 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_sort_by_generation_order() {
        let keys = PushKeyGenerator::new();
        let generated: Vec<String> = (0..200).map(|_| keys.next_key()).collect();
        let mut sorted = generated.clone();
        sorted.sort();
        assert_eq!(generated, sorted);
    }

    #[test]
    fn test_same_millisecond_keys_are_distinct_and_ordered() {
        let keys = PushKeyGenerator::new();
        let a = keys.key_at(1_700_000_000_000);
        let b = keys.key_at(1_700_000_000_000);
        assert_eq!(a.len(), 20);
        assert_ne!(a, b);
        assert!(a < b);
        assert_eq!(a[..8], b[..8]);
    }

    #[test]
    fn test_later_timestamp_sorts_after() {
        let keys = PushKeyGenerator::new();
        let a = keys.key_at(1_700_000_000_000);
        let b = keys.key_at(1_700_000_000_001);
        assert!(a < b);
    }
}
