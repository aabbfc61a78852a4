//! Join codes.

use rand::Rng;

use crate::constants::{JOIN_CODE_ALPHABET, JOIN_CODE_LENGTH};

/// A fresh random join code.
pub fn generate() -> String {
    generate_with(&mut rand::thread_rng())
}

pub fn generate_with<R: Rng>(rng: &mut R) -> String {
    (0..JOIN_CODE_LENGTH)
        .map(|_| JOIN_CODE_ALPHABET[rng.gen_range(0..JOIN_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Normalize user input; codes are case-sensitive so only whitespace is trimmed.
pub fn normalize(input: &str) -> String {
    input.trim().to_string()
}

/// True if `code` could have been produced by [`generate`].
pub fn is_well_formed(code: &str) -> bool {
    code.len() == JOIN_CODE_LENGTH && code.bytes().all(|b| JOIN_CODE_ALPHABET.contains(&b))
}
