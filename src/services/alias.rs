//! Student alias and display-name generation.
//!
//! An alias is the only credential a student has, so it is drawn at random
//! from a space large enough to be unguessable. Display names are simple
//! `Participant_<n>` labels.

use std::collections::HashSet;

use rand::Rng;

use crate::error::AppError;

pub const ALIAS_LEN: usize = 8;
pub const ALIAS_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
pub const MAX_ALIAS_ATTEMPTS: usize = 1000;
pub const NAME_PREFIX: &str = "Participant_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedStudent {
    pub alias: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct AliasGenerator {
    alphabet: &'static [u8],
    len: usize,
    max_attempts: usize,
}

impl Default for AliasGenerator {
    fn default() -> Self {
        Self {
            alphabet: ALIAS_ALPHABET,
            len: ALIAS_LEN,
            max_attempts: MAX_ALIAS_ATTEMPTS,
        }
    }
}

impl AliasGenerator {
    pub fn new(alphabet: &'static [u8], len: usize, max_attempts: usize) -> Self {
        assert!(!alphabet.is_empty() && len > 0 && max_attempts > 0);
        Self { alphabet, len, max_attempts }
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        (0..self.len)
            .map(|_| self.alphabet[rng.gen_range(0..self.alphabet.len())] as char)
            .collect()
    }

    /// Produces exactly `count` `(alias, name)` pairs.
    ///
    /// Aliases avoid `existing_aliases` and each other; a single alias gets
    /// at most `max_attempts` draws before the call fails with
    /// `AliasSpaceExhausted`. Names take the lowest free counters in
    /// ascending order, skipping `existing_names`.
    pub fn generate_students<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
        existing_aliases: &HashSet<String>,
        existing_names: &HashSet<String>,
    ) -> Result<Vec<GeneratedStudent>, AppError> {
        let mut issued: HashSet<String> = HashSet::with_capacity(count);
        let mut students = Vec::with_capacity(count);
        let mut counter: u64 = 0;

        for _ in 0..count {
            let mut attempts = 0;
            let alias = loop {
                if attempts == self.max_attempts {
                    return Err(AppError::AliasSpaceExhausted(attempts));
                }
                attempts += 1;
                let candidate = self.draw(rng);
                if !existing_aliases.contains(&candidate) && !issued.contains(&candidate) {
                    break candidate;
                }
            };
            issued.insert(alias.clone());

            let name = loop {
                counter += 1;
                let candidate = format!("{NAME_PREFIX}{counter}");
                if !existing_names.contains(&candidate) {
                    break candidate;
                }
            };

            students.push(GeneratedStudent { alias, name });
        }

        Ok(students)
    }
}
