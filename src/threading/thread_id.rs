//! Thread identifiers and the random source that mints them.

use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub const THREAD_ID_BITS: usize = 128;
pub const THREAD_ID_DIGITS: usize = THREAD_ID_BITS / 4;

/// Separator between ids in the stored thread value.
pub const THREAD_ID_SEPARATOR: char = ',';

/// Whether `id` has the external thread-id form: 32 lowercase hex digits.
pub fn is_thread_id(id: &str) -> bool {
    id.len() == THREAD_ID_DIGITS
        && id
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Source of fresh thread ids.
///
/// Construct one per process with [`ThreadIdGenerator::from_entropy`] and pass
/// it to every resolution; tests use [`ThreadIdGenerator::seeded`] for
/// reproducible ids. Collisions are not checked for.
pub struct ThreadIdGenerator {
    rng: StdRng,
}

impl ThreadIdGenerator {
    /// Seed from the OS entropy source, falling back to the wall clock.
    pub fn from_entropy() -> Self {
        let rng = match StdRng::from_rng(OsRng) {
            Ok(rng) => rng,
            Err(err) => {
                log::warn!("OS entropy unavailable ({}), seeding thread ids from clock", err);
                let nanos = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_nanos() as u64)
                    .unwrap_or(0);
                StdRng::seed_from_u64(nanos)
            }
        };
        Self { rng }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self) -> String {
        let value: u128 = self.rng.r#gen();
        format!("{:0width$x}", value, width = THREAD_ID_DIGITS)
    }
}

impl Default for ThreadIdGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl fmt::Debug for ThreadIdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadIdGenerator").finish_non_exhaustive()
    }
}

/// Insertion-ordered set of thread ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadIdSet {
    ids: Vec<String>,
}

impl ThreadIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` unless already present. Returns whether it was added.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Add every non-empty token of a stored comma-joined thread value.
    pub fn extend_from_value(&mut self, value: &str) {
        for id in value.split(THREAD_ID_SEPARATOR).filter(|id| !id.is_empty()) {
            self.insert(id);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Total length of the comma-joined rendering.
    pub fn joined_len(&self) -> usize {
        let ids: usize = self.ids.iter().map(String::len).sum();
        ids + self.ids.len().saturating_sub(1)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.ids
    }
}

impl<'a> IntoIterator for &'a ThreadIdSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

impl FromIterator<String> for ThreadIdSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = ThreadIdSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}
