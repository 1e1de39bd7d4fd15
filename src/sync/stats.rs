//! Batch import statistics.

use std::path::PathBuf;

/// Outcome of indexing one batch of mail files.
#[derive(Debug, Clone, Default)]
pub struct ImportStats {
    /// Files indexed as new documents.
    pub added: usize,
    /// Files that could not be read.
    pub unreadable: usize,
    /// Files that were not parseable mail.
    pub not_email: usize,
    /// Every skipped file, in the order it was seen.
    pub skipped: Vec<PathBuf>,
}

impl ImportStats {
    pub fn failed(&self) -> usize {
        self.unreadable + self.not_email
    }

    /// Merge another ImportStats into this one.
    pub fn merge(&mut self, other: ImportStats) {
        self.added += other.added;
        self.unreadable += other.unreadable;
        self.not_email += other.not_email;
        self.skipped.extend(other.skipped);
    }
}
