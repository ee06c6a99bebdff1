//! Append-only History Log
//!
//! Every committed mutation of the ladder appends one full snapshot.
//! Entries are never rewritten or removed, and their timestamps never go
//! backwards, so the log can rebuild any player's rating trajectory.

use crate::types::{HistoryEntry, Rating, Ratings};
use chrono::{DateTime, Utc};

/// Time-ordered sequence of full rating snapshots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap previously persisted entries
    ///
    /// Entries are re-sorted by timestamp (stable, so equal timestamps keep
    /// their stored order) in case the persisted log was edited by hand.
    pub fn from_entries(mut entries: Vec<HistoryEntry>) -> Self {
        entries.sort_by_key(|entry| entry.timestamp);
        Self { entries }
    }

    /// Append a snapshot stamped with the current time
    pub fn append(&mut self, snapshot: Ratings) -> DateTime<Utc> {
        self.append_at(Utc::now(), snapshot)
    }

    /// Append a snapshot at `timestamp`
    ///
    /// A timestamp earlier than the last entry (clock skew) is clamped to
    /// the last entry's, keeping the log non-decreasing. Returns the
    /// timestamp actually recorded.
    pub fn append_at(&mut self, timestamp: DateTime<Utc>, snapshot: Ratings) -> DateTime<Utc> {
        let timestamp = match self.entries.last() {
            Some(last) if last.timestamp > timestamp => last.timestamp,
            _ => timestamp,
        };

        self.entries.push(HistoryEntry {
            timestamp,
            ratings: snapshot,
        });
        timestamp
    }

    /// All entries, oldest first
    pub fn all(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rating trajectory of one player, oldest first
    ///
    /// Entries recorded before the player joined are skipped.
    pub fn for_player<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = (DateTime<Utc>, Rating)> + 'a {
        self.entries.iter().filter_map(move |entry| {
            entry
                .ratings
                .get(name)
                .map(|rating| (entry.timestamp, *rating))
        })
    }

    pub fn into_entries(self) -> Vec<HistoryEntry> {
        self.entries
    }
}
