//! Bounded newest-first history of formatted entries
//!
//! Each consumer owns one buffer. Pushing past capacity evicts the oldest
//! entry; entries themselves are never mutated.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use feed_types::entry::{EntryId, Formatted, FormattedEntry};

/// Default number of entries a consumer keeps.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Process-wide entry id source, shared by every buffer.
static NEXT_ENTRY_ID: AtomicU64 = AtomicU64::new(1);

fn next_entry_id() -> EntryId {
    EntryId::new(NEXT_ENTRY_ID.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    /// Newest entry at the front.
    entries: VecDeque<FormattedEntry>,
    capacity: usize,
}

impl HistoryBuffer {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a formatted event as the newest entry.
    ///
    /// Assigns the next process-wide id and evicts the oldest entry when
    /// the buffer is full.
    pub fn push(
        &mut self,
        formatted: Formatted,
        event_type: impl Into<String>,
        occurred_at: i64,
    ) -> &FormattedEntry {
        let entry = FormattedEntry {
            id: next_entry_id(),
            event_type: event_type.into(),
            icon: formatted.icon,
            rendered: formatted.rendered,
            occurred_at,
        };

        self.entries.truncate(self.capacity - 1);
        self.entries.push_front(entry);
        &self.entries[0]
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &FormattedEntry> {
        self.entries.iter()
    }

    /// Clone of the current view, newest first.
    pub fn snapshot(&self) -> Vec<FormattedEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn newest(&self) -> Option<&FormattedEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use feed_types::icon::Icon;
    use feed_types::markup::Rendered;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_bounded_and_newest_first(capacity in 1usize..20, pushes in 0usize..80) {
            let mut buffer = HistoryBuffer::new(capacity);
            for i in 0..pushes {
                buffer.push(Formatted::new(Icon::Signal, Rendered::new()), "x", i as i64);
            }
            prop_assert!(buffer.len() <= capacity);
            prop_assert_eq!(buffer.len(), pushes.min(capacity));

            let times: Vec<i64> = buffer.entries().map(|e| e.occurred_at).collect();
            let expected: Vec<i64> = (pushes.saturating_sub(capacity)..pushes)
                .rev()
                .map(|i| i as i64)
                .collect();
            prop_assert_eq!(times, expected);

            let ids: Vec<EntryId> = buffer.entries().map(|e| e.id).collect();
            prop_assert!(ids.windows(2).all(|w| w[0] > w[1]));
        }
    }
}
