//! Formatted entries held by history buffers
//!
//! An entry is created once, when an event passes a consumer's filter, and
//! is never mutated afterwards.

use std::fmt;

use serde::Serialize;

use crate::icon::Icon;
use crate::markup::Rendered;

/// Process-unique, monotonically increasing entry identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Icon plus rendered segments, as produced by the formatter registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Formatted {
    pub icon: Icon,
    pub rendered: Rendered,
}

impl Formatted {
    pub fn new(icon: Icon, rendered: Rendered) -> Self {
        Self { icon, rendered }
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }
}

/// One displayable line in a feed panel or ticker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedEntry {
    pub id: EntryId,
    /// Event tag copied from the envelope; never rendered as markup
    pub event_type: String,
    pub icon: Icon,
    pub rendered: Rendered,
    /// Unix milliseconds; display only, never used for ordering
    pub occurred_at: i64,
}

impl FormattedEntry {
    /// Markup-safe text for direct embedding.
    pub fn rendered_text(&self) -> String {
        self.rendered.to_markup()
    }

    pub fn plain_text(&self) -> String {
        self.rendered.plain_text()
    }
}
