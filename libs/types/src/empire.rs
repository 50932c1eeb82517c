//! Player empires and their marker colours

use serde::{Deserialize, Serialize};

/// Colour used for empires the table does not know.
pub const DEFAULT_EMPIRE_COLOR: &str = "#9ca3af";

/// The five playable empires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Empire {
    Solarian,
    Voidborn,
    Crimson,
    Nebula,
    Outerrim,
}

impl Empire {
    pub const ALL: [Empire; 5] = [
        Empire::Solarian,
        Empire::Voidborn,
        Empire::Crimson,
        Empire::Nebula,
        Empire::Outerrim,
    ];

    /// Case-insensitive lookup by tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|empire| empire.tag().eq_ignore_ascii_case(tag))
    }

    pub fn tag(self) -> &'static str {
        match self {
            Empire::Solarian => "solarian",
            Empire::Voidborn => "voidborn",
            Empire::Crimson => "crimson",
            Empire::Nebula => "nebula",
            Empire::Outerrim => "outerrim",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Empire::Solarian => "#f5b942",
            Empire::Voidborn => "#8b5cf6",
            Empire::Crimson => "#ef4444",
            Empire::Nebula => "#22d3ee",
            Empire::Outerrim => "#84cc16",
        }
    }
}

/// Marker colour for a raw empire tag, falling back to the default colour.
pub fn empire_color(tag: &str) -> &'static str {
    Empire::from_tag(tag)
        .map(Empire::color)
        .unwrap_or(DEFAULT_EMPIRE_COLOR)
}
