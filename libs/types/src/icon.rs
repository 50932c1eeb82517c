//! Symbolic icon keys attached to formatted entries
//!
//! The presentation layer maps each key to a glyph; the core never emits
//! glyphs itself.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Join,
    Leave,
    Jump,
    Dock,
    Undock,
    Combat,
    Kill,
    Ship,
    Trade,
    Exchange,
    Craft,
    Mining,
    Mission,
    Faction,
    War,
    Peace,
    Build,
    Explosion,
    Chat,
    Forum,
    Announcement,
    Explore,
    Salvage,
    Bounty,
    Police,
    Credits,
    Trophy,
    Broadcast,
    Clock,
    Stats,
    /// Default for event types without a registered template
    #[default]
    Signal,
}

impl Icon {
    pub fn key(self) -> &'static str {
        match self {
            Icon::Join => "join",
            Icon::Leave => "leave",
            Icon::Jump => "jump",
            Icon::Dock => "dock",
            Icon::Undock => "undock",
            Icon::Combat => "combat",
            Icon::Kill => "kill",
            Icon::Ship => "ship",
            Icon::Trade => "trade",
            Icon::Exchange => "exchange",
            Icon::Craft => "craft",
            Icon::Mining => "mining",
            Icon::Mission => "mission",
            Icon::Faction => "faction",
            Icon::War => "war",
            Icon::Peace => "peace",
            Icon::Build => "build",
            Icon::Explosion => "explosion",
            Icon::Chat => "chat",
            Icon::Forum => "forum",
            Icon::Announcement => "announcement",
            Icon::Explore => "explore",
            Icon::Salvage => "salvage",
            Icon::Bounty => "bounty",
            Icon::Police => "police",
            Icon::Credits => "credits",
            Icon::Trophy => "trophy",
            Icon::Broadcast => "broadcast",
            Icon::Clock => "clock",
            Icon::Stats => "stats",
            Icon::Signal => "signal",
        }
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
