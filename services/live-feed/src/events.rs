//! Event taxonomy for the live feed
//!
//! The server defines the set of event types and may add new ones at any
//! time. Known tags decode into a typed [`GameEvent`] variant; anything
//! else becomes [`GameEvent::Unknown`] and is rendered by the fallback
//! formatter.
//!
//! Every payload field is optional. Decoding a known tag only fails when a
//! field has the wrong *shape* (e.g. an object where a scalar is expected).

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use feed_types::envelope::Scalar;
use feed_types::errors::FormatError;
use feed_types::icon::Icon;

/// Tags with a registered template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PlayerJoined,
    PlayerLeft,
    PlayerJumped,
    PlayerDocked,
    PlayerUndocked,
    Combat,
    PlayerDestroyed,
    PirateDestroyed,
    ShipPurchased,
    Trade,
    ExchangeFill,
    ExchangeOrder,
    ItemCrafted,
    ResourceMined,
    MissionCompleted,
    FactionCreated,
    FactionJoined,
    FactionLeft,
    FactionWarDeclared,
    FactionPeace,
    BaseBuilt,
    BaseDestroyed,
    Chat,
    ForumPost,
    DevAnnouncement,
    SystemDiscovered,
    PoiDiscovered,
    Salvage,
    BountyPosted,
    BountyClaimed,
    PoliceResponse,
    InsurancePayout,
    LeaderboardChange,
    ServerAnnouncement,
    Tick,
    PlayerStats,
}

impl EventKind {
    pub const ALL: [EventKind; 36] = [
        EventKind::PlayerJoined,
        EventKind::PlayerLeft,
        EventKind::PlayerJumped,
        EventKind::PlayerDocked,
        EventKind::PlayerUndocked,
        EventKind::Combat,
        EventKind::PlayerDestroyed,
        EventKind::PirateDestroyed,
        EventKind::ShipPurchased,
        EventKind::Trade,
        EventKind::ExchangeFill,
        EventKind::ExchangeOrder,
        EventKind::ItemCrafted,
        EventKind::ResourceMined,
        EventKind::MissionCompleted,
        EventKind::FactionCreated,
        EventKind::FactionJoined,
        EventKind::FactionLeft,
        EventKind::FactionWarDeclared,
        EventKind::FactionPeace,
        EventKind::BaseBuilt,
        EventKind::BaseDestroyed,
        EventKind::Chat,
        EventKind::ForumPost,
        EventKind::DevAnnouncement,
        EventKind::SystemDiscovered,
        EventKind::PoiDiscovered,
        EventKind::Salvage,
        EventKind::BountyPosted,
        EventKind::BountyClaimed,
        EventKind::PoliceResponse,
        EventKind::InsurancePayout,
        EventKind::LeaderboardChange,
        EventKind::ServerAnnouncement,
        EventKind::Tick,
        EventKind::PlayerStats,
    ];

    /// Look up a server tag. Tags are matched exactly.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    pub fn tag(self) -> &'static str {
        match self {
            EventKind::PlayerJoined => "player_joined",
            EventKind::PlayerLeft => "player_left",
            EventKind::PlayerJumped => "player_jumped",
            EventKind::PlayerDocked => "player_docked",
            EventKind::PlayerUndocked => "player_undocked",
            EventKind::Combat => "combat",
            EventKind::PlayerDestroyed => "player_destroyed",
            EventKind::PirateDestroyed => "pirate_destroyed",
            EventKind::ShipPurchased => "ship_purchased",
            EventKind::Trade => "trade",
            EventKind::ExchangeFill => "exchange_fill",
            EventKind::ExchangeOrder => "exchange_order",
            EventKind::ItemCrafted => "item_crafted",
            EventKind::ResourceMined => "resource_mined",
            EventKind::MissionCompleted => "mission_completed",
            EventKind::FactionCreated => "faction_created",
            EventKind::FactionJoined => "faction_joined",
            EventKind::FactionLeft => "faction_left",
            EventKind::FactionWarDeclared => "faction_war_declared",
            EventKind::FactionPeace => "faction_peace",
            EventKind::BaseBuilt => "base_built",
            EventKind::BaseDestroyed => "base_destroyed",
            EventKind::Chat => "chat",
            EventKind::ForumPost => "forum_post",
            EventKind::DevAnnouncement => "dev_announcement",
            EventKind::SystemDiscovered => "system_discovered",
            EventKind::PoiDiscovered => "poi_discovered",
            EventKind::Salvage => "salvage",
            EventKind::BountyPosted => "bounty_posted",
            EventKind::BountyClaimed => "bounty_claimed",
            EventKind::PoliceResponse => "police_response",
            EventKind::InsurancePayout => "insurance_payout",
            EventKind::LeaderboardChange => "leaderboard_change",
            EventKind::ServerAnnouncement => "server_announcement",
            EventKind::Tick => "tick",
            EventKind::PlayerStats => "player_stats",
        }
    }

    pub fn icon(self) -> Icon {
        match self {
            EventKind::PlayerJoined => Icon::Join,
            EventKind::PlayerLeft => Icon::Leave,
            EventKind::PlayerJumped => Icon::Jump,
            EventKind::PlayerDocked => Icon::Dock,
            EventKind::PlayerUndocked => Icon::Undock,
            EventKind::Combat => Icon::Combat,
            EventKind::PlayerDestroyed | EventKind::PirateDestroyed => Icon::Kill,
            EventKind::ShipPurchased => Icon::Ship,
            EventKind::Trade => Icon::Trade,
            EventKind::ExchangeFill | EventKind::ExchangeOrder => Icon::Exchange,
            EventKind::ItemCrafted => Icon::Craft,
            EventKind::ResourceMined => Icon::Mining,
            EventKind::MissionCompleted => Icon::Mission,
            EventKind::FactionCreated | EventKind::FactionJoined | EventKind::FactionLeft => {
                Icon::Faction
            }
            EventKind::FactionWarDeclared => Icon::War,
            EventKind::FactionPeace => Icon::Peace,
            EventKind::BaseBuilt => Icon::Build,
            EventKind::BaseDestroyed => Icon::Explosion,
            EventKind::Chat => Icon::Chat,
            EventKind::ForumPost => Icon::Forum,
            EventKind::DevAnnouncement => Icon::Announcement,
            EventKind::SystemDiscovered | EventKind::PoiDiscovered => Icon::Explore,
            EventKind::Salvage => Icon::Salvage,
            EventKind::BountyPosted | EventKind::BountyClaimed => Icon::Bounty,
            EventKind::PoliceResponse => Icon::Police,
            EventKind::InsurancePayout => Icon::Credits,
            EventKind::LeaderboardChange => Icon::Trophy,
            EventKind::ServerAnnouncement => Icon::Broadcast,
            EventKind::Tick => Icon::Clock,
            EventKind::PlayerStats => Icon::Stats,
        }
    }
}

/// Icon for any tag, `signal` when the tag is not registered.
pub fn icon_for_tag(tag: &str) -> Icon {
    EventKind::from_tag(tag)
        .map(EventKind::icon)
        .unwrap_or(Icon::Signal)
}

/// Optional scalar payload field.
pub type Field = Option<Scalar>;

/// Entry of a list payload field: a bare name or `{name, quantity}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ListItem {
    Named(Scalar),
    Counted(CountedItem),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CountedItem {
    #[serde(alias = "item_name", alias = "resource")]
    pub name: Field,
    pub quantity: Field,
}

impl ListItem {
    pub fn name(&self) -> Option<&Scalar> {
        match self {
            ListItem::Named(name) => Some(name),
            ListItem::Counted(item) => item.name.as_ref(),
        }
    }

    pub fn quantity(&self) -> Option<&Scalar> {
        match self {
            ListItem::Named(_) => None,
            ListItem::Counted(item) => item.quantity.as_ref(),
        }
    }
}

/// Events whose only subject is a player.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerOnly {
    pub player: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Jump {
    pub player: Field,
    pub from_system: Field,
    pub to_system: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Docking {
    pub player: Field,
    pub station_name: Field,
    pub poi_name: Field,
    pub system_name: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Combat {
    pub attacker: Field,
    pub defender: Field,
    pub damage: Field,
    pub system_name: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Kill {
    pub killer: Field,
    pub victim: Field,
    pub ship_class: Field,
    pub system_name: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PirateKill {
    pub player: Field,
    pub pirate_name: Field,
    pub bounty: Field,
    pub system_name: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShipPurchase {
    pub player: Field,
    pub ship_class: Field,
    pub price: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Trade {
    pub seller: Field,
    pub buyer: Field,
    pub quantity: Field,
    pub item_name: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExchangeFill {
    pub buyer: Field,
    pub seller: Field,
    pub quantity: Field,
    pub item_name: Field,
    pub price: Field,
    pub station_name: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExchangeOrder {
    pub player: Field,
    pub side: Field,
    pub quantity: Field,
    pub item_name: Field,
    pub price: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Craft {
    pub player: Field,
    #[serde(alias = "recipe")]
    pub recipe_name: Field,
    pub quantity: Field,
    pub ingredients: Option<Vec<ListItem>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Mining {
    pub player: Field,
    pub resources: Option<Vec<ListItem>>,
    pub quantity: Field,
    pub item_name: Field,
    pub poi_name: Field,
    pub system_name: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Mission {
    pub player: Field,
    pub mission_name: Field,
    pub reward: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FactionMembership {
    pub player: Field,
    pub faction_name: Field,
    pub faction_tag: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FactionRelation {
    pub faction_name: Field,
    pub target_faction: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BaseBuilt {
    pub builder: Field,
    pub base_name: Field,
    pub poi_name: Field,
    pub system_name: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BaseDestroyed {
    pub attacker: Field,
    pub base_name: Field,
    pub owner: Field,
    pub system_name: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Chat {
    pub sender: Field,
    pub channel: Field,
    pub message: Field,
    pub is_dev: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForumPost {
    pub username: Field,
    pub title: Field,
    pub category: Field,
    pub is_dev: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Announcement {
    pub sender: Field,
    pub message: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Discovery {
    pub player: Field,
    pub system_name: Field,
    pub poi_name: Field,
    pub poi_type: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Salvage {
    pub player: Field,
    pub quantity: Field,
    pub item_name: Field,
    pub system_name: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Bounty {
    #[serde(alias = "poster")]
    pub player: Field,
    pub target: Field,
    pub amount: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Police {
    pub system_name: Field,
    pub target: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Insurance {
    pub player: Field,
    pub amount: Field,
    pub ship_class: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Leaderboard {
    pub player: Field,
    pub rank: Field,
    pub category: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TickInfo {
    pub tick: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub online_players: Field,
}

/// A decoded event: one variant per registered tag plus `Unknown`.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PlayerJoined(PlayerOnly),
    PlayerLeft(PlayerOnly),
    PlayerJumped(Jump),
    PlayerDocked(Docking),
    PlayerUndocked(Docking),
    Combat(Combat),
    PlayerDestroyed(Kill),
    PirateDestroyed(PirateKill),
    ShipPurchased(ShipPurchase),
    Trade(Trade),
    ExchangeFill(ExchangeFill),
    ExchangeOrder(ExchangeOrder),
    ItemCrafted(Craft),
    ResourceMined(Mining),
    MissionCompleted(Mission),
    FactionCreated(FactionMembership),
    FactionJoined(FactionMembership),
    FactionLeft(FactionMembership),
    FactionWarDeclared(FactionRelation),
    FactionPeace(FactionRelation),
    BaseBuilt(BaseBuilt),
    BaseDestroyed(BaseDestroyed),
    Chat(Chat),
    ForumPost(ForumPost),
    DevAnnouncement(Announcement),
    SystemDiscovered(Discovery),
    PoiDiscovered(Discovery),
    Salvage(Salvage),
    BountyPosted(Bounty),
    BountyClaimed(Bounty),
    PoliceResponse(Police),
    InsurancePayout(Insurance),
    LeaderboardChange(Leaderboard),
    ServerAnnouncement(Announcement),
    Tick(TickInfo),
    PlayerStats(PlayerStats),
    /// Tag without a registered template; rendered by the fallback
    Unknown {
        raw_type: String,
        data: Map<String, Value>,
    },
}

impl GameEvent {
    /// Decode an envelope's `type` and `data` into a typed event.
    pub fn decode(tag: &str, data: &Map<String, Value>) -> Result<Self, FormatError> {
        let Some(kind) = EventKind::from_tag(tag) else {
            return Ok(GameEvent::Unknown {
                raw_type: tag.to_string(),
                data: data.clone(),
            });
        };

        let payload = Value::Object(data.clone());
        let event = match kind {
            EventKind::PlayerJoined => GameEvent::PlayerJoined(parse(kind, payload)?),
            EventKind::PlayerLeft => GameEvent::PlayerLeft(parse(kind, payload)?),
            EventKind::PlayerJumped => GameEvent::PlayerJumped(parse(kind, payload)?),
            EventKind::PlayerDocked => GameEvent::PlayerDocked(parse(kind, payload)?),
            EventKind::PlayerUndocked => GameEvent::PlayerUndocked(parse(kind, payload)?),
            EventKind::Combat => GameEvent::Combat(parse(kind, payload)?),
            EventKind::PlayerDestroyed => GameEvent::PlayerDestroyed(parse(kind, payload)?),
            EventKind::PirateDestroyed => GameEvent::PirateDestroyed(parse(kind, payload)?),
            EventKind::ShipPurchased => GameEvent::ShipPurchased(parse(kind, payload)?),
            EventKind::Trade => GameEvent::Trade(parse(kind, payload)?),
            EventKind::ExchangeFill => GameEvent::ExchangeFill(parse(kind, payload)?),
            EventKind::ExchangeOrder => GameEvent::ExchangeOrder(parse(kind, payload)?),
            EventKind::ItemCrafted => GameEvent::ItemCrafted(parse(kind, payload)?),
            EventKind::ResourceMined => GameEvent::ResourceMined(parse(kind, payload)?),
            EventKind::MissionCompleted => GameEvent::MissionCompleted(parse(kind, payload)?),
            EventKind::FactionCreated => GameEvent::FactionCreated(parse(kind, payload)?),
            EventKind::FactionJoined => GameEvent::FactionJoined(parse(kind, payload)?),
            EventKind::FactionLeft => GameEvent::FactionLeft(parse(kind, payload)?),
            EventKind::FactionWarDeclared => GameEvent::FactionWarDeclared(parse(kind, payload)?),
            EventKind::FactionPeace => GameEvent::FactionPeace(parse(kind, payload)?),
            EventKind::BaseBuilt => GameEvent::BaseBuilt(parse(kind, payload)?),
            EventKind::BaseDestroyed => GameEvent::BaseDestroyed(parse(kind, payload)?),
            EventKind::Chat => GameEvent::Chat(parse(kind, payload)?),
            EventKind::ForumPost => GameEvent::ForumPost(parse(kind, payload)?),
            EventKind::DevAnnouncement => GameEvent::DevAnnouncement(parse(kind, payload)?),
            EventKind::SystemDiscovered => GameEvent::SystemDiscovered(parse(kind, payload)?),
            EventKind::PoiDiscovered => GameEvent::PoiDiscovered(parse(kind, payload)?),
            EventKind::Salvage => GameEvent::Salvage(parse(kind, payload)?),
            EventKind::BountyPosted => GameEvent::BountyPosted(parse(kind, payload)?),
            EventKind::BountyClaimed => GameEvent::BountyClaimed(parse(kind, payload)?),
            EventKind::PoliceResponse => GameEvent::PoliceResponse(parse(kind, payload)?),
            EventKind::InsurancePayout => GameEvent::InsurancePayout(parse(kind, payload)?),
            EventKind::LeaderboardChange => GameEvent::LeaderboardChange(parse(kind, payload)?),
            EventKind::ServerAnnouncement => {
                GameEvent::ServerAnnouncement(parse(kind, payload)?)
            }
            EventKind::Tick => GameEvent::Tick(parse(kind, payload)?),
            EventKind::PlayerStats => GameEvent::PlayerStats(parse(kind, payload)?),
        };
        Ok(event)
    }

    /// Registered kind, or `None` for `Unknown`.
    pub fn kind(&self) -> Option<EventKind> {
        let kind = match self {
            GameEvent::PlayerJoined(_) => EventKind::PlayerJoined,
            GameEvent::PlayerLeft(_) => EventKind::PlayerLeft,
            GameEvent::PlayerJumped(_) => EventKind::PlayerJumped,
            GameEvent::PlayerDocked(_) => EventKind::PlayerDocked,
            GameEvent::PlayerUndocked(_) => EventKind::PlayerUndocked,
            GameEvent::Combat(_) => EventKind::Combat,
            GameEvent::PlayerDestroyed(_) => EventKind::PlayerDestroyed,
            GameEvent::PirateDestroyed(_) => EventKind::PirateDestroyed,
            GameEvent::ShipPurchased(_) => EventKind::ShipPurchased,
            GameEvent::Trade(_) => EventKind::Trade,
            GameEvent::ExchangeFill(_) => EventKind::ExchangeFill,
            GameEvent::ExchangeOrder(_) => EventKind::ExchangeOrder,
            GameEvent::ItemCrafted(_) => EventKind::ItemCrafted,
            GameEvent::ResourceMined(_) => EventKind::ResourceMined,
            GameEvent::MissionCompleted(_) => EventKind::MissionCompleted,
            GameEvent::FactionCreated(_) => EventKind::FactionCreated,
            GameEvent::FactionJoined(_) => EventKind::FactionJoined,
            GameEvent::FactionLeft(_) => EventKind::FactionLeft,
            GameEvent::FactionWarDeclared(_) => EventKind::FactionWarDeclared,
            GameEvent::FactionPeace(_) => EventKind::FactionPeace,
            GameEvent::BaseBuilt(_) => EventKind::BaseBuilt,
            GameEvent::BaseDestroyed(_) => EventKind::BaseDestroyed,
            GameEvent::Chat(_) => EventKind::Chat,
            GameEvent::ForumPost(_) => EventKind::ForumPost,
            GameEvent::DevAnnouncement(_) => EventKind::DevAnnouncement,
            GameEvent::SystemDiscovered(_) => EventKind::SystemDiscovered,
            GameEvent::PoiDiscovered(_) => EventKind::PoiDiscovered,
            GameEvent::Salvage(_) => EventKind::Salvage,
            GameEvent::BountyPosted(_) => EventKind::BountyPosted,
            GameEvent::BountyClaimed(_) => EventKind::BountyClaimed,
            GameEvent::PoliceResponse(_) => EventKind::PoliceResponse,
            GameEvent::InsurancePayout(_) => EventKind::InsurancePayout,
            GameEvent::LeaderboardChange(_) => EventKind::LeaderboardChange,
            GameEvent::ServerAnnouncement(_) => EventKind::ServerAnnouncement,
            GameEvent::Tick(_) => EventKind::Tick,
            GameEvent::PlayerStats(_) => EventKind::PlayerStats,
            GameEvent::Unknown { .. } => return None,
        };
        Some(kind)
    }

    /// Icon for this event.
    pub fn icon(&self) -> Icon {
        self.kind().map(EventKind::icon).unwrap_or(Icon::Signal)
    }
}

fn parse<T: DeserializeOwned>(kind: EventKind, payload: Value) -> Result<T, FormatError> {
    serde_json::from_value(payload).map_err(|e| FormatError::PayloadShape {
        event_type: kind.tag().to_string(),
        reason: e.to_string(),
    })
}
