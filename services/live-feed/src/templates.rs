//! Per-event render templates
//!
//! Each template turns a typed [`GameEvent`] into [`Rendered`] segments.
//! Templates are total: a missing optional field drops its clause, and a
//! missing subject yields an empty rendering that consumers skip.
//!
//! Dynamic values only enter the output through `Segment` constructors,
//! which sanitize them. Static wording is plain text.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use feed_types::envelope::{PlayerInfo, Scalar};
use feed_types::markup::{Rendered, Segment};
use feed_types::numeric::format_decimal;

use crate::events::{self, Field, GameEvent, ListItem};

/// Actor fields consulted by the fallback, in priority order.
pub const FALLBACK_ACTOR_FIELDS: [&str; 6] =
    ["player", "username", "sender", "killer", "attacker", "builder"];

/// Render a decoded event.
pub fn render(event: &GameEvent, players: Option<&PlayerInfo>) -> Rendered {
    let mut line = Line::new(players);
    match event {
        GameEvent::PlayerJoined(e) => line.subject(&e.player).text(" joined the galaxy"),
        GameEvent::PlayerLeft(e) => line.subject(&e.player).text(" left the galaxy"),
        GameEvent::PlayerJumped(e) => jumped(&mut line, e),
        GameEvent::PlayerDocked(e) => docked(&mut line, e),
        GameEvent::PlayerUndocked(e) => undocked(&mut line, e),
        GameEvent::Combat(e) => combat(&mut line, e),
        GameEvent::PlayerDestroyed(e) => destroyed(&mut line, e),
        GameEvent::PirateDestroyed(e) => pirate_destroyed(&mut line, e),
        GameEvent::ShipPurchased(e) => ship_purchased(&mut line, e),
        GameEvent::Trade(e) => trade(&mut line, e),
        GameEvent::ExchangeFill(e) => exchange_fill(&mut line, e),
        GameEvent::ExchangeOrder(e) => exchange_order(&mut line, e),
        GameEvent::ItemCrafted(e) => crafted(&mut line, e),
        GameEvent::ResourceMined(e) => mined(&mut line, e),
        GameEvent::MissionCompleted(e) => mission(&mut line, e),
        GameEvent::FactionCreated(e) => faction_created(&mut line, e),
        GameEvent::FactionJoined(e) => line
            .subject(&e.player)
            .text(" joined ")
            .faction_or(&e.faction_name, "a faction"),
        GameEvent::FactionLeft(e) => line
            .subject(&e.player)
            .text(" left ")
            .faction_or(&e.faction_name, "their faction"),
        GameEvent::FactionWarDeclared(e) => line
            .faction_subject(&e.faction_name)
            .text(" declared war")
            .clause(" on ", &e.target_faction, Segment::faction),
        GameEvent::FactionPeace(e) => line
            .faction_subject(&e.faction_name)
            .text(" made peace")
            .clause(" with ", &e.target_faction, Segment::faction),
        GameEvent::BaseBuilt(e) => base_built(&mut line, e),
        GameEvent::BaseDestroyed(e) => base_destroyed(&mut line, e),
        GameEvent::Chat(e) => chat(&mut line, e),
        GameEvent::ForumPost(e) => forum_post(&mut line, e),
        GameEvent::DevAnnouncement(e) => dev_announcement(&mut line, e),
        GameEvent::SystemDiscovered(e) => line
            .subject(&e.player)
            .text(" discovered ")
            .system_or(&e.system_name, "a new system"),
        GameEvent::PoiDiscovered(e) => poi_discovered(&mut line, e),
        GameEvent::Salvage(e) => salvage(&mut line, e),
        GameEvent::BountyPosted(e) => line
            .subject(&e.player)
            .text(" placed a ")
            .amount_prefix(&e.amount)
            .text("bounty")
            .player_clause(" on ", &e.target),
        GameEvent::BountyClaimed(e) => line
            .subject(&e.player)
            .text(" claimed the ")
            .amount_prefix(&e.amount)
            .text("bounty")
            .player_clause(" on ", &e.target),
        GameEvent::PoliceResponse(e) => line
            .text("Police responded")
            .player_clause(" to ", &e.target)
            .clause(" in ", &e.system_name, Segment::system),
        GameEvent::InsurancePayout(e) => insurance(&mut line, e),
        GameEvent::LeaderboardChange(e) => leaderboard(&mut line, e),
        GameEvent::ServerAnnouncement(e) => match present(&e.message) {
            Some(message) => line.text_value(message),
            None => line.abandon(),
        },
        GameEvent::Tick(e) => match present(&e.tick) {
            Some(tick) => line.text("Tick ").text_value(tick),
            None => line.abandon(),
        },
        GameEvent::PlayerStats(e) => match present(&e.online_players) {
            Some(count) => line.text_value(count).text(" pilots online"),
            None => line.abandon(),
        },
        GameEvent::Unknown { raw_type, data } => return fallback(raw_type, data, players),
    };
    line.finish()
}

/// Generic rendering for tags without a template.
///
/// `<actor> <humanized tag>[ in <system> | at <poi>]`, where the actor is
/// the first present field of [`FALLBACK_ACTOR_FIELDS`].
pub fn fallback(
    event_type: &str,
    data: &Map<String, Value>,
    players: Option<&PlayerInfo>,
) -> Rendered {
    let mut line = Line::new(players);
    let actor = FALLBACK_ACTOR_FIELDS
        .iter()
        .find_map(|key| data.get(*key).and_then(scalar_value));

    let label = humanize(event_type);
    match actor {
        Some(actor) => {
            line.player_ref(&actor).text(" ").text(&label);
        }
        None => {
            line.text(&capitalize(&label));
        }
    }

    if let Some(system) = data.get("system_name").and_then(scalar_value) {
        line.text(" in ").push(Segment::system(&system));
    } else if let Some(poi) = data.get("poi_name").and_then(scalar_value) {
        line.text(" at ").push(Segment::system(&poi));
    }
    line.finish()
}

/// `faction_war_declared` → `faction war declared`
pub fn humanize(event_type: &str) -> String {
    event_type.replace('_', " ").trim().to_string()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn scalar_value(value: &Value) -> Option<Scalar> {
    let scalar = match value {
        Value::String(text) => Scalar::Text(text.clone()),
        Value::Number(number) => Scalar::Number(number.clone()),
        _ => return None,
    };
    (!scalar.is_blank()).then_some(scalar)
}

fn present(field: &Field) -> Option<&Scalar> {
    field.as_ref().filter(|value| !value.is_blank())
}

fn decimal(value: &Scalar) -> Option<Decimal> {
    match value {
        Scalar::Number(number) => Decimal::from_str(&number.to_string()).ok(),
        Scalar::Text(text) => Decimal::from_str(text.trim()).ok(),
        Scalar::Flag(_) => None,
    }
}

/// Output under construction.
///
/// Once the subject of a template is missing the line is abandoned and
/// every further call is a no-op, so templates read top to bottom without
/// early returns.
struct Line<'a> {
    out: Rendered,
    players: Option<&'a PlayerInfo>,
    abandoned: bool,
}

impl<'a> Line<'a> {
    fn new(players: Option<&'a PlayerInfo>) -> Self {
        Self {
            out: Rendered::new(),
            players,
            abandoned: false,
        }
    }

    fn finish(self) -> Rendered {
        if self.abandoned {
            Rendered::new()
        } else {
            self.out
        }
    }

    fn abandon(&mut self) -> &mut Self {
        self.abandoned = true;
        self
    }

    fn push(&mut self, segment: Segment) -> &mut Self {
        if !self.abandoned {
            self.out.push(segment);
        }
        self
    }

    fn text(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        self.push(Segment::text(text))
    }

    fn text_value(&mut self, value: &Scalar) -> &mut Self {
        self.push(Segment::text(value))
    }

    fn player_ref(&mut self, name: &Scalar) -> &mut Self {
        let key = name.to_string();
        let meta = self.players.and_then(|players| players.get(&key));
        self.push(Segment::player(&key, meta))
    }

    /// Leading player reference; abandons the line when absent.
    fn subject(&mut self, name: &Field) -> &mut Self {
        match present(name) {
            Some(name) => self.player_ref(name),
            None => self.abandon(),
        }
    }

    fn faction_subject(&mut self, name: &Field) -> &mut Self {
        match present(name) {
            Some(name) => self.push(Segment::faction(name)),
            None => self.abandon(),
        }
    }

    /// `prefix` followed by `build(value)` when the field is present.
    fn clause(&mut self, prefix: &str, field: &Field, build: fn(&Scalar) -> Segment) -> &mut Self {
        if let Some(value) = present(field) {
            self.text(prefix).push(build(value));
        }
        self
    }

    fn text_clause(&mut self, prefix: &str, field: &Field, suffix: &str) -> &mut Self {
        if let Some(value) = present(field) {
            self.text(prefix).text_value(value).text(suffix);
        }
        self
    }

    fn player_clause(&mut self, prefix: &str, field: &Field) -> &mut Self {
        if let Some(name) = present(field) {
            self.text(prefix).player_ref(name);
        }
        self
    }

    fn system_or(&mut self, field: &Field, otherwise: &str) -> &mut Self {
        match present(field) {
            Some(name) => self.push(Segment::system(name)),
            None => self.text(otherwise),
        }
    }

    fn item_or(&mut self, field: &Field, otherwise: &str) -> &mut Self {
        match present(field) {
            Some(name) => self.push(Segment::item(name)),
            None => self.text(otherwise),
        }
    }

    fn faction_or(&mut self, field: &Field, otherwise: &str) -> &mut Self {
        match present(field) {
            Some(name) => self.push(Segment::faction(name)),
            None => self.text(otherwise),
        }
    }

    /// `5x ` before an item when a quantity is present.
    fn quantity(&mut self, field: &Field) -> &mut Self {
        self.text_clause("", field, "x ")
    }

    /// `1,000 cr ` before a noun when an amount is present.
    fn amount_prefix(&mut self, field: &Field) -> &mut Self {
        self.text_clause("", field, " cr ")
    }

    /// `Nx A, B` with each name an item reference.
    fn item_list(&mut self, items: &[ListItem]) -> &mut Self {
        let mut first = true;
        for item in items {
            let Some(name) = item.name().filter(|name| !name.is_blank()) else {
                continue;
            };
            if !first {
                self.text(", ");
            }
            first = false;
            if let Some(quantity) = item.quantity().filter(|q| !q.is_blank()) {
                self.text_value(quantity).text("x ");
            }
            self.push(Segment::item(name));
        }
        self
    }
}

fn has_items(items: &Option<Vec<ListItem>>) -> bool {
    items
        .as_deref()
        .is_some_and(|items| items.iter().any(|item| item.name().is_some_and(|n| !n.is_blank())))
}

fn jumped<'l, 'a>(line: &'l mut Line<'a>, e: &events::Jump) -> &'l mut Line<'a> {
    line.subject(&e.player)
        .text(" jumped")
        .clause(" from ", &e.from_system, Segment::system)
        .clause(" to ", &e.to_system, Segment::system)
}

fn docked<'l, 'a>(line: &'l mut Line<'a>, e: &events::Docking) -> &'l mut Line<'a> {
    let place = present(&e.station_name).or(present(&e.poi_name));
    line.subject(&e.player).text(" docked");
    if let Some(place) = place {
        line.text(" at ").push(Segment::system(place));
    }
    line.clause(" in ", &e.system_name, Segment::system)
}

fn undocked<'l, 'a>(line: &'l mut Line<'a>, e: &events::Docking) -> &'l mut Line<'a> {
    let place = present(&e.station_name).or(present(&e.poi_name));
    line.subject(&e.player).text(" undocked");
    if let Some(place) = place {
        line.text(" from ").push(Segment::system(place));
    }
    line
}

fn combat<'l, 'a>(line: &'l mut Line<'a>, e: &events::Combat) -> &'l mut Line<'a> {
    line.subject(&e.attacker)
        .text(" attacked")
        .player_clause(" ", &e.defender)
        .text_clause(" for ", &e.damage, " damage")
        .clause(" in ", &e.system_name, Segment::system)
}

fn destroyed<'l, 'a>(line: &'l mut Line<'a>, e: &events::Kill) -> &'l mut Line<'a> {
    match (present(&e.killer), present(&e.victim)) {
        (Some(killer), victim) => {
            line.player_ref(killer).text(" destroyed ");
            match victim {
                Some(victim) => {
                    line.player_ref(victim).text("'s ");
                }
                None => {
                    line.text("a ");
                }
            }
            line.item_or(&e.ship_class, "ship");
        }
        (None, Some(victim)) => {
            line.player_ref(victim)
                .text("'s ")
                .item_or(&e.ship_class, "ship")
                .text(" was destroyed");
        }
        (None, None) => {
            line.abandon();
        }
    }
    line.clause(" in ", &e.system_name, Segment::system)
}

fn pirate_destroyed<'l, 'a>(line: &'l mut Line<'a>, e: &events::PirateKill) -> &'l mut Line<'a> {
    line.subject(&e.player).text(" destroyed ");
    match present(&e.pirate_name) {
        Some(name) => line.text("pirate ").text_value(name),
        None => line.text("a pirate"),
    };
    line.text_clause(" (+", &e.bounty, " cr)")
        .clause(" in ", &e.system_name, Segment::system)
}

fn ship_purchased<'l, 'a>(line: &'l mut Line<'a>, e: &events::ShipPurchase) -> &'l mut Line<'a> {
    line.subject(&e.player)
        .text(" purchased a ")
        .item_or(&e.ship_class, "new ship")
        .text_clause(" for ", &e.price, " cr")
}

fn trade<'l, 'a>(line: &'l mut Line<'a>, e: &events::Trade) -> &'l mut Line<'a> {
    line.subject(&e.seller)
        .text(" sold ")
        .quantity(&e.quantity)
        .item_or(&e.item_name, "goods")
        .player_clause(" to ", &e.buyer)
}

fn exchange_fill<'l, 'a>(line: &'l mut Line<'a>, e: &events::ExchangeFill) -> &'l mut Line<'a> {
    line.subject(&e.buyer)
        .text(" bought ")
        .quantity(&e.quantity)
        .item_or(&e.item_name, "goods")
        .player_clause(" from ", &e.seller)
        .text_clause(" at ", &e.price, " cr each");

    let total = present(&e.quantity)
        .and_then(decimal)
        .zip(present(&e.price).and_then(decimal))
        .and_then(|(quantity, price)| quantity.checked_mul(price));
    if let Some(total) = total {
        line.text(" (")
            .text(&format_decimal(total))
            .text(" cr total)");
    }
    line.clause(" in ", &e.station_name, Segment::system)
}

fn exchange_order<'l, 'a>(line: &'l mut Line<'a>, e: &events::ExchangeOrder) -> &'l mut Line<'a> {
    line.subject(&e.player);
    match present(&e.side) {
        Some(side) => line.text(" placed a ").text_value(side).text(" order for "),
        None => line.text(" placed an order for "),
    };
    line.quantity(&e.quantity)
        .item_or(&e.item_name, "goods")
        .text_clause(" at ", &e.price, " cr")
}

fn crafted<'l, 'a>(line: &'l mut Line<'a>, e: &events::Craft) -> &'l mut Line<'a> {
    line.subject(&e.player)
        .text(" crafted ")
        .quantity(&e.quantity)
        .item_or(&e.recipe_name, "an item");
    if let Some(ingredients) = e.ingredients.as_deref().filter(|_| has_items(&e.ingredients)) {
        line.text(" from ").item_list(ingredients);
    }
    line
}

fn mined<'l, 'a>(line: &'l mut Line<'a>, e: &events::Mining) -> &'l mut Line<'a> {
    line.subject(&e.player).text(" mined ");
    match e.resources.as_deref().filter(|_| has_items(&e.resources)) {
        Some(resources) => line.item_list(resources),
        None => line.quantity(&e.quantity).item_or(&e.item_name, "resources"),
    };
    line.clause(" at ", &e.poi_name, Segment::system)
        .clause(" in ", &e.system_name, Segment::system)
}

fn mission<'l, 'a>(line: &'l mut Line<'a>, e: &events::Mission) -> &'l mut Line<'a> {
    line.subject(&e.player)
        .text(" completed")
        .text_clause(" mission \"", &e.mission_name, "\"");
    if present(&e.mission_name).is_none() {
        line.text(" a mission");
    }
    line.text_clause(" (+", &e.reward, " cr)")
}

fn faction_created<'l, 'a>(
    line: &'l mut Line<'a>,
    e: &events::FactionMembership,
) -> &'l mut Line<'a> {
    line.subject(&e.player)
        .text(" founded ")
        .faction_or(&e.faction_name, "a faction")
        .text_clause(" [", &e.faction_tag, "]")
}

fn base_built<'l, 'a>(line: &'l mut Line<'a>, e: &events::BaseBuilt) -> &'l mut Line<'a> {
    line.subject(&e.builder)
        .text(" built ")
        .item_or(&e.base_name, "a base")
        .clause(" at ", &e.poi_name, Segment::system)
        .clause(" in ", &e.system_name, Segment::system)
}

fn base_destroyed<'l, 'a>(line: &'l mut Line<'a>, e: &events::BaseDestroyed) -> &'l mut Line<'a> {
    line.subject(&e.attacker).text(" destroyed ");
    match present(&e.owner) {
        Some(owner) => line.player_ref(owner).text("'s base"),
        None => line.text("a base"),
    };
    line.clause(" ", &e.base_name, Segment::item)
        .clause(" in ", &e.system_name, Segment::system)
}

fn chat<'l, 'a>(line: &'l mut Line<'a>, e: &events::Chat) -> &'l mut Line<'a> {
    let Some(message) = present(&e.message) else {
        return line.abandon();
    };
    if e.is_dev.as_ref().is_some_and(Scalar::is_true) {
        line.push(Segment::DevBadge).text(" ");
    }
    line.subject(&e.sender)
        .text_clause(" [#", &e.channel, "]")
        .text(": ")
        .text_value(message)
}

fn forum_post<'l, 'a>(line: &'l mut Line<'a>, e: &events::ForumPost) -> &'l mut Line<'a> {
    if e.is_dev.as_ref().is_some_and(Scalar::is_true) {
        line.push(Segment::DevBadge).text(" ");
    }
    line.subject(&e.username)
        .text(" posted")
        .text_clause(" \"", &e.title, "\"")
        .text_clause(" in ", &e.category, "")
}

fn dev_announcement<'l, 'a>(line: &'l mut Line<'a>, e: &events::Announcement) -> &'l mut Line<'a> {
    let Some(message) = present(&e.message) else {
        return line.abandon();
    };
    line.push(Segment::DevBadge)
        .player_clause(" ", &e.sender)
        .text(": ")
        .text_value(message)
}

fn poi_discovered<'l, 'a>(line: &'l mut Line<'a>, e: &events::Discovery) -> &'l mut Line<'a> {
    line.subject(&e.player)
        .text(" discovered ")
        .text_clause("", &e.poi_type, " ")
        .system_or(&e.poi_name, "a point of interest")
        .clause(" in ", &e.system_name, Segment::system)
}

fn salvage<'l, 'a>(line: &'l mut Line<'a>, e: &events::Salvage) -> &'l mut Line<'a> {
    line.subject(&e.player)
        .text(" salvaged ")
        .quantity(&e.quantity)
        .item_or(&e.item_name, "wreckage")
        .clause(" in ", &e.system_name, Segment::system)
}

fn insurance<'l, 'a>(line: &'l mut Line<'a>, e: &events::Insurance) -> &'l mut Line<'a> {
    line.subject(&e.player).text(" received ");
    match present(&e.amount) {
        Some(amount) => line.text_value(amount).text(" cr in insurance"),
        None => line.text("an insurance payout"),
    };
    line.clause(" for their ", &e.ship_class, Segment::item)
}

fn leaderboard<'l, 'a>(line: &'l mut Line<'a>, e: &events::Leaderboard) -> &'l mut Line<'a> {
    line.subject(&e.player);
    match present(&e.rank) {
        Some(rank) => line.text(" reached #").text_value(rank),
        None => line.text(" climbed the leaderboard"),
    };
    line.text_clause(" in ", &e.category, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_types::envelope::PlayerMeta;
    use serde_json::json;

    fn render_json(tag: &str, payload: Value) -> Rendered {
        let data = payload.as_object().cloned().unwrap();
        let event = GameEvent::decode(tag, &data).unwrap();
        render(&event, None)
    }

    fn plain(tag: &str, payload: Value) -> String {
        render_json(tag, payload).plain_text()
    }

    #[test]
    fn test_trade_wording_and_references() {
        let rendered = render_json(
            "trade",
            json!({"seller": "Ann", "buyer": "Bob", "quantity": 5, "item_name": "Ore"}),
        );
        assert_eq!(rendered.plain_text(), "Ann sold 5x Ore to Bob");
        assert_eq!(
            rendered.segments(),
            &[
                Segment::player("Ann", None),
                Segment::text(" sold "),
                Segment::text(&Scalar::Number(5.into())),
                Segment::text("x "),
                Segment::item("Ore"),
                Segment::text(" to "),
                Segment::player("Bob", None),
            ]
        );
    }

    #[test]
    fn test_trade_without_quantity() {
        assert_eq!(
            plain("trade", json!({"seller": "Ann", "buyer": "Bob", "item_name": "Ore"})),
            "Ann sold Ore to Bob"
        );
    }

    #[test]
    fn test_missing_subject_renders_nothing() {
        assert!(render_json("trade", json!({"buyer": "Bob"})).is_empty());
        assert!(render_json("player_joined", json!({})).is_empty());
        assert!(render_json("chat", json!({"sender": "Ann"})).is_empty());
        assert!(render_json("tick", json!({})).is_empty());
    }

    #[test]
    fn test_exchange_fill_total() {
        assert_eq!(
            plain(
                "exchange_fill",
                json!({
                    "buyer": "Bob", "seller": "Ann", "quantity": 200,
                    "item_name": "Ice", "price": 12.5, "station_name": "Haven"
                })
            ),
            "Bob bought 200x Ice from Ann at 12.5 cr each (2,500 cr total) in Haven"
        );
    }

    #[test]
    fn test_jump_clauses() {
        assert_eq!(
            plain("player_jumped", json!({"player": "Ann", "to_system": "Vega"})),
            "Ann jumped to Vega"
        );
    }

    #[test]
    fn test_destroyed_variants() {
        assert_eq!(
            plain(
                "player_destroyed",
                json!({
                    "killer": "Ann",
                    "victim": "Bob",
                    "ship_class": "Corvette",
                    "system_name": "Sol"
                })
            ),
            "Ann destroyed Bob's Corvette in Sol"
        );
        assert_eq!(
            plain("player_destroyed", json!({"victim": "Bob"})),
            "Bob's ship was destroyed"
        );
    }

    #[test]
    fn test_crafted_ingredient_list() {
        assert_eq!(
            plain(
                "item_crafted",
                json!({
                    "player": "Ann", "recipe_name": "Hull Plate", "quantity": 2,
                    "ingredients": [{"name": "Ore", "quantity": 3}, "Ice"]
                })
            ),
            "Ann crafted 2x Hull Plate from 3x Ore, Ice"
        );
    }

    #[test]
    fn test_mined_resources_fall_back_to_single_item() {
        assert_eq!(
            plain(
                "resource_mined",
                json!({
                    "player": "Ann",
                    "resources": [],
                    "quantity": 40,
                    "item_name": "Ore",
                    "poi_name": "Belt 4"
                })
            ),
            "Ann mined 40x Ore at Belt 4"
        );
    }

    #[test]
    fn test_dev_chat_badge() {
        let rendered = render_json(
            "chat",
            json!({"sender": "Mod", "channel": "general", "message": "hi", "is_dev": true}),
        );
        assert_eq!(rendered.segments()[0], Segment::DevBadge);
        assert_eq!(rendered.plain_text(), "[DEV] Mod [#general]: hi");
    }

    #[test]
    fn test_dev_announcement() {
        assert_eq!(
            plain("dev_announcement", json!({"message": "Patch 1.2 is live"})),
            "[DEV]: Patch 1.2 is live"
        );
    }

    #[test]
    fn test_faction_war() {
        assert_eq!(
            plain(
                "faction_war_declared",
                json!({"faction_name": "Miners", "target_faction": "Raiders"})
            ),
            "Miners declared war on Raiders"
        );
    }

    #[test]
    fn test_stats_and_tick() {
        assert_eq!(plain("player_stats", json!({"online_players": 1520})), "1,520 pilots online");
        assert_eq!(plain("tick", json!({"tick": 88})), "Tick 88");
    }

    #[test]
    fn test_police_always_renders() {
        assert_eq!(plain("police_response", json!({})), "Police responded");
    }

    #[test]
    fn test_player_reference_uses_metadata() {
        let mut players = PlayerInfo::new();
        players.insert(
            "Ann",
            PlayerMeta {
                empire: Some("nebula".to_string()),
                faction_tag: Some("ORE".to_string()),
            },
        );
        let data = json!({"player": "Ann"}).as_object().cloned().unwrap();
        let event = GameEvent::decode("player_joined", &data).unwrap();
        let rendered = render(&event, Some(&players));
        assert_eq!(rendered.plain_text(), "[ORE] Ann joined the galaxy");
        assert!(rendered.to_markup().contains("color:#22d3ee"));
    }

    #[test]
    fn test_fallback_with_actor_and_system() {
        let data = json!({"player": "Zed", "system_name": "Sol", "poi_name": "Gate"});
        let rendered = fallback("wormhole_opened", data.as_object().unwrap(), None);
        assert_eq!(rendered.plain_text(), "Zed wormhole opened in Sol");
        assert_eq!(rendered.segments()[0], Segment::player("Zed", None));
    }

    #[test]
    fn test_fallback_actor_priority_and_poi() {
        let data = json!({"attacker": "Ann", "username": "Bob", "poi_name": "Gate"});
        let rendered = fallback("gate_sabotaged", data.as_object().unwrap(), None);
        assert_eq!(rendered.plain_text(), "Bob gate sabotaged at Gate");
    }

    #[test]
    fn test_fallback_without_actor() {
        let data = json!({"player": {"nested": true}});
        let rendered = fallback("solar_flare", data.as_object().unwrap(), None);
        assert_eq!(rendered.plain_text(), "Solar flare");
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("faction_war_declared"), "faction war declared");
        assert_eq!(humanize("_x_"), "x");
    }
}
