//! Formatter registry
//!
//! Maps an envelope's `type` to an icon and rendered segments. Known tags
//! go through their typed decoder and template; everything else, and any
//! known tag whose payload has the wrong shape, goes through the fallback.

use serde_json::{Map, Value};
use tracing::debug;

use feed_types::entry::Formatted;
use feed_types::envelope::{EventEnvelope, PlayerInfo};

use crate::events::{icon_for_tag, GameEvent};
use crate::templates;

pub use crate::templates::fallback;

/// Format one event payload.
pub fn format(
    event_type: &str,
    data: &Map<String, Value>,
    players: Option<&PlayerInfo>,
) -> Formatted {
    match GameEvent::decode(event_type, data) {
        Ok(event) => Formatted::new(event.icon(), templates::render(&event, players)),
        Err(err) => {
            debug!(event_type, error = %err, "Template rejected payload, using fallback");
            Formatted::new(icon_for_tag(event_type), fallback(event_type, data, players))
        }
    }
}

/// Format a decoded envelope.
pub fn format_envelope(envelope: &EventEnvelope) -> Formatted {
    format(
        &envelope.event_type,
        &envelope.data,
        envelope.player_info.as_ref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_types::icon::Icon;
    use feed_types::markup::Segment;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_known_tag_uses_template() {
        let formatted = format(
            "trade",
            &data(json!({"seller": "Ann", "buyer": "Bob", "quantity": 5, "item_name": "Ore"})),
            None,
        );
        assert_eq!(formatted.icon, Icon::Trade);
        assert_eq!(formatted.rendered.plain_text(), "Ann sold 5x Ore to Bob");
    }

    #[test]
    fn test_unknown_tag_uses_fallback() {
        let formatted = format("wormhole_opened", &data(json!({"player": "Zed"})), None);
        assert_eq!(formatted.icon, Icon::Signal);
        assert_eq!(formatted.rendered.segments()[0], Segment::player("Zed", None));
        assert_eq!(formatted.rendered.plain_text(), "Zed wormhole opened");
    }

    #[test]
    fn test_bad_payload_shape_falls_back_with_known_icon() {
        let formatted = format(
            "player_jumped",
            &data(json!({"player": "Ann", "to_system": {"name": "Vega"}})),
            None,
        );
        assert_eq!(formatted.icon, Icon::Jump);
        assert_eq!(formatted.rendered.plain_text(), "Ann player jumped");
    }

    #[test]
    fn test_script_payload_is_escaped() {
        let formatted = format(
            "chat",
            &data(json!({
                "sender": "<script>alert(1)</script>",
                "message": "<script>alert(1)</script>"
            })),
            None,
        );
        let markup = formatted.rendered.to_markup();
        assert!(!markup.contains("<script>"));
        assert!(markup.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn test_faction_only_metadata_still_marks_player() {
        let envelope = EventEnvelope::decode(
            r#"{"type":"player_joined","data":{"player":"Ann"},
                "player_info":{"Ann":{"faction_tag":"ORE","empire":7}}}"#,
        )
        .unwrap();
        let rendered = format_envelope(&envelope).rendered;
        let markup = rendered.to_markup();
        assert!(markup.contains("<span class=\"empire-mark\" style=\"color:#9ca3af\""));
        assert!(markup.contains("[ORE]"));
        assert_eq!(rendered.plain_text(), "[ORE] Ann joined the galaxy");
    }

    #[test]
    fn test_format_envelope_passes_player_info() {
        let envelope = EventEnvelope::decode(
            r#"{"type":"player_joined","data":{"player":"Ann"},
                "player_info":{"Ann":{"empire":"voidborn"}}}"#,
        )
        .unwrap();
        let markup = format_envelope(&envelope).rendered.to_markup();
        assert!(markup.contains("color:#8b5cf6"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::events::EventKind;
    use feed_types::empire::{Empire, DEFAULT_EMPIRE_COLOR};
    use feed_types::envelope::PlayerMeta;
    use proptest::prelude::*;
    use serde_json::json;

    const TEXT_FIELDS: &[&str] = &[
        "player", "seller", "buyer", "attacker", "defender", "killer", "victim", "sender",
        "username", "builder", "owner", "target", "message", "title", "channel", "category",
        "item_name", "recipe_name", "ship_class", "system_name", "from_system", "to_system",
        "station_name", "poi_name", "poi_type", "faction_name", "target_faction",
        "faction_tag", "mission_name", "base_name", "pirate_name", "side", "name",
    ];

    const NUMERIC_FIELDS: &[&str] = &[
        "quantity", "price", "amount", "damage", "reward", "bounty", "rank", "tick",
        "online_players",
    ];

    /// Every field a template reads, holding `value`, including numeric
    /// slots sent as strings and both list item shapes.
    fn payload(value: &str) -> Map<String, Value> {
        let mut data: Map<String, Value> = TEXT_FIELDS
            .iter()
            .chain(NUMERIC_FIELDS)
            .map(|key| (key.to_string(), Value::String(value.to_string())))
            .collect();
        let list = json!([value, {"name": value, "quantity": value}, {"item_name": value}]);
        data.insert("ingredients".to_string(), list.clone());
        data.insert("resources".to_string(), list);
        data
    }

    fn players(value: &str) -> PlayerInfo {
        let mut players = PlayerInfo::new();
        players.insert(
            value,
            PlayerMeta {
                empire: Some(value.to_string()),
                faction_tag: Some(value.to_string()),
            },
        );
        players
    }

    /// Markup with every fixed wrapper removed.
    fn strip_wrappers(markup: &str) -> String {
        let mut stripped = markup.to_string();
        let colors = Empire::ALL
            .iter()
            .map(|empire| empire.color())
            .chain([DEFAULT_EMPIRE_COLOR]);
        for color in colors {
            let open = format!("<span class=\"empire-mark\" style=\"color:{}\" title=\"", color);
            stripped = stripped.replace(&open, "");
        }
        stripped
            .replace("\">\u{25cf}</span>", "")
            .replace("<span class=\"faction-tag\">[", "")
            .replace("<span class=\"feed-player\">", "")
            .replace("<span class=\"feed-system\">", "")
            .replace("<span class=\"feed-item\">", "")
            .replace("<span class=\"feed-faction\">", "")
            .replace("<span class=\"dev-badge\">DEV</span>", "")
            .replace("</span>", "")
    }

    proptest! {
        #[test]
        fn prop_no_raw_metacharacters_reach_markup(
            value in "[a-z0-9<>\"'&/ ]{1,24}",
            tag_index in 0usize..EventKind::ALL.len(),
            with_players in any::<bool>(),
        ) {
            let kind = EventKind::ALL[tag_index];
            let info = players(&value);
            let players = if with_players { Some(&info) } else { None };
            let markup = format(kind.tag(), &payload(&value), players).rendered.to_markup();
            let stripped = strip_wrappers(&markup);
            prop_assert!(!stripped.contains('<'), "{}", markup);
            prop_assert!(!stripped.contains('>'), "{}", markup);
            prop_assert!(!stripped.contains('\''), "{}", markup);
            prop_assert!(!stripped.contains('"'), "{}", markup);
        }

        #[test]
        fn prop_fallback_escapes_actor(value in "[a-z<>\"'&]{1,16}") {
            let mut data = Map::new();
            data.insert("player".to_string(), Value::String(value.clone()));
            let markup = format("anything_new", &data, None).rendered.to_markup();
            let stripped = strip_wrappers(&markup);
            prop_assert!(!stripped.contains('<'));
            prop_assert!(!stripped.contains('>'));
        }
    }
}
