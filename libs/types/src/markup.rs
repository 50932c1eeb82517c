//! Sanitizer and typed markup segments
//!
//! Rendered feed text is a sequence of [`Segment`]s. Every dynamic value a
//! segment carries is a [`SafeText`], and a `SafeText` can only be built by
//! escaping raw input, so an unescaped payload value cannot reach the
//! markup writer. The only other text in the output is the fixed wrapper
//! fragments emitted by [`Rendered::to_markup`].
//!
//! Escaping is not idempotent: escaping twice double-encodes. Raw data is
//! escaped exactly once, when it is wrapped in a `SafeText`.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::empire::empire_color;
use crate::envelope::{PlayerMeta, Scalar};

/// Escape the five markup metacharacters.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Inverse of [`escape`] for text that came out of it.
fn unescape(escaped: &str) -> String {
    escaped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Anything the sanitizer accepts: strings, bytes, numbers, JSON values,
/// and absent values (which become the empty string).
pub trait Sanitize {
    fn sanitize(&self) -> SafeText;
}

/// Escape any supported input into a [`SafeText`].
pub fn sanitize<T: Sanitize + ?Sized>(input: &T) -> SafeText {
    input.sanitize()
}

impl Sanitize for str {
    fn sanitize(&self) -> SafeText {
        SafeText(escape(self))
    }
}

impl Sanitize for String {
    fn sanitize(&self) -> SafeText {
        self.as_str().sanitize()
    }
}

impl Sanitize for [u8] {
    fn sanitize(&self) -> SafeText {
        String::from_utf8_lossy(self).sanitize()
    }
}

impl Sanitize for std::borrow::Cow<'_, str> {
    fn sanitize(&self) -> SafeText {
        self.as_ref().sanitize()
    }
}

macro_rules! sanitize_display {
    ($($ty:ty),*) => {
        $(impl Sanitize for $ty {
            fn sanitize(&self) -> SafeText {
                self.to_string().sanitize()
            }
        })*
    };
}

sanitize_display!(i32, i64, u32, u64, usize, f64, bool);

impl Sanitize for Scalar {
    fn sanitize(&self) -> SafeText {
        self.to_string().sanitize()
    }
}

impl Sanitize for Value {
    fn sanitize(&self) -> SafeText {
        match self {
            Value::Null => SafeText::empty(),
            Value::String(text) => text.sanitize(),
            Value::Number(number) => number.to_string().sanitize(),
            Value::Bool(flag) => flag.sanitize(),
            compound => compound.to_string().sanitize(),
        }
    }
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn sanitize(&self) -> SafeText {
        self.as_ref().map(Sanitize::sanitize).unwrap_or_default()
    }
}

impl<T: Sanitize + ?Sized> Sanitize for &T {
    fn sanitize(&self) -> SafeText {
        (**self).sanitize()
    }
}

/// Escaped text, safe to embed in markup text or quoted attribute positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SafeText(String);

impl SafeText {
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// The escaped form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The original text, for non-markup surfaces such as a terminal.
    pub fn unescaped(&self) -> String {
        unescape(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SafeText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for SafeText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Empire marker shown in front of a player reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmpireMark {
    /// Sanitized empire tag as received, empty when none was sent
    pub label: SafeText,
    /// Colour from the fixed empire table
    pub color: &'static str,
}

/// One typed piece of rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Text {
        text: SafeText,
    },
    Player {
        name: SafeText,
        empire: Option<EmpireMark>,
        faction_tag: Option<SafeText>,
    },
    System {
        name: SafeText,
    },
    Item {
        name: SafeText,
    },
    Faction {
        name: SafeText,
    },
    DevBadge,
}

impl Segment {
    pub fn text<T: Sanitize + ?Sized>(raw: &T) -> Self {
        Segment::Text {
            text: raw.sanitize(),
        }
    }

    /// A player reference, decorated from the envelope's player metadata.
    pub fn player<T: Sanitize + ?Sized>(name: &T, meta: Option<&PlayerMeta>) -> Self {
        // known players always get a marker; unknown empires use the default colour
        let empire = meta.map(|m| {
            let tag = m.empire.as_deref().unwrap_or_default();
            EmpireMark {
                label: tag.sanitize(),
                color: empire_color(tag),
            }
        });
        let faction_tag = meta
            .and_then(|m| m.faction_tag.as_deref())
            .map(Sanitize::sanitize);
        Segment::Player {
            name: name.sanitize(),
            empire,
            faction_tag,
        }
    }

    pub fn system<T: Sanitize + ?Sized>(name: &T) -> Self {
        Segment::System {
            name: name.sanitize(),
        }
    }

    pub fn item<T: Sanitize + ?Sized>(name: &T) -> Self {
        Segment::Item {
            name: name.sanitize(),
        }
    }

    pub fn faction<T: Sanitize + ?Sized>(name: &T) -> Self {
        Segment::Faction {
            name: name.sanitize(),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Segment::Text { text } => text.as_str().trim().is_empty(),
            Segment::Player { name, .. }
            | Segment::System { name }
            | Segment::Item { name }
            | Segment::Faction { name } => name.is_empty(),
            Segment::DevBadge => false,
        }
    }

    fn write_markup(&self, out: &mut String) {
        match self {
            Segment::Text { text } => out.push_str(text.as_str()),
            Segment::Player {
                name,
                empire,
                faction_tag,
            } => {
                out.push_str("<span class=\"feed-player\">");
                if let Some(mark) = empire {
                    out.push_str("<span class=\"empire-mark\" style=\"color:");
                    out.push_str(mark.color);
                    out.push_str("\" title=\"");
                    out.push_str(mark.label.as_str());
                    out.push_str("\">\u{25cf}</span>");
                }
                if let Some(tag) = faction_tag {
                    out.push_str("<span class=\"faction-tag\">[");
                    out.push_str(tag.as_str());
                    out.push_str("]</span> ");
                }
                out.push_str(name.as_str());
                out.push_str("</span>");
            }
            Segment::System { name } => wrap(out, "feed-system", name),
            Segment::Item { name } => wrap(out, "feed-item", name),
            Segment::Faction { name } => wrap(out, "feed-faction", name),
            Segment::DevBadge => out.push_str("<span class=\"dev-badge\">DEV</span>"),
        }
    }

    fn write_plain(&self, out: &mut String) {
        match self {
            Segment::Text { text } => out.push_str(&text.unescaped()),
            Segment::Player {
                name, faction_tag, ..
            } => {
                if let Some(tag) = faction_tag {
                    out.push('[');
                    out.push_str(&tag.unescaped());
                    out.push_str("] ");
                }
                out.push_str(&name.unescaped());
            }
            Segment::System { name } | Segment::Item { name } | Segment::Faction { name } => {
                out.push_str(&name.unescaped())
            }
            Segment::DevBadge => out.push_str("[DEV]"),
        }
    }
}

fn wrap(out: &mut String, class: &'static str, name: &SafeText) {
    out.push_str("<span class=\"");
    out.push_str(class);
    out.push_str("\">");
    out.push_str(name.as_str());
    out.push_str("</span>");
}

/// The rendered form of one event: an ordered list of segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Rendered {
    segments: Vec<Segment>,
}

impl Rendered {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: Segment) -> &mut Self {
        self.segments.push(segment);
        self
    }

    pub fn text<T: Sanitize + ?Sized>(&mut self, raw: &T) -> &mut Self {
        self.push(Segment::text(raw))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when there is nothing worth displaying.
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(Segment::is_blank)
    }

    /// Markup string built only from fixed fragments and escaped values.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            segment.write_markup(&mut out);
        }
        out
    }

    /// Unstyled text with the original characters restored.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            segment.write_plain(&mut out);
        }
        out
    }
}

impl FromIterator<Segment> for Rendered {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_all_metacharacters() {
        assert_eq!(
            escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_is_not_idempotent() {
        let once = escape("&");
        let twice = escape(&once);
        assert_eq!(once, "&amp;");
        assert_eq!(twice, "&amp;amp;");
    }

    #[test]
    fn test_sanitize_inputs() {
        assert_eq!(sanitize("a<b").as_str(), "a&lt;b");
        assert_eq!(sanitize(&b"x>y"[..]).as_str(), "x&gt;y");
        assert_eq!(sanitize(&42_i64).as_str(), "42");
        assert_eq!(sanitize(&None::<String>).as_str(), "");
        assert_eq!(sanitize(&Value::Null).as_str(), "");
        assert_eq!(sanitize(&json!("'q'")).as_str(), "&#39;q&#39;");
        assert_eq!(sanitize(&json!(["<"])).as_str(), "[&quot;&lt;&quot;]");
    }

    #[test]
    fn test_unescaped_round_trips_through_escape() {
        let raw = "&lt; is not <";
        assert_eq!(sanitize(raw).unescaped(), raw);
    }

    #[test]
    fn test_player_markup_with_metadata() {
        let meta = PlayerMeta {
            empire: Some("crimson".to_string()),
            faction_tag: Some("R&D".to_string()),
        };
        let rendered: Rendered = [Segment::player("Ann", Some(&meta))].into_iter().collect();
        assert_eq!(
            rendered.to_markup(),
            "<span class=\"feed-player\"><span class=\"empire-mark\" style=\"color:#ef4444\" \
             title=\"crimson\">\u{25cf}</span>\
             <span class=\"faction-tag\">[R&amp;D]</span> Ann</span>"
        );
        assert_eq!(rendered.plain_text(), "[R&D] Ann");
    }

    #[test]
    fn test_player_markup_unknown_empire_escaped() {
        let meta = PlayerMeta {
            empire: Some("\"><script>".to_string()),
            faction_tag: None,
        };
        let markup = Rendered::from_iter([Segment::player("Zed", Some(&meta))]).to_markup();
        assert!(markup.contains("color:#9ca3af"));
        assert!(markup.contains("title=\"&quot;&gt;&lt;script&gt;\""));
        assert!(!markup.contains("<script>"));
    }

    #[test]
    fn test_player_markup_without_empire_gets_default_marker() {
        let meta = PlayerMeta {
            empire: None,
            faction_tag: Some("ORE".to_string()),
        };
        let markup = Rendered::from_iter([Segment::player("Ann", Some(&meta))]).to_markup();
        assert_eq!(
            markup,
            "<span class=\"feed-player\"><span class=\"empire-mark\" style=\"color:#9ca3af\" \
             title=\"\">\u{25cf}</span><span class=\"faction-tag\">[ORE]</span> Ann</span>"
        );
    }

    #[test]
    fn test_player_without_metadata_has_no_marker() {
        let markup = Rendered::from_iter([Segment::player("Ann", None)]).to_markup();
        assert_eq!(markup, "<span class=\"feed-player\">Ann</span>");
    }

    #[test]
    fn test_reference_wrappers() {
        let mut rendered = Rendered::new();
        rendered
            .push(Segment::DevBadge)
            .text(" ")
            .push(Segment::system("Sol"))
            .push(Segment::item("Ore"))
            .push(Segment::faction("Miners"));
        assert_eq!(
            rendered.to_markup(),
            "<span class=\"dev-badge\">DEV</span> <span class=\"feed-system\">Sol</span>\
             <span class=\"feed-item\">Ore</span><span class=\"feed-faction\">Miners</span>"
        );
        assert_eq!(rendered.plain_text(), "[DEV] SolOreMiners");
    }

    #[test]
    fn test_empty_rendering() {
        assert!(Rendered::new().is_empty());
        let mut rendered = Rendered::new();
        rendered.text("  ");
        assert!(rendered.is_empty());
        rendered.push(Segment::DevBadge);
        assert!(!rendered.is_empty());
    }

    #[test]
    fn test_segments_serialize_with_kind() {
        let json = serde_json::to_value(Segment::item("<Ore>")).unwrap();
        assert_eq!(json, json!({"kind": "item", "name": "&lt;Ore&gt;"}));
    }
}
