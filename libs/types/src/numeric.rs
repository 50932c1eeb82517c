//! Display formatting for numeric payload values
//!
//! Payload numbers arrive as JSON numbers of arbitrary shape. They are
//! routed through rust_decimal so that `0.1 + 0.2` style float noise never
//! reaches the feed, and integers get thousands grouping (`12500` → `12,500`).

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Number;

/// Format a JSON number for display.
///
/// Falls back to the raw JSON text when the value does not fit a Decimal
/// (e.g. `1e300`).
pub fn format_number(value: &Number) -> String {
    let raw = value.to_string();
    match Decimal::from_str(&raw).or_else(|_| Decimal::from_scientific(&raw)) {
        Ok(decimal) => format_decimal(decimal),
        Err(_) => raw,
    }
}

/// Format a decimal with trailing zeros removed and the integer part grouped.
pub fn format_decimal(value: Decimal) -> String {
    let text = value.normalize().to_string();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits, None),
    };

    let mut out = String::with_capacity(text.len() + int_part.len() / 3);
    out.push_str(sign);
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}
