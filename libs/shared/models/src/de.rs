//! Lenient deserializers for store columns whose JSON type varies by table
//! or by the client that last wrote them.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Row ids may be uuids or serial integers; both become strings.
pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Scores saved as numbers or as the text of a form field.
/// Blank or non-numeric text is treated as absent.
pub fn optional_score<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .and_then(|v| i32::try_from(v).ok()),
        Some(Value::String(s)) => parse_score(&s),
        _ => None,
    })
}

/// Leading integer of a form entry: "12" -> 12, " 7.5" -> 7, "12abc" -> 12,
/// "" -> None.
pub fn parse_score(text: &str) -> Option<i32> {
    let text = text.trim_start();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }

    let value = rest[..end].parse::<i64>().ok()?;
    i32::try_from(if negative { -value } else { value }).ok()
}
