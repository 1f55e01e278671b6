//! Payload normalization: localized value maps and `/Date(ms)/` strings

use std::sync::OnceLock;

use chrono::{SecondsFormat, TimeZone, Utc};
use k3bridge_domain::LanguageCode;
use regex::Regex;
use serde_json::{Map, Value};

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^/Date\((-?\d+)\)/$").expect("DATE_PATTERN should compile - this is a bug")
    })
}

/// Recursively rewrite a payload for the given locale.
///
/// - `[{"Key": 2052, "Value": ..}, ..]` resolves to the entry whose key
///   matches `locale`, else the first entry.
/// - A lone `{"Key": .., "Value": ..}` object resolves to its value.
/// - `"/Date(1700000000000)/"` becomes an RFC 3339 UTC instant with
///   millisecond precision.
///
/// Applying it twice gives the same result as applying it once.
pub fn normalize(value: &Value, locale: LanguageCode) -> Value {
    match value {
        Value::Array(items) => match items.first().and_then(localized_pair) {
            Some(first) => {
                let chosen = items
                    .iter()
                    .filter_map(localized_pair)
                    .find(|(key, _)| key_matches(key, locale))
                    .unwrap_or(first);
                normalize(chosen.1, locale)
            }
            None => Value::Array(items.iter().map(|item| normalize(item, locale)).collect()),
        },
        Value::Object(map) => match localized_pair(value) {
            Some((_, inner)) => normalize(inner, locale),
            None => Value::Object(
                map.iter().map(|(k, v)| (k.clone(), normalize(v, locale))).collect::<Map<_, _>>(),
            ),
        },
        Value::String(text) => parse_date(text).map_or_else(|| value.clone(), Value::String),
        _ => value.clone(),
    }
}

/// `(Key, Value)` of an object with exactly those two fields.
fn localized_pair(value: &Value) -> Option<(&Value, &Value)> {
    let map = value.as_object()?;
    if map.len() != 2 {
        return None;
    }
    Some((map.get("Key")?, map.get("Value")?))
}

fn key_matches(key: &Value, locale: LanguageCode) -> bool {
    match key {
        Value::Number(n) => n.as_u64() == Some(u64::from(locale.code())),
        Value::String(s) => s.trim().parse::<u32>().ok() == Some(locale.code()),
        _ => false,
    }
}

fn parse_date(text: &str) -> Option<String> {
    let millis: i64 = date_pattern().captures(text)?.get(1)?.as_str().parse().ok()?;
    let instant = Utc.timestamp_millis_opt(millis).single()?;
    Some(instant.to_rfc3339_opts(SecondsFormat::Millis, true))
}
