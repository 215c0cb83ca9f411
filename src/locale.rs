use serde_json::Value;

/// Locales tried, in order, before falling back to whatever comes first.
const PREFERRED_LOCALES: [&str; 2] = ["en", "en_US"];

/// Resolve an OJS localized value (`"text"` or `{"en": "text", ...}`) to a
/// single display string.
///
/// Preference is `en`, then `en_US`, then the first non-empty string in the
/// map's upstream order. Empty strings count as absent. Anything that is not
/// a string or a map resolves to `""`.
pub fn localized(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => PREFERRED_LOCALES
            .iter()
            .filter_map(|locale| map.get(*locale))
            .chain(map.values())
            .find_map(|v| v.as_str().filter(|s| !s.is_empty()))
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// Resolve `object[key]`, treating a missing key like any other absent value.
pub fn localized_field(object: &Value, key: &str) -> String {
    object.get(key).map(localized).unwrap_or_default()
}

/// Like [`localized`], but `None` instead of an empty string.
pub fn localized_opt(value: &Value) -> Option<String> {
    Some(localized(value)).filter(|s| !s.is_empty())
}
