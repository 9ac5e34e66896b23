//! Conversion between the API's camelCase keys and the snake_case field
//! names used by the resource structs.

use serde_json::{Map, Value};

/// Convert a camelCase key to snake_case.
///
/// Runs of capitals are kept together (`ID` -> `id`, `HTTPResponse` ->
/// `http_response`), and a capital directly after an underscore does not
/// produce a second underscore.
pub fn to_snake(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let starts_word = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if starts_word && prev != '_' {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// Convert a snake_case key to camelCase, stripping leading underscores.
pub fn to_camel(key: &str) -> String {
    let mut parts = key.trim_start_matches('_').split('_');
    let mut out = parts.next().unwrap_or_default().to_string();

    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }

    out
}

/// Recursively rename every object key in `value` to snake_case.
pub fn keys_to_snake(value: Value) -> Value {
    rename_keys(value, &to_snake)
}

/// Recursively rename every object key in `value` to camelCase.
pub fn keys_to_camel(value: Value) -> Value {
    rename_keys(value, &to_camel)
}

fn rename_keys(value: Value, rename: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, val)| (rename(&key), rename_keys(val, rename)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| rename_keys(item, rename))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_snake() {
        assert_eq!(to_snake("spreadsheetId"), "spreadsheet_id");
        assert_eq!(to_snake("webViewLink"), "web_view_link");
        assert_eq!(to_snake("ID"), "id");
        assert_eq!(to_snake("sheetID"), "sheet_id");
        assert_eq!(to_snake("HTTPResponse"), "http_response");
        assert_eq!(to_snake("a1Notation"), "a1_notation");
        assert_eq!(to_snake("already_snake"), "already_snake");
        assert_eq!(to_snake("_Private"), "_private");
        assert_eq!(to_snake(""), "");
    }

    #[test]
    fn test_to_camel() {
        assert_eq!(to_camel("spreadsheet_id"), "spreadsheetId");
        assert_eq!(to_camel("_email_address"), "emailAddress");
        assert_eq!(to_camel("__id"), "id");
        assert_eq!(to_camel("role"), "role");
        assert_eq!(to_camel("allow_file_discovery"), "allowFileDiscovery");
    }

    #[test]
    fn test_keys_to_snake_recurses_into_objects_and_arrays() {
        let raw = json!({
            "spreadsheetId": "abc",
            "properties": {"title": "T", "timeZone": "UTC"},
            "sheets": [{"properties": {"sheetId": 1, "gridProperties": {"rowCount": 5}}}],
            "values": [["keepCase", 1]]
        });

        let snake = keys_to_snake(raw);
        assert_eq!(snake["spreadsheet_id"], "abc");
        assert_eq!(snake["properties"]["time_zone"], "UTC");
        assert_eq!(snake["sheets"][0]["properties"]["sheet_id"], 1);
        assert_eq!(
            snake["sheets"][0]["properties"]["grid_properties"]["row_count"],
            5
        );
        // strings inside arrays are values, not keys
        assert_eq!(snake["values"][0][0], "keepCase");
    }

    #[test]
    fn test_round_trip_restores_keys() {
        let raw = json!({
            "mimeType": "x",
            "permissions": [{"emailAddress": "a@b.c", "allowFileDiscovery": true}],
            "capabilities": {"canCopy": true}
        });

        let restored = keys_to_camel(keys_to_snake(raw.clone()));
        assert_eq!(restored, raw);
    }

    #[test]
    fn test_abbreviation_does_not_round_trip() {
        let raw = json!({"sheetID": 1});
        let restored = keys_to_camel(keys_to_snake(raw));
        assert_eq!(restored, json!({"sheetId": 1}));
    }
}
