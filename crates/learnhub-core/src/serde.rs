use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Treats an empty query value (`?school_id=`) as absent.
pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Accepts `true`/`false`/`1`/`0` from a query string, empty meaning absent.
pub fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(Some(true)),
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(Some(false)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid boolean value '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Query {
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        school_id: Option<Uuid>,
        #[serde(default, deserialize_with = "deserialize_optional_bool")]
        flag: Option<bool>,
    }

    #[test]
    fn test_empty_values_are_none() {
        let q: Query = serde_json::from_str(r#"{"school_id":"","flag":""}"#).unwrap();
        assert!(q.school_id.is_none());
        assert!(q.flag.is_none());
    }

    #[test]
    fn test_values_parse() {
        let q: Query = serde_json::from_str(
            r#"{"school_id":"12345678-1234-1234-1234-123456789abc","flag":"TRUE"}"#,
        )
        .unwrap();
        assert!(q.school_id.is_some());
        assert_eq!(q.flag, Some(true));
    }

    #[test]
    fn test_invalid_bool_rejected() {
        let result: Result<Query, _> = serde_json::from_str(r#"{"flag":"maybe"}"#);
        assert!(result.is_err());
    }
}
