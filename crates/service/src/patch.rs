//! PATCH bodies distinguish an absent field from an explicit `null`.
//!
//! Declare nullable fields as `Option<Option<T>>` with
//! `#[serde(default, deserialize_with = "double_option")]`:
//! absent → `None`, `null` → `Some(None)`, value → `Some(Some(v))`.

use serde::{Deserialize, Deserializer};

use crate::errors::ServiceError;

pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// A required field in a PATCH: absent keeps the old value, `null` is rejected.
pub fn required<T>(field: &str, v: Option<Option<T>>) -> Result<Option<T>, ServiceError> {
    match v {
        None => Ok(None),
        Some(None) => Err(ServiceError::Validation(format!("{field}: must not be null"))),
        Some(Some(v)) => Ok(Some(v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "double_option")]
        nick: Option<Option<String>>,
    }

    #[test]
    fn absent_null_and_value_are_distinct() {
        let absent: Body = serde_json::from_str("{}").unwrap();
        let null: Body = serde_json::from_str(r#"{"nick":null}"#).unwrap();
        let value: Body = serde_json::from_str(r#"{"nick":"Kula"}"#).unwrap();
        assert_eq!(absent.nick, None);
        assert_eq!(null.nick, Some(None));
        assert_eq!(value.nick, Some(Some("Kula".to_string())));
    }

    #[test]
    fn required_rejects_explicit_null() {
        assert!(required::<String>("name", Some(None)).is_err());
        assert_eq!(required::<String>("name", None).unwrap(), None);
        assert_eq!(required("name", Some(Some(1))).unwrap(), Some(1));
    }
}
