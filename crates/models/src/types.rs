use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Code list entry (vocal range, address kind, membership kind, ...) with per-language labels.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "type")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(column_name = "type")]
    pub kind: TypeType,
    pub labels: Option<Json>,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Label for `lang`, then Swedish, then whatever label exists.
    pub fn label(&self, lang: &str) -> Option<String> {
        let labels = self.labels.as_ref()?.as_object()?;
        labels
            .get(lang)
            .or_else(|| labels.get("sv"))
            .or_else(|| labels.values().next())
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

crate::audited_behavior!();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeType {
    #[sea_orm(string_value = "VOCAL")]
    Vocal,
    #[sea_orm(string_value = "ADDRESS")]
    Address,
    #[sea_orm(string_value = "MEMBERSHIP")]
    Membership,
    #[sea_orm(string_value = "CONSENT")]
    Consent,
    #[sea_orm(string_value = "TOGGLE")]
    Toggle,
}

impl std::str::FromStr for TypeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use sea_orm::Iterable;
        Self::iter()
            .find(|v| v.to_value().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown type '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn vocal(labels: Option<Json>) -> Model {
        Model {
            id: "S1".into(),
            kind: TypeType::Vocal,
            labels,
            created_by: "system".into(),
            created_at: Utc::now().into(),
            last_modified_by: None,
            last_modified_at: None,
        }
    }

    #[test]
    fn label_falls_back_to_swedish() {
        let t = vocal(Some(serde_json::json!({"sv": "Sopran 1", "en": "Soprano 1"})));
        assert_eq!(t.label("en").as_deref(), Some("Soprano 1"));
        assert_eq!(t.label("de").as_deref(), Some("Sopran 1"));
        assert_eq!(vocal(None).label("sv"), None);
    }

    #[test]
    fn type_type_parses_case_insensitively() {
        assert_eq!("vocal".parse::<TypeType>(), Ok(TypeType::Vocal));
        assert_eq!("Address".parse::<TypeType>(), Ok(TypeType::Address));
        assert!("nope".parse::<TypeType>().is_err());
    }
}
