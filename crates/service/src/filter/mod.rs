//! Filter language: parse the `filter` parameter and turn it into a sea-orm
//! [`Condition`] over a resource's exposed fields.

pub mod parser;

use sea_orm::sea_query::{Expr as SqlExpr, Func, LikeExpr, SimpleExpr};
use sea_orm::{ColumnTrait, Condition, IntoSimpleExpr, Value};

use crate::errors::ServiceError;
pub use parser::{parse, Criteria, Expr, Op};

const LIKE_ESCAPE: char = '!';

/// Make `raw` match literally inside a LIKE pattern.
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

fn pattern(p: String) -> LikeExpr {
    LikeExpr::new(p).escape(LIKE_ESCAPE)
}

pub fn like(expr: SimpleExpr, p: String) -> SimpleExpr {
    SqlExpr::expr(expr).like(pattern(p))
}

/// Case-insensitive "contains" on a text column.
pub fn contains_ci(col: impl ColumnTrait, term: &str) -> SimpleExpr {
    like(Func::lower(col.into_simple_expr()).into(), format!("%{}%", escape_like(&term.to_lowercase())))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Bool,
}

/// API field name → column, used for both filtering and sorting.
pub struct Fields<C: 'static> {
    entries: &'static [(&'static str, C, FieldKind)],
}

impl<C: ColumnTrait + Copy> Fields<C> {
    pub const fn new(entries: &'static [(&'static str, C, FieldKind)]) -> Self {
        Self { entries }
    }

    pub fn lookup(&self, key: &str) -> Option<(C, FieldKind)> {
        self.entries.iter().find(|(name, _, _)| *name == key).map(|(_, c, k)| (*c, *k))
    }

    pub fn require(&self, key: &str) -> Result<(C, FieldKind), ServiceError> {
        self.lookup(key)
            .ok_or_else(|| ServiceError::Validation(format!("unknown field '{key}'")))
    }

    /// Parse `filter` and build the condition; `None` when the filter is blank.
    pub fn condition(&self, filter: Option<&str>) -> Result<Option<Condition>, ServiceError> {
        let Some(raw) = filter else { return Ok(None) };
        match parse(raw)? {
            Some(expr) => Ok(Some(self.build(&expr)?)),
            None => Ok(None),
        }
    }

    fn build(&self, expr: &Expr) -> Result<Condition, ServiceError> {
        Ok(match expr {
            Expr::Criteria(c) => Condition::all().add(self.criteria(c)?),
            Expr::And(l, r) => Condition::all().add(self.build(l)?).add(self.build(r)?),
            Expr::Or(l, r) => Condition::any().add(self.build(l)?).add(self.build(r)?),
        })
    }

    fn criteria(&self, c: &Criteria) -> Result<SimpleExpr, ServiceError> {
        let (col, kind) = self.require(&c.key)?;
        if c.is_null() {
            return match c.op {
                Op::Equal => Ok(col.is_null()),
                Op::NotEqual => Ok(col.is_not_null()),
                _ => Err(ServiceError::Validation(format!("filter: NULL only works with ':' and '!' on '{}'", c.key))),
            };
        }
        let wildcard = c.leading || c.trailing;
        if wildcard && (kind != FieldKind::Text || !matches!(c.op, Op::Equal | Op::NotEqual)) {
            return Err(ServiceError::Validation(format!("filter: wildcard not allowed on '{}'", c.key)));
        }
        if wildcard {
            let raw = format!(
                "{}{}{}",
                if c.leading { "%" } else { "" },
                escape_like(&c.value),
                if c.trailing { "%" } else { "" }
            );
            let col = SqlExpr::expr(col.into_simple_expr());
            return Ok(match c.op {
                Op::Equal => col.like(pattern(raw)),
                _ => col.not_like(pattern(raw)),
            });
        }
        let value = coerce(&c.key, &c.value, kind)?;
        Ok(match c.op {
            Op::Equal => col.eq(value),
            Op::NotEqual => col.ne(value),
            Op::GreaterThan => col.gt(value),
            Op::LessThan => col.lt(value),
            Op::Like => {
                if kind != FieldKind::Text {
                    return Err(ServiceError::Validation(format!("filter: '~' only works on text field '{}'", c.key)));
                }
                contains_ci(col, &c.value)
            }
        })
    }
}

fn coerce(key: &str, raw: &str, kind: FieldKind) -> Result<Value, ServiceError> {
    let bad = || ServiceError::Validation(format!("filter: invalid value '{raw}' for '{key}'"));
    Ok(match kind {
        FieldKind::Text => Value::from(raw.to_string()),
        FieldKind::Integer => Value::from(raw.parse::<i64>().map_err(|_| bad())?),
        FieldKind::Bool => Value::from(raw.parse::<bool>().map_err(|_| bad())?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::spexare;
    use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait};

    const FIELDS: Fields<spexare::Column> = Fields::new(&[
        ("id", spexare::Column::Id, FieldKind::Integer),
        ("firstName", spexare::Column::FirstName, FieldKind::Text),
        ("nickName", spexare::Column::NickName, FieldKind::Text),
        ("partner", spexare::Column::PartnerId, FieldKind::Integer),
    ]);

    fn sql(filter: &str) -> String {
        let cond = FIELDS.condition(Some(filter)).unwrap().unwrap();
        spexare::Entity::find().filter(cond).build(DbBackend::Sqlite).to_string()
    }

    #[test]
    fn wildcards_become_like_patterns() {
        assert!(sql("firstName:Kal*").contains(r#""spexare"."first_name" LIKE 'Kal%'"#));
        assert!(sql("firstName:*lle").contains(r#"LIKE '%lle'"#));
        assert!(sql("firstName:*al*").contains(r#"LIKE '%al%'"#));
    }

    #[test]
    fn like_metacharacters_match_literally() {
        assert!(escape_like("50%_off!") == "50!%!_off!!");
        let s = sql("nickName~50%");
        assert!(s.contains(r#"LOWER("spexare"."nick_name") LIKE '%50!%%' ESCAPE '!'"#), "{s}");
        assert!(sql("firstName:K_l*").contains(r#"LIKE 'K!_l%' ESCAPE '!'"#));
        assert!(sql("firstName!*x").contains(r#"NOT LIKE '%x' ESCAPE '!'"#));
    }

    #[test]
    fn null_and_not_null() {
        assert!(sql("partner:NULL").contains(r#""spexare"."partner_id" IS NULL"#));
        assert!(sql("partner!NULL").contains(r#""spexare"."partner_id" IS NOT NULL"#));
    }

    #[test]
    fn case_insensitive_like_lowers_both_sides() {
        assert!(sql("nickName~KuLa").contains(r#"LOWER("spexare"."nick_name") LIKE '%kula%'"#));
    }

    #[test]
    fn or_groups_are_parenthesised() {
        let s = sql("id>1 AND ( firstName:A OR firstName:B )");
        assert!(s.contains(r#""spexare"."id" > 1"#));
        assert!(s.contains(r#"("spexare"."first_name" = 'A' OR "spexare"."first_name" = 'B')"#));
    }

    #[test]
    fn unknown_field_and_bad_values_are_rejected() {
        assert!(FIELDS.condition(Some("bogus:1")).is_err());
        assert!(FIELDS.condition(Some("id:abc")).is_err());
        assert!(FIELDS.condition(Some("id:*1")).is_err());
        assert!(FIELDS.condition(Some("id~1")).is_err());
    }

    #[test]
    fn absent_filter_is_none() {
        assert!(FIELDS.condition(None).unwrap().is_none());
        assert!(FIELDS.condition(Some("")).unwrap().is_none());
    }
}
