//! Roles and object-level access control entries.
//!
//! Every ACL-protected object gets per-role grants when created; listing and
//! lookups only see objects one of the caller's roles may READ.

use models::acl_entry::{self, AclPermission};
use sea_orm::sea_query::{Query, SelectStatement};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ServiceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Editor,
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Editor, Role::User];

    /// Security identifier stored in `acl_entry.sid`.
    pub fn sid(self) -> &'static str {
        match self {
            Role::Admin => "ROLE_ADMIN",
            Role::Editor => "ROLE_EDITOR",
            Role::User => "ROLE_USER",
        }
    }

    /// Accepts `ADMIN`, `ROLE_ADMIN` and `spexregister_ADMIN` (case-insensitive).
    pub fn from_claim(raw: &str) -> Option<Role> {
        let upper = raw.to_ascii_uppercase();
        let bare = upper
            .strip_prefix("ROLE_")
            .or_else(|| upper.strip_prefix("SPEXREGISTER_"))
            .unwrap_or(&upper);
        match bare {
            "ADMIN" => Some(Role::Admin),
            "EDITOR" => Some(Role::Editor),
            "USER" => Some(Role::User),
            _ => None,
        }
    }
}

/// The kinds of objects carrying ACL entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectClass {
    Spex,
    SpexCategory,
    Task,
    TaskCategory,
    Tag,
}

type Grants = &'static [(Role, &'static [AclPermission])];

const READ: &[AclPermission] = &[AclPermission::Read];
const READ_WRITE: &[AclPermission] = &[AclPermission::Read, AclPermission::Write];
const READ_WRITE_DELETE: &[AclPermission] = &[AclPermission::Read, AclPermission::Write, AclPermission::Delete];

impl ObjectClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectClass::Spex => "spex",
            ObjectClass::SpexCategory => "spex_category",
            ObjectClass::Task => "task",
            ObjectClass::TaskCategory => "task_category",
            ObjectClass::Tag => "tag",
        }
    }

    /// Grants written when an object of this class is created.
    pub fn default_grants(self) -> Grants {
        match self {
            ObjectClass::Spex | ObjectClass::Task => &[
                (Role::Admin, READ_WRITE_DELETE),
                (Role::Editor, READ_WRITE),
                (Role::User, READ),
            ],
            ObjectClass::SpexCategory | ObjectClass::TaskCategory => &[
                (Role::Admin, READ_WRITE_DELETE),
                (Role::Editor, READ),
                (Role::User, READ),
            ],
            ObjectClass::Tag => &[
                (Role::Admin, READ_WRITE_DELETE),
                (Role::Editor, READ_WRITE_DELETE),
                (Role::User, READ),
            ],
        }
    }
}

/// Write the default grants for a freshly created object.
pub async fn grant_defaults<C: ConnectionTrait>(db: &C, class: ObjectClass, object_id: i64) -> Result<(), ServiceError> {
    for (role, permissions) in class.default_grants() {
        for permission in permissions.iter() {
            acl_entry::ActiveModel {
                object_class: Set(class.as_str().to_string()),
                object_id: Set(object_id),
                sid: Set(role.sid().to_string()),
                permission: Set(*permission),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }
    debug!(class = class.as_str(), object_id, "acl_granted");
    Ok(())
}

pub async fn revoke_all<C: ConnectionTrait>(db: &C, class: ObjectClass, object_id: i64) -> Result<(), ServiceError> {
    acl_entry::Entity::delete_many()
        .filter(acl_entry::Column::ObjectClass.eq(class.as_str()))
        .filter(acl_entry::Column::ObjectId.eq(object_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Ids of `class` objects on which any of `roles` holds `permission`.
pub fn permitted_ids(class: ObjectClass, roles: &[Role], permission: AclPermission) -> SelectStatement {
    let sids: Vec<&str> = roles.iter().map(|r| r.sid()).collect();
    Query::select()
        .column(acl_entry::Column::ObjectId)
        .from(acl_entry::Entity)
        .and_where(acl_entry::Column::ObjectClass.eq(class.as_str()))
        .and_where(acl_entry::Column::Sid.is_in(sids))
        .and_where(acl_entry::Column::Permission.eq(permission))
        .to_owned()
}

pub async fn has_permission<C: ConnectionTrait>(
    db: &C,
    class: ObjectClass,
    object_id: i64,
    roles: &[Role],
    permission: AclPermission,
) -> Result<bool, ServiceError> {
    let sids: Vec<&str> = roles.iter().map(|r| r.sid()).collect();
    let found = acl_entry::Entity::find()
        .filter(acl_entry::Column::ObjectClass.eq(class.as_str()))
        .filter(acl_entry::Column::ObjectId.eq(object_id))
        .filter(acl_entry::Column::Sid.is_in(sids))
        .filter(acl_entry::Column::Permission.eq(permission))
        .one(db)
        .await?;
    Ok(found.is_some())
}
