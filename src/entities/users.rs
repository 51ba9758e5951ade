use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};

use crate::models::PasswordDigest;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique, indexed)]
    pub username: String,

    /// Argon2 PHC string
    pub password: PasswordDigest,

    #[sea_orm(unique, indexed)]
    pub api_key: String,

    pub is_admin: bool,

    pub last_login: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::heartbeats::Entity")]
    Heartbeats,
}

impl Related<super::heartbeats::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Heartbeats.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// Store-assigned defaults are generated per row, at insert time.
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            if self.id.is_not_set() {
                self.id = Set(Uuid::new_v4());
            }
            if self.api_key.is_not_set() {
                self.api_key = Set(generate_api_key());
            }
            if self.is_admin.is_not_set() {
                self.is_admin = Set(false);
            }
            if self.last_login.is_not_set() {
                self.last_login = Set(Utc::now());
            }
        }

        Ok(self)
    }
}

/// Generate a fresh API key (hyphenated UUIDv4).
#[must_use]
pub fn generate_api_key() -> String {
    Uuid::new_v4().to_string()
}
