use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "heartbeats")]
pub struct Model {
    /// 32-char hex UUID
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub user_id: Uuid,

    #[sea_orm(indexed)]
    pub entity: String,

    #[sea_orm(column_name = "type", indexed)]
    #[serde(rename = "type")]
    pub kind: String,

    #[sea_orm(indexed)]
    pub category: String,

    #[sea_orm(indexed)]
    pub browser: String,

    #[sea_orm(indexed)]
    pub domain: String,

    #[sea_orm(indexed)]
    pub path: String,

    pub user_agent: String,

    /// Event time reported by the client, if any.
    #[sea_orm(indexed, nullable)]
    pub time: Option<DateTimeUtc>,

    #[sea_orm(unique, indexed)]
    pub hash: String,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            return Err(DbErr::Custom("heartbeats are immutable once recorded".to_string()));
        }

        Ok(self.stamped())
    }
}

impl ActiveModel {
    /// Fill in `id` and `created_at` unless the caller already set them.
    #[must_use]
    pub fn stamped(mut self) -> Self {
        if self.id.is_not_set() {
            self.id = Set(new_heartbeat_id());
        }
        if self.created_at.is_not_set() {
            self.created_at = Set(Utc::now());
        }
        self
    }
}

#[must_use]
pub fn new_heartbeat_id() -> String {
    Uuid::new_v4().simple().to_string()
}
