use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Heartbeats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Heartbeats::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Heartbeats::UserId).uuid().not_null())
                    .col(ColumnDef::new(Heartbeats::Entity).string().not_null())
                    .col(ColumnDef::new(Heartbeats::Type).string().not_null())
                    .col(ColumnDef::new(Heartbeats::Category).string().not_null())
                    .col(ColumnDef::new(Heartbeats::Browser).string().not_null())
                    .col(ColumnDef::new(Heartbeats::Domain).string().not_null())
                    .col(ColumnDef::new(Heartbeats::Path).string().not_null())
                    .col(ColumnDef::new(Heartbeats::UserAgent).string().not_null())
                    .col(
                        ColumnDef::new(Heartbeats::Time)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Heartbeats::Hash).string().not_null())
                    .col(
                        ColumnDef::new(Heartbeats::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_owned()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_heartbeats_user_id")
                            .from(Heartbeats::Table, Heartbeats::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        // Deduplication contract: one row per fingerprint.
        manager
            .create_index(
                Index::create()
                    .name("idx_heartbeats_hash")
                    .table(Heartbeats::Table)
                    .col(Heartbeats::Hash)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        let lookups = [
            ("idx_heartbeats_user_id", Heartbeats::UserId),
            ("idx_heartbeats_entity", Heartbeats::Entity),
            ("idx_heartbeats_type", Heartbeats::Type),
            ("idx_heartbeats_category", Heartbeats::Category),
            ("idx_heartbeats_browser", Heartbeats::Browser),
            ("idx_heartbeats_domain", Heartbeats::Domain),
            ("idx_heartbeats_path", Heartbeats::Path),
            ("idx_heartbeats_time", Heartbeats::Time),
        ];

        for (name, column) in lookups {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Heartbeats::Table)
                        .col(column)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Heartbeats::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Heartbeats {
    Table,
    Id,
    UserId,
    Entity,
    Type,
    Category,
    Browser,
    Domain,
    Path,
    UserAgent,
    Time,
    Hash,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
