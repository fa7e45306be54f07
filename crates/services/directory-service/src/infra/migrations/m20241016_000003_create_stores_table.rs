//! Migration: Create stores table with slug, tag and full-text indexes.

use sea_orm_migration::prelude::*;

use super::m20241016_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Stores::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Stores::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Stores::Name).string().not_null())
                    // Backstop for concurrent creations computing the same slug
                    .col(ColumnDef::new(Stores::Slug).string().not_null().unique_key())
                    .col(ColumnDef::new(Stores::Description).text().null())
                    .col(
                        ColumnDef::new(Stores::Tags)
                            .array(ColumnType::Text)
                            .not_null()
                            .default(Expr::cust("'{}'::text[]")),
                    )
                    .col(
                        ColumnDef::new(Stores::Created)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Stores::LocationType)
                            .string()
                            .not_null()
                            .default("Point"),
                    )
                    .col(ColumnDef::new(Stores::Longitude).double().not_null())
                    .col(ColumnDef::new(Stores::Latitude).double().not_null())
                    .col(ColumnDef::new(Stores::Address).string().not_null())
                    .col(ColumnDef::new(Stores::Photo).string().null())
                    .col(ColumnDef::new(Stores::AuthorId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stores_author_id")
                            .from(Stores::Table, Stores::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stores_created")
                    .table(Stores::Table)
                    .col(Stores::Created)
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();
        db.execute_unprepared("CREATE INDEX idx_stores_tags ON stores USING GIN (tags)")
            .await?;
        db.execute_unprepared(
            "CREATE INDEX idx_stores_search ON stores USING GIN \
             (to_tsvector('english', name || ' ' || coalesce(description, '')))",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Stores::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Stores {
    Table,
    Id,
    Name,
    Slug,
    Description,
    Tags,
    Created,
    LocationType,
    Longitude,
    Latitude,
    Address,
    Photo,
    AuthorId,
}
