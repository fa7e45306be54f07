//! Migration: Create store_hearts join table (a user's favorite stores).

use sea_orm_migration::prelude::*;

use super::m20241016_000001_create_users_table::Users;
use super::m20241016_000003_create_stores_table::Stores;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StoreHearts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(StoreHearts::UserId).uuid().not_null())
                    .col(ColumnDef::new(StoreHearts::StoreId).uuid().not_null())
                    .col(
                        ColumnDef::new(StoreHearts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(StoreHearts::UserId)
                            .col(StoreHearts::StoreId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_store_hearts_user_id")
                            .from(StoreHearts::Table, StoreHearts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_store_hearts_store_id")
                            .from(StoreHearts::Table, StoreHearts::StoreId)
                            .to(Stores::Table, Stores::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StoreHearts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum StoreHearts {
    Table,
    UserId,
    StoreId,
    CreatedAt,
}
