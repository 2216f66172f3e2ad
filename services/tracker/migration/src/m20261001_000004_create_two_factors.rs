use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TwoFactors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TwoFactors::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TwoFactors::UserId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(TwoFactors::Secret).string().not_null())
                    .col(ColumnDef::new(TwoFactors::BackupCodes).json_binary().not_null())
                    .col(
                        ColumnDef::new(TwoFactors::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TwoFactors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TwoFactors::Table, TwoFactors::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TwoFactors::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TwoFactors {
    Table,
    Id,
    UserId,
    Secret,
    BackupCodes,
    Verified,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
