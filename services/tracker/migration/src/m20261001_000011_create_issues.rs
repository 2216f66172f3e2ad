use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Issues::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Issues::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Issues::WorkspaceId).uuid().not_null())
                    .col(ColumnDef::new(Issues::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Issues::Number).integer().not_null())
                    .col(ColumnDef::new(Issues::Title).string().not_null())
                    .col(ColumnDef::new(Issues::Description).text())
                    .col(
                        ColumnDef::new(Issues::Status)
                            .string()
                            .not_null()
                            .default("backlog"),
                    )
                    .col(
                        ColumnDef::new(Issues::Priority)
                            .string()
                            .not_null()
                            .default("no_priority"),
                    )
                    .col(ColumnDef::new(Issues::AssigneeId).uuid())
                    .col(ColumnDef::new(Issues::CreatorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Issues::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Issues::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Issues::Table, Issues::WorkspaceId)
                            .to(Workspaces::Table, Workspaces::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Issues::Table, Issues::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Issues::Table, Issues::AssigneeId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Issues::Table)
                    .col(Issues::ProjectId)
                    .col(Issues::Number)
                    .unique()
                    .name("uq_issues_project_number")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Issues::Table)
                    .col(Issues::WorkspaceId)
                    .col(Issues::Status)
                    .name("idx_issues_workspace_status")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Issues::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Issues {
    Table,
    Id,
    WorkspaceId,
    ProjectId,
    Number,
    Title,
    Description,
    Status,
    Priority,
    AssigneeId,
    CreatorId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Workspaces {
    Table,
    Id,
}

#[derive(Iden)]
enum Projects {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
