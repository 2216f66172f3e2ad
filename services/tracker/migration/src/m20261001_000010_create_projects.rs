use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Projects::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Projects::WorkspaceId).uuid().not_null())
                    .col(ColumnDef::new(Projects::Name).string().not_null())
                    .col(ColumnDef::new(Projects::Identifier).string().not_null())
                    .col(ColumnDef::new(Projects::Description).text())
                    .col(
                        ColumnDef::new(Projects::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Projects::LeadId).uuid())
                    .col(ColumnDef::new(Projects::CreatorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Projects::IssueCounter)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Projects::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Projects::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Projects::Table, Projects::WorkspaceId)
                            .to(Workspaces::Table, Workspaces::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Projects::Table, Projects::LeadId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Projects::Table)
                    .col(Projects::WorkspaceId)
                    .col(Projects::Identifier)
                    .unique()
                    .name("uq_projects_workspace_identifier")
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProjectTeams::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ProjectTeams::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(ProjectTeams::TeamId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(ProjectTeams::ProjectId)
                            .col(ProjectTeams::TeamId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ProjectTeams::Table, ProjectTeams::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ProjectTeams::Table, ProjectTeams::TeamId)
                            .to(Teams::Table, Teams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProjectTeams::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Projects {
    Table,
    Id,
    WorkspaceId,
    Name,
    Identifier,
    Description,
    Status,
    LeadId,
    CreatorId,
    IssueCounter,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ProjectTeams {
    Table,
    ProjectId,
    TeamId,
}

#[derive(Iden)]
enum Workspaces {
    Table,
    Id,
}

#[derive(Iden)]
enum Teams {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
