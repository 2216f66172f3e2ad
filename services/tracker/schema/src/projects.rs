use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    /// Unique per workspace; prefix of issue keys.
    pub identifier: String,
    pub description: Option<String>,
    /// `active` | `archived` | `completed`
    pub status: String,
    pub lead_id: Option<Uuid>,
    pub creator_id: Uuid,
    /// Last issue number handed out. Incremented under a row lock.
    pub issue_counter: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workspaces::Entity",
        from = "Column::WorkspaceId",
        to = "super::workspaces::Column::Id",
        on_delete = "Cascade"
    )]
    Workspace,
    #[sea_orm(has_many = "super::issues::Entity")]
    Issues,
    #[sea_orm(has_many = "super::project_teams::Entity")]
    ProjectTeams,
}

impl Related<super::workspaces::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workspace.def()
    }
}

impl Related<super::issues::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Issues.def()
    }
}

impl Related<super::project_teams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectTeams.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
