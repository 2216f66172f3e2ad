use sea_orm_migration::prelude::*;

mod m20261001_000001_create_users;
mod m20261001_000002_create_accounts;
mod m20261001_000003_create_sessions;
mod m20261001_000004_create_two_factors;
mod m20261001_000005_create_passkeys;
mod m20261001_000006_create_verifications;
mod m20261001_000007_create_outbox_events;
mod m20261001_000008_create_workspaces;
mod m20261001_000009_create_teams;
mod m20261001_000010_create_projects;
mod m20261001_000011_create_issues;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_users::Migration),
            Box::new(m20261001_000002_create_accounts::Migration),
            Box::new(m20261001_000003_create_sessions::Migration),
            Box::new(m20261001_000004_create_two_factors::Migration),
            Box::new(m20261001_000005_create_passkeys::Migration),
            Box::new(m20261001_000006_create_verifications::Migration),
            Box::new(m20261001_000007_create_outbox_events::Migration),
            Box::new(m20261001_000008_create_workspaces::Migration),
            Box::new(m20261001_000009_create_teams::Migration),
            Box::new(m20261001_000010_create_projects::Migration),
            Box::new(m20261001_000011_create_issues::Migration),
        ]
    }
}
