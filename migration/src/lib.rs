pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users_table;
mod m20250101_000002_create_auth_tables;
mod m20250928_000001_create_drive_tables;
mod m20250929_000001_create_booking_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users_table::Migration),
            Box::new(m20250101_000002_create_auth_tables::Migration),
            Box::new(m20250928_000001_create_drive_tables::Migration),
            Box::new(m20250929_000001_create_booking_tables::Migration),
        ]
    }
}
