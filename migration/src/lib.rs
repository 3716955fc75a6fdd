pub use sea_orm_migration::prelude::*;

mod m20250325_000001_create_users;
mod m20250325_000002_create_greenhouses;
mod m20250408_000001_create_inventory;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250325_000001_create_users::Migration),
            Box::new(m20250325_000002_create_greenhouses::Migration),
            Box::new(m20250408_000001_create_inventory::Migration),
        ]
    }
}
