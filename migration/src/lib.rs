pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users_table;
mod m20250301_000002_create_members_table;
mod m20250301_000003_create_categories_table;
mod m20250301_000004_create_portfolios_table;
mod m20250301_000005_create_questions_table;
mod m20250301_000006_create_form_submissions_table;
mod m20250301_000007_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users_table::Migration),
            Box::new(m20250301_000002_create_members_table::Migration),
            Box::new(m20250301_000003_create_categories_table::Migration),
            Box::new(m20250301_000004_create_portfolios_table::Migration),
            Box::new(m20250301_000005_create_questions_table::Migration),
            Box::new(m20250301_000006_create_form_submissions_table::Migration),
            Box::new(m20250301_000007_add_indexes::Migration),
        ]
    }
}
