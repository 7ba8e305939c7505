use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Identifiers for the `form_submissions` table and its columns.
#[derive(DeriveIden)]
enum FormSubmissions {
    Table,
    Id,
    PortfolioId,
    CompanyName,
    PinHash,
    Responses,
    IsDraft,
    IpAddress,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Portfolios {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FormSubmissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FormSubmissions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FormSubmissions::PortfolioId).uuid().not_null())
                    .col(ColumnDef::new(FormSubmissions::CompanyName).string().not_null())
                    .col(ColumnDef::new(FormSubmissions::PinHash).string().not_null())
                    .col(
                        ColumnDef::new(FormSubmissions::Responses)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FormSubmissions::IsDraft)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(FormSubmissions::IpAddress).string().null())
                    .col(
                        ColumnDef::new(FormSubmissions::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FormSubmissions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FormSubmissions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_form_submissions_portfolio_id")
                            .from(FormSubmissions::Table, FormSubmissions::PortfolioId)
                            .to(Portfolios::Table, Portfolios::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FormSubmissions::Table).to_owned())
            .await
    }
}
