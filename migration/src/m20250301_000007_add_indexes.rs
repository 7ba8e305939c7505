use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum FormSubmissions {
    Table,
    PortfolioId,
    CompanyName,
}

#[derive(DeriveIden)]
enum Questions {
    Table,
    PortfolioId,
    Step,
    SortOrder,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // PIN lookups scan every submission under one company name
        manager
            .create_index(
                Index::create()
                    .name("idx_form_submissions_company_name")
                    .table(FormSubmissions::Table)
                    .col(FormSubmissions::CompanyName)
                    .to_owned(),
            )
            .await?;

        // Admin listing and export filter by portfolio
        manager
            .create_index(
                Index::create()
                    .name("idx_form_submissions_portfolio_id")
                    .table(FormSubmissions::Table)
                    .col(FormSubmissions::PortfolioId)
                    .to_owned(),
            )
            .await?;

        // Questions are always read in (step, order) within a portfolio
        manager
            .create_index(
                Index::create()
                    .name("idx_questions_portfolio_step_order")
                    .table(Questions::Table)
                    .col(Questions::PortfolioId)
                    .col(Questions::Step)
                    .col(Questions::SortOrder)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_questions_portfolio_step_order")
                    .table(Questions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_form_submissions_portfolio_id")
                    .table(FormSubmissions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_form_submissions_company_name")
                    .table(FormSubmissions::Table)
                    .to_owned(),
            )
            .await
    }
}
