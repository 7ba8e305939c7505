use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Identifiers for the `questions` table and its columns.
#[derive(DeriveIden)]
enum Questions {
    Table,
    Id,
    PortfolioId,
    Step,
    SortOrder,
    Title,
    Description,
    Thumbnail,
    QuestionType,
    Options,
    MinLength,
    MaxLength,
    RequireMinLength,
    IsRequired,
    CreatedAt,
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
                    .table(Questions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Questions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Questions::PortfolioId).uuid().not_null())
                    .col(
                        ColumnDef::new(Questions::Step)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Questions::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Questions::Title).string().not_null())
                    .col(
                        ColumnDef::new(Questions::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Questions::Thumbnail).string().null())
                    .col(
                        ColumnDef::new(Questions::QuestionType)
                            .string()
                            .not_null()
                            .default("text"),
                    )
                    .col(ColumnDef::new(Questions::Options).json_binary().null())
                    .col(
                        ColumnDef::new(Questions::MinLength)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Questions::MaxLength)
                            .integer()
                            .not_null()
                            .default(500),
                    )
                    .col(
                        ColumnDef::new(Questions::RequireMinLength)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Questions::IsRequired)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Questions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_questions_portfolio_id")
                            .from(Questions::Table, Questions::PortfolioId)
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
            .drop_table(Table::drop().table(Questions::Table).to_owned())
            .await
    }
}
