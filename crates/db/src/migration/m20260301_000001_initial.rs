//! Initial schema: companies, parties, treasuries, the ledger, obligations,
//! and sale/purchase documents.
//!
//! Built with the schema builder so the same migration runs on Postgres and
//! on the SQLite database used by the integration tests. Money columns are
//! `NUMERIC(19,4)` on Postgres; SQLite stores them as REAL.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DbBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let money = |col: ColumnDef| numeric(col, backend, 19, 4);
        let rate = |col: ColumnDef| numeric(col, backend, 19, 6);

        manager
            .create_table(
                Table::create()
                    .table(Companies::Table)
                    .if_not_exists()
                    .col(uuid_pk(Companies::Id))
                    .col(ColumnDef::new(Companies::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Companies::ParentId).uuid().null())
                    .col(timestamp(Companies::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_companies_parent")
                            .from(Companies::Table, Companies::ParentId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Parties::Table)
                    .if_not_exists()
                    .col(uuid_pk(Parties::Id))
                    .col(ColumnDef::new(Parties::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(Parties::Name).string_len(255).not_null())
                    .col(timestamp(Parties::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Treasuries::Table)
                    .if_not_exists()
                    .col(uuid_pk(Treasuries::Id))
                    .col(ColumnDef::new(Treasuries::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Treasuries::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(Treasuries::CompanyId).uuid().null())
                    .col(ColumnDef::new(Treasuries::BankName).string_len(255).null())
                    .col(currency(Treasuries::Currency))
                    .col(money(ColumnDef::new(Treasuries::CurrentBalance)).default(0))
                    .col(
                        ColumnDef::new(Treasuries::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(timestamp(Treasuries::CreatedAt))
                    .col(timestamp(Treasuries::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_treasuries_company")
                            .from(Treasuries::Table, Treasuries::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LedgerBalances::Table)
                    .if_not_exists()
                    .col(uuid_pk(LedgerBalances::Id))
                    .col(ColumnDef::new(LedgerBalances::AccountKind).string_len(16).not_null())
                    .col(ColumnDef::new(LedgerBalances::AccountId).uuid().not_null())
                    .col(currency(LedgerBalances::Currency))
                    .col(money(ColumnDef::new(LedgerBalances::CurrentBalance)))
                    .col(ColumnDef::new(LedgerBalances::Version).big_integer().not_null())
                    .col(timestamp(LedgerBalances::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_ledger_balances_account_currency")
                    .table(LedgerBalances::Table)
                    .col(LedgerBalances::AccountKind)
                    .col(LedgerBalances::AccountId)
                    .col(LedgerBalances::Currency)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(uuid_pk(LedgerEntries::Id))
                    .col(ColumnDef::new(LedgerEntries::AccountKind).string_len(16).not_null())
                    .col(ColumnDef::new(LedgerEntries::AccountId).uuid().not_null())
                    .col(ColumnDef::new(LedgerEntries::Direction).string_len(16).not_null())
                    .col(money(ColumnDef::new(LedgerEntries::Amount)))
                    .col(currency(LedgerEntries::Currency))
                    .col(money(ColumnDef::new(LedgerEntries::BalanceBefore)))
                    .col(money(ColumnDef::new(LedgerEntries::BalanceAfter)))
                    .col(ColumnDef::new(LedgerEntries::Version).big_integer().not_null())
                    .col(ColumnDef::new(LedgerEntries::ReferenceKind).string_len(16).not_null())
                    .col(ColumnDef::new(LedgerEntries::ReferenceId).uuid().not_null())
                    .col(ColumnDef::new(LedgerEntries::Description).text().not_null())
                    .col(ColumnDef::new(LedgerEntries::CreatedBy).uuid().null())
                    .col(timestamp(LedgerEntries::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_ledger_entries_chain")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::AccountKind)
                    .col(LedgerEntries::AccountId)
                    .col(LedgerEntries::Currency)
                    .col(LedgerEntries::Version)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_entries_reference")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::ReferenceKind)
                    .col(LedgerEntries::ReferenceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PaymentObligations::Table)
                    .if_not_exists()
                    .col(uuid_pk(PaymentObligations::Id))
                    .col(ColumnDef::new(PaymentObligations::PartyId).uuid().null())
                    .col(money(ColumnDef::new(PaymentObligations::TotalAmount)))
                    .col(currency(PaymentObligations::Currency))
                    .col(rate(ColumnDef::new(PaymentObligations::ExchangeRate)))
                    .col(money(ColumnDef::new(PaymentObligations::BaseAmount)))
                    .col(ColumnDef::new(PaymentObligations::Status).string_len(16).not_null())
                    .col(ColumnDef::new(PaymentObligations::OriginKind).string_len(16).not_null())
                    .col(ColumnDef::new(PaymentObligations::OriginId).uuid().not_null())
                    .col(ColumnDef::new(PaymentObligations::CancelReason).text().null())
                    .col(ColumnDef::new(PaymentObligations::CreatedBy).uuid().null())
                    .col(timestamp(PaymentObligations::CreatedAt))
                    .col(
                        ColumnDef::new(PaymentObligations::PaidAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(timestamp(PaymentObligations::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_obligations_party")
                            .from(PaymentObligations::Table, PaymentObligations::PartyId)
                            .to(Parties::Table, Parties::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Installments::Table)
                    .if_not_exists()
                    .col(uuid_pk(Installments::Id))
                    .col(ColumnDef::new(Installments::ObligationId).uuid().not_null())
                    .col(money(ColumnDef::new(Installments::Amount)))
                    .col(rate(ColumnDef::new(Installments::ExchangeRate)))
                    .col(money(ColumnDef::new(Installments::BaseAmount)))
                    .col(ColumnDef::new(Installments::TreasuryId).uuid().null())
                    .col(ColumnDef::new(Installments::PaymentMethod).string_len(64).null())
                    .col(ColumnDef::new(Installments::ReferenceNumber).string_len(128).null())
                    .col(ColumnDef::new(Installments::CreatedBy).uuid().null())
                    .col(timestamp(Installments::PaidAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_installments_obligation")
                            .from(Installments::Table, Installments::ObligationId)
                            .to(PaymentObligations::Table, PaymentObligations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_installments_treasury")
                            .from(Installments::Table, Installments::TreasuryId)
                            .to(Treasuries::Table, Treasuries::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Purchases::Table)
                    .if_not_exists()
                    .col(uuid_pk(Purchases::Id))
                    .col(ColumnDef::new(Purchases::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(Purchases::SupplierId).uuid().null())
                    .col(ColumnDef::new(Purchases::SourceCompanyId).uuid().null())
                    .col(ColumnDef::new(Purchases::PaymentMode).string_len(16).not_null())
                    .col(ColumnDef::new(Purchases::Status).string_len(16).not_null())
                    .col(money(ColumnDef::new(Purchases::Total)))
                    .col(money(ColumnDef::new(Purchases::TotalExpenses)))
                    .col(money(ColumnDef::new(Purchases::FinalTotal)))
                    .col(ColumnDef::new(Purchases::CreatedBy).uuid().null())
                    .col(timestamp(Purchases::CreatedAt))
                    .col(
                        ColumnDef::new(Purchases::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(timestamp(Purchases::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchases_company")
                            .from(Purchases::Table, Purchases::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PurchaseLines::Table)
                    .if_not_exists()
                    .col(uuid_pk(PurchaseLines::Id))
                    .col(ColumnDef::new(PurchaseLines::PurchaseId).uuid().not_null())
                    .col(ColumnDef::new(PurchaseLines::ProductId).uuid().not_null())
                    .col(ColumnDef::new(PurchaseLines::Quantity).big_integer().not_null())
                    .col(money(ColumnDef::new(PurchaseLines::UnitPrice)))
                    .col(money(ColumnDef::new(PurchaseLines::LineTotal)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_lines_purchase")
                            .from(PurchaseLines::Table, PurchaseLines::PurchaseId)
                            .to(Purchases::Table, Purchases::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PurchaseExpenses::Table)
                    .if_not_exists()
                    .col(uuid_pk(PurchaseExpenses::Id))
                    .col(ColumnDef::new(PurchaseExpenses::PurchaseId).uuid().not_null())
                    .col(ColumnDef::new(PurchaseExpenses::Description).text().not_null())
                    .col(money(ColumnDef::new(PurchaseExpenses::Amount)))
                    .col(currency(PurchaseExpenses::Currency))
                    .col(rate(ColumnDef::new(PurchaseExpenses::ExchangeRate)))
                    .col(money(ColumnDef::new(PurchaseExpenses::BaseAmount)))
                    .col(
                        ColumnDef::new(PurchaseExpenses::IsActualExpense)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseExpenses::SupplierId).uuid().null())
                    .col(ColumnDef::new(PurchaseExpenses::ObligationId).uuid().null())
                    .col(ColumnDef::new(PurchaseExpenses::CreatedBy).uuid().null())
                    .col(timestamp(PurchaseExpenses::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_expenses_purchase")
                            .from(PurchaseExpenses::Table, PurchaseExpenses::PurchaseId)
                            .to(Purchases::Table, Purchases::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sales::Table)
                    .if_not_exists()
                    .col(uuid_pk(Sales::Id))
                    .col(ColumnDef::new(Sales::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(Sales::CustomerId).uuid().null())
                    .col(ColumnDef::new(Sales::Status).string_len(16).not_null())
                    .col(money(ColumnDef::new(Sales::Total)))
                    .col(
                        ColumnDef::new(Sales::IsInterCompany)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Sales::LinkedPurchaseId).uuid().null())
                    .col(ColumnDef::new(Sales::CreatedBy).uuid().null())
                    .col(timestamp(Sales::CreatedAt))
                    .col(ColumnDef::new(Sales::ApprovedAt).timestamp_with_time_zone().null())
                    .col(timestamp(Sales::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_company")
                            .from(Sales::Table, Sales::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_linked_purchase")
                            .from(Sales::Table, Sales::LinkedPurchaseId)
                            .to(Purchases::Table, Purchases::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SaleLines::Table)
                    .if_not_exists()
                    .col(uuid_pk(SaleLines::Id))
                    .col(ColumnDef::new(SaleLines::SaleId).uuid().not_null())
                    .col(ColumnDef::new(SaleLines::ProductId).uuid().not_null())
                    .col(ColumnDef::new(SaleLines::Quantity).big_integer().not_null())
                    .col(money(ColumnDef::new(SaleLines::UnitPrice)))
                    .col(money(ColumnDef::new(SaleLines::LineTotal)))
                    .col(
                        ColumnDef::new(SaleLines::IsFromParentCompany)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sale_lines_sale")
                            .from(SaleLines::Table, SaleLines::SaleId)
                            .to(Sales::Table, Sales::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StockMovements::Table)
                    .if_not_exists()
                    .col(uuid_pk(StockMovements::Id))
                    .col(ColumnDef::new(StockMovements::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(StockMovements::ProductId).uuid().not_null())
                    .col(ColumnDef::new(StockMovements::Quantity).big_integer().not_null())
                    .col(ColumnDef::new(StockMovements::DocumentKind).string_len(16).not_null())
                    .col(ColumnDef::new(StockMovements::DocumentId).uuid().not_null())
                    .col(timestamp(StockMovements::CreatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StockMovements::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SaleLines::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sales::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PurchaseExpenses::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PurchaseLines::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Purchases::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Installments::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentObligations::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerBalances::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Treasuries::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Parties::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Companies::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

fn uuid_pk<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name).uuid().not_null().primary_key().to_owned()
}

fn timestamp<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

fn currency<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name).string_len(3).not_null().to_owned()
}

fn numeric(mut col: ColumnDef, backend: DbBackend, precision: u32, scale: u32) -> ColumnDef {
    match backend {
        DbBackend::Sqlite => col.double().not_null().to_owned(),
        _ => col.decimal_len(precision, scale).not_null().to_owned(),
    }
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
    Name,
    ParentId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Parties {
    Table,
    Id,
    Kind,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Treasuries {
    Table,
    Id,
    Name,
    Kind,
    CompanyId,
    BankName,
    Currency,
    CurrentBalance,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LedgerBalances {
    Table,
    Id,
    AccountKind,
    AccountId,
    Currency,
    CurrentBalance,
    Version,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LedgerEntries {
    Table,
    Id,
    AccountKind,
    AccountId,
    Direction,
    Amount,
    Currency,
    BalanceBefore,
    BalanceAfter,
    Version,
    ReferenceKind,
    ReferenceId,
    Description,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PaymentObligations {
    Table,
    Id,
    PartyId,
    TotalAmount,
    Currency,
    ExchangeRate,
    BaseAmount,
    Status,
    OriginKind,
    OriginId,
    CancelReason,
    CreatedBy,
    CreatedAt,
    PaidAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Installments {
    Table,
    Id,
    ObligationId,
    Amount,
    ExchangeRate,
    BaseAmount,
    TreasuryId,
    PaymentMethod,
    ReferenceNumber,
    CreatedBy,
    PaidAt,
}

#[derive(DeriveIden)]
enum Purchases {
    Table,
    Id,
    CompanyId,
    SupplierId,
    SourceCompanyId,
    PaymentMode,
    Status,
    Total,
    TotalExpenses,
    FinalTotal,
    CreatedBy,
    CreatedAt,
    ApprovedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PurchaseLines {
    Table,
    Id,
    PurchaseId,
    ProductId,
    Quantity,
    UnitPrice,
    LineTotal,
}

#[derive(DeriveIden)]
enum PurchaseExpenses {
    Table,
    Id,
    PurchaseId,
    Description,
    Amount,
    Currency,
    ExchangeRate,
    BaseAmount,
    IsActualExpense,
    SupplierId,
    ObligationId,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Sales {
    Table,
    Id,
    CompanyId,
    CustomerId,
    Status,
    Total,
    IsInterCompany,
    LinkedPurchaseId,
    CreatedBy,
    CreatedAt,
    ApprovedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SaleLines {
    Table,
    Id,
    SaleId,
    ProductId,
    Quantity,
    UnitPrice,
    LineTotal,
    IsFromParentCompany,
}

#[derive(DeriveIden)]
enum StockMovements {
    Table,
    Id,
    CompanyId,
    ProductId,
    Quantity,
    DocumentKind,
    DocumentId,
    CreatedAt,
}
