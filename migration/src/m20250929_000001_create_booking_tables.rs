use sea_orm_migration::prelude::*;

use super::m20250928_000001_create_drive_tables::GoogleDriveFolders;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum IngestionRun {
    Table,
    Id,
    FolderId,
    FileId,
    Filename,
    FileCreatedTime,
    FileModifiedTime,
    DataTime,
    Status,
    SheetNames,
    RowsProcessed,
    RowsInserted,
    RowsUpdated,
    RowsIgnored,
    ConflictsDetected,
    RowsQuarantined,
    ErrorMessage,
    StartedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
enum Booking {
    Table,
    Id,
    BookingNumber,
    Status,
    FileAs,
    FirstName,
    Surname,
    Company,
    Region,
    Portal,
    ArriveDate,
    DepartDate,
    RoomNumber,
    RoomType,
    DepositRequired,
    ReceivedAmount,
    DepositDue,
    DepositByDate,
    TotalAmount,
    Balance,
    OriginalTotal,
    Agent,
    AgentRef,
    Email,
    Mobile,
    CarRego,
    GuestRequest,
    EnquiryStatus,
    PrimarySource,
    BlackList,
    Rate,
    Suburb,
    PostCode,
    State,
    RoomStatus,
    DualKey,
    PreAuthAmount,
    TotalPreAuths,
    SourceFileId,
    SourceFileTime,
    SourceRowHash,
    IngestionRunId,
    FolderId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProcessedFile {
    Table,
    Id,
    FolderId,
    FileId,
    Filename,
    IngestionRunId,
    ProcessedAt,
}

#[derive(DeriveIden)]
enum RawRow {
    Table,
    Id,
    FileId,
    RowIndex,
    RowHash,
    RawData,
    IngestionRunId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum QuarantinedRow {
    Table,
    Id,
    FileId,
    RowIndex,
    RawData,
    ErrorMessage,
    IngestionRunId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BookingConflict {
    Table,
    Id,
    BookingNumber,
    FieldName,
    ExistingValue,
    IncomingValue,
    SourceFileId,
    IngestionRunId,
    DetectedAt,
}

fn text(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col).string().not_null().default("").to_owned()
}

fn money(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col).decimal_len(12, 2).null().to_owned()
}

fn counter(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col).integer().not_null().default(0).to_owned()
}

fn run_fk(name: &str, table: impl IntoTableRef, col: impl IntoIden) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(table, col)
        .to(IngestionRun::Table, IngestionRun::Id)
        .on_delete(ForeignKeyAction::Cascade)
        .on_update(ForeignKeyAction::Cascade)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, m: &SchemaManager) -> Result<(), DbErr> {
        m.create_table(
            Table::create()
                .table(IngestionRun::Table)
                .if_not_exists()
                .col(ColumnDef::new(IngestionRun::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(IngestionRun::FolderId).uuid().not_null())
                .col(ColumnDef::new(IngestionRun::FileId).string_len(255).not_null())
                .col(ColumnDef::new(IngestionRun::Filename).string().not_null())
                .col(ColumnDef::new(IngestionRun::FileCreatedTime).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(IngestionRun::FileModifiedTime).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(IngestionRun::DataTime).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(IngestionRun::Status).string_len(20).not_null().default("running"))
                .col(ColumnDef::new(IngestionRun::SheetNames).json_binary().not_null().default(Expr::cust("'[]'::jsonb")))
                .col(counter(IngestionRun::RowsProcessed))
                .col(counter(IngestionRun::RowsInserted))
                .col(counter(IngestionRun::RowsUpdated))
                .col(counter(IngestionRun::RowsIgnored))
                .col(counter(IngestionRun::ConflictsDetected))
                .col(counter(IngestionRun::RowsQuarantined))
                .col(ColumnDef::new(IngestionRun::ErrorMessage).text().null())
                .col(ColumnDef::new(IngestionRun::StartedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                .col(ColumnDef::new(IngestionRun::CompletedAt).timestamp_with_time_zone().null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_ingestion_run_folder")
                        .from(IngestionRun::Table, IngestionRun::FolderId)
                        .to(GoogleDriveFolders::Table, GoogleDriveFolders::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .on_update(ForeignKeyAction::Cascade)
                )
                .to_owned(),
        ).await?;

        m.create_index(
            Index::create()
                .name("idx_ingestion_run_file")
                .table(IngestionRun::Table)
                .col(IngestionRun::FileId)
                .col(IngestionRun::StartedAt)
                .to_owned(),
        ).await?;

        m.create_table(
            Table::create()
                .table(Booking::Table)
                .if_not_exists()
                .col(ColumnDef::new(Booking::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Booking::BookingNumber).string_len(50).not_null().unique_key())
                .col(text(Booking::Status))
                .col(text(Booking::FileAs))
                .col(text(Booking::FirstName))
                .col(text(Booking::Surname))
                .col(text(Booking::Company))
                .col(text(Booking::Region))
                .col(text(Booking::Portal))
                .col(ColumnDef::new(Booking::ArriveDate).date().null())
                .col(ColumnDef::new(Booking::DepartDate).date().null())
                .col(text(Booking::RoomNumber))
                .col(text(Booking::RoomType))
                .col(money(Booking::DepositRequired))
                .col(money(Booking::ReceivedAmount))
                .col(money(Booking::DepositDue))
                .col(ColumnDef::new(Booking::DepositByDate).date().null())
                .col(money(Booking::TotalAmount))
                .col(money(Booking::Balance))
                .col(money(Booking::OriginalTotal))
                .col(text(Booking::Agent))
                .col(text(Booking::AgentRef))
                .col(text(Booking::Email))
                .col(text(Booking::Mobile))
                .col(text(Booking::CarRego))
                .col(ColumnDef::new(Booking::GuestRequest).text().not_null().default(""))
                .col(text(Booking::EnquiryStatus))
                .col(text(Booking::PrimarySource))
                .col(ColumnDef::new(Booking::BlackList).boolean().not_null().default(false))
                .col(text(Booking::Rate))
                .col(text(Booking::Suburb))
                .col(text(Booking::PostCode))
                .col(text(Booking::State))
                .col(text(Booking::RoomStatus))
                .col(text(Booking::DualKey))
                .col(money(Booking::PreAuthAmount))
                .col(money(Booking::TotalPreAuths))
                .col(ColumnDef::new(Booking::SourceFileId).string_len(255).not_null())
                .col(ColumnDef::new(Booking::SourceFileTime).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Booking::SourceRowHash).string_len(64).not_null())
                .col(ColumnDef::new(Booking::IngestionRunId).uuid().null())
                .col(ColumnDef::new(Booking::FolderId).uuid().null())
                .col(ColumnDef::new(Booking::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                .col(ColumnDef::new(Booking::UpdatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_booking_ingestion_run")
                        .from(Booking::Table, Booking::IngestionRunId)
                        .to(IngestionRun::Table, IngestionRun::Id)
                        .on_delete(ForeignKeyAction::SetNull)
                        .on_update(ForeignKeyAction::Cascade)
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_booking_folder")
                        .from(Booking::Table, Booking::FolderId)
                        .to(GoogleDriveFolders::Table, GoogleDriveFolders::Id)
                        .on_delete(ForeignKeyAction::SetNull)
                        .on_update(ForeignKeyAction::Cascade)
                )
                .to_owned(),
        ).await?;

        m.create_index(
            Index::create()
                .name("idx_booking_arrive_date")
                .table(Booking::Table)
                .col(Booking::ArriveDate)
                .to_owned(),
        ).await?;

        m.create_table(
            Table::create()
                .table(ProcessedFile::Table)
                .if_not_exists()
                .col(ColumnDef::new(ProcessedFile::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(ProcessedFile::FolderId).uuid().not_null())
                .col(ColumnDef::new(ProcessedFile::FileId).string_len(255).not_null())
                .col(ColumnDef::new(ProcessedFile::Filename).string().not_null())
                .col(ColumnDef::new(ProcessedFile::IngestionRunId).uuid().not_null())
                .col(ColumnDef::new(ProcessedFile::ProcessedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_processed_file_folder")
                        .from(ProcessedFile::Table, ProcessedFile::FolderId)
                        .to(GoogleDriveFolders::Table, GoogleDriveFolders::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .on_update(ForeignKeyAction::Cascade)
                )
                .foreign_key(&mut run_fk("fk_processed_file_run", ProcessedFile::Table, ProcessedFile::IngestionRunId))
                .to_owned(),
        ).await?;

        m.create_index(
            Index::create()
                .name("uq_processed_file_folder_file")
                .table(ProcessedFile::Table)
                .col(ProcessedFile::FolderId)
                .col(ProcessedFile::FileId)
                .unique()
                .to_owned(),
        ).await?;

        m.create_table(
            Table::create()
                .table(RawRow::Table)
                .if_not_exists()
                .col(ColumnDef::new(RawRow::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(RawRow::FileId).string_len(255).not_null())
                .col(ColumnDef::new(RawRow::RowIndex).integer().not_null())
                .col(ColumnDef::new(RawRow::RowHash).string_len(64).not_null())
                .col(ColumnDef::new(RawRow::RawData).json_binary().not_null())
                .col(ColumnDef::new(RawRow::IngestionRunId).uuid().not_null())
                .col(ColumnDef::new(RawRow::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                .foreign_key(&mut run_fk("fk_raw_row_run", RawRow::Table, RawRow::IngestionRunId))
                .to_owned(),
        ).await?;

        m.create_table(
            Table::create()
                .table(QuarantinedRow::Table)
                .if_not_exists()
                .col(ColumnDef::new(QuarantinedRow::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(QuarantinedRow::FileId).string_len(255).not_null())
                .col(ColumnDef::new(QuarantinedRow::RowIndex).integer().not_null())
                .col(ColumnDef::new(QuarantinedRow::RawData).json_binary().not_null())
                .col(ColumnDef::new(QuarantinedRow::ErrorMessage).text().not_null())
                .col(ColumnDef::new(QuarantinedRow::IngestionRunId).uuid().not_null())
                .col(ColumnDef::new(QuarantinedRow::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                .foreign_key(&mut run_fk("fk_quarantined_row_run", QuarantinedRow::Table, QuarantinedRow::IngestionRunId))
                .to_owned(),
        ).await?;

        m.create_table(
            Table::create()
                .table(BookingConflict::Table)
                .if_not_exists()
                .col(ColumnDef::new(BookingConflict::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(BookingConflict::BookingNumber).string_len(50).not_null())
                .col(ColumnDef::new(BookingConflict::FieldName).string_len(50).not_null())
                .col(ColumnDef::new(BookingConflict::ExistingValue).text().not_null())
                .col(ColumnDef::new(BookingConflict::IncomingValue).text().not_null())
                .col(ColumnDef::new(BookingConflict::SourceFileId).string_len(255).not_null())
                .col(ColumnDef::new(BookingConflict::IngestionRunId).uuid().not_null())
                .col(ColumnDef::new(BookingConflict::DetectedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                .foreign_key(&mut run_fk("fk_booking_conflict_run", BookingConflict::Table, BookingConflict::IngestionRunId))
                .to_owned(),
        ).await?;

        Ok(())
    }

    async fn down(&self, m: &SchemaManager) -> Result<(), DbErr> {
        m.drop_table(Table::drop().table(BookingConflict::Table).if_exists().to_owned()).await?;
        m.drop_table(Table::drop().table(QuarantinedRow::Table).if_exists().to_owned()).await?;
        m.drop_table(Table::drop().table(RawRow::Table).if_exists().to_owned()).await?;
        m.drop_table(Table::drop().table(ProcessedFile::Table).if_exists().to_owned()).await?;
        m.drop_table(Table::drop().table(Booking::Table).if_exists().to_owned()).await?;
        m.drop_table(Table::drop().table(IngestionRun::Table).if_exists().to_owned()).await?;
        Ok(())
    }
}
