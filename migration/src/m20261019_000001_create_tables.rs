use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Users table
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(User::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(User::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(User::Name).string().not_null())
                    .col(ColumnDef::new(User::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(User::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Videos table
        manager
            .create_table(
                Table::create()
                    .table(Video::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Video::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Video::UserId).string().not_null())
                    .col(ColumnDef::new(Video::Title).string().not_null())
                    .col(ColumnDef::new(Video::Filename).string().not_null())
                    .col(ColumnDef::new(Video::FileSize).big_integer().not_null())
                    .col(ColumnDef::new(Video::FileUrl).text())
                    .col(
                        ColumnDef::new(Video::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Video::ThumbnailUrl).text())
                    .col(ColumnDef::new(Video::Duration).double())
                    .col(ColumnDef::new(Video::ResolutionWidth).integer())
                    .col(ColumnDef::new(Video::ResolutionHeight).integer())
                    .col(ColumnDef::new(Video::Format).string())
                    .col(
                        ColumnDef::new(Video::Status)
                            .string()
                            .not_null()
                            .default("uploaded"),
                    )
                    .col(
                        ColumnDef::new(Video::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Video::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Video::DeletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_video_user_id")
                            .from(Video::Table, Video::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Analysis tasks table
        manager
            .create_table(
                Table::create()
                    .table(AnalysisTask::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AnalysisTask::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AnalysisTask::VideoId).string().not_null())
                    .col(ColumnDef::new(AnalysisTask::UserId).string().not_null())
                    .col(
                        ColumnDef::new(AnalysisTask::VideoSegmentation)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AnalysisTask::TransitionDetection)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AnalysisTask::AudioTranscription)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AnalysisTask::ReportGeneration)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AnalysisTask::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(AnalysisTask::Progress)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .col(ColumnDef::new(AnalysisTask::ErrorMessage).text())
                    .col(ColumnDef::new(AnalysisTask::ReportPdfUrl).text())
                    .col(ColumnDef::new(AnalysisTask::SubtitleSrtUrl).text())
                    .col(ColumnDef::new(AnalysisTask::SubtitleVttUrl).text())
                    .col(ColumnDef::new(AnalysisTask::ScriptMdUrl).text())
                    .col(ColumnDef::new(AnalysisTask::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(AnalysisTask::CompletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(AnalysisTask::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AnalysisTask::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_analysis_task_video_id")
                            .from(AnalysisTask::Table, AnalysisTask::VideoId)
                            .to(Video::Table, Video::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_analysis_task_user_id")
                            .from(AnalysisTask::Table, AnalysisTask::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_video_user_id_created_at")
                    .table(Video::Table)
                    .col(Video::UserId)
                    .col(Video::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_analysis_task_video_id")
                    .table(AnalysisTask::Table)
                    .col(AnalysisTask::VideoId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_analysis_task_user_id_created_at")
                    .table(AnalysisTask::Table)
                    .col(AnalysisTask::UserId)
                    .col(AnalysisTask::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order of creation
        manager
            .drop_table(Table::drop().table(AnalysisTask::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Video::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Email,
    Name,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Video {
    #[sea_orm(iden = "videos")]
    Table,
    Id,
    UserId,
    Title,
    Filename,
    FileSize,
    FileUrl,
    Description,
    ThumbnailUrl,
    Duration,
    ResolutionWidth,
    ResolutionHeight,
    Format,
    Status,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum AnalysisTask {
    #[sea_orm(iden = "analysis_tasks")]
    Table,
    Id,
    VideoId,
    UserId,
    VideoSegmentation,
    TransitionDetection,
    AudioTranscription,
    ReportGeneration,
    Status,
    Progress,
    ErrorMessage,
    ReportPdfUrl,
    SubtitleSrtUrl,
    SubtitleVttUrl,
    ScriptMdUrl,
    StartedAt,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}
