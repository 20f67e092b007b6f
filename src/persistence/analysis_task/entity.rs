use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "analysis_tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub video_id: String,
    pub user_id: String,
    pub video_segmentation: bool,
    pub transition_detection: bool,
    pub audio_transcription: bool,
    pub report_generation: bool,
    pub status: String,
    #[sea_orm(column_type = "Text")]
    pub progress: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub report_pdf_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub subtitle_srt_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub subtitle_vtt_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub script_md_url: Option<String>,
    pub started_at: Option<DateTimeWithTimeZone>,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::persistence::video::entity::Entity",
        from = "Column::VideoId",
        to = "crate::persistence::video::entity::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Video,
}

impl Related<crate::persistence::video::entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Video.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
