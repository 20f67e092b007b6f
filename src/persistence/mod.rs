mod analysis_task;
mod user;
mod video;

pub(crate) use crate::persistence::analysis_task::{
    AnalysisTaskActiveModel, AnalysisTaskColumn, AnalysisTaskEntity, AnalysisTaskModel,
};
pub(crate) use crate::persistence::user::{UserActiveModel, UserColumn, UserEntity, UserModel};
pub(crate) use crate::persistence::video::{
    VideoActiveModel, VideoColumn, VideoEntity, VideoModel,
};
