pub(crate) mod analysis_task_repository;
pub(crate) mod user_repository;
pub(crate) mod video_repository;
