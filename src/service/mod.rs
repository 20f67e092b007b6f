pub(crate) mod account_service;
pub(crate) mod analysis_service;
pub(crate) mod data_quality;
pub(crate) mod error;
pub(crate) mod payload;
pub(crate) mod upload_service;
pub(crate) mod video_service;
