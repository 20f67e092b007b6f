pub mod size_limit;

pub use size_limit::{
    SizeLimitConfig, SizeLimitError, SizeLimitService, content_length_middleware,
};
pub use size_limit::presets as size_limit_presets;
