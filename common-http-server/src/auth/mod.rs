pub mod config;
pub mod helpers;
pub mod jwt;
pub mod middleware;
pub mod types;

pub use config::{AuthConfig, SharedAuthConfig, presets};
pub use helpers::{auth_subject, get_auth_user};
pub use jwt::JwtUtils;
pub use middleware::{extract_bearer_token, jwt_auth_middleware};
pub use types::{AuthError, AuthUser, Claims};
