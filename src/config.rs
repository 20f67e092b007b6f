//! Runtime settings loaded from the process environment.

use common_http_server_rs::LogFormat;
use std::{env, path::PathBuf};

pub(crate) const DEFAULT_MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;
const DEFAULT_DATABASE_URL: &str = "sqlite://video_analysis.db?mode=rwc";

#[derive(Debug, thiserror::Error)]
pub(crate) enum SettingsError {
    #[error("{name} must be a valid {expected}, got `{value}`")]
    InvalidNumber {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("unknown STORAGE_PROVIDER `{0}`, expected `local` or `supabase`")]
    UnknownStorageProvider(String),
    #[error("{0} is required when STORAGE_PROVIDER=supabase")]
    MissingSupabaseSetting(&'static str),
    #[error("invalid LOG_FORMAT: {0}")]
    InvalidLogFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StorageSettings {
    Local {
        root: PathBuf,
        public_base_url: String,
    },
    Supabase {
        url: String,
        service_role_key: String,
        bucket: String,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct AppSettings {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) database_url: String,
    /// `None` means a random per-process secret (tokens die with the process).
    pub(crate) jwt_secret: Option<String>,
    pub(crate) jwt_expiration_hours: i64,
    pub(crate) storage: StorageSettings,
    pub(crate) max_upload_bytes: u64,
    pub(crate) analysis_backend_url: Option<String>,
    pub(crate) cors_allowed_origins: Vec<String>,
    pub(crate) log_format: LogFormat,
}

impl AppSettings {
    pub(crate) fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds settings from any key lookup; empty values count as unset.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let host = get("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_number(get("PORT"), "PORT", "port number", 3000u16)?;
        let jwt_expiration_hours = parse_number(
            get("JWT_EXPIRATION_HOURS"),
            "JWT_EXPIRATION_HOURS",
            "positive number of hours",
            24i64,
        )?;
        if jwt_expiration_hours <= 0 {
            return Err(SettingsError::InvalidNumber {
                name: "JWT_EXPIRATION_HOURS",
                expected: "positive number of hours",
                value: jwt_expiration_hours.to_string(),
            });
        }
        let max_upload_bytes = parse_number(
            get("MAX_UPLOAD_BYTES"),
            "MAX_UPLOAD_BYTES",
            "byte count",
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;

        let storage = match get("STORAGE_PROVIDER")
            .map(|value| value.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("local") => StorageSettings::Local {
                root: PathBuf::from(get("FILE_STORAGE_DIR").unwrap_or_else(|| "uploads".into())),
                public_base_url: get("PUBLIC_BASE_URL")
                    .unwrap_or_else(|| format!("http://{host}:{port}"))
                    .trim_end_matches('/')
                    .to_string(),
            },
            Some("supabase") => StorageSettings::Supabase {
                url: get("SUPABASE_URL")
                    .ok_or(SettingsError::MissingSupabaseSetting("SUPABASE_URL"))?
                    .trim_end_matches('/')
                    .to_string(),
                service_role_key: get("SUPABASE_SERVICE_ROLE_KEY").ok_or(
                    SettingsError::MissingSupabaseSetting("SUPABASE_SERVICE_ROLE_KEY"),
                )?,
                bucket: get("STORAGE_BUCKET").unwrap_or_else(|| "uploads".into()),
            },
            Some(other) => return Err(SettingsError::UnknownStorageProvider(other.to_string())),
        };

        let log_format = match get("LOG_FORMAT") {
            Some(value) => value
                .parse::<LogFormat>()
                .map_err(SettingsError::InvalidLogFormat)?,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            host,
            port,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            jwt_secret: get("JWT_SECRET_KEY"),
            jwt_expiration_hours,
            storage,
            max_upload_bytes,
            analysis_backend_url: get("ANALYSIS_BACKEND_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            log_format,
        })
    }

    pub(crate) fn storage_provider_name(&self) -> &'static str {
        match self.storage {
            StorageSettings::Local { .. } => "local",
            StorageSettings::Supabase { .. } => "supabase",
        }
    }
}

fn parse_number<T: std::str::FromStr>(
    raw: Option<String>,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, SettingsError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| SettingsError::InvalidNumber {
            name,
            expected,
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<AppSettings, SettingsError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppSettings::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let settings = settings(&[]).unwrap();
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(settings.jwt_expiration_hours, 24);
        assert_eq!(settings.max_upload_bytes, 524_288_000);
        assert_eq!(
            settings.storage,
            StorageSettings::Local {
                root: PathBuf::from("uploads"),
                public_base_url: "http://127.0.0.1:3000".to_string(),
            }
        );
        assert!(settings.jwt_secret.is_none());
        assert!(settings.cors_allowed_origins.is_empty());
    }

    #[test]
    fn supabase_requires_credentials() {
        let err = settings(&[("STORAGE_PROVIDER", "supabase"), ("SUPABASE_URL", "https://x.supabase.co")])
            .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::MissingSupabaseSetting("SUPABASE_SERVICE_ROLE_KEY")
        ));
    }

    #[test]
    fn supabase_url_loses_trailing_slash() {
        let settings = settings(&[
            ("STORAGE_PROVIDER", "Supabase"),
            ("SUPABASE_URL", "https://x.supabase.co/"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
        ])
        .unwrap();
        assert_eq!(settings.storage_provider_name(), "supabase");
        assert!(matches!(
            settings.storage,
            StorageSettings::Supabase { ref url, ref bucket, .. }
                if url == "https://x.supabase.co" && bucket == "uploads"
        ));
    }

    #[test]
    fn invalid_numbers_and_providers_are_reported() {
        assert!(matches!(
            settings(&[("PORT", "eighty")]),
            Err(SettingsError::InvalidNumber { name: "PORT", .. })
        ));
        assert!(matches!(
            settings(&[("JWT_EXPIRATION_HOURS", "0")]),
            Err(SettingsError::InvalidNumber { .. })
        ));
        assert!(matches!(
            settings(&[("STORAGE_PROVIDER", "s3")]),
            Err(SettingsError::UnknownStorageProvider(_))
        ));
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let settings =
            settings(&[("CORS_ALLOWED_ORIGINS", "https://a.example, ,https://b.example")]).unwrap();
        assert_eq!(
            settings.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }
}
