use std::path::PathBuf;

use clap::{ArgAction, Args, Parser};

use crate::consts::limits::{DEFAULT_INVITATION_TTL_HOURS, DEFAULT_PAGE_SIZE};

#[derive(Parser, Debug, Clone)]
#[command(name = "hive-api", version, about = "Collaborative event planning API")]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "HIVE_BIND", default_value = "127.0.0.1:3587")]
    pub bind: String,

    /// SurrealDB endpoint, e.g. `mem://` or `ws://localhost:8050`
    #[arg(long, env = "HIVE_DATABASE_URL", default_value = "mem://")]
    pub database_url: String,

    #[arg(long, env = "HIVE_DATABASE_NS", default_value = "hive")]
    pub database_ns: String,

    #[arg(long, env = "HIVE_DATABASE_DB", default_value = "hive")]
    pub database_db: String,

    /// Root user for remote databases; ignored for `mem://`
    #[arg(long, env = "HIVE_DATABASE_USER")]
    pub database_user: Option<String>,

    #[arg(long, env = "HIVE_DATABASE_PASSWORD", hide_env_values = true)]
    pub database_password: Option<String>,

    #[arg(long, env = "HIVE_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(long, env = "HIVE_ACCESS_TOKEN_TTL_MINUTES", default_value_t = 60)]
    pub access_token_ttl_minutes: i64,

    #[arg(long, env = "HIVE_INVITATION_TTL_HOURS", default_value_t = DEFAULT_INVITATION_TTL_HOURS)]
    pub invitation_ttl_hours: i64,

    /// Root directory of the local object store
    #[arg(long, env = "HIVE_MEDIA_ROOT", default_value = "./media")]
    pub media_root: PathBuf,

    #[arg(long, env = "HIVE_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    #[arg(long, env = "HIVE_LOG", default_value = "info")]
    pub log_level: String,

    #[command(flatten)]
    pub features: FeatureFlags,
}

/// Optional features. A disabled feature answers `not_found` as if it did not exist.
#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    #[arg(long = "feature-comments", env = "FEATURE_COMMENTS_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub comments: bool,

    #[arg(long = "feature-reactions", env = "FEATURE_REACTIONS_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub reactions: bool,

    #[arg(long = "feature-documents", env = "FEATURE_DOCUMENTS_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub documents: bool,

    #[arg(long = "feature-gallery", env = "FEATURE_GALLERY_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub gallery: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            comments: true,
            reactions: true,
            documents: true,
            gallery: true,
        }
    }
}

impl FeatureFlags {
    pub fn all_disabled() -> Self {
        Self {
            comments: false,
            reactions: false,
            documents: false,
            gallery: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3587".to_string(),
            database_url: "mem://".to_string(),
            database_ns: "hive".to_string(),
            database_db: "hive".to_string(),
            database_user: None,
            database_password: None,
            jwt_secret: "dev-secret-change-me".to_string(),
            access_token_ttl_minutes: 60,
            invitation_ttl_hours: DEFAULT_INVITATION_TTL_HOURS,
            media_root: PathBuf::from("./media"),
            page_size: DEFAULT_PAGE_SIZE,
            log_level: "info".to_string(),
            features: FeatureFlags::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_flags_parse_from_args() {
        let config = Config::parse_from([
            "hive-api",
            "--jwt-secret",
            "s3cret",
            "--feature-comments",
            "false",
            "--invitation-ttl-hours",
            "24",
        ]);
        assert!(!config.features.comments);
        assert!(config.features.reactions);
        assert_eq!(config.invitation_ttl_hours, 24);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }
}
