//! Environment-backed configuration.
//!
//! All knobs come from `LAUNCHPAD_*` variables (a `.env` file is honored via
//! dotenvy at startup). The resulting [`AppConfig`] is handed to the router
//! state explicitly; nothing reads the environment after boot.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Fallback signing secret for local development. `main` warns loudly when it
/// is in effect; production deployments must set `LAUNCHPAD_SESSION_SECRET`.
pub const DEV_SESSION_SECRET: &str = "launchpad-dev-secret";

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DATA_DIR: &str = "launchpad_data";
const DEFAULT_PROJECTS_ROOT: &str = "projects";
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("LAUNCHPAD_ADDR is not a valid socket address: {0}")]
    BadAddr(#[from] std::net::AddrParseError),

    #[error("LAUNCHPAD_TOKEN_TTL_SECS is not a number: {0}")]
    BadTtl(#[from] std::num::ParseIntError),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Sled data directory (users + project registry).
    pub data_dir: PathBuf,
    /// Root of the on-disk artifact tree: `{root}/{username}/{project}/...`.
    pub projects_root: PathBuf,
    /// HMAC secret for session tokens.
    pub session_secret: String,
    pub token_ttl_secs: i64,
    /// When set, logs additionally roll into daily files under this directory.
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var("LAUNCHPAD_ADDR")
            .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
            .parse()?;
        let token_ttl_secs = match env::var("LAUNCHPAD_TOKEN_TTL_SECS") {
            Ok(raw) => raw.parse()?,
            Err(_) => DEFAULT_TOKEN_TTL_SECS,
        };
        Ok(Self {
            bind_addr,
            data_dir: path_from_env("LAUNCHPAD_DATA_DIR", DEFAULT_DATA_DIR),
            projects_root: path_from_env("LAUNCHPAD_PROJECTS_ROOT", DEFAULT_PROJECTS_ROOT),
            session_secret: env::var("LAUNCHPAD_SESSION_SECRET")
                .unwrap_or_else(|_| DEV_SESSION_SECRET.to_string()),
            token_ttl_secs,
            log_dir: env::var("LAUNCHPAD_LOG_DIR").ok().map(PathBuf::from),
        })
    }

    /// True when no real signing secret was configured.
    pub fn uses_dev_secret(&self) -> bool {
        self.session_secret == DEV_SESSION_SECRET
    }
}

fn path_from_env(key: &str, default: &str) -> PathBuf {
    env::var(key).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(default))
}
