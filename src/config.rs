//! Bridge configuration. Everything is optional: with no environment
//! at all the bridge still works against a discovered store, minus the
//! delegated-write paths that need the URL-scheme auth token.

use std::path::PathBuf;

use crate::store::poll::PollPlan;

/// Environment variable holding the host's URL-scheme auth token.
/// Found in the host under Settings > General > Enable Things URLs.
pub const URL_TOKEN_VAR: &str = "THINGS_URL_TOKEN";

/// Environment variable overriding store discovery with an explicit
/// database path.
pub const STORE_PATH_VAR: &str = "THINGS_DB_PATH";

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Auth token for `things:///update` requests. Absent means
    /// checklist appends fall back to direct row inserts.
    pub url_auth_token: Option<String>,
    /// Explicit store location; `None` triggers discovery under the
    /// host's group container.
    pub store_path: Option<PathBuf>,
    pub poll: PollPlan,
}

impl Config {
    /// Reads configuration from the process environment, loading a
    /// `.env` file first if one is present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Config {
            url_auth_token: lookup(URL_TOKEN_VAR).filter(|t| !t.trim().is_empty()),
            store_path: lookup(STORE_PATH_VAR)
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            poll: PollPlan::default(),
        }
    }
}
