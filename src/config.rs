use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Server configuration, layered from a TOML file and the environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// SQLite connection string, e.g. `sqlite://feedline.db`
    #[serde(default = "database_url")]
    pub database_url: String,

    /// HMAC secret used to sign session tokens. No default.
    pub jwt_secret: String,

    /// <address>:<port> to serve on
    #[serde(default = "listen_address")]
    pub listen_address: SocketAddr,

    /// Posts per feed page
    #[serde(default = "page_size")]
    pub page_size: usize,

    /// How long a rendered index page fragment stays cached
    #[serde(default = "index_cache_ttl_secs")]
    pub index_cache_ttl_secs: u64,

    /// Maximum number of cached fragments
    #[serde(default = "cache_capacity")]
    pub cache_capacity: u64,

    /// Directory uploaded images are written to and served from
    #[serde(default = "media_root")]
    pub media_root: PathBuf,

    /// Where anonymous callers of gated routes are sent
    #[serde(default = "login_url")]
    pub login_url: String,

    /// Max HTTP body size the server accepts, uploads included
    #[serde(default = "max_body_size")]
    pub max_body_size: usize,

    /// Output colourful human-friendly logs instead of JSON lines
    #[serde(default = "human_logs")]
    pub human_logs: bool,
}

impl Config {
    pub const DEFAULT_FILE_NAME: &'static str = "feedline.toml";
    pub const ENV_PREFIX: &'static str = "FEEDLINE_";

    pub fn new(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            jwt_secret: jwt_secret.into(),
            listen_address: listen_address(),
            page_size: page_size(),
            index_cache_ttl_secs: index_cache_ttl_secs(),
            cache_capacity: cache_capacity(),
            media_root: media_root(),
            login_url: login_url(),
            max_body_size: max_body_size(),
            human_logs: human_logs(),
        }
    }

    /// Sources in increasing precedence: `feedline.toml` (or the file named by
    /// `FEEDLINE_CONFIG`), `DATABASE_URL`/`JWT_SECRET`, `FEEDLINE_*` variables.
    pub fn figment() -> Figment {
        let file = std::env::var("FEEDLINE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(Self::DEFAULT_FILE_NAME));

        Figment::new()
            .merge(Toml::file(file))
            .merge(Env::raw().only(&["DATABASE_URL", "JWT_SECRET"]))
            .merge(Env::prefixed(Self::ENV_PREFIX).ignore(&["CONFIG"]))
    }

    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config: Config = Self::figment()
            .extract()
            .context("could not load server configuration")?;
        anyhow::ensure!(!config.jwt_secret.is_empty(), "jwt_secret must not be empty");
        anyhow::ensure!(config.page_size > 0, "page_size must be at least 1");
        Ok(config)
    }

    pub fn index_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.index_cache_ttl_secs)
    }
}

fn database_url() -> String {
    "sqlite://feedline.db".to_owned()
}

fn listen_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3001))
}

fn page_size() -> usize {
    crate::feed::DEFAULT_PAGE_SIZE
}

fn index_cache_ttl_secs() -> u64 {
    20
}

fn cache_capacity() -> u64 {
    10_000
}

fn media_root() -> PathBuf {
    PathBuf::from("media")
}

fn login_url() -> String {
    "/auth/login/".to_owned()
}

fn max_body_size() -> usize {
    5 * 1024 * 1024
}

fn human_logs() -> bool {
    true
}
