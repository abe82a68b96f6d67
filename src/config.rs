use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::error::Result;
use crate::model::Identity;

const CONFIG_FILE: &str = "Election.toml";
const ENV_PREFIX: &str = "ELECTION_";

/// Host configuration, derived from `Election.toml` and `ELECTION_*`
/// environment variables. Environment variables take priority.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    admin: Identity,
    journal_path: PathBuf,
    #[serde(default = "default_log_config")]
    log_config: PathBuf,
}

fn default_log_config() -> PathBuf {
    PathBuf::from("log4rs.yaml")
}

impl Config {
    /// The sources configuration is read from.
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load the configuration from the default sources.
    pub fn load() -> Result<Self> {
        Self::from_figment(&Self::figment())
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        Ok(figment.extract()?)
    }

    /// The identity that administers the election.
    /// Configured via `ADMIN`, which must keep its `0x` prefix: the environment
    /// provider reads bare digits as a number, which is not an identity.
    pub fn admin(&self) -> Identity {
        self.admin
    }

    /// Where the journal of receipts is kept.
    /// Configured via `JOURNAL_PATH`.
    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    /// The log4rs configuration file.
    /// Configured via `LOG_CONFIG`, defaults to `log4rs.yaml`.
    pub fn log_config(&self) -> &Path {
        &self.log_config
    }
}
