use std::path::PathBuf;

use anyhow::{Context, Result};
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_DB_PATH: &str = "data/courses.sqlite";
const DEFAULT_LMS_HOST: &str = "elearning.ut.ac.id";

/// Runtime settings: defaults, then `course_scraper.toml`, then
/// `COURSE_SCRAPER_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: PathBuf,
    /// Host pages must come from. Empty disables the check.
    pub lms_host: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let config = Self::builder()?
            .add_source(File::with_name("course_scraper").required(false))
            .add_source(Environment::with_prefix("COURSE_SCRAPER"))
            .build()
            .context("Failed to load settings")?;
        config.try_deserialize().context("Invalid settings")
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("db_path", DEFAULT_DB_PATH)?
            .set_default("lms_host", DEFAULT_LMS_HOST)?
            .set_default("user_agent", concat!("course_scraper/", env!("CARGO_PKG_VERSION")))?
            .set_default("timeout_secs", 30_i64)?)
    }
}
