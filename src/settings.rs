use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::parser::sections::SplitMode;

const CONFIG_FILE: &str = "kegg_expert";
const ENV_PREFIX: &str = "KEGG_EXPERT";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub cache_path: String,
    pub cache_max_age_days: i64,
    pub use_cache: bool,
    /// KEGG organism code of the production host.
    pub organism: String,
    pub outdir: String,
    pub split_mode: SplitMode,
}

impl Settings {
    /// Defaults ← `kegg_expert.{toml,yaml,json}` ← `KEGG_EXPERT_*` env vars.
    pub fn load() -> Result<Self, ConfigError> {
        builder()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    #[cfg(test)]
    pub fn defaults() -> Result<Self, ConfigError> {
        builder()?.build()?.try_deserialize()
    }
}

fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("base_url", "https://rest.kegg.jp")?
        .set_default("timeout_secs", 30_i64)?
        .set_default("max_retries", 3_i64)?
        .set_default("backoff_ms", 2000_i64)?
        .set_default("cache_path", "data/kegg_cache.sqlite")?
        .set_default("cache_max_age_days", 30_i64)?
        .set_default("use_cache", true)?
        .set_default("organism", "sce")?
        .set_default("outdir", "outputs")?
        .set_default("split_mode", "lenient")
}

// ── Tests ──
