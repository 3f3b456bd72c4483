use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from a TOML file with `SCALP_`-prefixed
    /// environment overrides (e.g. `SCALP_GOVERNOR.MAX_TRADES_PER_DAY=3`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("SCALP_").split("."))
            .extract()?;

        Ok(config)
    }
}
