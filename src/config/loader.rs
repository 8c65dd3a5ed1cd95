use super::types::Config;
use std::fs;
use std::path::{Path, PathBuf};

use crate::billing::{CatalogError, TariffCatalog};
use crate::debug_println;

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load() -> Config {
        Config::load().unwrap_or_else(|_| Config::default())
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Config {
    /// Load configuration from default location
    pub fn load() -> Result<Config, Box<dyn std::error::Error>> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)?;
        debug_println!("Loaded config from {}", config_path.display());

        Ok(config)
    }

    /// Save configuration to default location
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config_path = Self::config_path();

        // Ensure config directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;
        Ok(())
    }

    /// Get the default config file path (~/.parkmeter/config.toml)
    fn config_path() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            home.join(".parkmeter").join("config.toml")
        } else {
            PathBuf::from(".parkmeter/config.toml")
        }
    }

    /// Initialize config directory and create default config
    pub fn init() -> Result<(), Box<dyn std::error::Error>> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if !config_path.exists() {
            let default_config = Config::default();
            default_config.save()?;
            println!("Created config at {}", config_path.display());
        } else {
            println!("Config already exists at {}", config_path.display());
        }

        Ok(())
    }

    /// Validate configuration
    pub fn check(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.shortcut_name.is_empty() {
            return Err("Shortcut name must not be empty".into());
        }
        if self.tuning.cap_search_bound_minutes <= 0 {
            return Err("Cap search bound must be positive".into());
        }

        // Catalog invariants are enforced here, at load time, so the fee
        // engine never sees a malformed tariff.
        self.catalog()?;

        Ok(())
    }

    /// Print configuration as TOML
    pub fn print(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        println!("{}", content);
        Ok(())
    }

    /// Compose the runtime catalog: built-in lots with config lots layered
    /// on top.
    pub fn catalog(&self) -> Result<TariffCatalog, CatalogError> {
        let mut lots = TariffCatalog::builtin().into_lots();

        for custom in &self.lots {
            match lots.iter_mut().find(|lot| lot.id == custom.id) {
                Some(existing) => *existing = custom.clone(),
                None => lots.push(custom.clone()),
            }
        }

        debug_println!("Catalog composed: {} lots", lots.len());
        TariffCatalog::new(lots)
    }
}
