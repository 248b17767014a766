pub mod models;

use anyhow::{Context, Result};
use std::{fs::File, io::Read};
use validator::Validate;

pub use models::{Config, Credentials, Domain};

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
pub const CONFIG_ENV_VAR: &str = "NJALLA_DNS_CONFIG";

pub fn config_path() -> String {
    std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string())
}

pub fn load_config(config_file: &str) -> Result<Config> {
    let mut file = File::open(config_file)
        .with_context(|| format!("Failed to open config file: {}", config_file))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .with_context(|| format!("Failed to read config file: {}", config_file))?;

    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", config_file))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file: {}", config_file))?;
    Ok(config)
}
