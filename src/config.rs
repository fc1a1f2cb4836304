use std::fs;
use log::LevelFilter;
use serde::Deserialize;
use crate::errors::ConfigError;
use crate::models::{Area, BatteryConfig, PriceConfig};

#[derive(Deserialize, Clone)]
pub struct HomeSettings {
    pub voltage: f64,
    pub max_fuse_current: f64,
    pub safety_margin: f64,
    pub step_size: f64,
}

#[derive(Deserialize)]
pub struct MailParameters {
    pub smtp_user: String,
    pub smtp_password: String,
    pub smtp_endpoint: String,
    pub from: String,
    pub to: String,
}

#[derive(Deserialize)]
pub struct FoxESS {
    pub api_key: String,
    pub inverter_sn: String,
    pub max_tou_segments: usize,
}

#[derive(Deserialize)]
pub struct Http {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

#[derive(Deserialize)]
pub struct Config {
    pub battery: BatteryConfig,
    pub price: PriceConfig,
    pub home: HomeSettings,
    pub fox_ess: FoxESS,
    pub mail: MailParameters,
    pub http: Http,
    pub general: General,
    #[serde(default = "default_default_consumption_kwh")]
    pub default_consumption_kwh: f64,
}

fn default_default_consumption_kwh() -> f64 {
    5.2
}

/// Loads the configuration file and returns a struct with all configuration items.
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {
    let toml = fs::read_to_string(config_path)?;
    let config: Config = toml::from_str(&toml)?;

    if !(0.0 < config.battery.min_soc_pct && config.battery.min_soc_pct < 100.0) {
        return Err(ConfigError("battery.min_soc_pct must be in (0, 100)".into()));
    }
    if config.battery.max_charge_discharge_kw <= 0.0 {
        return Err(ConfigError("battery.max_charge_discharge_kw must be positive".into()));
    }
    if config.price.vat_multiplier < 1.0 {
        return Err(ConfigError("price.vat_multiplier must be >= 1".into()));
    }

    Ok(config)
}

/// Validates an `Area` string coming from the HTTP surface against the configured set.
pub fn parse_area(s: &str) -> Result<Area, ConfigError> {
    s.parse().map_err(ConfigError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_area_accepts_configured_set_case_insensitively() {
        assert!(parse_area("se1").is_ok());
        assert!(parse_area("SE4").is_ok());
    }

    #[test]
    fn parse_area_rejects_unknown_area() {
        assert!(parse_area("XX1").is_err());
    }

    #[test]
    fn load_config_rejects_missing_file() {
        assert!(load_config("/nonexistent/path/gridarb.toml").is_err());
    }
}
