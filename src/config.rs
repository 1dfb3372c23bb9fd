use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub store_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub base_port: u16,
    pub dns: String,
    pub ip_endpoint: String,
    pub uplink_iface: Option<String>,
    pub manage_services: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("/etc/wireguard"),
            scratch_dir: PathBuf::from("/tmp"),
            base_port: 51820,
            dns: "1.1.1.1".into(),
            ip_endpoint: "https://ifconfig.me/ip".into(),
            uplink_iface: None,
            manage_services: false,
        }
    }
}

/**
 * @brief Load tool settings, writing the defaults when the file is missing.
 * @param path Optional settings path, defaults to `wirewizard.toml`.
 * @return Settings ready to open the store with.
 */
pub fn load_settings(path: Option<PathBuf>) -> Result<Settings> {
    let p = path.unwrap_or_else(|| PathBuf::from("wirewizard.toml"));
    if !p.exists() {
        let def = Settings::default();
        let s = toml::to_string_pretty(&def).map_err(|e| Error::SettingsInvalid {
            path: p.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&p, s).map_err(|e| Error::WriteFailure {
            path: p.clone(),
            source: e,
        })?;
        return Ok(def);
    }
    let s = fs::read_to_string(&p).map_err(|e| Error::ReadFailure {
        path: p.clone(),
        source: e,
    })?;
    let settings: Settings = toml::from_str(&s).map_err(|e| Error::SettingsInvalid {
        path: p,
        reason: e.to_string(),
    })?;
    Ok(settings)
}
