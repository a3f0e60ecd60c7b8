use std::{collections::HashMap, fs};

use anyhow::{anyhow, Context, Result};
use url::Url;

#[derive(Debug, Clone)]
pub struct Settings {
    pub store_url: String,
    pub collection: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_url: "http://127.0.0.1:8088".into(),
            collection: "inventory".into(),
        }
    }
}

/// Defaults, overridden by `inventory.toml` in the working directory,
/// overridden in turn by environment variables.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("inventory.toml") {
        apply_file_overrides(&mut settings, &raw);
    }

    if let Ok(v) = std::env::var("STORE_URL") {
        settings.store_url = v;
    }
    if let Ok(v) = std::env::var("APP__STORE_URL") {
        settings.store_url = v;
    }

    if let Ok(v) = std::env::var("INVENTORY_COLLECTION") {
        settings.collection = v;
    }
    if let Ok(v) = std::env::var("APP__COLLECTION") {
        settings.collection = v;
    }

    settings
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
        if let Some(v) = file_cfg.get("store_url") {
            settings.store_url = v.clone();
        }
        if let Some(v) = file_cfg.get("collection") {
            settings.collection = v.clone();
        }
    }
}

pub fn parse_store_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid store url '{raw}'"))?;
    if url.cannot_be_a_base() {
        return Err(anyhow!("store url '{raw}' cannot be used as a base"));
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
