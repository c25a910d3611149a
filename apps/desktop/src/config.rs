use std::{collections::HashMap, fs};

use client_core::tmdb::TMDB_API_BASE_URL;

#[derive(Debug)]
pub struct Settings {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: TMDB_API_BASE_URL.to_string(),
        }
    }
}

/// Defaults, overridden by `tmdb.toml` in the working directory, overridden
/// by `TMDB_API_KEY` / `TMDB_BASE_URL`. Command-line flags win over all of
/// these in `main`.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("tmdb.toml") {
        apply_file_config(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings);

    settings
}

fn apply_file_config(settings: &mut Settings, raw: &str) {
    if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
        if let Some(v) = file_cfg.get("api_key") {
            settings.api_key = Some(v.clone());
        }
        if let Some(v) = file_cfg.get("base_url") {
            settings.base_url = v.clone();
        }
    }
}

fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(v) = std::env::var("TMDB_API_KEY") {
        settings.api_key = Some(v);
    }
    if let Ok(v) = std::env::var("TMDB_BASE_URL") {
        settings.base_url = v;
    }
}
