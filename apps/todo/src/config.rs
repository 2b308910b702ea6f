use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::terminal::OutputFormat;

pub const SETTINGS_FILE: &str = "todo.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub default_route: String,
    pub event_queue_capacity: usize,
    pub output: OutputFormat,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/todos.db".into(),
            default_route: "#/".into(),
            event_queue_capacity: 64,
            output: OutputFormat::Text,
            log_filter: "warn".into(),
        }
    }
}

/// A setting that was present but could not be used. Settings load before
/// logging is installed, so these are handed back and reported afterwards.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsWarning {
    #[error("ignoring unreadable todo.toml: {0}")]
    UnreadableFile(String),
    #[error("ignoring invalid event queue capacity '{0}'")]
    InvalidCapacity(String),
    #[error("ignoring output setting: {0}")]
    InvalidOutput(String),
}

/// Defaults, then `todo.toml` in the working directory, then environment.
pub fn load_settings() -> (Settings, Vec<SettingsWarning>) {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> (Settings, Vec<SettingsWarning>) {
    let mut settings = Settings::default();
    let mut warnings = Vec::new();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw, &mut warnings);
    }
    apply_env(&mut settings, env, &mut warnings);

    (settings, warnings)
}

pub fn report_warnings(warnings: &[SettingsWarning]) {
    for warning in warnings {
        tracing::warn!(%warning, "ignored setting");
    }
}

fn apply_file(settings: &mut Settings, raw: &str, warnings: &mut Vec<SettingsWarning>) {
    let file_cfg = match toml::from_str::<HashMap<String, toml::Value>>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warnings.push(SettingsWarning::UnreadableFile(err.to_string()));
            return;
        }
    };

    let get = |key: &str| {
        file_cfg.get(key).map(|v| match v {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    };

    if let Some(v) = get("database_url") {
        settings.database_url = v;
    }
    if let Some(v) = get("default_route") {
        settings.default_route = v;
    }
    if let Some(v) = get("event_queue_capacity") {
        set_capacity(settings, &v, warnings);
    }
    if let Some(v) = get("output") {
        set_output(settings, &v, warnings);
    }
    if let Some(v) = get("log_filter") {
        settings.log_filter = v;
    }
}

fn apply_env(
    settings: &mut Settings,
    env: impl Fn(&str) -> Option<String>,
    warnings: &mut Vec<SettingsWarning>,
) {
    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("APP__DEFAULT_ROUTE") {
        settings.default_route = v;
    }

    if let Some(v) = env("APP__EVENT_QUEUE_CAPACITY") {
        set_capacity(settings, &v, warnings);
    }

    if let Some(v) = env("APP__OUTPUT") {
        set_output(settings, &v, warnings);
    }

    if let Some(v) = env("RUST_LOG") {
        settings.log_filter = v;
    }
}

fn set_capacity(settings: &mut Settings, raw: &str, warnings: &mut Vec<SettingsWarning>) {
    match raw.trim().parse::<usize>() {
        Ok(parsed) if parsed > 0 => settings.event_queue_capacity = parsed,
        _ => warnings.push(SettingsWarning::InvalidCapacity(raw.to_string())),
    }
}

fn set_output(settings: &mut Settings, raw: &str, warnings: &mut Vec<SettingsWarning>) {
    match raw.parse::<OutputFormat>() {
        Ok(output) => settings.output = output,
        Err(err) => warnings.push(SettingsWarning::InvalidOutput(err)),
    }
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
