use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;

pub const DEFAULT_CONFIG_FILE: &str = "candidate.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub submit_path: String,
    pub recruiter_view: bool,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            submit_path: "/submit".into(),
            recruiter_view: false,
            log_filter: "info".into(),
        }
    }
}

/// Defaults, then the config file, then the process environment.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

/// An explicitly named config file must exist; the default one is optional.
pub fn load_settings_with(
    config_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file_cfg = toml::from_str::<HashMap<String, String>>(&raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
            apply_file(&mut settings, &file_cfg);
        }
        Err(err) if required => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()));
        }
        Err(_) => {}
    }

    apply_env(&mut settings, env);
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("server_url") {
        settings.server_url = v.clone();
    }
    if let Some(v) = file_cfg.get("submit_path") {
        settings.submit_path = v.clone();
    }
    if let Some(v) = file_cfg.get("recruiter_view").and_then(|v| parse_flag(v)) {
        settings.recruiter_view = v;
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
}

fn apply_env(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("CANDIDATE_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("APP__SUBMIT_PATH") {
        settings.submit_path = v;
    }

    if let Some(v) = env("APP__RECRUITER_VIEW").and_then(|v| parse_flag(&v)) {
        settings.recruiter_view = v;
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
