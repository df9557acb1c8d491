use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{
    form::FormConfig,
    viewport::{WatchOptions, DEFAULT_REVEAL_THRESHOLD, DEFAULT_ROOT_MARGIN},
};

pub const DEFAULT_SETTINGS_FILE: &str = "site.toml";
pub const ENV_PREFIX: &str = "SITE__";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub reveal_threshold: f64,
    pub reveal_root_margin: f64,
    pub stagger_unit_ms: u64,
    pub initial_sweep_delay_ms: u64,
    pub form_endpoint: Option<Url>,
    pub fallback_address: String,
    pub submit_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reveal_threshold: DEFAULT_REVEAL_THRESHOLD,
            reveal_root_margin: DEFAULT_ROOT_MARGIN,
            stagger_unit_ms: 90,
            initial_sweep_delay_ms: 120,
            form_endpoint: None,
            fallback_address: "hello@example.com".into(),
            submit_timeout_ms: 8_000,
        }
    }
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str::<Settings>(raw)?.normalized())
    }

    /// Clamps fractional options into `[0, 1]`.
    pub fn normalized(mut self) -> Self {
        self.reveal_threshold = clamp_fraction(self.reveal_threshold, DEFAULT_REVEAL_THRESHOLD);
        self.reveal_root_margin = clamp_fraction(self.reveal_root_margin, DEFAULT_ROOT_MARGIN);
        self
    }

    /// Overlays `SITE__*` variables resolved through `lookup`. Unparseable values are
    /// logged and ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = var("REVEAL_THRESHOLD") {
            override_parsed(&mut self.reveal_threshold, "REVEAL_THRESHOLD", &v);
        }
        if let Some(v) = var("REVEAL_ROOT_MARGIN") {
            override_parsed(&mut self.reveal_root_margin, "REVEAL_ROOT_MARGIN", &v);
        }
        if let Some(v) = var("STAGGER_UNIT_MS") {
            override_parsed(&mut self.stagger_unit_ms, "STAGGER_UNIT_MS", &v);
        }
        if let Some(v) = var("INITIAL_SWEEP_DELAY_MS") {
            override_parsed(&mut self.initial_sweep_delay_ms, "INITIAL_SWEEP_DELAY_MS", &v);
        }
        if let Some(v) = var("SUBMIT_TIMEOUT_MS") {
            override_parsed(&mut self.submit_timeout_ms, "SUBMIT_TIMEOUT_MS", &v);
        }
        if let Some(v) = var("FALLBACK_ADDRESS") {
            self.fallback_address = v;
        }
        if let Some(v) = var("FORM_ENDPOINT") {
            if v.trim().is_empty() {
                self.form_endpoint = None;
            } else {
                match Url::parse(v.trim()) {
                    Ok(url) => self.form_endpoint = Some(url),
                    Err(err) => warn!(value = %v, error = %err, "ignoring invalid SITE__FORM_ENDPOINT"),
                }
            }
        }
    }

    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            threshold: self.reveal_threshold,
            root_margin: self.reveal_root_margin,
        }
    }

    pub fn stagger_unit(&self) -> Duration {
        Duration::from_millis(self.stagger_unit_ms)
    }

    pub fn initial_sweep_delay(&self) -> Duration {
        Duration::from_millis(self.initial_sweep_delay_ms)
    }

    pub fn form_config(&self) -> FormConfig {
        FormConfig {
            endpoint: self.form_endpoint.clone(),
            fallback_address: self.fallback_address.clone(),
            submit_timeout: Duration::from_millis(self.submit_timeout_ms),
        }
    }
}

/// Defaults, then `site.toml` in the working directory if present, then the environment.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(None)
}

/// Like [`load_settings`], reading `path` instead of `site.toml`. An explicit path must exist.
pub fn load_settings_from(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut settings = match path {
        Some(path) => read_settings_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_SETTINGS_FILE);
            if default_path.exists() {
                read_settings_file(default_path)?
            } else {
                Settings::default()
            }
        }
    };

    settings.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(settings.normalized())
}

fn read_settings_file(path: &Path) -> Result<Settings, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Settings::from_toml_str(&raw)
}

fn override_parsed<T: std::str::FromStr>(slot: &mut T, name: &str, raw: &str) {
    match raw.trim().parse::<T>() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!(variable = %format!("{ENV_PREFIX}{name}"), value = raw, "ignoring unparseable override"),
    }
}

fn clamp_fraction(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
