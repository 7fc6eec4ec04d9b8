// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use log::LevelFilter;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_DOUBLE_CLICK_MS: i64 = 400;
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            ui: Ui::default(),
            logging: Logging::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub silent_stale_updates: Option<bool>,
    pub double_click_ms: Option<i64>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            silent_stale_updates: Some(false),
            double_click_ms: Some(DEFAULT_DOUBLE_CLICK_MS),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Logging {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("TASKTABLE_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!(
                "cannot resolve config directory; set TASKTABLE_CONFIG_PATH to the config file"
            )
        })?;

        let app_dir = config_root.join(tasktable_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and move values under [storage], [ui], and [logging]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            tasktable_db::validate_db_path(db_path)
                .with_context(|| format!("storage.db_path in {}", path.display()))?;
        }

        if let Some(millis) = self.ui.double_click_ms
            && millis <= 0
        {
            bail!(
                "ui.double_click_ms in {} must be positive, got {}",
                path.display(),
                millis
            );
        }

        if let Some(level) = &self.logging.level
            && LevelFilter::from_str(level).is_err()
        {
            bail!(
                "logging.level in {} must be one of off, error, warn, info, debug, trace; got {:?}",
                path.display(),
                level
            );
        }

        if let Some(file) = &self.logging.file
            && file.trim().is_empty()
        {
            bail!(
                "logging.file in {} must not be empty; remove it to log beside the database",
                path.display()
            );
        }

        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        match &self.storage.db_path {
            Some(path) => PathBuf::from(path),
            None => tasktable_db::default_db_path(),
        }
    }

    pub fn silent_stale_updates(&self) -> bool {
        self.ui.silent_stale_updates.unwrap_or(false)
    }

    pub fn double_click(&self) -> Duration {
        let millis = self
            .ui
            .double_click_ms
            .and_then(|millis| u64::try_from(millis).ok())
            .unwrap_or(DEFAULT_DOUBLE_CLICK_MS as u64);
        Duration::from_millis(millis)
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Option<&str> {
        self.logging.file.as_deref()
    }
}
