// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::config::Config;

pub const LOG_ENV: &str = "TASKTABLE_LOG";
const LOG_FILE: &str = "tasktable.log";

/// Resolves where log records go. The terminal belongs to the UI, so this is
/// always a file: `[logging].file`, else beside the database, else (in demo
/// mode, where the database lives in memory) the platform state directory.
pub fn log_file_path(config: &Config, db_path: &Path, demo: bool) -> PathBuf {
    if let Some(path) = config.log_file() {
        return PathBuf::from(path);
    }
    if demo {
        let root = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(env::temp_dir);
        return root.join(tasktable_db::APP_NAME).join(LOG_FILE);
    }
    db_path.with_file_name(LOG_FILE)
}

pub fn init(config: &Config, db_path: &Path, demo: bool) -> Result<PathBuf> {
    let path = log_file_path(config, db_path, demo);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| {
            format!(
                "open log file {} -- set [logging].file to a writable path",
                path.display()
            )
        })?;

    Builder::from_env(Env::new().filter_or(LOG_ENV, config.log_level()))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .context("initialize logger")?;
    Ok(path)
}
