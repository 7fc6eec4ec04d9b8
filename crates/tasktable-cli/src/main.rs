// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use log::info;
use runtime::DbRuntime;
use std::env;
use std::path::{Path, PathBuf};
use tasktable_app::{AppState, StatusFilter};
use tasktable_db::Store;
use tasktable_tui::TuiOptions;

const MEMORY_DB: &str = ":memory:";

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let launch = match parse_args(env::args().skip(1))? {
        CliAction::Help => {
            print_usage();
            return Ok(());
        }
        CliAction::Launch(launch) => launch,
    };

    let config_path = match &launch.config_path {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("load config {}", config_path.display()))?;

    let db_path = resolve_db_path(&launch, &config)?;
    let log_path = logging::init(&config, &db_path, launch.demo)?;
    info!(
        "opening {} with config {} (log file {})",
        db_path.display(),
        config_path.display(),
        log_path.display()
    );

    let store = open_store(&db_path, launch.demo)?;
    let mut state = AppState {
        silent_stale_updates: config.silent_stale_updates(),
        ..AppState::default()
    };
    let mut runtime = DbRuntime::new(&store);
    tasktable_tui::run_app(
        &mut state,
        &mut runtime,
        TuiOptions {
            double_click: config.double_click(),
            initial_filter: launch.filter,
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliAction {
    Help,
    Launch(LaunchOptions),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LaunchOptions {
    config_path: Option<PathBuf>,
    db_path: Option<PathBuf>,
    demo: bool,
    filter: Option<StatusFilter>,
}

/// `tasktable [OPTIONS] [DB_PATH]`. Help short-circuits everything after it.
fn parse_args<I, S>(args: I) -> Result<CliAction>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut launch = LaunchOptions::default();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let arg = arg.as_ref();
        match arg {
            "-h" | "--help" => return Ok(CliAction::Help),
            "--demo" => launch.demo = true,
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config needs a file path"))?;
                launch.config_path = Some(PathBuf::from(value.as_ref()));
            }
            "--filter" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--filter needs a status"))?;
                launch.filter = Some(parse_filter(value.as_ref())?);
            }
            flag if flag.starts_with('-') => {
                bail!("unknown option {flag:?}; see `tasktable --help`");
            }
            path => {
                if let Some(previous) = &launch.db_path {
                    bail!(
                        "expected one database path, got {} and {path}",
                        previous.display()
                    );
                }
                tasktable_db::validate_db_path(path)?;
                launch.db_path = Some(PathBuf::from(path));
            }
        }
    }

    if launch.demo && launch.db_path.is_some() {
        bail!("--demo runs on an in-memory database; drop the database path");
    }
    Ok(CliAction::Launch(launch))
}

fn parse_filter(value: &str) -> Result<StatusFilter> {
    StatusFilter::parse(value).ok_or_else(|| {
        let choices = StatusFilter::ALL
            .iter()
            .map(|filter| format!("{:?}", filter.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        anyhow!("unknown status {value:?} for --filter; expected one of {choices}")
    })
}

/// Command line path, then `[storage].db_path`, then `TASKTABLE_DB_PATH`, then
/// the working-directory default.
fn resolve_db_path(launch: &LaunchOptions, config: &Config) -> Result<PathBuf> {
    if launch.demo {
        return Ok(PathBuf::from(MEMORY_DB));
    }
    let path = match &launch.db_path {
        Some(path) => path.clone(),
        None => config.db_path(),
    };
    tasktable_db::validate_db_path(&path.to_string_lossy())?;
    Ok(path)
}

/// Opens the store, creates or checks the `tasks` table, seeds demo rows, and
/// reads the table once so a broken database fails before the terminal is
/// taken over.
fn open_store(db_path: &Path, demo: bool) -> Result<Store> {
    let store = Store::open(db_path).with_context(|| {
        format!(
            "open database {}; pass a path or set [storage].db_path",
            db_path.display()
        )
    })?;
    store.ensure_schema()?;
    if demo {
        store.seed_demo_data()?;
    }
    let count = store
        .fetch_all()
        .with_context(|| format!("read tasks from {}", db_path.display()))?
        .len();
    info!("{count} tasks readable in {}", db_path.display());
    Ok(store)
}

fn print_usage() {
    println!("usage: tasktable [OPTIONS] [DB_PATH]");
    println!();
    println!("Browse the tasks table of a SQLite database.");
    println!();
    println!(
        "  DB_PATH               Database file (default: {})",
        tasktable_db::DEFAULT_DB_FILE
    );
    println!("  --filter <status>     Start filtered by \"in progress\", \"waiting\", \"completed\"");
    println!("  --demo                Use an in-memory database with sample tasks");
    println!("  --config <path>       Read settings from this TOML file");
    println!("  -h, --help            Show this help");
    println!();
    println!("Keys: 1/2/3 filter, Enter edit, s status column, q quit");
    println!(
        "Environment: TASKTABLE_CONFIG_PATH, TASKTABLE_DB_PATH, {}",
        logging::LOG_ENV
    );
}

#[cfg(test)]
mod tests {
    use super::{CliAction, LaunchOptions, MEMORY_DB, open_store, parse_args, resolve_db_path};
    use crate::config::{Config, Storage};
    use anyhow::Result;
    use std::path::PathBuf;
    use tasktable_app::StatusFilter;
    use tasktable_db::Store;
    use tasktable_testkit::{seed_tasks, survey_and_audit, temp_db_path};

    fn launch(args: &[&str]) -> Result<LaunchOptions> {
        match parse_args(args.iter().copied())? {
            CliAction::Launch(launch) => Ok(launch),
            CliAction::Help => anyhow::bail!("expected a launch for {args:?}"),
        }
    }

    fn config_with_db(path: &str) -> Config {
        Config {
            storage: Storage {
                db_path: Some(path.to_owned()),
            },
            ..Config::default()
        }
    }

    #[test]
    fn bare_invocation_launches_with_configured_database() -> Result<()> {
        let launch = launch(&[])?;
        assert_eq!(launch, LaunchOptions::default());
        assert_eq!(
            resolve_db_path(&launch, &config_with_db("/srv/tasks.db"))?,
            PathBuf::from("/srv/tasks.db")
        );
        Ok(())
    }

    #[test]
    fn positional_path_beats_configured_path() -> Result<()> {
        let launch = launch(&["field/tasks.db", "--filter", "waiting"])?;
        assert_eq!(launch.db_path, Some(PathBuf::from("field/tasks.db")));
        assert_eq!(launch.filter, Some(StatusFilter::Waiting));
        assert_eq!(
            resolve_db_path(&launch, &config_with_db("/srv/tasks.db"))?,
            PathBuf::from("field/tasks.db")
        );
        Ok(())
    }

    #[test]
    fn filter_accepts_each_stored_literal() -> Result<()> {
        for filter in StatusFilter::ALL {
            assert_eq!(launch(&["--filter", filter.as_str()])?.filter, Some(filter));
        }
        Ok(())
    }

    #[test]
    fn filter_rejects_other_spellings_and_lists_choices() {
        for value in ["Waiting", "in-progress", "done"] {
            let error = parse_args(["--filter", value]).expect_err("spelling should be rejected");
            let message = error.to_string();
            assert!(message.contains(value), "got {message}");
            assert!(message.contains("\"in progress\""), "got {message}");
        }
        let error = parse_args(["--filter"]).expect_err("missing value");
        assert!(error.to_string().contains("--filter needs a status"));
    }

    #[test]
    fn help_wins_over_later_arguments() -> Result<()> {
        assert_eq!(parse_args(["-h", "--bogus"])?, CliAction::Help);
        assert_eq!(parse_args(["a.db", "--help"])?, CliAction::Help);
        Ok(())
    }

    #[test]
    fn rejects_conflicting_or_malformed_arguments() {
        let cases: [(&[&str], &str); 5] = [
            (&["one.db", "two.db"], "expected one database path"),
            (&["--demo", "tasks.db"], "--demo runs on an in-memory database"),
            (&["--verbose"], "unknown option \"--verbose\""),
            (&["--config"], "--config needs a file path"),
            (&["sqlite://tasks.db"], "looks like a URI"),
        ];
        for (args, expected) in cases {
            let error = parse_args(args.iter().copied()).expect_err("arguments should fail");
            let message = error.to_string();
            assert!(message.contains(expected), "{args:?}: got {message}");
        }
    }

    #[test]
    fn demo_resolves_to_memory_and_seeds_every_status() -> Result<()> {
        let launch = launch(&["--demo", "--config", "/etc/tasktable.toml"])?;
        assert_eq!(launch.config_path, Some(PathBuf::from("/etc/tasktable.toml")));
        let db_path = resolve_db_path(&launch, &config_with_db("/srv/tasks.db"))?;
        assert_eq!(db_path, PathBuf::from(MEMORY_DB));

        let store = open_store(&db_path, true)?;
        for filter in StatusFilter::ALL {
            assert!(!store.fetch_by_status(filter.as_str())?.is_empty());
        }
        Ok(())
    }

    #[test]
    fn open_store_creates_missing_table_and_keeps_rows() -> Result<()> {
        let (_temp, path) = temp_db_path()?;

        let store = open_store(&path, false)?;
        assert!(store.fetch_all()?.is_empty());
        seed_tasks(store.raw_connection(), &survey_and_audit())?;
        drop(store);

        let reopened = open_store(&path, false)?;
        assert_eq!(reopened.fetch_all()?, survey_and_audit());
        Ok(())
    }

    #[test]
    fn open_store_rejects_foreign_tasks_table() -> Result<()> {
        let (_temp, path) = temp_db_path()?;
        let foreign = Store::open(&path)?;
        foreign
            .raw_connection()
            .execute("CREATE TABLE tasks (id INTEGER PRIMARY KEY, title TEXT)", [])?;
        drop(foreign);

        let error = open_store(&path, false).expect_err("foreign schema should fail");
        let message = format!("{error:#}");
        assert!(message.contains("missing required columns"), "got {message}");
        assert!(message.contains("performer"), "got {message}");
        Ok(())
    }
}
