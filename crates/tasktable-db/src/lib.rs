// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use log::{debug, info};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row, params};
use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};
use tasktable_app::{TaskColumn, TaskId, TaskRow};

pub const APP_NAME: &str = "tasktable";
pub const DEFAULT_DB_FILE: &str = "tasks_database.db";

const TASKS_TABLE: &str = "tasks";

const SELECT_TASKS: &str = "
    SELECT id, item, macroregion, region, assignment_date, performer, status
    FROM tasks
";

const DEMO_TASKS: &[[&str; 6]] = &[
    ["Survey", "North", "R1", "2024-01-01", "Alice", "waiting"],
    ["Audit", "South", "R2", "2024-02-01", "Bob", "in progress"],
    ["Inventory", "North", "R3", "2024-02-14", "Carol", "completed"],
    ["Inspection", "East", "R4", "2024-03-03", "Dmitri", "in progress"],
    ["Calibration", "West", "R5", "2024-03-20", "Erin", "waiting"],
    ["Handover", "South", "R6", "2024-04-02", "Farid", "on hold"],
];

/// Owns the SQLite connection backing the task table. Dropping the store
/// closes the connection.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        info!("opened database {}", path.display());
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    /// Creates the `tasks` table when absent. An existing table must carry
    /// every required column; nothing is migrated.
    pub fn ensure_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(include_str!("sql/schema.sql"))
            .context("create schema")?;
        validate_schema(&self.conn)?;
        debug!("schema ready");
        Ok(())
    }

    pub fn fetch_all(&self) -> Result<Vec<TaskRow>> {
        let sql = format!("{SELECT_TASKS} ORDER BY id ASC");
        let mut stmt = self.conn.prepare(&sql).context("prepare tasks query")?;
        let rows = stmt
            .query_map([], task_from_row)
            .context("query tasks")?;

        let tasks = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("collect tasks")?;
        debug!("fetched {} tasks", tasks.len());
        Ok(tasks)
    }

    /// Rows whose status equals `status` exactly (case-sensitive), in the
    /// same relative order as [`Store::fetch_all`].
    pub fn fetch_by_status(&self, status: &str) -> Result<Vec<TaskRow>> {
        let sql = format!("{SELECT_TASKS} WHERE status = ? ORDER BY id ASC");
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare filtered tasks query")?;
        let rows = stmt
            .query_map(params![status], task_from_row)
            .with_context(|| format!("query tasks with status {status:?}"))?;

        let tasks = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("collect tasks with status {status:?}"))?;
        debug!("fetched {} tasks with status {status:?}", tasks.len());
        Ok(tasks)
    }

    pub fn seed_demo_data(&self) -> Result<()> {
        for fields in DEMO_TASKS {
            self.conn
                .execute(
                    "
                    INSERT INTO tasks (
                      item, macroregion, region, assignment_date, performer, status
                    ) VALUES (?, ?, ?, ?, ?, ?)
                    ",
                    params![fields[0], fields[1], fields[2], fields[3], fields[4], fields[5]],
                )
                .with_context(|| format!("insert demo task {}", fields[0]))?;
        }
        info!("seeded {} demo tasks", DEMO_TASKS.len());
        Ok(())
    }
}

pub fn default_db_path() -> PathBuf {
    if let Some(override_path) = env::var_os("TASKTABLE_DB_PATH") {
        return PathBuf::from(override_path);
    }
    PathBuf::from(DEFAULT_DB_FILE)
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: TaskId::new(row.get(0)?),
        item: text_column(row, 1)?,
        macroregion: text_column(row, 2)?,
        region: text_column(row, 3)?,
        assignment_date: text_column(row, 4)?,
        performer: text_column(row, 5)?,
        status: text_column(row, 6)?,
    })
}

// Columns are declared TEXT but SQLite stores whatever it is given.
fn text_column(row: &Row<'_>, index: usize) -> rusqlite::Result<String> {
    Ok(value_ref_to_string(row.get_ref(index)?))
}

fn value_ref_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(value) => value.to_string(),
        ValueRef::Real(value) => value.to_string(),
        ValueRef::Text(value) | ValueRef::Blob(value) => {
            String::from_utf8_lossy(value).into_owned()
        }
    }
}

fn validate_schema(conn: &Connection) -> Result<()> {
    let columns = table_columns(conn, TASKS_TABLE)?;
    let missing = std::iter::once("id")
        .chain(TaskColumn::ALL.iter().map(|column| column.sql_name()))
        .filter(|column| !columns.contains(*column))
        .collect::<Vec<_>>();

    if !missing.is_empty() {
        bail!(
            "table `{TASKS_TABLE}` is missing required columns: {}; point [storage].db_path at a tasktable database",
            missing.join(", ")
        );
    }
    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    let names = rows
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(names)
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA busy_timeout = 5000;")
        .context("configure sqlite pragmas")
}
