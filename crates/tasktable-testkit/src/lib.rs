// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use std::path::PathBuf;
use tasktable_app::{StatusFilter, TaskId, TaskRow};
use time::macros::{date, format_description};
use time::{Date, Duration};

const ITEMS: [&str; 10] = [
    "Survey",
    "Audit",
    "Inventory",
    "Inspection",
    "Calibration",
    "Handover",
    "Sampling",
    "Mapping",
    "Review",
    "Training",
];

const MACROREGIONS: [&str; 5] = ["North", "South", "East", "West", "Central"];

const PERFORMERS: [&str; 12] = [
    "Alice", "Bob", "Carol", "Dmitri", "Erin", "Farid", "Grace", "Hiro", "Ines", "Jonas",
    "Kasia", "Lena",
];

// Statuses outside the three filter literals; reachable only unfiltered.
const OFF_FILTER_STATUSES: [&str; 3] = ["on hold", "Waiting", "waiting "];

const REFERENCE_DATE: Date = date!(2024 - 01 - 01);

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Deterministic generator of task rows. Identifiers are assigned in
/// sequence starting at 1, matching what SQLite hands out for a fresh table.
#[derive(Debug, Clone)]
pub struct TaskFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl TaskFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    pub fn task(&mut self) -> TaskRow {
        let status = if self.rng.int_n(5) == 0 {
            self.pick(&OFF_FILTER_STATUSES).to_owned()
        } else {
            StatusFilter::ALL[self.rng.int_n(StatusFilter::ALL.len())]
                .as_str()
                .to_owned()
        };
        self.task_with_status(&status)
    }

    pub fn task_with_status(&mut self, status: &str) -> TaskRow {
        let id = TaskId::new(self.next_id);
        self.next_id += 1;
        let region_number = self.rng.int_n(40) + 1;
        TaskRow {
            id,
            item: self.pick(&ITEMS).to_owned(),
            macroregion: self.pick(&MACROREGIONS).to_owned(),
            region: format!("R{region_number}"),
            assignment_date: self.assignment_date(),
            performer: self.pick(&PERFORMERS).to_owned(),
            status: status.to_owned(),
        }
    }

    pub fn tasks(&mut self, count: usize) -> Vec<TaskRow> {
        (0..count).map(|_| self.task()).collect()
    }

    fn assignment_date(&mut self) -> String {
        let offset = Duration::days(self.rng.int_n(365) as i64);
        let assigned: Date = REFERENCE_DATE.saturating_add(offset);
        assigned
            .format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_default()
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.rng.int_n(values.len())]
    }
}

/// The two-row fixture used by the end-to-end scenario.
pub fn survey_and_audit() -> Vec<TaskRow> {
    vec![
        TaskRow {
            id: TaskId::new(1),
            item: "Survey".to_owned(),
            macroregion: "North".to_owned(),
            region: "R1".to_owned(),
            assignment_date: "2024-01-01".to_owned(),
            performer: "Alice".to_owned(),
            status: "waiting".to_owned(),
        },
        TaskRow {
            id: TaskId::new(2),
            item: "Audit".to_owned(),
            macroregion: "South".to_owned(),
            region: "R2".to_owned(),
            assignment_date: "2024-02-01".to_owned(),
            performer: "Bob".to_owned(),
            status: "in progress".to_owned(),
        },
    ]
}

/// Inserts `rows` with their explicit identifiers. The table must exist.
pub fn seed_tasks(conn: &Connection, rows: &[TaskRow]) -> Result<()> {
    for row in rows {
        conn.execute(
            "
            INSERT INTO tasks (
              id, item, macroregion, region, assignment_date, performer, status
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                row.id.get(),
                row.item,
                row.macroregion,
                row.region,
                row.assignment_date,
                row.performer,
                row.status,
            ],
        )
        .with_context(|| format!("seed task {}", row.id))?;
    }
    Ok(())
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("tasks_database.db");
    Ok((dir, db_path))
}

#[cfg(test)]
mod tests {
    use super::{TaskFaker, survey_and_audit};

    #[test]
    fn faker_is_deterministic_per_seed() {
        let first = TaskFaker::new(7).tasks(20);
        let second = TaskFaker::new(7).tasks(20);
        assert_eq!(first, second);
        assert_ne!(first, TaskFaker::new(8).tasks(20));
    }

    #[test]
    fn faker_assigns_sequential_ids_and_iso_dates() {
        let rows = TaskFaker::new(3).tasks(5);
        for (index, row) in rows.iter().enumerate() {
            assert_eq!(row.id.get(), index as i64 + 1);
            assert_eq!(row.assignment_date.len(), 10);
            assert!(row.assignment_date.starts_with("2024-"));
        }
    }

    #[test]
    fn scenario_fixture_has_two_rows() {
        let rows = survey_and_audit();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].performer, "Alice");
    }
}
