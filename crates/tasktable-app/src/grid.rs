// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use log::debug;
use std::collections::BTreeSet;

use crate::{TaskColumn, TaskId, TaskRow};

#[derive(Debug, Clone, PartialEq, Eq)]
struct GridRow {
    id: TaskId,
    cells: Vec<String>,
}

/// Read-only presentation grid for task rows.
///
/// The identifier of each row is kept as metadata and never rendered as a
/// column. Cells only change through [`TaskGrid::render`] and
/// [`TaskGrid::apply_edit`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskGrid {
    rows: Vec<GridRow>,
    hidden_columns: BTreeSet<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnVisibility {
    Hidden,
    Shown,
}

impl TaskGrid {
    pub fn column_count(&self) -> usize {
        TaskColumn::ALL.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Replaces every displayed row with `rows`, keeping their order.
    pub fn render(&mut self, rows: &[TaskRow]) {
        self.rows.clear();
        self.rows.extend(rows.iter().map(|row| GridRow {
            id: row.id,
            cells: row.display_values(),
        }));
        debug!("grid rendered {} rows", self.rows.len());
    }

    pub fn row_identifier(&self, row: usize) -> Option<TaskId> {
        self.rows.get(row).map(|row| row.id)
    }

    pub fn row_values(&self, row: usize) -> Option<&[String]> {
        self.rows.get(row).map(|row| row.cells.as_slice())
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|row| row.cells.get(column))
            .map(String::as_str)
    }

    pub fn find_row_by_identifier(&self, id: TaskId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    /// Overwrites the cells of `row` left to right. Values past the last
    /// column are ignored; cells without a value keep their text.
    pub fn apply_edit(&mut self, row: usize, values: &[String]) -> bool {
        let Some(target) = self.rows.get_mut(row) else {
            return false;
        };
        for (cell, value) in target.cells.iter_mut().zip(values) {
            cell.clone_from(value);
        }
        true
    }

    pub fn is_column_hidden(&self, column: usize) -> bool {
        self.hidden_columns.contains(&column)
    }

    pub fn visible_columns(&self) -> Vec<usize> {
        (0..self.column_count())
            .filter(|index| !self.hidden_columns.contains(index))
            .collect()
    }

    pub fn visible_cells(&self, row: usize) -> Vec<&str> {
        let Some(target) = self.rows.get(row) else {
            return Vec::new();
        };
        self.visible_columns()
            .into_iter()
            .filter_map(|column| target.cells.get(column).map(String::as_str))
            .collect()
    }

    /// Hidden columns keep their cells; only the rendered view skips them.
    pub fn hide_column(&mut self, column: TaskColumn) {
        self.hidden_columns.insert(column.index());
    }

    pub fn show_column(&mut self, column: TaskColumn) {
        self.hidden_columns.remove(&column.index());
    }

    pub fn toggle_column(&mut self, column: TaskColumn) -> ColumnVisibility {
        if self.is_column_hidden(column.index()) {
            self.show_column(column);
            ColumnVisibility::Shown
        } else {
            self.hide_column(column);
            ColumnVisibility::Hidden
        }
    }
}
