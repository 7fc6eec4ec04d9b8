// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::TaskId;

/// One persisted row of the `tasks` table.
///
/// Every text column is free-form: the status is an open set and the
/// assignment date is never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: TaskId,
    pub item: String,
    pub macroregion: String,
    pub region: String,
    pub assignment_date: String,
    pub performer: String,
    pub status: String,
}

impl TaskRow {
    /// Field text in grid column order, identifier excluded.
    pub fn display_values(&self) -> Vec<String> {
        TaskColumn::ALL
            .iter()
            .map(|column| self.field(*column).to_owned())
            .collect()
    }

    pub fn field(&self, column: TaskColumn) -> &str {
        match column {
            TaskColumn::Item => &self.item,
            TaskColumn::Macroregion => &self.macroregion,
            TaskColumn::Region => &self.region,
            TaskColumn::AssignmentDate => &self.assignment_date,
            TaskColumn::Performer => &self.performer,
            TaskColumn::Status => &self.status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskColumn {
    Item,
    Macroregion,
    Region,
    AssignmentDate,
    Performer,
    Status,
}

impl TaskColumn {
    pub const ALL: [Self; 6] = [
        Self::Item,
        Self::Macroregion,
        Self::Region,
        Self::AssignmentDate,
        Self::Performer,
        Self::Status,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Item => "Item",
            Self::Macroregion => "Macroregion",
            Self::Region => "Region",
            Self::AssignmentDate => "Assignment Date",
            Self::Performer => "Performer",
            Self::Status => "Status",
        }
    }

    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Macroregion => "macroregion",
            Self::Region => "region",
            Self::AssignmentDate => "assignment_date",
            Self::Performer => "performer",
            Self::Status => "status",
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Item => 0,
            Self::Macroregion => 1,
            Self::Region => 2,
            Self::AssignmentDate => 3,
            Self::Performer => 4,
            Self::Status => 5,
        }
    }
}

/// The three status literals bound to the filter buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusFilter {
    InProgress,
    Waiting,
    Completed,
}

impl StatusFilter {
    pub const ALL: [Self; 3] = [Self::InProgress, Self::Waiting, Self::Completed];

    /// Exact value matched against the `status` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in progress",
            Self::Waiting => "waiting",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in progress" => Some(Self::InProgress),
            "waiting" => Some(Self::Waiting),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub const fn shortcut(self) -> char {
        match self {
            Self::InProgress => '1',
            Self::Waiting => '2',
            Self::Completed => '3',
        }
    }

    pub fn from_shortcut(key: char) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|filter| filter.shortcut() == key)
    }

    pub fn position(self) -> usize {
        Self::ALL
            .iter()
            .position(|filter| *filter == self)
            .unwrap_or(0)
    }
}
