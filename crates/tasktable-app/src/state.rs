// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use log::{debug, warn};

use crate::{
    ColumnVisibility, DetailEditor, FieldEdit, StatusFilter, TaskColumn, TaskGrid, TaskId,
    TaskRow,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub grid: TaskGrid,
    pub editor: DetailEditor,
    pub active_filter: Option<StatusFilter>,
    pub status_line: Option<String>,
    pub silent_stale_updates: bool,
}

impl Default for AppState {
    fn default() -> Self {
        let mut grid = TaskGrid::default();
        grid.hide_column(TaskColumn::Status);
        Self {
            grid,
            editor: DetailEditor::default(),
            active_filter: None,
            status_line: None,
            silent_stale_updates: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    ShowRows {
        filter: Option<StatusFilter>,
        rows: Vec<TaskRow>,
    },
    Filter(StatusFilter),
    ActivateRow(usize),
    EditField(FieldEdit),
    ConfirmEdit,
    DismissEdit,
    ToggleStatusColumn,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    FilterRequested(StatusFilter),
    RowsRendered {
        filter: Option<StatusFilter>,
        count: usize,
    },
    EditorOpened(TaskId),
    EditorClosed,
    RowUpdated {
        id: TaskId,
        row: usize,
    },
    StaleRow(TaskId),
    ColumnVisibilityChanged {
        column: TaskColumn,
        hidden: bool,
    },
    StatusUpdated(String),
    StatusCleared,
}

/// Outcome of pushing edited values into the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowUpdate {
    Applied { row: usize },
    /// The row is no longer displayed, usually because a filter replaced the
    /// grid contents while the editor was open.
    Stale(TaskId),
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::ShowRows { filter, rows } => {
                self.grid.render(&rows);
                self.active_filter = filter;
                let mut events = vec![AppEvent::RowsRendered {
                    filter,
                    count: rows.len(),
                }];
                if let Some(filter) = filter {
                    events.push(self.set_status(&format!(
                        "filter {} ({} rows)",
                        filter.as_str(),
                        rows.len()
                    )));
                }
                events
            }
            AppCommand::Filter(filter) => vec![AppEvent::FilterRequested(filter)],
            AppCommand::ActivateRow(row) => self.activate_row(row),
            AppCommand::EditField(edit) => {
                self.editor.apply(edit);
                Vec::new()
            }
            AppCommand::ConfirmEdit => self.confirm_edit(),
            AppCommand::DismissEdit => {
                if self.editor.dismiss() {
                    vec![AppEvent::EditorClosed]
                } else {
                    Vec::new()
                }
            }
            AppCommand::ToggleStatusColumn => self.toggle_status_column(),
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    /// Writes `values` over the displayed cells of the row holding `id`.
    /// Storage is never touched.
    pub fn apply_row_update(&mut self, id: TaskId, values: &[String]) -> RowUpdate {
        match self.grid.find_row_by_identifier(id) {
            Some(row) => {
                self.grid.apply_edit(row, values);
                debug!("applied edit to task {id} at row {row}");
                RowUpdate::Applied { row }
            }
            None => {
                warn!("edit for task {id} dropped: row no longer displayed");
                RowUpdate::Stale(id)
            }
        }
    }

    fn activate_row(&mut self, row: usize) -> Vec<AppEvent> {
        let Some(id) = self.grid.row_identifier(row) else {
            return vec![self.set_status("no row to open")];
        };
        let values = self
            .grid
            .row_values(row)
            .map(<[String]>::to_vec)
            .unwrap_or_default();

        let mut events = Vec::new();
        if self.editor.dismiss() {
            events.push(AppEvent::EditorClosed);
        }
        self.editor.open(id, &values);
        events.push(AppEvent::EditorOpened(id));
        events
    }

    fn confirm_edit(&mut self) -> Vec<AppEvent> {
        let Some(submission) = self.editor.confirm() else {
            return Vec::new();
        };

        let mut events = vec![AppEvent::EditorClosed];
        match self.apply_row_update(submission.id, &submission.values) {
            RowUpdate::Applied { row } => {
                events.push(AppEvent::RowUpdated {
                    id: submission.id,
                    row,
                });
                events.push(self.set_status(&format!(
                    "task {} updated in view (not saved)",
                    submission.id
                )));
            }
            RowUpdate::Stale(id) => {
                events.push(AppEvent::StaleRow(id));
                if !self.silent_stale_updates {
                    events.push(self.set_status(&format!(
                        "task {id} is no longer displayed -- edit discarded"
                    )));
                }
            }
        }
        events
    }

    fn toggle_status_column(&mut self) -> Vec<AppEvent> {
        let column = TaskColumn::Status;
        match self.grid.toggle_column(column) {
            ColumnVisibility::Hidden => vec![
                AppEvent::ColumnVisibilityChanged {
                    column,
                    hidden: true,
                },
                self.set_status("status column hidden"),
            ],
            ColumnVisibility::Shown => vec![
                AppEvent::ColumnVisibilityChanged {
                    column,
                    hidden: false,
                },
                self.set_status("status column shown"),
            ],
        }
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState, RowUpdate};
    use crate::{FieldEdit, StatusFilter, TaskColumn, TaskId, TaskRow};

    fn task(id: i64, item: &str, performer: &str, status: &str) -> TaskRow {
        TaskRow {
            id: TaskId::new(id),
            item: item.to_owned(),
            macroregion: "North".to_owned(),
            region: "R1".to_owned(),
            assignment_date: "2024-01-01".to_owned(),
            performer: performer.to_owned(),
            status: status.to_owned(),
        }
    }

    fn loaded_state() -> AppState {
        let mut state = AppState::default();
        state.dispatch(AppCommand::ShowRows {
            filter: None,
            rows: vec![
                task(1, "Survey", "Alice", "waiting"),
                task(2, "Audit", "Bob", "in progress"),
            ],
        });
        state
    }

    fn type_text(state: &mut AppState, text: &str) {
        for ch in text.chars() {
            state.dispatch(AppCommand::EditField(FieldEdit::Insert(ch)));
        }
    }

    #[test]
    fn status_column_starts_hidden() {
        let state = AppState::default();
        assert!(state.grid.is_column_hidden(TaskColumn::Status.index()));
    }

    #[test]
    fn filter_command_only_requests_a_query() {
        let mut state = loaded_state();
        let before = state.grid.clone();

        let events = state.dispatch(AppCommand::Filter(StatusFilter::Waiting));
        assert_eq!(events, vec![AppEvent::FilterRequested(StatusFilter::Waiting)]);
        assert_eq!(state.grid, before);
        assert_eq!(state.active_filter, None);
    }

    #[test]
    fn show_rows_records_filter_and_status() {
        let mut state = loaded_state();
        let events = state.dispatch(AppCommand::ShowRows {
            filter: Some(StatusFilter::Waiting),
            rows: vec![task(1, "Survey", "Alice", "waiting")],
        });

        assert_eq!(state.active_filter, Some(StatusFilter::Waiting));
        assert_eq!(state.grid.row_count(), 1);
        assert_eq!(
            events,
            vec![
                AppEvent::RowsRendered {
                    filter: Some(StatusFilter::Waiting),
                    count: 1,
                },
                AppEvent::StatusUpdated("filter waiting (1 rows)".to_owned()),
            ],
        );
    }

    #[test]
    fn activate_row_opens_editor_with_displayed_values() {
        let mut state = loaded_state();
        let events = state.dispatch(AppCommand::ActivateRow(1));

        assert_eq!(events, vec![AppEvent::EditorOpened(TaskId::new(2))]);
        let texts = state
            .editor
            .inputs()
            .iter()
            .map(|input| input.text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            texts,
            vec!["Audit", "North", "R1", "2024-01-01", "Bob", "in progress"],
        );
    }

    #[test]
    fn activating_twice_keeps_a_single_editor() {
        let mut state = loaded_state();
        state.dispatch(AppCommand::ActivateRow(0));
        let events = state.dispatch(AppCommand::ActivateRow(1));

        assert_eq!(
            events,
            vec![AppEvent::EditorClosed, AppEvent::EditorOpened(TaskId::new(2))],
        );
        assert_eq!(state.editor.inputs().len(), 6);
        assert_eq!(state.editor.inputs()[0].text, "Audit");
    }

    #[test]
    fn activate_missing_row_reports_status() {
        let mut state = loaded_state();
        let events = state.dispatch(AppCommand::ActivateRow(9));

        assert!(!state.editor.is_open());
        assert_eq!(
            events,
            vec![AppEvent::StatusUpdated("no row to open".to_owned())],
        );
    }

    #[test]
    fn confirm_edit_updates_only_the_matching_row() {
        let mut state = loaded_state();
        let other_before = state.grid.row_values(1).map(<[String]>::to_vec);

        state.dispatch(AppCommand::ActivateRow(0));
        for _ in 0..4 {
            state.dispatch(AppCommand::EditField(FieldEdit::NextField));
        }
        state.dispatch(AppCommand::EditField(FieldEdit::Clear));
        type_text(&mut state, "Carol");
        let events = state.dispatch(AppCommand::ConfirmEdit);

        assert!(events.contains(&AppEvent::RowUpdated {
            id: TaskId::new(1),
            row: 0,
        }));
        assert_eq!(state.grid.cell(0, TaskColumn::Performer.index()), Some("Carol"));
        assert_eq!(state.grid.row_values(1).map(<[String]>::to_vec), other_before);
        assert!(!state.editor.is_open());
    }

    #[test]
    fn dismiss_discards_edits() {
        let mut state = loaded_state();
        let before = state.grid.clone();

        state.dispatch(AppCommand::ActivateRow(0));
        type_text(&mut state, " draft");
        let events = state.dispatch(AppCommand::DismissEdit);

        assert_eq!(events, vec![AppEvent::EditorClosed]);
        assert_eq!(state.grid, before);
        assert!(state.dispatch(AppCommand::DismissEdit).is_empty());
    }

    #[test]
    fn apply_row_update_with_unknown_id_changes_nothing() {
        let mut state = loaded_state();
        let before = state.grid.clone();

        let outcome = state.apply_row_update(TaskId::new(99), &["x".to_owned()]);
        assert_eq!(outcome, RowUpdate::Stale(TaskId::new(99)));
        assert_eq!(state.grid, before);
    }

    #[test]
    fn stale_confirm_is_reported_unless_silenced() {
        let mut state = loaded_state();
        state.dispatch(AppCommand::ActivateRow(1));
        state.dispatch(AppCommand::ShowRows {
            filter: Some(StatusFilter::Waiting),
            rows: vec![task(1, "Survey", "Alice", "waiting")],
        });
        let events = state.dispatch(AppCommand::ConfirmEdit);
        assert!(events.contains(&AppEvent::StaleRow(TaskId::new(2))));
        assert_eq!(
            state.status_line.as_deref(),
            Some("task 2 is no longer displayed -- edit discarded"),
        );

        let mut silent = loaded_state();
        silent.silent_stale_updates = true;
        silent.dispatch(AppCommand::ActivateRow(1));
        silent.dispatch(AppCommand::ShowRows {
            filter: None,
            rows: vec![task(1, "Survey", "Alice", "waiting")],
        });
        let before = silent.grid.clone();
        let events = silent.dispatch(AppCommand::ConfirmEdit);
        assert_eq!(
            events,
            vec![AppEvent::EditorClosed, AppEvent::StaleRow(TaskId::new(2))],
        );
        assert_eq!(silent.status_line, None);
        assert_eq!(silent.grid, before);
    }

    #[test]
    fn toggle_status_column_round_trips() {
        let mut state = loaded_state();
        state.dispatch(AppCommand::ToggleStatusColumn);
        assert!(!state.grid.is_column_hidden(TaskColumn::Status.index()));
        assert_eq!(state.status_line.as_deref(), Some("status column shown"));

        state.dispatch(AppCommand::ToggleStatusColumn);
        assert!(state.grid.is_column_hidden(TaskColumn::Status.index()));
    }

    #[test]
    fn clear_status_resets_line() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::SetStatus("hello".to_owned()));
        assert_eq!(state.status_line.as_deref(), Some("hello"));

        let events = state.dispatch(AppCommand::ClearStatus);
        assert_eq!(events, vec![AppEvent::StatusCleared]);
        assert_eq!(state.status_line, None);
    }
}
