// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use tasktable_app::{StatusFilter, TaskRow};
use tasktable_db::Store;

pub struct DbRuntime<'a> {
    store: &'a Store,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl tasktable_tui::AppRuntime for DbRuntime<'_> {
    fn load_rows(&mut self, filter: Option<StatusFilter>) -> Result<Vec<TaskRow>> {
        match filter {
            Some(filter) => self.store.fetch_by_status(filter.as_str()),
            None => self.store.fetch_all(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DbRuntime;
    use anyhow::Result;
    use tasktable_app::{
        AppCommand, AppEvent, AppState, FieldEdit, StatusFilter, TaskColumn, TaskId,
    };
    use tasktable_db::Store;
    use tasktable_testkit::{TaskFaker, seed_tasks, survey_and_audit};
    use tasktable_tui::AppRuntime;

    fn seeded_store() -> Result<Store> {
        let store = Store::open_memory()?;
        store.ensure_schema()?;
        seed_tasks(store.raw_connection(), &survey_and_audit())?;
        Ok(store)
    }

    fn show(
        state: &mut AppState,
        runtime: &mut DbRuntime<'_>,
        filter: Option<StatusFilter>,
    ) -> Result<()> {
        let rows = runtime.load_rows(filter)?;
        state.dispatch(AppCommand::ShowRows { filter, rows });
        Ok(())
    }

    fn replace_focused(state: &mut AppState, text: &str) {
        state.dispatch(AppCommand::EditField(FieldEdit::Clear));
        for ch in text.chars() {
            state.dispatch(AppCommand::EditField(FieldEdit::Insert(ch)));
        }
    }

    #[test]
    fn load_rows_routes_filters_to_the_store() -> Result<()> {
        let store = Store::open_memory()?;
        store.ensure_schema()?;
        seed_tasks(store.raw_connection(), &TaskFaker::new(9).tasks(40))?;
        let mut runtime = DbRuntime::new(&store);

        assert_eq!(runtime.load_rows(None)?, store.fetch_all()?);
        for filter in StatusFilter::ALL {
            let rows = runtime.load_rows(Some(filter))?;
            assert!(rows.iter().all(|row| row.status == filter.as_str()));
            assert_eq!(rows, store.fetch_by_status(filter.as_str())?);
        }
        Ok(())
    }

    #[test]
    fn edit_changes_view_and_leaves_storage_alone() -> Result<()> {
        let store = seeded_store()?;
        let mut runtime = DbRuntime::new(&store);
        let mut state = AppState::default();
        show(&mut state, &mut runtime, None)?;

        let performer = TaskColumn::Performer.index();
        assert_eq!(state.grid.cell(0, performer), Some("Alice"));
        assert!(state.grid.is_column_hidden(TaskColumn::Status.index()));

        state.dispatch(AppCommand::ActivateRow(0));
        assert_eq!(state.editor.inputs().len(), TaskColumn::ALL.len());
        for _ in 0..performer {
            state.dispatch(AppCommand::EditField(FieldEdit::NextField));
        }
        replace_focused(&mut state, "Carol");
        let events = state.dispatch(AppCommand::ConfirmEdit);

        assert!(events.contains(&AppEvent::RowUpdated {
            id: TaskId::new(1),
            row: 0
        }));
        assert_eq!(state.grid.cell(0, performer), Some("Carol"));
        assert_eq!(state.grid.cell(1, performer), Some("Bob"));
        assert_eq!(store.fetch_all()?[0].performer, "Alice");

        show(&mut state, &mut runtime, Some(StatusFilter::Waiting))?;
        assert_eq!(state.grid.cell(0, performer), Some("Alice"));
        Ok(())
    }

    #[test]
    fn waiting_filter_then_edit_performer_stays_in_view() -> Result<()> {
        let store = seeded_store()?;
        let mut runtime = DbRuntime::new(&store);
        let mut state = AppState::default();
        show(&mut state, &mut runtime, None)?;

        let events = state.dispatch(AppCommand::Filter(StatusFilter::Waiting));
        assert_eq!(events, vec![AppEvent::FilterRequested(StatusFilter::Waiting)]);
        show(&mut state, &mut runtime, Some(StatusFilter::Waiting))?;
        assert_eq!(state.grid.row_count(), 1);
        assert_eq!(state.grid.row_identifier(0), Some(TaskId::new(1)));

        state.dispatch(AppCommand::ActivateRow(0));
        assert!(state.editor.is_open());
        let performer = TaskColumn::Performer.index();
        for _ in 0..performer {
            state.dispatch(AppCommand::EditField(FieldEdit::NextField));
        }
        replace_focused(&mut state, "Carol");
        let events = state.dispatch(AppCommand::ConfirmEdit);

        assert!(events.contains(&AppEvent::RowUpdated {
            id: TaskId::new(1),
            row: 0
        }));
        assert!(!state.editor.is_open());
        assert_eq!(state.active_filter, Some(StatusFilter::Waiting));
        assert_eq!(state.grid.cell(0, performer), Some("Carol"));
        assert_eq!(
            state.grid.cell(0, TaskColumn::Status.index()),
            Some("waiting")
        );
        assert_eq!(store.fetch_by_status("waiting")?[0].performer, "Alice");
        Ok(())
    }

    #[test]
    fn edit_for_row_filtered_away_is_reported_stale() -> Result<()> {
        let store = seeded_store()?;
        let mut runtime = DbRuntime::new(&store);
        let mut state = AppState::default();
        show(&mut state, &mut runtime, None)?;

        state.dispatch(AppCommand::ActivateRow(0));
        replace_focused(&mut state, "Renamed");
        show(&mut state, &mut runtime, Some(StatusFilter::InProgress))?;
        let before = state.grid.clone();

        let events = state.dispatch(AppCommand::ConfirmEdit);
        assert!(events.contains(&AppEvent::StaleRow(TaskId::new(1))));
        assert_eq!(state.grid, before);
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|line| line.contains("no longer displayed"))
        );
        Ok(())
    }

    #[test]
    fn silent_stale_updates_keep_status_line() -> Result<()> {
        let store = seeded_store()?;
        let mut runtime = DbRuntime::new(&store);
        let mut state = AppState {
            silent_stale_updates: true,
            ..AppState::default()
        };
        show(&mut state, &mut runtime, None)?;

        state.dispatch(AppCommand::ActivateRow(1));
        show(&mut state, &mut runtime, Some(StatusFilter::Waiting))?;
        let status_before = state.status_line.clone();

        let events = state.dispatch(AppCommand::ConfirmEdit);
        assert!(events.contains(&AppEvent::StaleRow(TaskId::new(2))));
        assert_eq!(state.status_line, status_before);
        Ok(())
    }
}
