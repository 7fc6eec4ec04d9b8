// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use log::debug;

use crate::{TaskColumn, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorPhase {
    #[default]
    Closed,
    Open,
}

/// One text control of the detail editor. `cursor` counts chars, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorInput {
    pub label: String,
    pub text: String,
    pub cursor: usize,
}

impl EditorInput {
    fn new(label: String, text: String) -> Self {
        let cursor = text.chars().count();
        Self {
            label,
            text,
            cursor,
        }
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map_or(self.text.len(), |(offset, _)| offset)
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn insert(&mut self, ch: char) {
        let offset = self.byte_offset(self.cursor);
        self.text.insert(offset, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let offset = self.byte_offset(self.cursor);
        self.text.remove(offset);
    }

    fn delete(&mut self) {
        if self.cursor >= self.char_len() {
            return;
        }
        let offset = self.byte_offset(self.cursor);
        self.text.remove(offset);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEdit {
    Insert(char),
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    Clear,
    NextField,
    PrevField,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSubmission {
    pub id: TaskId,
    pub values: Vec<String>,
}

/// Modal form holding one text input per displayed field of a row.
///
/// Lifecycle: `Closed -> Open -> Closed`, leaving `Open` through either
/// [`DetailEditor::confirm`] or [`DetailEditor::dismiss`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailEditor {
    phase: EditorPhase,
    row_id: Option<TaskId>,
    inputs: Vec<EditorInput>,
    focus: usize,
}

impl DetailEditor {
    pub fn phase(&self) -> EditorPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase == EditorPhase::Open
    }

    pub fn row_id(&self) -> Option<TaskId> {
        self.row_id
    }

    pub fn inputs(&self) -> &[EditorInput] {
        &self.inputs
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focused_input(&self) -> Option<&EditorInput> {
        self.inputs.get(self.focus)
    }

    /// Rebuilds the inputs from scratch, one per value.
    pub fn open(&mut self, id: TaskId, values: &[String]) {
        self.inputs = values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let label = match TaskColumn::ALL.get(index) {
                    Some(column) => column.label().to_owned(),
                    None => format!("Field {}", index + 1),
                };
                EditorInput::new(label, value.clone())
            })
            .collect();
        self.row_id = Some(id);
        self.focus = 0;
        self.phase = EditorPhase::Open;
        debug!("editor opened for task {id} with {} fields", self.inputs.len());
    }

    pub fn apply(&mut self, edit: FieldEdit) {
        if !self.is_open() || self.inputs.is_empty() {
            return;
        }

        let len = self.inputs.len();
        match edit {
            FieldEdit::NextField => {
                self.focus = (self.focus + 1) % len;
                return;
            }
            FieldEdit::PrevField => {
                self.focus = (self.focus + len - 1) % len;
                return;
            }
            _ => {}
        }

        let Some(input) = self.inputs.get_mut(self.focus) else {
            return;
        };
        match edit {
            FieldEdit::Insert(ch) => input.insert(ch),
            FieldEdit::Backspace => input.backspace(),
            FieldEdit::Delete => input.delete(),
            FieldEdit::CursorLeft => input.cursor = input.cursor.saturating_sub(1),
            FieldEdit::CursorRight => input.cursor = (input.cursor + 1).min(input.char_len()),
            FieldEdit::CursorHome => input.cursor = 0,
            FieldEdit::CursorEnd => input.cursor = input.char_len(),
            FieldEdit::Clear => {
                input.text.clear();
                input.cursor = 0;
            }
            FieldEdit::NextField | FieldEdit::PrevField => {}
        }
    }

    /// Collects the input text in creation order and closes the editor.
    pub fn confirm(&mut self) -> Option<EditorSubmission> {
        if !self.is_open() {
            return None;
        }
        let id = self.row_id?;
        let values = self.inputs.iter().map(|input| input.text.clone()).collect();
        self.close();
        debug!("editor confirmed for task {id}");
        Some(EditorSubmission { id, values })
    }

    pub fn dismiss(&mut self) -> bool {
        if !self.is_open() {
            return false;
        }
        debug!("editor dismissed");
        self.close();
        true
    }

    fn close(&mut self) {
        self.phase = EditorPhase::Closed;
        self.row_id = None;
        self.inputs.clear();
        self.focus = 0;
    }
}
