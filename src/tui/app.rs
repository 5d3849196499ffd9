//! Presentation state and key mapping
//!
//! Everything here is view-local: cursor positions, the highlighted list
//! row, the spinner frame. The workflow only sees the [`Message`]s produced
//! by [`Ui::handle_event`].

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::widgets::ListState;

use super::input::TextInput;
use crate::workflow::{Message, Phase, TextField};

const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

pub struct Ui {
    pub list: ListState,
    pub branch_input: TextInput,
    pub workspace_input: TextInput,
    spinner: usize,
}

impl Default for Ui {
    fn default() -> Self {
        Self::new()
    }
}

impl Ui {
    pub fn new() -> Self {
        Self {
            list: ListState::default(),
            branch_input: TextInput::new("feature/my-new-branch"),
            workspace_input: TextInput::new("My Feature Workspace"),
            spinner: 0,
        }
    }

    pub fn tick(&mut self) {
        self.spinner = (self.spinner + 1) % SPINNER_FRAMES.len();
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner]
    }

    pub fn prefill(&mut self, field: TextField, value: &str) {
        self.input_mut(field).set_value(value);
    }

    pub fn input(&self, field: TextField) -> &TextInput {
        match field {
            TextField::BranchName => &self.branch_input,
            TextField::WorkspaceName => &self.workspace_input,
        }
    }

    fn input_mut(&mut self, field: TextField) -> &mut TextInput {
        match field {
            TextField::BranchName => &mut self.branch_input,
            TextField::WorkspaceName => &mut self.workspace_input,
        }
    }

    /// Keep the highlighted row inside a list of `count` items.
    pub fn clamp_selection(&mut self, count: usize) {
        match (self.list.selected(), count) {
            (_, 0) => self.list.select(None),
            (None, _) => self.list.select(Some(0)),
            (Some(i), n) if i >= n => self.list.select(Some(n - 1)),
            _ => {}
        }
    }

    pub fn handle_event(
        &mut self,
        phase: Phase,
        item_count: usize,
        event: Event,
    ) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                self.handle_key(phase, item_count, key)
            }
            Event::Resize(width, height) => Some(Message::Resize { width, height }),
            _ => None,
        }
    }

    fn handle_key(&mut self, phase: Phase, item_count: usize, key: KeyEvent) -> Option<Message> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Message::Abort);
        }

        match phase {
            Phase::SelectWorkspace => self.handle_list_key(item_count, key),
            Phase::EnterBranchName => self.handle_input_key(TextField::BranchName, key),
            Phase::EnterWorkspaceName => self.handle_input_key(TextField::WorkspaceName, key),
            Phase::Error if key.code == KeyCode::Esc => Some(Message::Abort),
            _ => None,
        }
    }

    fn handle_list_key(&mut self, item_count: usize, key: KeyEvent) -> Option<Message> {
        self.clamp_selection(item_count);
        if item_count == 0 {
            return match key.code {
                KeyCode::Enter => Some(Message::SelectionConfirmed(None)),
                _ => None,
            };
        }

        let current = self.list.selected().unwrap_or(0);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.list.select(Some(current.saturating_sub(1))),
            KeyCode::Down | KeyCode::Char('j') => {
                self.list.select(Some((current + 1).min(item_count - 1)))
            }
            KeyCode::Home | KeyCode::Char('g') => self.list.select(Some(0)),
            KeyCode::End | KeyCode::Char('G') => self.list.select(Some(item_count - 1)),
            KeyCode::Enter => return Some(Message::SelectionConfirmed(self.list.selected())),
            _ => {}
        }
        None
    }

    fn handle_input_key(&mut self, field: TextField, key: KeyEvent) -> Option<Message> {
        if key.code == KeyCode::Enter {
            return Some(Message::TextConfirmed {
                field,
                value: self.input(field).value().to_string(),
            });
        }
        self.input_mut(field).handle_key(key);
        None
    }
}
