use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// Single line text input shown in the status line.
#[derive(Debug, Default, Clone)]
pub struct Prompt {
    text: String,
    cursor: usize, // In chars
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
    Editing,
    Submitted(String),
    Canceled,
}

impl Prompt {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position in chars.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn read(&mut self, key: KeyEvent) -> PromptEvent {
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return PromptEvent::Editing;
        }
        match key.code {
            KeyCode::Enter => return PromptEvent::Submitted(self.text.clone()),
            KeyCode::Esc => {
                self.clear();
                return PromptEvent::Canceled;
            }
            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                self.text.remove(self.byte_pos());
            }
            KeyCode::Delete if self.cursor < self.len() => {
                self.text.remove(self.byte_pos());
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.len(),
            KeyCode::Char(chr) => {
                self.text.insert(self.byte_pos(), chr);
                self.cursor += 1;
            }
            _ => (),
        }
        trace!("Prompt: {:?} at {}", self.text, self.cursor);
        PromptEvent::Editing
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_pos(&self) -> usize {
        self.text
            .char_indices()
            .nth(self.cursor)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.text.len())
    }
}
