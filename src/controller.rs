use std::time::Duration;
use tracing::trace;

use crate::domain::{Message, RTVError, TVConfig};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    /// Waits up to the poll time for one terminal event.
    pub fn handle_event<T>(&self, model: &Model<T>) -> Result<Option<Message>, RTVError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(None);
        }
        Ok(self.map_event(event::read()?, model.prompt().is_some()))
    }

    // While a prompt is open keys are passed through unmapped.
    fn map_event(&self, event: Event, prompting: bool) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                if prompting {
                    Some(Message::RawKey(key))
                } else {
                    self.handle_key(key)
                }
            }
            Event::Resize(width, height) => Some(Message::Resize(width.into(), height.into())),
            _ => None,
        }
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Esc => Some(Message::Exit),
            KeyCode::Char('?') => Some(Message::Help),

            KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
            KeyCode::Left | KeyCode::Char('h') => Some(Message::MoveLeft),
            KeyCode::Right | KeyCode::Char('l') => Some(Message::MoveRight),
            KeyCode::PageUp => Some(Message::MovePageUp),
            KeyCode::PageDown => Some(Message::MovePageDown),
            KeyCode::Home | KeyCode::Char('g') => Some(Message::MoveBeginning),
            KeyCode::End | KeyCode::Char('G') => Some(Message::MoveEnd),

            KeyCode::Enter if shift => Some(Message::ToggleMultiSort),
            KeyCode::Enter | KeyCode::Char('s') => Some(Message::ToggleSort),
            KeyCode::Char('S') => Some(Message::ToggleMultiSort),
            KeyCode::Char('c') => Some(Message::ClearSort),

            KeyCode::Char('x') => Some(Message::HideColumn),
            KeyCode::Char('a') => Some(Message::ShowAllColumns),
            KeyCode::Char('r') => Some(Message::Refresh),
            KeyCode::Char('y') => Some(Message::CopyRow),

            KeyCode::Char('/') => Some(Message::Search),
            KeyCode::Char('n') => Some(Message::SearchNext),
            KeyCode::Char('N') => Some(Message::SearchPrev),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
