use std::fmt;
use std::io::Error;

use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

#[derive(Debug)]
pub enum RTVError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    ParseFailed(String),
    UnresolvedUrl,
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl fmt::Display for RTVError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RTVError::IoError(e) => write!(f, "IO error: {e}"),
            RTVError::PolarsError(e) => write!(f, "Data error: {e}"),
            RTVError::LoadingFailed(msg) => write!(f, "Loading failed: {msg}"),
            RTVError::ParseFailed(msg) => write!(f, "Parsing failed: {msg}"),
            RTVError::UnresolvedUrl => write!(f, "Resource url resolved to nothing"),
            RTVError::FileNotFound => write!(f, "File not found"),
            RTVError::PermissionDenied => write!(f, "Permission denied"),
            RTVError::UnknownFileType => write!(f, "Unknown file type"),
        }
    }
}

impl std::error::Error for RTVError {}

impl From<Error> for RTVError {
    fn from(err: Error) -> Self {
        RTVError::IoError(err)
    }
}

impl From<PolarsError> for RTVError {
    fn from(err: PolarsError) -> Self {
        RTVError::PolarsError(err)
    }
}

#[derive(Debug, Clone)]
pub struct TVConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
}

impl Default for TVConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            max_column_width: 40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Quit,
    Exit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    ToggleSort,
    ToggleMultiSort,
    ClearSort,
    HideColumn,
    ShowAllColumns,
    Refresh,
    CopyRow,
    Search,
    SearchNext,
    SearchPrev,
    RawKey(KeyEvent),
    Help,
    Resize(usize, usize),
}

pub const HELP_TEXT: &str = "\
Navigation
  ←/→ h/l        select column
  ↑/↓ j/k        select row
  PgUp/PgDn      page up/down
  g/G            first/last row

Sorting
  s, Enter       sort by column (asc → desc → off)
  S, Shift+Enter add column to sort (asc → desc → removed)
  c              clear sort

Columns
  x              hide column
  a              show all columns

Search
  /              search all visible cells
  n/N            next/previous matching row
  Esc            clear highlight

Data
  r              reload resource
  y              copy row

  ?              help
  Esc            close popup
  q              quit";
