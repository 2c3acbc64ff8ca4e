use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use crate::cells::{find_matches, line_text, render_cell};
use crate::domain::{HELP_TEXT, Message, RTVError, TVConfig};
use crate::prompt::{Prompt, PromptEvent};
use crate::resource::{LoadState, Resource};
use crate::state::TableState;
use crate::ui::{BORDER_HEIGHT, STATUSLINE_HEIGHT, TABLE_HEADER_HEIGHT};
use crate::value::Value;

/// Stable identity of a row, used to keep the selection across re-sorts
/// and reloads.
pub type RowKeyFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    LOADING,
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modus {
    TABLE,
    POPUP,
    SEARCH,
}

pub struct Model<T> {
    config: TVConfig,
    pub status: Status,
    modus: Modus,
    title: String,
    resource: Resource<T>,
    table: TableState<T>,
    row_key: RowKeyFn<T>,
    curser_row: usize,    // Position in the sorted order
    curser_column: usize, // Index into the visible columns
    offset_row: usize,
    table_height: usize,
    clipboard: Option<Clipboard>,
    status_message: String,
    last_status_message_update: Instant,
    popup_message: Option<String>,
    prompt: Prompt,
    search_query: Option<String>,
}

impl<T> Model<T> {
    /// Creates the model and requests the first load of `resource`.
    pub fn init(
        config: &TVConfig,
        title: impl Into<String>,
        mut resource: Resource<T>,
        table: TableState<T>,
        row_key: RowKeyFn<T>,
    ) -> Self {
        resource.refetch(false);
        Self {
            config: config.clone(),
            status: Status::LOADING,
            modus: Modus::TABLE,
            title: title.into(),
            resource,
            table,
            row_key,
            curser_row: 0,
            curser_column: 0,
            offset_row: 0,
            table_height: 1,
            clipboard: None,
            status_message: "Loading ...".to_string(),
            last_status_message_update: Instant::now(),
            popup_message: None,
            prompt: Prompt::default(),
            search_query: None,
        }
    }

    pub fn config(&self) -> &TVConfig {
        &self.config
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn table(&self) -> &TableState<T> {
        &self.table
    }

    pub fn load_state(&self) -> LoadState {
        self.resource.state()
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn status_message_age(&self) -> Duration {
        self.last_status_message_update.elapsed()
    }

    pub fn popup_message(&self) -> Option<&str> {
        self.popup_message.as_deref()
    }

    /// The search input while it is being edited.
    pub fn prompt(&self) -> Option<&Prompt> {
        (self.modus == Modus::SEARCH).then_some(&self.prompt)
    }

    /// Query whose occurrences are highlighted.
    pub fn search_query(&self) -> Option<&str> {
        self.search_query.as_deref()
    }

    pub fn row_count(&self) -> usize {
        self.table.row_order().len()
    }

    /// Absolute position of the selected row in the sorted order.
    pub fn selected_row(&self) -> usize {
        self.curser_row
    }

    /// Position of the selected row within [`Model::visible_rows`].
    pub fn selected_row_in_view(&self) -> Option<usize> {
        (self.row_count() > 0).then(|| self.curser_row - self.offset_row)
    }

    /// Index of the selected column within the visible columns.
    pub fn selected_column(&self) -> usize {
        self.curser_column
    }

    pub fn selected_column_id(&self) -> Option<String> {
        self.table
            .visible_columns()
            .get(self.curser_column)
            .map(|c| c.id.clone())
    }

    /// Rows that fit on screen, in sorted order.
    pub fn visible_rows(&self) -> Vec<&T> {
        let Some(rows) = self.table.rows() else {
            return Vec::new();
        };
        self.table
            .row_order()
            .iter()
            .skip(self.offset_row)
            .take(self.table_height)
            .map(|&idx| &rows[idx])
            .collect()
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    /// Runs a pending load. Returns `true` if there is a new row snapshot.
    pub fn poll_resource(&mut self) -> bool {
        let was_loading = self.resource.state() == LoadState::Loading;
        let changed = self.resource.poll();

        if changed {
            let key = self.selected_key();
            self.table.set_rows(self.resource.data());
            self.reselect(key);
            info!("Showing {} rows", self.row_count());
            self.set_status_message(format!("Loaded {} rows", self.row_count()));
        } else if was_loading && let Some(e) = self.resource.error() {
            let message = format!("{e}");
            self.set_status_message(message);
        }

        if self.status != Status::QUITTING {
            self.status = match self.resource.state() {
                LoadState::Loading => Status::LOADING,
                _ => Status::READY,
            };
        }
        changed
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), RTVError> {
        if let Some(msg) = message {
            trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);
            match self.modus {
                Modus::TABLE => match msg {
                    Message::Quit => self.quit(),
                    Message::MoveUp => self.move_selection_up(1),
                    Message::MoveDown => self.move_selection_down(1),
                    Message::MoveLeft => self.move_selection_left(),
                    Message::MoveRight => self.move_selection_right(),
                    Message::MovePageUp => self.move_selection_up(self.table_height),
                    Message::MovePageDown => self.move_selection_down(self.table_height),
                    Message::MoveBeginning => self.select_row(0),
                    Message::MoveEnd => self.select_row(usize::MAX),
                    Message::ToggleSort => self.toggle_sort(false),
                    Message::ToggleMultiSort => self.toggle_sort(true),
                    Message::ClearSort => self.clear_sort(),
                    Message::HideColumn => self.hide_column(),
                    Message::ShowAllColumns => self.table.show_all_columns(),
                    Message::Refresh => self.refresh(),
                    Message::CopyRow => self.copy_table_row(),
                    Message::Search => self.enter_search(),
                    Message::SearchNext => self.search_next(1),
                    Message::SearchPrev => self.search_next(-1),
                    Message::Help => self.show_help(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::Exit => self.clear_search(),
                    Message::RawKey(_) => (),
                },
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::Exit | Message::Help => self.exit(),
                    _ => (),
                },
                Modus::SEARCH => match msg {
                    Message::RawKey(key) => self.search_input(key),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    _ => (),
                },
            }
        }
        Ok(())
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
        trace!("Status message: {}", self.status_message);
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        let table_height = height
            .saturating_sub(TABLE_HEADER_HEIGHT + STATUSLINE_HEIGHT + BORDER_HEIGHT)
            .max(1);
        trace!(
            "UI was resized! w: {width}, h: {height}, table rows {} -> {table_height}",
            self.table_height
        );
        self.table_height = table_height;
        self.select_row(self.curser_row);
    }

    fn show_help(&mut self) {
        self.modus = Modus::POPUP;
        self.popup_message = Some(HELP_TEXT.to_string());
    }

    fn exit(&mut self) {
        trace!("Close popup ...");
        self.modus = Modus::TABLE;
        self.popup_message = None;
    }

    fn refresh(&mut self) {
        debug!("Refetching resource, bypassing the cache");
        self.resource.refetch(true);
        self.status = Status::LOADING;
        self.set_status_message("Loading ...");
    }

    // -------------------- Selection ---------------------- //

    fn selected_key(&self) -> Option<String> {
        let rows = self.table.rows()?;
        let idx = *self.table.row_order().get(self.curser_row)?;
        Some((self.row_key)(&rows[idx]))
    }

    fn reselect(&mut self, key: Option<String>) {
        let position = key.and_then(|key| {
            let rows = self.table.rows()?;
            self.table
                .row_order()
                .iter()
                .position(|&idx| (self.row_key)(&rows[idx]) == key)
        });
        trace!("Reselecting row at {position:?}");
        self.select_row(position.unwrap_or(0));
    }

    fn select_row(&mut self, row: usize) {
        let count = self.row_count();
        if count == 0 {
            self.curser_row = 0;
            self.offset_row = 0;
            return;
        }
        self.curser_row = row.min(count - 1);
        if self.curser_row < self.offset_row {
            self.offset_row = self.curser_row;
        } else if self.curser_row >= self.offset_row + self.table_height {
            self.offset_row = self.curser_row + 1 - self.table_height;
        }
    }

    fn move_selection_up(&mut self, size: usize) {
        self.select_row(self.curser_row.saturating_sub(size));
    }

    fn move_selection_down(&mut self, size: usize) {
        self.select_row(self.curser_row.saturating_add(size));
    }

    fn move_selection_left(&mut self) {
        self.curser_column = self.curser_column.saturating_sub(1);
    }

    fn move_selection_right(&mut self) {
        let visible = self.table.visible_columns().len();
        if self.curser_column + 1 < visible {
            self.curser_column += 1;
        }
    }

    // -------------------- Sorting and columns ---------------------- //

    fn toggle_sort(&mut self, multi: bool) {
        let Some(column_id) = self.selected_column_id() else {
            return;
        };
        match self.table.column(&column_id) {
            Some(column) if column.can_sort() => {}
            Some(column) => {
                let message = format!("Column \"{}\" is not sortable", column.header);
                self.set_status_message(message);
                return;
            }
            None => return,
        }

        let key = self.selected_key();
        self.table.toggle_sort(&column_id, multi);
        self.reselect(key);
    }

    fn clear_sort(&mut self) {
        let key = self.selected_key();
        self.table.clear_sort();
        self.reselect(key);
    }

    fn hide_column(&mut self) {
        let visible = self.table.visible_columns().len();
        if visible <= 1 {
            self.set_status_message("Cannot hide the last visible column");
            return;
        }
        let Some(column_id) = self.selected_column_id() else {
            return;
        };
        self.table.set_column_visibility(&column_id, false);
        self.curser_column = self.curser_column.min(visible - 2);
        debug!("Hid column {column_id}");
    }

    // -------------------- Search ---------------------- //

    fn enter_search(&mut self) {
        trace!("Entering search prompt ...");
        self.modus = Modus::SEARCH;
        self.prompt.clear();
    }

    fn search_input(&mut self, key: KeyEvent) {
        match self.prompt.read(key) {
            PromptEvent::Editing => {}
            PromptEvent::Submitted(query) => {
                self.modus = Modus::TABLE;
                self.search(query);
            }
            PromptEvent::Canceled => self.modus = Modus::TABLE,
        }
    }

    fn search(&mut self, query: String) {
        if query.is_empty() {
            self.clear_search();
            return;
        }
        debug!("Searching for {query:?}");
        self.search_query = Some(query);
        self.search_next(0);
    }

    fn clear_search(&mut self) {
        if self.search_query.take().is_some() {
            self.set_status_message("");
        }
    }

    /// Positions in the sorted order of rows with a visible cell that shows
    /// `query`.
    fn matching_rows(&self, query: &str) -> Vec<usize> {
        let Some(rows) = self.table.rows() else {
            return Vec::new();
        };
        let columns = self.table.visible_columns();
        self.table
            .row_order()
            .iter()
            .enumerate()
            .filter(|&(_, &idx)| {
                columns.iter().any(|c| {
                    let text = line_text(&render_cell(*c, &rows[idx]));
                    !find_matches(&text, query).is_empty()
                })
            })
            .map(|(position, _)| position)
            .collect()
    }

    // Moves to the next (1), previous (-1) or first from the cursor (0)
    // matching row, wrapping around.
    fn search_next(&mut self, step: i32) {
        let Some(query) = self.search_query.clone() else {
            self.set_status_message("No active search, press / to search");
            return;
        };
        let start_time = Instant::now();
        let matches = self.matching_rows(&query);
        trace!(
            "Search found {} matching rows in {}ms",
            matches.len(),
            start_time.elapsed().as_millis()
        );
        if matches.is_empty() {
            self.set_status_message(format!("No matches for \"{query}\""));
            return;
        }

        let cursor = self.curser_row;
        let idx = match step {
            0 => matches.iter().position(|&row| row >= cursor).unwrap_or(0),
            s if s > 0 => matches.iter().position(|&row| row > cursor).unwrap_or(0),
            _ => matches
                .iter()
                .rposition(|&row| row < cursor)
                .unwrap_or(matches.len() - 1),
        };
        self.select_row(matches[idx]);
        self.set_status_message(format!(
            "Match {}/{} for \"{query}\"",
            idx + 1,
            matches.len()
        ));
    }

    // -------------------- Clipboard ---------------------- //

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.chars().any(|c| c == '"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace('"', "\"\"");
        }
        if needs_wrapping || needs_escaping {
            out = format!("\"{out}\"");
        }
        out
    }

    fn cell_text(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// The selected row as one CSV line of its visible cells.
    pub fn selected_row_as_csv(&self) -> Option<String> {
        let rows = self.table.rows()?;
        let row = &rows[*self.table.row_order().get(self.curser_row)?];
        let content = self
            .table
            .visible_columns()
            .iter()
            .map(|c| Self::wrap_cell_content(&Self::cell_text(&c.value(row))))
            .collect::<Vec<String>>();
        Some(content.join(","))
    }

    fn copy_table_row(&mut self) {
        let Some(row_content) = self.selected_row_as_csv() else {
            return;
        };

        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => {
                    warn!("No clipboard available: {e:?}");
                    self.set_status_message("No clipboard available");
                    return;
                }
            }
        }
        let Some(clipboard) = self.clipboard.as_mut() else {
            return;
        };
        match clipboard.set_text(row_content) {
            Ok(_) => {
                trace!("Copied row content to clipboard.");
                self.set_status_message("Copied row");
            }
            Err(e) => trace!("Error copying to clipboard: {:?}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::SortEntry;
    use crate::resource::ResourceDef;
    use crate::swapi::Person;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn fixture(name: &str) -> String {
        format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
    }

    fn people_model(file: &str) -> Model<Person> {
        let resource = Resource::new(ResourceDef::new(fixture(file), Person::parse));
        let mut model = Model::init(
            &TVConfig::default(),
            "People",
            resource,
            TableState::new(Person::columns()),
            Arc::new(Person::row_key),
        );
        model.update(Some(Message::Resize(80, 14))).unwrap();
        model.poll_resource();
        model
    }

    fn send(model: &mut Model<Person>, messages: &[Message]) {
        for message in messages {
            model.update(Some(*message)).unwrap();
        }
    }

    fn key(code: KeyCode) -> Message {
        Message::RawKey(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn search_for(model: &mut Model<Person>, query: &str) {
        send(model, &[Message::Search]);
        for chr in query.chars() {
            send(model, &[key(KeyCode::Char(chr))]);
        }
        send(model, &[key(KeyCode::Enter)]);
    }

    fn selected_name(model: &Model<Person>) -> String {
        let idx = model.table().row_order()[model.selected_row()];
        model.table().rows().unwrap()[idx].name.clone()
    }

    #[test]
    fn first_poll_loads_rows() {
        let model = people_model("people.csv");
        assert_eq!(model.status, Status::READY);
        assert_eq!(model.load_state(), LoadState::Success);
        assert_eq!(model.row_count(), 8);
        assert_eq!(model.status_message(), "Loaded 8 rows");
        assert_eq!(model.visible_rows().len(), 8);
    }

    #[test]
    fn failed_load_is_reported() {
        let model = people_model("missing.csv");
        assert_eq!(model.status, Status::READY);
        assert_eq!(model.load_state(), LoadState::Error);
        assert_eq!(model.status_message(), "File not found");
        assert!(model.visible_rows().is_empty());
        assert_eq!(model.selected_row_in_view(), None);
    }

    #[test]
    fn failed_preload_still_opens_the_table() {
        let resource = Resource::preloaded(ResourceDef::new(fixture("missing.csv"), Person::parse));
        let mut model = Model::init(
            &TVConfig::default(),
            "People",
            resource,
            TableState::new(Person::columns()),
            Arc::new(Person::row_key),
        );
        assert_eq!(model.status, Status::LOADING);
        assert!(!model.poll_resource());
        assert_eq!(model.status, Status::READY);
        assert_eq!(model.load_state(), LoadState::Error);
        assert_eq!(model.status_message(), "File not found");
        assert_eq!(model.row_count(), 0);
    }

    #[test]
    fn sorting_keeps_the_selected_row() {
        let mut model = people_model("people.csv");
        assert_eq!(selected_name(&model), "Luke Skywalker");

        send(
            &mut model,
            &[Message::MoveRight, Message::MoveRight, Message::MoveRight],
        );
        assert_eq!(model.selected_column_id().as_deref(), Some("height"));

        send(&mut model, &[Message::ToggleSort]);
        assert_eq!(model.table().sort_chain(), [SortEntry::asc("height")]);
        assert_eq!(selected_name(&model), "Luke Skywalker");
        assert_eq!(model.selected_row(), 4);

        send(&mut model, &[Message::ToggleSort]);
        assert_eq!(model.table().sort_chain(), [SortEntry::desc("height")]);
        assert_eq!(model.selected_row(), 2);

        send(&mut model, &[Message::ToggleSort]);
        assert!(model.table().sort_chain().is_empty());
        assert_eq!(model.selected_row(), 0);
    }

    #[test]
    fn multi_sort_appends_keys() {
        let mut model = people_model("people.csv");
        send(&mut model, &[Message::MoveRight, Message::ToggleSort]);
        send(
            &mut model,
            &[Message::MoveRight, Message::MoveRight, Message::ToggleMultiSort],
        );
        assert_eq!(
            model.table().sort_chain(),
            [SortEntry::asc("gender"), SortEntry::asc("height")]
        );

        send(&mut model, &[Message::ClearSort]);
        assert!(model.table().sort_chain().is_empty());
    }

    #[test]
    fn tag_columns_do_not_sort() {
        let mut model = people_model("people.csv");
        for _ in 0..5 {
            send(&mut model, &[Message::MoveRight]);
        }
        assert_eq!(model.selected_column_id().as_deref(), Some("hair_color"));
        send(&mut model, &[Message::ToggleSort]);
        assert!(model.table().sort_chain().is_empty());
        assert_eq!(model.status_message(), "Column \"Hair\" is not sortable");
    }

    #[test]
    fn last_visible_column_stays() {
        let mut model = people_model("people.csv");
        for _ in 0..10 {
            send(&mut model, &[Message::HideColumn]);
        }
        assert_eq!(model.table().visible_columns().len(), 1);
        assert_eq!(model.status_message(), "Cannot hide the last visible column");

        send(&mut model, &[Message::ShowAllColumns]);
        assert_eq!(model.table().visible_columns().len(), 8);
    }

    #[test]
    fn hiding_keeps_column_selection_in_range() {
        let mut model = people_model("people.csv");
        for _ in 0..7 {
            send(&mut model, &[Message::MoveRight]);
        }
        assert_eq!(model.selected_column(), 7);
        send(&mut model, &[Message::HideColumn]);
        assert_eq!(model.selected_column(), 6);
        assert!(!model.table().is_visible("skin_color"));
    }

    #[test]
    fn navigation_scrolls_the_view() {
        let mut model = people_model("people.csv");
        send(&mut model, &[Message::Resize(80, 7)]);
        send(&mut model, &[Message::MoveEnd]);
        assert_eq!(model.selected_row(), 7);
        assert_eq!(model.visible_rows().len(), 3);
        assert_eq!(model.selected_row_in_view(), Some(2));

        send(&mut model, &[Message::MovePageUp]);
        assert_eq!(model.selected_row(), 4);
        send(&mut model, &[Message::MoveBeginning, Message::MoveUp]);
        assert_eq!(model.selected_row(), 0);
        assert_eq!(model.selected_row_in_view(), Some(0));
    }

    #[test]
    fn selected_row_as_csv_quotes_cells() {
        let model = people_model("people.csv");
        assert_eq!(
            model.selected_row_as_csv().as_deref(),
            Some("\"Luke Skywalker\",male,19BBY,172,77,blond,blue,fair")
        );
        assert_eq!(
            Model::<Person>::wrap_cell_content("say \"hi\""),
            "\"say \"\"hi\"\"\""
        );
    }

    #[test]
    fn refresh_goes_through_loading() {
        let mut model = people_model("people.csv");
        send(&mut model, &[Message::Refresh]);
        assert_eq!(model.status, Status::LOADING);
        assert_eq!(model.load_state(), LoadState::Loading);
        assert!(model.poll_resource());
        assert_eq!(model.status, Status::READY);
    }

    #[test]
    fn search_jumps_between_matching_rows() {
        let mut model = people_model("people.csv");
        search_for(&mut model, "BROWN");
        assert_eq!(model.search_query(), Some("BROWN"));
        assert!(model.prompt().is_none());
        assert_eq!(selected_name(&model), "Leia Organa");
        assert_eq!(model.status_message(), "Match 1/4 for \"BROWN\"");

        send(&mut model, &[Message::SearchNext, Message::SearchNext]);
        assert_eq!(selected_name(&model), "Yoda");
        send(&mut model, &[Message::SearchNext, Message::SearchNext]);
        assert_eq!(selected_name(&model), "Leia Organa");
        send(&mut model, &[Message::SearchPrev]);
        assert_eq!(selected_name(&model), "Arvel Crynyd");
        assert_eq!(model.status_message(), "Match 4/4 for \"BROWN\"");
    }

    #[test]
    fn search_follows_the_sorted_order() {
        let mut model = people_model("people.csv");
        send(
            &mut model,
            &[
                Message::MoveRight,
                Message::MoveRight,
                Message::MoveRight,
                Message::ToggleSort,
                Message::ToggleSort,
            ],
        );
        assert_eq!(selected_name(&model), "Luke Skywalker");
        assert_eq!(model.selected_row(), 2);

        search_for(&mut model, "brown");
        assert_eq!(selected_name(&model), "Leia Organa");
        assert_eq!(model.status_message(), "Match 2/4 for \"brown\"");
        send(&mut model, &[Message::SearchPrev]);
        assert_eq!(selected_name(&model), "Jabba Desilijic Tiure");
    }

    #[test]
    fn search_prompt_captures_keys() {
        let mut model = people_model("people.csv");
        send(&mut model, &[Message::Search, key(KeyCode::Char('q'))]);
        assert_eq!(model.status, Status::READY);
        assert_eq!(model.prompt().map(|p| p.text()), Some("q"));

        send(&mut model, &[key(KeyCode::Esc)]);
        assert!(model.prompt().is_none());
        assert_eq!(model.search_query(), None);

        search_for(&mut model, "jedi");
        assert_eq!(model.search_query(), Some("jedi"));
        assert_eq!(model.status_message(), "No matches for \"jedi\"");
        assert_eq!(model.selected_row(), 0);

        send(&mut model, &[Message::Exit]);
        assert_eq!(model.search_query(), None);
        send(&mut model, &[Message::SearchNext]);
        assert_eq!(model.status_message(), "No active search, press / to search");
    }

    #[test]
    fn search_skips_hidden_columns() {
        let mut model = people_model("people.csv");
        search_for(&mut model, "hermaphrodite");
        assert_eq!(selected_name(&model), "Jabba Desilijic Tiure");

        send(&mut model, &[Message::MoveBeginning, Message::MoveRight, Message::HideColumn]);
        assert!(!model.table().is_visible("gender"));
        send(&mut model, &[Message::SearchNext]);
        assert_eq!(model.status_message(), "No matches for \"hermaphrodite\"");
    }

    #[test]
    fn help_popup_captures_input() {
        let mut model = people_model("people.csv");
        send(&mut model, &[Message::Help]);
        assert_eq!(model.popup_message(), Some(HELP_TEXT));
        send(&mut model, &[Message::MoveDown]);
        assert_eq!(model.selected_row(), 0);
        send(&mut model, &[Message::Exit]);
        assert_eq!(model.popup_message(), None);

        send(&mut model, &[Message::Quit]);
        assert_eq!(model.status, Status::QUITTING);
    }
}
