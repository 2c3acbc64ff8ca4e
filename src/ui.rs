use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState as ViewState},
};

use crate::cells::{MUTED, SORT_ASC, SORT_DESC, header_cell, highlight_matches, render_cell};
use crate::column::SortDirection;
use crate::domain::TVConfig;
use crate::model::Model;
use crate::resource::LoadState;
use crate::state::TableState;

pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const STATUSLINE_HEIGHT: usize = 1;
pub const BORDER_HEIGHT: usize = 2;
pub const COLUMN_SPACING: u16 = 1;
const STATUS_MESSAGE_FADE: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct TableUI {
    max_column_width: usize,
}

impl TableUI {
    pub fn new(cfg: &TVConfig) -> Self {
        Self {
            max_column_width: cfg.max_column_width,
        }
    }

    pub fn draw<T>(&self, model: &Model<T>, frame: &mut Frame) {
        let chunks = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(STATUSLINE_HEIGHT as u16),
        ])
        .split(frame.area());

        self.render_table(model, frame, chunks[0]);
        render_statusline(model, frame, chunks[1]);

        if let Some(message) = model.popup_message() {
            render_popup(" Help ", message, frame);
        }
    }

    fn render_table<T>(&self, model: &Model<T>, frame: &mut Frame, area: Rect) {
        let table = model.table();
        let columns = table.visible_columns();
        let rows = model.visible_rows();

        let header: Vec<Line> = columns
            .iter()
            .map(|c| header_cell(*c, table.sort_indicator(&c.id)))
            .collect();
        let query = model.search_query().unwrap_or_default();
        let body: Vec<Vec<Line>> = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| highlight_matches(render_cell(*c, *row), query))
                    .collect()
            })
            .collect();

        let widths = column_widths(&header, &body, self.max_column_width);
        let inner_width = area.width.saturating_sub(2);
        let first = first_visible_column(&widths, model.selected_column(), inner_width);

        let header = Row::new(header.into_iter().skip(first).map(Cell::from))
            .height(TABLE_HEADER_HEIGHT as u16)
            .style(Style::new().add_modifier(Modifier::UNDERLINED));
        let body = body
            .into_iter()
            .map(|cells| Row::new(cells.into_iter().skip(first).map(Cell::from)));
        let constraints = widths.iter().skip(first).map(|w| Constraint::Length(*w));

        let view = Table::new(body, constraints)
            .header(header)
            .column_spacing(COLUMN_SPACING)
            .block(Block::bordered().title(format!(" {} ", model.title())))
            .row_highlight_style(Style::new().add_modifier(Modifier::REVERSED))
            .column_highlight_style(Style::new().fg(Color::Yellow))
            .cell_highlight_style(Style::new().add_modifier(Modifier::BOLD));

        let mut state = ViewState::default()
            .with_selected(model.selected_row_in_view())
            .with_selected_column(Some(model.selected_column().saturating_sub(first)));
        frame.render_stateful_widget(view, area, &mut state);
    }
}

/// Width per column: the widest of header and cells, capped.
pub fn column_widths(header: &[Line], body: &[Vec<Line>], max_column_width: usize) -> Vec<u16> {
    header
        .iter()
        .enumerate()
        .map(|(idx, head)| {
            let widest = body
                .iter()
                .filter_map(|cells| cells.get(idx))
                .map(Line::width)
                .fold(head.width(), usize::max);
            widest.clamp(1, max_column_width.max(1)) as u16
        })
        .collect()
}

/// First column to draw so that `selected` fits into `available` cells.
pub fn first_visible_column(widths: &[u16], selected: usize, available: u16) -> usize {
    let Some(&selected_width) = widths.get(selected) else {
        return 0;
    };
    let mut first = selected;
    let mut used = selected_width;
    while first > 0 {
        let next = used
            .saturating_add(COLUMN_SPACING)
            .saturating_add(widths[first - 1]);
        if next > available {
            break;
        }
        used = next;
        first -= 1;
    }
    first
}

/// Active sort keys in priority order, e.g. `Height ▼, Name ▲`.
pub fn sort_description<T>(table: &TableState<T>) -> String {
    table
        .sort_chain()
        .iter()
        .map(|entry| {
            let header = table
                .column(&entry.column_id)
                .map(|c| c.header.as_str())
                .unwrap_or(entry.column_id.as_str());
            let arrow = match entry.direction {
                SortDirection::Asc => SORT_ASC,
                SortDirection::Desc => SORT_DESC,
            };
            format!("{header} {arrow}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_statusline<T>(model: &Model<T>, frame: &mut Frame, area: Rect) {
    if let Some(prompt) = model.prompt() {
        let before_cursor: String = prompt.text().chars().take(prompt.cursor()).collect();
        let x = area.x + 1 + Span::raw(before_cursor).width() as u16;
        frame.render_widget(Paragraph::new(format!("/{}", prompt.text())), area);
        frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
        return;
    }

    let (state, state_style) = match model.load_state() {
        LoadState::Idle => ("IDLE", Style::new().fg(Color::Black).bg(Color::Gray)),
        LoadState::Loading => ("LOADING", Style::new().fg(Color::Black).bg(Color::Yellow)),
        LoadState::Success => ("READY", Style::new().fg(Color::Black).bg(Color::Green)),
        LoadState::Error => ("ERROR", Style::new().fg(Color::White).bg(Color::Red)),
    };

    let count = model.row_count();
    let position = if count == 0 {
        0
    } else {
        model.selected_row() + 1
    };

    let mut spans = vec![
        Span::styled(format!(" {state} "), state_style.add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {position}/{count} rows ")),
    ];
    let sort = sort_description(model.table());
    if !sort.is_empty() {
        spans.push(Span::styled(format!(" sort: {sort} "), Style::new().fg(Color::Cyan)));
    }
    let message_style = if model.status_message_age() > STATUS_MESSAGE_FADE {
        MUTED
    } else {
        Style::new()
    };
    spans.push(Span::styled(format!(" {}", model.status_message()), message_style));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn render_popup(title: &str, message: &str, frame: &mut Frame) {
    let text = Text::from(message);
    let width = (text.width() as u16).saturating_add(4);
    let height = (text.height() as u16).saturating_add(BORDER_HEIGHT as u16);
    let area = popup_area(frame.area(), width, height);

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text).block(Block::bordered().title(title.to_string())),
        area,
    );
}
