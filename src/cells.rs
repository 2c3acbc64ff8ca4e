use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use ratatui::layout::Alignment;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::column::{ColumnDef, ExtraProps, SortDirection};
use crate::value::Value;

pub const MUTED: Style = Style::new().fg(Color::DarkGray);
pub const TAG: Style = Style::new().fg(Color::Black).bg(Color::Gray);
pub const MATCH: Style = Style::new().fg(Color::Black).bg(Color::Yellow);
pub const SORT_NEUTRAL: &str = "⇅";
pub const SORT_ASC: &str = "▲";
pub const SORT_DESC: &str = "▼";

/// Everything a custom renderer gets to build one cell.
pub struct CellContext<'a, T> {
    pub value: &'a Value,
    pub row: &'a T,
    pub style: Style,
    pub props: &'a ExtraProps,
}

pub type CellFn<T> = Arc<dyn Fn(CellContext<'_, T>) -> Line<'static> + Send + Sync>;

/// Per column rendering capability.
pub enum CellRenderer<T> {
    Text,
    Mixed,
    Tags,
    Custom(CellFn<T>),
}

impl<T> CellRenderer<T> {
    pub fn custom(
        render: impl Fn(CellContext<'_, T>) -> Line<'static> + Send + Sync + 'static,
    ) -> Self {
        CellRenderer::Custom(Arc::new(render))
    }

    pub fn render(&self, ctx: CellContext<'_, T>) -> Line<'static> {
        match self {
            CellRenderer::Text => text_cell(ctx.value, ctx.style),
            CellRenderer::Mixed => {
                mixed_cell(ctx.value, ctx.props.numeric_unit.as_deref(), ctx.style)
            }
            CellRenderer::Tags => tag_cell(ctx.value, ctx.style),
            CellRenderer::Custom(render) => render(ctx),
        }
    }
}

impl<T> Clone for CellRenderer<T> {
    fn clone(&self) -> Self {
        match self {
            CellRenderer::Text => CellRenderer::Text,
            CellRenderer::Mixed => CellRenderer::Mixed,
            CellRenderer::Tags => CellRenderer::Tags,
            CellRenderer::Custom(render) => CellRenderer::Custom(Arc::clone(render)),
        }
    }
}

impl<T> fmt::Debug for CellRenderer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellRenderer::Text => write!(f, "Text"),
            CellRenderer::Mixed => write!(f, "Mixed"),
            CellRenderer::Tags => write!(f, "Tags"),
            CellRenderer::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Renders one body cell of `column` for `row`. Columns without a renderer
/// show the stringified value.
pub fn render_cell<T>(column: &ColumnDef<T>, row: &T) -> Line<'static> {
    let value = column.value(row);
    match &column.renderer {
        Some(renderer) => renderer.render(CellContext {
            value: &value,
            row,
            style: column.style.cell,
            props: &column.props,
        }),
        None => Line::styled(value.to_string(), column.style.cell),
    }
}

pub fn text_cell(value: &Value, style: Style) -> Line<'static> {
    match value {
        Value::Null => Line::default().style(style),
        Value::Text(s) => Line::styled(s.clone(), style),
        other => Line::styled(other.to_string(), style),
    }
}

pub fn mixed_cell(value: &Value, unit: Option<&str>, style: Style) -> Line<'static> {
    match value {
        Value::Number(n) => {
            let mut spans = vec![Span::styled(group_digits(*n), style)];
            if let Some(unit) = unit.filter(|u| !u.is_empty()) {
                spans.push(Span::styled(unit.to_string(), style.patch(MUTED)));
            }
            Line::from(spans).alignment(Alignment::Right)
        }
        Value::Null => Line::default().alignment(Alignment::Center),
        other => Line::styled(other.to_string(), style.patch(MUTED)).alignment(Alignment::Center),
    }
}

pub fn tag_cell(value: &Value, style: Style) -> Line<'static> {
    let tags: Vec<&str> = match value {
        Value::Tags(tags) => tags.iter().map(String::as_str).collect(),
        Value::Text(s) if !s.is_empty() => vec![s.as_str()],
        _ => Vec::new(),
    };
    tag_line(&tags, style)
}

/// Lays tokens out as separate badges on one line.
pub fn tag_line(tags: &[&str], style: Style) -> Line<'static> {
    let mut spans = Vec::with_capacity(tags.len() * 2);
    for (idx, tag) in tags.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(format!(" {tag} "), style.patch(TAG)));
    }
    Line::from(spans)
}

/// Formats a number with `,` digit grouping and at most three fraction
/// digits.
pub fn group_digits(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let formatted = format!("{:.3}", n.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, chr) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(chr);
    }

    let mut out = String::new();
    if n < 0.0 && (grouped != "0" || !frac_part.is_empty()) {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// What a header shows about the sort state of its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortIndicator {
    /// Column cannot be sorted.
    None,
    Unsorted,
    Sorted {
        direction: SortDirection,
        /// 1-based position, only set while more than one key is active.
        priority: Option<usize>,
    },
}

pub fn header_cell<T>(column: &ColumnDef<T>, indicator: SortIndicator) -> Line<'static> {
    let mut spans = vec![Span::styled(
        column.header.clone(),
        Style::new().add_modifier(Modifier::BOLD),
    )];
    match indicator {
        SortIndicator::None => {}
        SortIndicator::Unsorted => spans.push(Span::styled(format!(" {SORT_NEUTRAL}"), MUTED)),
        SortIndicator::Sorted {
            direction,
            priority,
        } => {
            let arrow = match direction {
                SortDirection::Asc => SORT_ASC,
                SortDirection::Desc => SORT_DESC,
            };
            spans.push(Span::raw(format!(" {arrow}")));
            if let Some(priority) = priority {
                spans.push(Span::styled(priority.to_string(), MUTED));
            }
        }
    }
    let line = Line::from(spans);
    match column.style.header_align {
        Some(align) => line.alignment(align),
        None => line,
    }
}

/// Plain text of a rendered line.
pub fn line_text(line: &Line) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

/// Byte ranges of every case-insensitive, non-overlapping occurrence of
/// `query` in `text`.
pub fn find_matches(text: &str, query: &str) -> Vec<Range<usize>> {
    let needle: Vec<char> = query.chars().flat_map(char::to_lowercase).collect();
    let mut matches = Vec::new();
    if needle.is_empty() {
        return matches;
    }

    let mut next_start = 0;
    for (start, _) in text.char_indices() {
        if start < next_start {
            continue;
        }
        if let Some(len) = match_len(&text[start..], &needle) {
            matches.push(start..start + len);
            next_start = start + len;
        }
    }
    matches
}

fn match_len(text: &str, needle: &[char]) -> Option<usize> {
    let mut matched = 0;
    for (idx, chr) in text.char_indices() {
        for lower in chr.to_lowercase() {
            if needle.get(matched) != Some(&lower) {
                return None;
            }
            matched += 1;
        }
        if matched == needle.len() {
            return Some(idx + chr.len_utf8());
        }
    }
    None
}

/// Restyles occurrences of `query` within each span. Occurrences crossing
/// span borders are not marked.
pub fn highlight_matches(mut line: Line<'static>, query: &str) -> Line<'static> {
    if query.is_empty() {
        return line;
    }
    let spans = std::mem::take(&mut line.spans);
    line.spans = spans
        .into_iter()
        .flat_map(|span| highlight_span(span, query))
        .collect();
    line
}

fn highlight_span(span: Span<'static>, query: &str) -> Vec<Span<'static>> {
    let matches = find_matches(&span.content, query);
    if matches.is_empty() {
        return vec![span];
    }

    let content = span.content.as_ref();
    let mut spans = Vec::with_capacity(matches.len() * 2 + 1);
    let mut last = 0;
    for range in matches {
        if range.start > last {
            spans.push(Span::styled(content[last..range.start].to_string(), span.style));
        }
        spans.push(Span::styled(
            content[range.clone()].to_string(),
            span.style.patch(MATCH),
        ));
        last = range.end;
    }
    if last < content.len() {
        spans.push(Span::styled(content[last..].to_string(), span.style));
    }
    spans
}
