use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use ratatui::layout::Alignment;
use ratatui::style::Style;
use serde::{Deserialize, Serialize};

use crate::cells::CellRenderer;
use crate::value::{SortValue, Value};

pub type ValueFn<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;
pub type SortFn<T> = Arc<dyn Fn(&T) -> SortValue + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Applies the direction to an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// One key of a multi column sort. Its position in the chain is its priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortEntry {
    pub column_id: String,
    pub direction: SortDirection,
}

impl SortEntry {
    pub fn new(column_id: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column_id: column_id.into(),
            direction,
        }
    }

    pub fn asc(column_id: impl Into<String>) -> Self {
        Self::new(column_id, SortDirection::Asc)
    }

    pub fn desc(column_id: impl Into<String>) -> Self {
        Self::new(column_id, SortDirection::Desc)
    }
}

/// Type specific extra properties handed to cell renderers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraProps {
    pub numeric_unit: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColumnStyle {
    pub header_align: Option<Alignment>,
    pub cell: Style,
}

/// A fully resolved column. Column lists of one table share the row type but
/// each column may have been built from a differently typed field.
pub struct ColumnDef<T> {
    pub id: String,
    pub header: String,
    pub get_value: ValueFn<T>,
    pub is_sortable: bool,
    pub get_sort_value: Option<SortFn<T>>,
    pub renderer: Option<CellRenderer<T>>,
    pub props: ExtraProps,
    pub style: ColumnStyle,
}

impl<T> ColumnDef<T> {
    /// A bare, unsortable column without a renderer.
    pub fn new(
        id: impl Into<String>,
        header: impl Into<String>,
        get_value: impl Fn(&T) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            get_value: Arc::new(get_value),
            is_sortable: false,
            get_sort_value: None,
            renderer: None,
            props: ExtraProps::default(),
            style: ColumnStyle::default(),
        }
    }

    pub fn sortable_by(
        mut self,
        get_sort_value: impl Fn(&T) -> SortValue + Send + Sync + 'static,
    ) -> Self {
        self.is_sortable = true;
        self.get_sort_value = Some(Arc::new(get_sort_value));
        self
    }

    pub fn with_renderer(mut self, renderer: CellRenderer<T>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn value(&self, row: &T) -> Value {
        (self.get_value)(row)
    }

    /// Sortable in practice: flagged sortable *and* able to produce a key.
    pub fn can_sort(&self) -> bool {
        self.is_sortable && self.get_sort_value.is_some()
    }

    pub fn sort_value(&self, row: &T) -> Option<SortValue> {
        match &self.get_sort_value {
            Some(get) if self.is_sortable => Some(get(row)),
            _ => None,
        }
    }
}

impl<T> Clone for ColumnDef<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            header: self.header.clone(),
            get_value: Arc::clone(&self.get_value),
            is_sortable: self.is_sortable,
            get_sort_value: self.get_sort_value.clone(),
            renderer: self.renderer.clone(),
            props: self.props.clone(),
            style: self.style,
        }
    }
}

impl<T> fmt::Debug for ColumnDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("is_sortable", &self.is_sortable)
            .field("has_sort_value", &self.get_sort_value.is_some())
            .field("renderer", &self.renderer)
            .field("props", &self.props)
            .finish()
    }
}
