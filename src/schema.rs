//! Declarative column construction.
//!
//! A column is described by a typed [`Field`] and a [`ColumnConfig`] whose
//! kind parameter selects the default sortability, sort key and renderer.
//! Which kinds a field may use is decided by its value type through
//! [`AllowsKind`], so a tag column over a numeric field does not compile:
//!
//! ```compile_fail
//! use rtv::schema::{col, ColumnConfig, Field};
//!
//! struct Row {
//!     tags: Vec<String>,
//! }
//! const TAGS: Field<Row, Vec<String>> = Field::new("tags", |r, _| r.tags.clone());
//! let _ = col(TAGS, ColumnConfig::numeric("Tags"));
//! ```
//!
//! ```
//! use rtv::schema::{col, ColumnConfig, Field};
//! use rtv::value::Mixed;
//!
//! struct Row {
//!     height: Mixed,
//! }
//! const HEIGHT: Field<Row, Mixed> = Field::new("height", |r, _| r.height.clone());
//! let column = col(HEIGHT, ColumnConfig::numeric("Height").unit(" cm"));
//! assert!(column.can_sort());
//! ```
use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

use derive_setters::Setters;
use ratatui::layout::Alignment;
use ratatui::style::Style;
use tracing::trace;

use crate::cells::{CellContext, CellRenderer};
use crate::column::{ColumnDef, ColumnStyle, ExtraProps, SortFn, ValueFn};
use crate::value::{Mixed, SortValue, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Numeric,
    TagArray,
}

/// Marker types for the kind parameter of [`ColumnConfig`].
pub mod kind {
    use super::ColumnType;

    pub trait ColumnKind {
        const TYPE: Option<ColumnType>;
    }

    #[derive(Debug, Clone, Copy)]
    pub struct Text;
    #[derive(Debug, Clone, Copy)]
    pub struct Numeric;
    #[derive(Debug, Clone, Copy)]
    pub struct TagArray;
    /// No preset; everything comes from the config.
    #[derive(Debug, Clone, Copy)]
    pub struct Untyped;

    impl ColumnKind for Text {
        const TYPE: Option<ColumnType> = Some(ColumnType::Text);
    }
    impl ColumnKind for Numeric {
        const TYPE: Option<ColumnType> = Some(ColumnType::Numeric);
    }
    impl ColumnKind for TagArray {
        const TYPE: Option<ColumnType> = Some(ColumnType::TagArray);
    }
    impl ColumnKind for Untyped {
        const TYPE: Option<ColumnType> = None;
    }
}

use kind::ColumnKind;

/// Implemented by field value types for every column kind they may use.
pub trait AllowsKind<K> {}

impl<V> AllowsKind<kind::Text> for V {}
impl<V> AllowsKind<kind::Untyped> for V {}

macro_rules! allows_numeric {
    ($($t:ty),*) => {
        $(
            impl AllowsKind<kind::Numeric> for $t {}
            impl AllowsKind<kind::Numeric> for Option<$t> {}
        )*
    };
}

allows_numeric!(f64, i64, i32, u64, u32, Mixed);

impl AllowsKind<kind::TagArray> for Vec<String> {}
impl AllowsKind<kind::TagArray> for Option<Vec<String>> {}

// Dynamic values are only known at runtime and degrade at render/sort time.
impl AllowsKind<kind::Numeric> for Value {}
impl AllowsKind<kind::TagArray> for Value {}

/// A typed field of row type `T` holding values of type `V`.
pub struct Field<T, V> {
    key: Cow<'static, str>,
    get: fn(&T, &str) -> V,
}

impl<T, V> Field<T, V> {
    pub const fn new(key: &'static str, get: fn(&T, &str) -> V) -> Self {
        Self {
            key: Cow::Borrowed(key),
            get,
        }
    }

    /// A field whose key is only known at runtime.
    pub fn dynamic(key: impl Into<String>, get: fn(&T, &str) -> V) -> Self {
        Self {
            key: Cow::Owned(key.into()),
            get,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn read(&self, row: &T) -> V {
        (self.get)(row, &self.key)
    }
}

impl<T, V> Clone for Field<T, V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            get: self.get,
        }
    }
}

#[derive(Setters)]
#[setters(strip_option)]
pub struct ColumnConfig<T, K> {
    #[setters(into)]
    pub label: String,
    pub is_sortable: Option<bool>,
    pub header_align: Option<Alignment>,
    pub cell_style: Option<Style>,
    #[setters(skip)]
    pub get_value: Option<ValueFn<T>>,
    #[setters(skip)]
    pub get_sort_value: Option<SortFn<T>>,
    #[setters(skip)]
    pub renderer: Option<CellRenderer<T>>,
    #[setters(skip)]
    numeric_unit: Option<String>,
    #[setters(skip)]
    kind: PhantomData<K>,
}

impl<T, K: ColumnKind> ColumnConfig<T, K> {
    fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            is_sortable: None,
            header_align: None,
            cell_style: None,
            get_value: None,
            get_sort_value: None,
            renderer: None,
            numeric_unit: None,
            kind: PhantomData,
        }
    }

    pub fn value_with(mut self, get: impl Fn(&T) -> Value + Send + Sync + 'static) -> Self {
        self.get_value = Some(Arc::new(get));
        self
    }

    pub fn sort_with(mut self, get: impl Fn(&T) -> SortValue + Send + Sync + 'static) -> Self {
        self.get_sort_value = Some(Arc::new(get));
        self
    }

    pub fn render_with(mut self, renderer: CellRenderer<T>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Shorthand for a custom renderer closure.
    pub fn render_custom(
        self,
        render: impl Fn(CellContext<'_, T>) -> ratatui::text::Line<'static> + Send + Sync + 'static,
    ) -> Self {
        self.render_with(CellRenderer::custom(render))
    }
}

impl<T> ColumnConfig<T, kind::Text> {
    pub fn text(label: impl Into<String>) -> Self {
        Self::with_label(label)
    }
}

impl<T> ColumnConfig<T, kind::Numeric> {
    pub fn numeric(label: impl Into<String>) -> Self {
        Self::with_label(label)
    }

    /// Suffix appended to rendered numbers, e.g. `" cm"`.
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.numeric_unit = Some(unit.into());
        self
    }
}

impl<T> ColumnConfig<T, kind::TagArray> {
    pub fn tags(label: impl Into<String>) -> Self {
        Self::with_label(label)
    }
}

impl<T> ColumnConfig<T, kind::Untyped> {
    pub fn custom(label: impl Into<String>) -> Self {
        Self::with_label(label)
    }
}

struct TypeDefaults<T> {
    is_sortable: bool,
    header_align: Option<Alignment>,
    renderer: CellRenderer<T>,
}

impl<T> TypeDefaults<T> {
    fn of(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Text => Self {
                is_sortable: true,
                header_align: None,
                renderer: CellRenderer::Text,
            },
            ColumnType::Numeric => Self {
                is_sortable: true,
                header_align: Some(Alignment::Center),
                renderer: CellRenderer::Mixed,
            },
            ColumnType::TagArray => Self {
                is_sortable: false,
                header_align: None,
                renderer: CellRenderer::Tags,
            },
        }
    }
}

fn numeric_sort_value<T: 'static>(get_value: ValueFn<T>) -> SortFn<T> {
    Arc::new(move |row| match get_value(row) {
        Value::Number(n) if !n.is_nan() => SortValue::Number(n),
        _ => SortValue::Null,
    })
}

fn text_sort_value<T: 'static>(get_value: ValueFn<T>) -> SortFn<T> {
    Arc::new(move |row| match get_value(row) {
        Value::Null => SortValue::Null,
        Value::Text(s) => SortValue::Text(s),
        other => SortValue::Text(other.to_string()),
    })
}

/// Builds the column for `field` from `config`: explicit settings win over
/// the kind's defaults, which win over nothing.
pub fn col<T, V, K>(field: Field<T, V>, config: ColumnConfig<T, K>) -> ColumnDef<T>
where
    T: 'static,
    V: Into<Value> + AllowsKind<K> + 'static,
    K: ColumnKind,
{
    let column_type = K::TYPE;
    let defaults = column_type.map(TypeDefaults::<T>::of);
    let id = field.key().to_string();

    let is_sortable = config
        .is_sortable
        .or(defaults.as_ref().map(|d| d.is_sortable))
        .unwrap_or(false);

    let get_value: ValueFn<T> = match config.get_value {
        Some(get) => get,
        None => Arc::new(move |row: &T| field.read(row).into()),
    };

    let get_sort_value = match (config.get_sort_value, column_type) {
        (Some(get), _) => Some(get),
        (None, Some(ColumnType::Numeric)) if is_sortable => {
            Some(numeric_sort_value(Arc::clone(&get_value)))
        }
        (None, Some(ColumnType::Text)) if is_sortable => {
            Some(text_sort_value(Arc::clone(&get_value)))
        }
        // Arrays have no natural order, tag columns stay unsortable.
        _ => None,
    };

    let header_align = config
        .header_align
        .or(defaults.as_ref().and_then(|d| d.header_align));
    let renderer = config.renderer.or(defaults.map(|d| d.renderer));

    let props = ExtraProps {
        numeric_unit: match column_type {
            Some(ColumnType::Numeric) => config.numeric_unit,
            _ => None,
        },
    };

    let header = if config.label.is_empty() {
        id.clone()
    } else {
        config.label
    };

    let column = ColumnDef {
        id,
        header,
        get_value,
        is_sortable,
        get_sort_value,
        renderer,
        props,
        style: ColumnStyle {
            header_align,
            cell: config.cell_style.unwrap_or_default(),
        },
    };
    trace!(
        "Built column \"{}\" ({:?}), sortable: {}",
        column.id,
        column_type,
        column.can_sort()
    );
    column
}
