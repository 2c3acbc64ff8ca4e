use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::cells::SortIndicator;
use crate::column::{ColumnDef, SortDirection, SortEntry};
use crate::sort::sort_order;

/// Serializable part of a [`TableState`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub sort_chain: Vec<SortEntry>,
    pub column_visibility: BTreeMap<String, bool>,
}

/// Interactive sort and visibility state of one table instance.
///
/// The row order is re-derived after every change of the sort chain or the
/// row snapshot, the snapshot itself is never modified.
pub struct TableState<T> {
    columns: Vec<ColumnDef<T>>,
    sort_chain: Vec<SortEntry>,
    column_visibility: HashMap<String, bool>,
    rows: Option<Arc<Vec<T>>>,
    order: Arc<Vec<usize>>, // Mapping of sorted position to snapshot index
}

impl<T> TableState<T> {
    pub fn new(columns: Vec<ColumnDef<T>>) -> Self {
        let column_visibility = columns.iter().map(|c| (c.id.clone(), true)).collect();
        Self {
            columns,
            sort_chain: Vec::new(),
            column_visibility,
            rows: None,
            order: Arc::new(Vec::new()),
        }
    }

    pub fn columns(&self) -> &[ColumnDef<T>] {
        &self.columns
    }

    pub fn column(&self, column_id: &str) -> Option<&ColumnDef<T>> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn sort_chain(&self) -> &[SortEntry] {
        &self.sort_chain
    }

    pub fn rows(&self) -> Option<&Arc<Vec<T>>> {
        self.rows.as_ref()
    }

    /// Replaces the row snapshot, keeping the sort chain.
    pub fn set_rows(&mut self, rows: Option<Arc<Vec<T>>>) {
        trace!(
            "New row snapshot with {} rows",
            rows.as_ref().map(|r| r.len()).unwrap_or(0)
        );
        self.rows = rows;
        self.update_order();
    }

    /// Header activation. Without `multi` a column cycles
    /// unsorted -> ascending -> descending -> unsorted and replaces any other
    /// sort. With `multi` the column is added to, flipped in or removed from
    /// the chain while the other keys stay where they are.
    pub fn toggle_sort(&mut self, column_id: &str, multi: bool) {
        match self.column(column_id) {
            Some(column) if column.can_sort() => {}
            Some(_) => {
                debug!("Column {column_id} is not sortable");
                return;
            }
            None => {
                debug!("Unknown column {column_id}");
                return;
            }
        }

        if multi {
            match self.sort_chain.iter().position(|e| e.column_id == column_id) {
                Some(idx) => match self.sort_chain[idx].direction {
                    SortDirection::Asc => self.sort_chain[idx].direction = SortDirection::Desc,
                    SortDirection::Desc => {
                        self.sort_chain.remove(idx);
                    }
                },
                None => self.sort_chain.push(SortEntry::asc(column_id)),
            }
        } else {
            self.sort_chain = match self.sort_chain.as_slice() {
                [only] if only.column_id == column_id => match only.direction {
                    SortDirection::Asc => vec![SortEntry::desc(column_id)],
                    SortDirection::Desc => Vec::new(),
                },
                _ => vec![SortEntry::asc(column_id)],
            };
        }
        debug!("Sort chain: {:?}", self.sort_chain);
        self.update_order();
    }

    pub fn clear_sort(&mut self) {
        self.sort_chain.clear();
        self.update_order();
    }

    pub fn sort_indicator(&self, column_id: &str) -> SortIndicator {
        match self.column(column_id) {
            Some(column) if column.can_sort() => {}
            _ => return SortIndicator::None,
        }
        let multi = self.sort_chain.len() > 1;
        match self.sort_chain.iter().position(|e| e.column_id == column_id) {
            Some(idx) => SortIndicator::Sorted {
                direction: self.sort_chain[idx].direction,
                priority: multi.then_some(idx + 1),
            },
            None => SortIndicator::Unsorted,
        }
    }

    pub fn is_visible(&self, column_id: &str) -> bool {
        self.column_visibility
            .get(column_id)
            .copied()
            .unwrap_or(false)
    }

    pub fn set_column_visibility(&mut self, column_id: &str, visible: bool) {
        match self.column_visibility.get_mut(column_id) {
            Some(v) => *v = visible,
            None => debug!("Unknown column {column_id}"),
        }
    }

    pub fn toggle_column_visibility(&mut self, column_id: &str) {
        let visible = self.is_visible(column_id);
        self.set_column_visibility(column_id, !visible);
    }

    pub fn show_all_columns(&mut self) {
        self.column_visibility.values_mut().for_each(|v| *v = true);
    }

    /// Columns in schema order, without the hidden ones.
    pub fn visible_columns(&self) -> Vec<&ColumnDef<T>> {
        self.columns
            .iter()
            .filter(|c| self.is_visible(&c.id))
            .collect()
    }

    /// Snapshot indices in display order.
    pub fn row_order(&self) -> &[usize] {
        &self.order
    }

    pub fn sorted_rows(&self) -> Vec<&T> {
        match &self.rows {
            Some(rows) => self.order.iter().map(|&idx| &rows[idx]).collect(),
            None => Vec::new(),
        }
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            sort_chain: self.sort_chain.clone(),
            column_visibility: self
                .column_visibility
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        }
    }

    /// Applies a stored snapshot. Entries for columns that no longer exist
    /// are kept in the chain but have no effect on the order.
    pub fn restore(&mut self, snapshot: TableSnapshot) {
        self.sort_chain = snapshot.sort_chain;
        for (column_id, visible) in snapshot.column_visibility {
            self.set_column_visibility(&column_id, visible);
        }
        self.update_order();
    }

    fn update_order(&mut self) {
        let order = match &self.rows {
            Some(rows) => sort_order(rows, &self.columns, &self.sort_chain),
            None => Vec::new(),
        };
        self.order = Arc::new(order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{SortValue, Value};

    #[derive(Debug, PartialEq)]
    struct Row {
        name: &'static str,
        height: Option<f64>,
        tag: &'static str,
    }

    fn columns() -> Vec<ColumnDef<Row>> {
        vec![
            ColumnDef::new("name", "Name", |r: &Row| Value::from(r.name))
                .sortable_by(|r: &Row| SortValue::from(r.name)),
            ColumnDef::new("height", "Height", |r: &Row| Value::from(r.height))
                .sortable_by(|r: &Row| SortValue::from(r.height)),
            ColumnDef::new("tag", "Tag", |r: &Row| Value::from(r.tag)),
        ]
    }

    fn rows() -> Arc<Vec<Row>> {
        Arc::new(vec![
            Row { name: "Vader", height: Some(202.0), tag: "b" },
            Row { name: "Yoda", height: Some(66.0), tag: "a" },
            Row { name: "Leia", height: Some(150.0), tag: "a" },
        ])
    }

    fn names(state: &TableState<Row>) -> Vec<&'static str> {
        state.sorted_rows().iter().map(|r| r.name).collect()
    }

    #[test]
    fn plain_toggle_cycles_through_three_states() {
        let mut state = TableState::new(columns());
        state.toggle_sort("height", false);
        assert_eq!(state.sort_chain(), [SortEntry::asc("height")]);
        state.toggle_sort("height", false);
        assert_eq!(state.sort_chain(), [SortEntry::desc("height")]);
        state.toggle_sort("height", false);
        assert!(state.sort_chain().is_empty());
    }

    #[test]
    fn plain_toggle_replaces_other_sorts() {
        let mut state = TableState::new(columns());
        state.toggle_sort("height", false);
        state.toggle_sort("name", false);
        assert_eq!(state.sort_chain(), [SortEntry::asc("name")]);

        state.toggle_sort("height", true);
        assert_eq!(state.sort_chain().len(), 2);
        // A multi entry chain is replaced even when it contains the column.
        state.toggle_sort("height", false);
        assert_eq!(state.sort_chain(), [SortEntry::asc("height")]);
    }

    #[test]
    fn multi_toggle_flips_removes_and_appends() {
        let mut state = TableState::new(columns());
        state.toggle_sort("name", true);
        state.toggle_sort("height", true);
        assert_eq!(
            state.sort_chain(),
            [SortEntry::asc("name"), SortEntry::asc("height")]
        );

        state.toggle_sort("name", true);
        assert_eq!(
            state.sort_chain(),
            [SortEntry::desc("name"), SortEntry::asc("height")]
        );

        state.toggle_sort("name", true);
        assert_eq!(state.sort_chain(), [SortEntry::asc("height")]);

        state.toggle_sort("name", true);
        assert_eq!(
            state.sort_chain(),
            [SortEntry::asc("height"), SortEntry::asc("name")]
        );
    }

    #[test]
    fn unsortable_and_unknown_columns_are_ignored() {
        let mut state = TableState::new(columns());
        state.toggle_sort("height", false);
        state.toggle_sort("tag", false);
        state.toggle_sort("tag", true);
        state.toggle_sort("nonexistent", false);
        state.toggle_sort("nonexistent", true);
        assert_eq!(state.sort_chain(), [SortEntry::asc("height")]);
    }

    #[test]
    fn sorted_rows_follow_chain_and_snapshot() {
        let mut state = TableState::new(columns());
        assert!(state.sorted_rows().is_empty());

        state.set_rows(Some(rows()));
        assert_eq!(names(&state), ["Vader", "Yoda", "Leia"]);

        state.toggle_sort("height", false);
        assert_eq!(names(&state), ["Yoda", "Leia", "Vader"]);
        state.toggle_sort("height", false);
        assert_eq!(names(&state), ["Vader", "Leia", "Yoda"]);

        // A refetch replaces the rows but keeps the user's sort.
        state.set_rows(Some(Arc::new(vec![
            Row { name: "Luke", height: Some(172.0), tag: "c" },
            Row { name: "Ghost", height: None, tag: "c" },
            Row { name: "R2-D2", height: Some(96.0), tag: "c" },
        ])));
        assert_eq!(state.sort_chain(), [SortEntry::desc("height")]);
        assert_eq!(names(&state), ["Luke", "R2-D2", "Ghost"]);
        assert_eq!(state.row_order(), [0, 2, 1]);

        state.set_rows(None);
        assert!(state.sorted_rows().is_empty());
        assert_eq!(state.sort_chain(), [SortEntry::desc("height")]);
    }

    #[test]
    fn visibility_filters_in_schema_order() {
        let mut state = TableState::new(columns());
        let ids = |s: &TableState<Row>| -> Vec<String> {
            s.visible_columns().iter().map(|c| c.id.clone()).collect()
        };
        assert_eq!(ids(&state), ["name", "height", "tag"]);

        state.set_column_visibility("height", false);
        assert_eq!(ids(&state), ["name", "tag"]);
        state.toggle_column_visibility("name");
        assert_eq!(ids(&state), ["tag"]);
        state.set_column_visibility("nonexistent", true);
        assert!(!state.is_visible("nonexistent"));
        state.show_all_columns();
        assert_eq!(ids(&state), ["name", "height", "tag"]);
    }

    #[test]
    fn indicators() {
        let mut state = TableState::new(columns());
        assert_eq!(state.sort_indicator("tag"), SortIndicator::None);
        assert_eq!(state.sort_indicator("name"), SortIndicator::Unsorted);

        state.toggle_sort("name", false);
        assert_eq!(
            state.sort_indicator("name"),
            SortIndicator::Sorted {
                direction: SortDirection::Asc,
                priority: None
            }
        );

        state.toggle_sort("height", true);
        state.toggle_sort("height", true);
        assert_eq!(
            state.sort_indicator("height"),
            SortIndicator::Sorted {
                direction: SortDirection::Desc,
                priority: Some(2)
            }
        );
        assert_eq!(
            state.sort_indicator("name"),
            SortIndicator::Sorted {
                direction: SortDirection::Asc,
                priority: Some(1)
            }
        );
    }

    #[test]
    fn instances_do_not_share_state() {
        let shared = rows();
        let mut a = TableState::new(columns());
        let mut b = TableState::new(columns());
        a.set_rows(Some(Arc::clone(&shared)));
        b.set_rows(Some(Arc::clone(&shared)));
        a.toggle_sort("name", false);
        b.toggle_sort("height", false);
        assert_eq!(names(&a), ["Leia", "Vader", "Yoda"]);
        assert_eq!(names(&b), ["Yoda", "Leia", "Vader"]);
        assert_eq!(shared[0].name, "Vader");
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut state = TableState::new(columns());
        state.set_rows(Some(rows()));
        state.toggle_sort("height", true);
        state.toggle_sort("name", true);
        state.set_column_visibility("tag", false);

        let json = serde_json::to_string(&state.snapshot()).unwrap();
        assert!(json.contains("\"direction\":\"asc\""));

        let mut restored = TableState::new(columns());
        restored.set_rows(Some(rows()));
        restored.restore(serde_json::from_str(&json).unwrap());
        assert_eq!(restored.snapshot(), state.snapshot());
        assert_eq!(names(&restored), names(&state));
    }

    #[test]
    fn stale_restored_entries_do_not_break_sorting() {
        let json = r#"{
            "sort_chain": [
                {"column_id": "dropped_column", "direction": "desc"},
                {"column_id": "tag", "direction": "asc"},
                {"column_id": "height", "direction": "asc"}
            ],
            "column_visibility": {"dropped_column": false}
        }"#;
        let mut state = TableState::new(columns());
        state.set_rows(Some(rows()));
        state.restore(serde_json::from_str(json).unwrap());
        assert_eq!(names(&state), ["Yoda", "Leia", "Vader"]);
        assert_eq!(state.visible_columns().len(), 3);
    }
}
