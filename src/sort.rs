use std::cmp::Ordering;

use tracing::trace;

use crate::column::{ColumnDef, SortDirection, SortEntry, SortFn};
use crate::value::SortValue;

/// Compares two sort values of one key. Nulls go last in both directions,
/// the direction only applies between non-null values.
pub fn compare_sort_values(a: &SortValue, b: &SortValue, direction: SortDirection) -> Ordering {
    match (a, b) {
        (SortValue::Null, SortValue::Null) => Ordering::Equal,
        (SortValue::Null, _) => Ordering::Greater,
        (_, SortValue::Null) => Ordering::Less,
        (SortValue::Number(x), SortValue::Number(y)) => direction.apply(x.total_cmp(y)),
        (SortValue::Text(x), SortValue::Text(y)) => direction.apply(x.cmp(y)),
        (SortValue::Number(_), SortValue::Text(_)) => direction.apply(Ordering::Less),
        (SortValue::Text(_), SortValue::Number(_)) => direction.apply(Ordering::Greater),
    }
}

/// Resolves the entries to sort keys, dropping entries that point to an
/// unknown or unsortable column.
fn resolve_keys<'a, T>(
    columns: &'a [ColumnDef<T>],
    entries: &[SortEntry],
) -> Vec<(&'a SortFn<T>, SortDirection)> {
    entries
        .iter()
        .filter_map(|entry| {
            let column = columns.iter().find(|c| c.id == entry.column_id);
            match column {
                Some(column) if column.is_sortable => column
                    .get_sort_value
                    .as_ref()
                    .map(|get| (get, entry.direction)),
                Some(_) => {
                    trace!("Dropping sort entry for unsortable column {}", entry.column_id);
                    None
                }
                None => {
                    trace!("Dropping sort entry for unknown column {}", entry.column_id);
                    None
                }
            }
        })
        .collect()
}

/// Returns the indices of `rows` in sorted order. The sort is stable, rows
/// that tie on every key keep their relative order.
pub fn sort_order<T>(rows: &[T], columns: &[ColumnDef<T>], entries: &[SortEntry]) -> Vec<usize> {
    let keys = resolve_keys(columns, entries);
    if keys.is_empty() || rows.len() < 2 {
        return (0..rows.len()).collect();
    }

    // Extract every key once per row instead of once per comparison.
    let mut decorated: Vec<(usize, Vec<SortValue>)> = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| (idx, keys.iter().map(|(get, _)| get(row)).collect()))
        .collect();

    decorated.sort_by(|(_, a), (_, b)| {
        a.iter()
            .zip(b.iter())
            .zip(keys.iter())
            .map(|((a, b), (_, direction))| compare_sort_values(a, b, *direction))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });

    decorated.into_iter().map(|(idx, _)| idx).collect()
}

/// Sorts `rows` by the chain of `entries` into a new vector of references.
pub fn sort_data<'a, T>(
    rows: &'a [T],
    columns: &[ColumnDef<T>],
    entries: &[SortEntry],
) -> Vec<&'a T> {
    sort_order(rows, columns, entries)
        .into_iter()
        .map(|idx| &rows[idx])
        .collect()
}
