use super::model::{CellValue, ColumnRef, RecordTable, Warning};

// ---------------------------------------------------------------------------
// Row predicates
// ---------------------------------------------------------------------------

/// Whether a cell carries the quota marker.
///
/// Only text counts. The match is a case-insensitive substring test, so
/// `"sim"`, `"SIM"` and `"Sim"` all qualify while `"NAO"` and empty cells do not.
pub fn contains_marker(value: &CellValue, marker: &str) -> bool {
    value
        .as_text()
        .is_some_and(|s| s.to_uppercase().contains(&marker.to_uppercase()))
}

/// Rows selected by a filter, plus why the selection may be degraded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub rows: Vec<usize>,
    pub warning: Option<Warning>,
}

impl FilterOutcome {
    fn missing(column: &str) -> Self {
        FilterOutcome {
            rows: Vec::new(),
            warning: Some(Warning::MissingColumn {
                column: column.to_string(),
            }),
        }
    }
}

/// Return indices of rows whose `column` contains `marker`.
///
/// A missing column is not an error: the outcome is empty and carries a
/// [`Warning::MissingColumn`].
pub fn quota_subset(table: &RecordTable, column: &str, marker: &str) -> FilterOutcome {
    let Some(col) = table.column(column) else {
        log::warn!("Quota column '{column}' not present; subset is empty");
        return FilterOutcome::missing(column);
    };
    FilterOutcome {
        rows: matching_rows(table, col, |v| contains_marker(v, marker)),
        warning: None,
    }
}

/// Rows whose numeric value in `column` is at least `threshold`.
pub fn at_least(table: &RecordTable, column: ColumnRef, threshold: f64) -> Vec<usize> {
    matching_rows(table, column, |v| v.as_f64().is_some_and(|x| x >= threshold))
}

/// Rows present in both subsets, kept in table order.
///
/// Both inputs come from [`matching_rows`] and are therefore sorted.
pub fn intersect(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn matching_rows(
    table: &RecordTable,
    column: ColumnRef,
    predicate: impl Fn(&CellValue) -> bool,
) -> Vec<usize> {
    table
        .column_values(column)
        .enumerate()
        .filter(|(_, v)| predicate(v))
        .map(|(i, _)| i)
        .collect()
}
