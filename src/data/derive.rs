use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::model::{CellValue, ColumnRef, RecordTable};

/// Average length of a year, leap days included.
pub const DAYS_PER_YEAR: f64 = 365.25;

const TEXT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];
const TEXT_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

// ---------------------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------------------

/// Read a birth date out of a cell. Anything that is not a date becomes
/// `None` instead of failing the pass.
pub fn parse_birth_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Text(s) => parse_text_date(s.trim()),
        _ => None,
    }
}

fn parse_text_date(s: &str) -> Option<NaiveDate> {
    TEXT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            TEXT_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Age in fractional years at `reference`.
pub fn age_in_years(birth: NaiveDate, reference: NaiveDate) -> f64 {
    (reference - birth).num_days() as f64 / DAYS_PER_YEAR
}

// ---------------------------------------------------------------------------
// Per-row ages and aggregates
// ---------------------------------------------------------------------------

/// Age at `reference` for every row; rows without a usable birth date are `None`.
pub fn ages_at(table: &RecordTable, birth: ColumnRef, reference: NaiveDate) -> Vec<Option<f64>> {
    table
        .column_values(birth)
        .map(|cell| parse_birth_date(cell).map(|b| age_in_years(b, reference)))
        .collect()
}

/// Mean over the ages that are present.
pub fn mean_age(ages: &[Option<f64>]) -> Option<f64> {
    let (sum, n) = ages
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, n), age| (sum + age, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Whether an age aggregate could be computed at all.
///
/// A sheet without a birth-date column is `Unavailable`, which is not the
/// same thing as a mean of zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum AgeAvailability {
    Available(f64),
    /// The column exists but no row has a parseable date.
    NoValidDates,
    /// The birth-date column is missing.
    Unavailable,
}

/// One histogram bucket `[lower, upper)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Group present ages into buckets of `bin_width` years. Empty buckets are
/// left out; the result is sorted by `lower`.
pub fn age_distribution(ages: &[Option<f64>], bin_width: f64) -> Vec<AgeBin> {
    if bin_width <= 0.0 {
        return Vec::new();
    }
    let mut bins: Vec<AgeBin> = Vec::new();
    for age in ages.iter().flatten() {
        let lower = (age / bin_width).floor() * bin_width;
        match bins.iter_mut().find(|b| b.lower == lower) {
            Some(bin) => bin.count += 1,
            None => bins.push(AgeBin {
                lower,
                upper: lower + bin_width,
                count: 1,
            }),
        }
    }
    bins.sort_by(|a, b| a.lower.total_cmp(&b.lower));
    bins
}

/// Append (or refresh) the age-at-cutoff column computed from `birth`.
pub fn derive_cutoff_ages(
    table: &mut RecordTable,
    birth: ColumnRef,
    cutoff: NaiveDate,
    target: &str,
) -> ColumnRef {
    let ages = ages_at(table, birth, cutoff);
    let present = ages.iter().flatten().count();
    log::debug!(
        "Derived '{target}' from '{}' at {cutoff}: {present}/{} rows have a valid birth date",
        table.column_name(birth),
        ages.len()
    );
    table.push_column(target, ages.into_iter().map(CellValue::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn age_is_days_over_365_25() {
        let age = age_in_years(date(1960, 1, 1), date(2024, 1, 1));
        assert!((age - 64.0).abs() < 1e-9);

        let age = age_in_years(date(2000, 3, 1), date(2001, 3, 1));
        assert!((age - 365.0 / 365.25).abs() < 1e-12);
    }

    #[test]
    fn text_dates_are_parsed_in_common_layouts() {
        let expected = Some(date(1960, 1, 1));
        assert_eq!(parse_birth_date(&text("1960-01-01")), expected);
        assert_eq!(parse_birth_date(&text("01/01/1960")), expected);
        assert_eq!(parse_birth_date(&text("1960-01-01 00:00:00")), expected);
        assert_eq!(parse_birth_date(&text(" 1960-01-01 ")), expected);
    }

    #[test]
    fn malformed_dates_become_absent() {
        assert_eq!(parse_birth_date(&text("ontem")), None);
        assert_eq!(parse_birth_date(&text("1960-13-45")), None);
        assert_eq!(parse_birth_date(&CellValue::Integer(1960)), None);
        assert_eq!(parse_birth_date(&CellValue::Empty), None);
    }

    #[test]
    fn ages_follow_rows_and_mean_skips_gaps() {
        let table = RecordTable::new(
            vec!["NASCIMENTO".into()],
            vec![
                vec![text("1960-01-01")],
                vec![text("sem data")],
                vec![CellValue::DateTime(
                    date(1984, 1, 1).and_time(chrono::NaiveTime::MIN),
                )],
            ],
        );
        let col = table.column("NASCIMENTO").unwrap();
        let ages = ages_at(&table, col, date(2024, 1, 1));
        assert_eq!(ages.len(), 3);
        assert!(ages[1].is_none());

        let mean = mean_age(&ages).unwrap();
        let expected = (64.0 + age_in_years(date(1984, 1, 1), date(2024, 1, 1))) / 2.0;
        assert!((mean - expected).abs() < 1e-9);
    }

    #[test]
    fn mean_of_nothing_is_none() {
        assert_eq!(mean_age(&[None, None]), None);
        assert_eq!(mean_age(&[]), None);
    }

    #[test]
    fn distribution_buckets_are_sorted_and_sparse() {
        let bins = age_distribution(&[Some(64.0), Some(21.5), None, Some(68.9), Some(20.0)], 10.0);
        assert_eq!(
            bins,
            vec![
                AgeBin {
                    lower: 20.0,
                    upper: 30.0,
                    count: 2
                },
                AgeBin {
                    lower: 60.0,
                    upper: 70.0,
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn cutoff_column_is_appended_with_gaps() {
        let mut table = RecordTable::new(
            vec!["NOME".into(), "NASCIMENTO".into()],
            vec![
                vec![text("Ana"), text("1960-01-01")],
                vec![text("Bia"), text("??")],
            ],
        );
        let birth = table.column("NASCIMENTO").unwrap();
        let col = derive_cutoff_ages(&mut table, birth, date(2024, 1, 1), "IDADE_CONCURSO");
        assert_eq!(table.column_name(col), "IDADE_CONCURSO");
        assert!((table.cell(0, col).as_f64().unwrap() - 64.0).abs() < 1e-9);
        assert_eq!(table.cell(1, col), &CellValue::Empty);
    }
}
