//! Missing-value reporting.
//!
//! Reports the share of missing cells per column as a percentage. A
//! zero-row dataset reports 0.0 for every column.

use crate::models::Dataset;

use super::models::{ColumnMissing, MissingReport};
use super::stats::round_to;

/// Decimal places kept in reported percentages.
const PCT_DECIMALS: i32 = 4;

/// Computes the missing percentage of every column, in column order.
pub fn missing_report(dataset: &Dataset) -> MissingReport {
    let total = dataset.row_count();

    let missing_pct = dataset
        .columns()
        .iter()
        .map(|column| {
            let pct = if total == 0 {
                0.0
            } else {
                round_to(
                    column.missing_count() as f64 * 100.0 / total as f64,
                    PCT_DECIMALS,
                )
            };
            ColumnMissing {
                column: column.name.clone(),
                pct,
            }
        })
        .collect();

    MissingReport { missing_pct }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;

    #[test]
    fn test_missing_report() {
        let dataset = Dataset::from_columns(vec![
            Column::integer("full", vec![Some(1), Some(2), Some(3)]),
            Column::float("third", vec![Some(1.0), None, Some(3.0)]),
            Column::text("empty", vec![None, None, None]),
        ])
        .unwrap();

        let report = missing_report(&dataset);
        let pcts: Vec<(&str, f64)> = report
            .missing_pct
            .iter()
            .map(|m| (m.column.as_str(), m.pct))
            .collect();

        assert_eq!(
            pcts,
            vec![("full", 0.0), ("third", 33.3333), ("empty", 100.0)]
        );
    }

    #[test]
    fn test_missing_report_zero_rows() {
        let dataset = Dataset::from_columns(vec![
            Column::integer("a", vec![]),
            Column::text("b", vec![]),
        ])
        .unwrap();

        let report = missing_report(&dataset);
        assert_eq!(report.missing_pct.len(), 2);
        assert!(report.missing_pct.iter().all(|m| m.pct == 0.0));
    }
}
