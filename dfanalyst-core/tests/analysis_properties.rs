//! Property tests for the analysis operations.
//!
//! Datasets are generated with random shapes, random missing cells and a
//! mix of integer, float and text columns.

use dfanalyst_core::analysis::{
    CorrelationMethod, GroupByConfig, GroupByRequest, OutlierConfig, OutlierMethod,
    OutlierRequest, correlation, detect_outliers, groupby, infer_schema, missing_report,
};
use dfanalyst_core::analysis::stats;
use dfanalyst_core::models::{Column, Dataset};
use proptest::prelude::*;

/// Strategy for one column of `rows` cells, roughly a third missing.
fn column(index: usize, rows: usize) -> impl Strategy<Value = Column> {
    let name = format!("c{}", index);
    prop_oneof![
        proptest::collection::vec(proptest::option::weighted(0.7, -1000i64..1000), rows)
            .prop_map({
                let name = name.clone();
                move |values| Column::integer(name.clone(), values)
            }),
        proptest::collection::vec(proptest::option::weighted(0.7, -1e6f64..1e6), rows)
            .prop_map({
                let name = name.clone();
                move |values| Column::float(name.clone(), values)
            }),
        proptest::collection::vec(proptest::option::weighted(0.7, "[a-c0-9]{1,3}"), rows)
            .prop_map(move |values| Column::text(name.clone(), values)),
    ]
}

/// Kendall's tau-b by direct pair enumeration.
fn kendall_pairwise(x: &[f64], y: &[f64]) -> Option<f64> {
    use std::cmp::Ordering::Equal;

    let (mut concordant, mut discordant, mut ties_x, mut ties_y) = (0u64, 0u64, 0u64, 0u64);
    for (i, (xi, yi)) in x.iter().zip(y).enumerate() {
        for (xj, yj) in x.iter().zip(y).skip(i.saturating_add(1)) {
            let counter = match (xi.total_cmp(xj), yi.total_cmp(yj)) {
                (Equal, Equal) => continue,
                (Equal, _) => &mut ties_x,
                (_, Equal) => &mut ties_y,
                (dx, dy) if dx == dy => &mut concordant,
                _ => &mut discordant,
            };
            *counter = counter.saturating_add(1);
        }
    }
    let ranked = concordant.saturating_add(discordant);
    let denominator =
        (ranked.saturating_add(ties_x) as f64 * ranked.saturating_add(ties_y) as f64).sqrt();
    (denominator > 0.0).then(|| (concordant as f64 - discordant as f64) / denominator)
}

/// Strategy for a dataset of 1-4 columns and 0-40 rows.
fn dataset() -> impl Strategy<Value = Dataset> {
    (0usize..40, 1usize..5).prop_flat_map(|(rows, width)| {
        (0..width)
            .map(|index| column(index, rows))
            .collect::<Vec<_>>()
            .prop_map(|columns| Dataset::from_columns(columns).expect("equal lengths"))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn missing_pct_within_bounds(dataset in dataset()) {
        let report = missing_report(&dataset);
        prop_assert_eq!(report.missing_pct.len(), dataset.column_count());
        for entry in &report.missing_pct {
            prop_assert!((0.0..=100.0).contains(&entry.pct), "pct out of range: {}", entry.pct);
            if dataset.row_count() == 0 {
                prop_assert_eq!(entry.pct, 0.0);
            }
        }
    }

    #[test]
    fn nullable_iff_missing(dataset in dataset()) {
        let report = infer_schema(&dataset);
        for (entry, column) in report.schema.iter().zip(dataset.columns()) {
            prop_assert_eq!(entry.nullable, column.missing_count() > 0);
        }
    }

    #[test]
    fn correlation_is_symmetric_with_unit_diagonal(dataset in dataset()) {
        for method in [CorrelationMethod::Pearson, CorrelationMethod::Spearman, CorrelationMethod::Kendall] {
            let report = correlation(&dataset, method);
            for row in &report.matrix {
                for other in &report.matrix {
                    prop_assert_eq!(
                        report.coefficient(&row.col, &other.col),
                        report.coefficient(&other.col, &row.col)
                    );
                }
                let value = report.coefficient(&row.col, &row.col).unwrap_or(f64::NAN);
                prop_assert!(value == 0.0 || value == 1.0);
            }
        }
    }

    #[test]
    fn pearson_diagonal_is_one_with_variance(dataset in dataset()) {
        let report = correlation(&dataset, CorrelationMethod::Pearson);
        for column in dataset.columns() {
            let mut values: Vec<f64> = column.to_numeric().into_iter().flatten().collect();
            values.sort_by(f64::total_cmp);
            values.dedup();
            let expected = if values.len() > 1 { 1.0 } else { 0.0 };
            prop_assert_eq!(report.coefficient(&column.name, &column.name), Some(expected));
        }
    }

    #[test]
    fn read_operations_are_idempotent(dataset in dataset()) {
        prop_assert_eq!(missing_report(&dataset), missing_report(&dataset));
        prop_assert_eq!(infer_schema(&dataset), infer_schema(&dataset));
        prop_assert_eq!(
            correlation(&dataset, CorrelationMethod::Spearman),
            correlation(&dataset, CorrelationMethod::Spearman)
        );
    }

    #[test]
    fn outlier_rows_are_ascending_and_present(dataset in dataset(), z in 0.0f64..4.0) {
        let name = &dataset.columns()[0].name;
        let values = dataset.columns()[0].to_numeric();
        for method in [OutlierMethod::Iqr, OutlierMethod::Zscore] {
            let request = OutlierRequest::new(name.clone()).with_method(method).with_z(z);
            let report = detect_outliers(&dataset, &request, &OutlierConfig::default())
                .expect("column exists");
            prop_assert_eq!(report.count, report.outliers.len());
            prop_assert!(report.outliers.windows(2).all(|w| w[0].row < w[1].row));
            for outlier in &report.outliers {
                prop_assert_eq!(outlier.value, values[outlier.row]);
            }
        }
    }

    #[test]
    fn group_counts_cover_every_present_value(dataset in dataset()) {
        let key = dataset.columns()[0].name.clone();
        let metric = dataset.columns()[dataset.column_count() - 1].name.clone();
        let request = GroupByRequest::new([key]).with_metric(metric.clone(), ["count"]);
        let report = groupby(&dataset, &request, &GroupByConfig::default()).expect("columns exist");

        let total: u64 = report
            .groups
            .iter()
            .map(|g| g[&format!("{}_count", metric)].as_u64().unwrap_or(0))
            .sum();
        let present = dataset
            .column(&metric)
            .map(|c| c.to_numeric().into_iter().flatten().count())
            .unwrap_or(0);
        prop_assert_eq!(total, present as u64);
    }

    #[test]
    fn kendall_matches_pairwise_enumeration(
        pairs in proptest::collection::vec((-3i32..4, -3i32..4), 0..40)
    ) {
        let x: Vec<f64> = pairs.iter().map(|p| f64::from(p.0)).collect();
        let y: Vec<f64> = pairs.iter().map(|p| f64::from(p.1)).collect();
        match (stats::kendall(&x, &y), kendall_pairwise(&x, &y)) {
            (Some(fast), Some(slow)) => prop_assert!((fast - slow).abs() < 1e-9, "{} vs {}", fast, slow),
            (fast, slow) => prop_assert_eq!(fast, slow),
        }
    }

    #[test]
    fn constant_column_has_no_zscore_outliers(
        value in -1e3f64..1e3,
        rows in 1usize..30,
        z in 0.0f64..4.0,
    ) {
        let dataset = Dataset::from_columns(vec![Column::float("c", vec![Some(value); rows])])
            .expect("single column");
        let request = OutlierRequest::new("c").with_method(OutlierMethod::Zscore).with_z(z);
        let report = detect_outliers(&dataset, &request, &OutlierConfig::default())
            .expect("column exists");
        prop_assert_eq!(report.count, 0);
    }
}
