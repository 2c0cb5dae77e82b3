//! Tests for the dataset models.

use super::*;

fn sales() -> Dataset {
    Dataset::from_columns(vec![
        Column::integer("precio", vec![Some(1), Some(2), Some(3), Some(4), Some(5)]),
        Column::text(
            "categoria",
            vec![
                Some("A".to_string()),
                Some("A".to_string()),
                Some("B".to_string()),
                Some("B".to_string()),
                Some("C".to_string()),
            ],
        ),
    ])
    .unwrap()
}

#[test]
fn test_dataset_creation() {
    let dataset = sales();
    assert_eq!(dataset.row_count(), 5);
    assert_eq!(dataset.column_count(), 2);
    assert_eq!(dataset.column_names(), vec!["precio", "categoria"]);
}

#[test]
fn test_empty_dataset() {
    let dataset = Dataset::new();
    assert_eq!(dataset.row_count(), 0);
    assert_eq!(dataset.column_count(), 0);
    assert!(dataset.head_records(5).is_empty());
}

#[test]
fn test_unequal_column_lengths_rejected() {
    let result = Dataset::from_columns(vec![
        Column::integer("a", vec![Some(1), Some(2)]),
        Column::integer("b", vec![Some(1)]),
    ]);
    assert!(matches!(
        result,
        Err(AnalystError::InvalidArgument { .. })
    ));
}

#[test]
fn test_duplicate_column_rejected() {
    let result = Dataset::from_columns(vec![
        Column::integer("a", vec![Some(1)]),
        Column::float("a", vec![Some(1.0)]),
    ]);
    assert!(result.is_err());
}

#[test]
fn test_require_column() {
    let dataset = sales();
    assert!(dataset.require_column("precio").is_ok());
    let error = dataset.require_column("missing").unwrap_err();
    assert!(matches!(error, AnalystError::ColumnNotFound { ref column } if column == "missing"));
}

#[test]
fn test_numeric_coercion_text() {
    let column = Column::text(
        "mixed",
        vec![
            Some("1.5".to_string()),
            Some(" 2 ".to_string()),
            Some("abc".to_string()),
            None,
            Some("NaN".to_string()),
            Some("inf".to_string()),
        ],
    );
    assert_eq!(
        column.to_numeric(),
        vec![Some(1.5), Some(2.0), None, None, None, None]
    );
}

#[test]
fn test_numeric_coercion_boolean_and_object() {
    let column = Column::boolean("flag", vec![Some(true), Some(false), None]);
    assert_eq!(column.to_numeric(), vec![Some(1.0), Some(0.0), None]);

    let column = Column::object(
        "obj",
        vec![
            Some(Scalar::Integer(3)),
            Some(Scalar::Text("4.5".to_string())),
            Some(Scalar::Text("x".to_string())),
            Some(Scalar::Float(f64::NAN)),
            None,
        ],
    );
    assert_eq!(
        column.to_numeric(),
        vec![Some(3.0), Some(4.5), None, None, None]
    );
}

#[test]
fn test_nan_float_counts_as_missing() {
    let column = Column::float("x", vec![Some(1.0), Some(f64::NAN), None]);
    assert_eq!(column.missing_count(), 2);
    assert_eq!(column.json_at(1), JsonValue::Null);
    assert_eq!(column.to_numeric(), vec![Some(1.0), None, None]);
}

#[test]
fn test_head_records() {
    let dataset = sales();
    let records = dataset.head_records(2);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["precio"], serde_json::json!(1));
    assert_eq!(records[1]["categoria"], serde_json::json!("A"));

    // Keys follow column order
    let keys: Vec<&String> = records[0].keys().collect();
    assert_eq!(keys, vec!["precio", "categoria"]);
}

#[test]
fn test_data_type_labels() {
    assert_eq!(DataType::Integer.to_string(), "int64");
    assert_eq!(DataType::Float.to_string(), "float64");
    assert_eq!(DataType::Boolean.to_string(), "bool");
    assert_eq!(DataType::Text.to_string(), "string");
    assert_eq!(DataType::Object.to_string(), "object");
    assert!(DataType::Integer.is_numeric());
    assert!(!DataType::Boolean.is_numeric());
}

#[test]
fn test_float_to_json_non_finite() {
    assert_eq!(float_to_json(f64::INFINITY), JsonValue::Null);
    assert_eq!(float_to_json(1.5), serde_json::json!(1.5));
}
