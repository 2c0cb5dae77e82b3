//! Column type inference for ingested text and JSON cells.

use serde_json::Value as JsonValue;

use crate::models::{Column, Scalar};

/// Text cells read as missing.
pub const MISSING_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a raw text cell is a missing marker.
pub fn is_missing_marker(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell.trim() {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Builds a typed column from raw text cells.
///
/// Missing markers become `None`. The narrowest type that reads every
/// present cell wins: integer, then float, then boolean, then text. A
/// column with no present cells is stored as float.
pub fn infer_text_column(name: impl Into<String>, raw: Vec<String>) -> Column {
    let cells: Vec<Option<String>> = raw
        .into_iter()
        .map(|cell| (!is_missing_marker(&cell)).then_some(cell))
        .collect();
    let present = || cells.iter().flatten();

    if present().next().is_some()
        && let Some(values) = parse_all(&cells, |s| s.trim().parse::<i64>().ok())
    {
        return Column::integer(name, values);
    }
    if let Some(values) = parse_all(&cells, |s| s.trim().parse::<f64>().ok()) {
        return Column::float(name, values);
    }
    if let Some(values) = parse_all(&cells, parse_bool) {
        return Column::boolean(name, values);
    }
    Column::text(name, cells)
}

/// Parses every present cell with `parse`, or gives up on the first failure.
fn parse_all<T>(cells: &[Option<String>], parse: impl Fn(&str) -> Option<T>) -> Option<Vec<Option<T>>> {
    cells
        .iter()
        .map(|cell| match cell {
            None => Some(None),
            Some(text) => parse(text).map(Some),
        })
        .collect()
}

/// Converts one JSON record field to a cell.
///
/// Nested arrays and objects are kept as their JSON text.
pub fn json_cell(value: Option<&JsonValue>) -> Option<Scalar> {
    match value? {
        JsonValue::Null => None,
        JsonValue::Bool(b) => Some(Scalar::Boolean(*b)),
        JsonValue::Number(n) => n
            .as_i64()
            .map(Scalar::Integer)
            .or_else(|| n.as_f64().map(Scalar::Float)),
        JsonValue::String(s) => Some(Scalar::Text(s.clone())),
        nested => Some(Scalar::Text(nested.to_string())),
    }
}

/// Builds a typed column from JSON cells.
///
/// Uniform columns keep their JSON type, integers mixed with floats become
/// float, and any other mix becomes an `object` column.
pub fn infer_json_column(name: impl Into<String>, cells: Vec<Option<Scalar>>) -> Column {
    let present = || cells.iter().flatten();

    if present().next().is_none() {
        return Column::float(name, vec![None; cells.len()]);
    }
    if present().all(|c| matches!(c, Scalar::Integer(_))) {
        let values = cells
            .iter()
            .map(|c| match c {
                Some(Scalar::Integer(i)) => Some(*i),
                _ => None,
            })
            .collect();
        return Column::integer(name, values);
    }
    if present().all(|c| matches!(c, Scalar::Integer(_) | Scalar::Float(_))) {
        let values = cells.iter().map(|c| c.as_ref().and_then(Scalar::to_f64)).collect();
        return Column::float(name, values);
    }
    if present().all(|c| matches!(c, Scalar::Boolean(_))) {
        let values = cells
            .iter()
            .map(|c| match c {
                Some(Scalar::Boolean(b)) => Some(*b),
                _ => None,
            })
            .collect();
        return Column::boolean(name, values);
    }
    if present().all(|c| matches!(c, Scalar::Text(_))) {
        let values = cells
            .into_iter()
            .map(|c| match c {
                Some(Scalar::Text(s)) => Some(s),
                _ => None,
            })
            .collect();
        return Column::text(name, values);
    }
    Column::object(name, cells)
}

/// Makes header names usable: blanks become `Unnamed: <i>` and repeats
/// get a `.1`, `.2`, ... suffix.
pub fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(raw.len());
    for (index, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", index)
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut suffix = 1u32;
        while names.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix = suffix.saturating_add(1);
        }
        names.push(candidate);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnData, DataType};

    fn raw(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_markers() {
        for marker in ["", "NA", "N/A", "null", "NaN", "<NA>", "#N/A", " NA "] {
            assert!(is_missing_marker(marker), "{marker:?} should be missing");
        }
        assert!(!is_missing_marker("0"));
        assert!(!is_missing_marker("NAN!"));
    }

    #[test]
    fn test_text_inference() {
        assert_eq!(
            infer_text_column("a", raw(&["1", "", "3"])).data,
            ColumnData::Integer(vec![Some(1), None, Some(3)])
        );
        assert_eq!(
            infer_text_column("a", raw(&["1", "2.5", "NA"])).data,
            ColumnData::Float(vec![Some(1.0), Some(2.5), None])
        );
        assert_eq!(
            infer_text_column("a", raw(&["true", "False"])).data,
            ColumnData::Boolean(vec![Some(true), Some(false)])
        );
        assert_eq!(infer_text_column("a", raw(&["1", "x"])).data_type(), DataType::Text);
        assert_eq!(
            infer_text_column("a", raw(&["", "NA"])).data,
            ColumnData::Float(vec![None, None])
        );
    }

    #[test]
    fn test_json_inference() {
        let ints = vec![Some(Scalar::Integer(1)), None];
        assert_eq!(infer_json_column("a", ints).data_type(), DataType::Integer);

        let nums = vec![Some(Scalar::Integer(1)), Some(Scalar::Float(2.5))];
        assert_eq!(
            infer_json_column("a", nums).data,
            ColumnData::Float(vec![Some(1.0), Some(2.5)])
        );

        let mixed = vec![Some(Scalar::Integer(1)), Some(Scalar::Text("x".to_string()))];
        assert_eq!(infer_json_column("a", mixed).data_type(), DataType::Object);
    }

    #[test]
    fn test_json_cell() {
        assert_eq!(json_cell(None), None);
        assert_eq!(json_cell(Some(&JsonValue::Null)), None);
        assert_eq!(json_cell(Some(&serde_json::json!(3))), Some(Scalar::Integer(3)));
        assert_eq!(
            json_cell(Some(&serde_json::json!([1, 2]))),
            Some(Scalar::Text("[1,2]".to_string()))
        );
    }

    #[test]
    fn test_normalize_headers() {
        assert_eq!(
            normalize_headers(raw(&["a", "", "a", "a"])),
            vec!["a", "Unnamed: 1", "a.1", "a.2"]
        );
    }
}
