//! Schema inspection.

use crate::models::Dataset;

use super::models::{ColumnSchema, SchemaReport};

/// Summarizes the storage type and nullability of every column.
///
/// Types come from the uncoerced storage; an empty dataset yields an empty
/// schema.
pub fn infer_schema(dataset: &Dataset) -> SchemaReport {
    let schema = dataset
        .columns()
        .iter()
        .map(|column| {
            ColumnSchema::new(
                column.name.clone(),
                column.data_type(),
                column.missing_count() > 0,
            )
        })
        .collect();

    SchemaReport { schema }
}
