//! Partition-column materialization.
//!
//! Partition values are file-placement metadata, not file contents, so the
//! engine never reads them from storage; when retention is enabled they are
//! synthesized here onto every batch the engine yields.

use std::sync::Arc;

use arrow_array::{ArrayRef, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};

use lakescan_core::{Error, Result};

/// Append one Utf8 column per partition pair, each holding the partition
/// value in every row. Pairs whose key already names a column in the batch
/// are left to the engine's output.
pub(crate) fn append_partition_columns(
    batch: &RecordBatch,
    partitions: &[(String, String)],
) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();

    for (key, value) in partitions {
        if schema.index_of(key).is_ok() {
            continue;
        }
        fields.push(Field::new(key, DataType::Utf8, false));
        let column = StringArray::from_iter_values(
            std::iter::repeat(value.as_str()).take(batch.num_rows()),
        );
        columns.push(Arc::new(column));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .map_err(|e| Error::Read(e.to_string()))
}
