//! Parquet footer inspection

use crate::error::Result;
use crate::schema::{check_file_schema, Relation};
use crate::storage::Storage;
use parquet::arrow::async_reader::ParquetObjectReader;
use parquet::arrow::ParquetRecordBatchStreamBuilder;
use serde::Serialize;

/// What a relation looks like on disk after a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationSummary {
    /// Which relation
    pub relation: Relation,
    /// Relation directory
    pub location: String,
    /// Rows across all parts
    pub rows: usize,
    /// Number of part files
    pub parts: usize,
}

/// Read every part footer of a relation, validating its schema
///
/// Only the footer of each part is fetched (ranged reads), never the row groups.
pub async fn inspect_relation(storage: &Storage, relation: Relation) -> Result<RelationSummary> {
    let parts = storage.list_parts(relation.name()).await?;
    let mut rows = 0usize;

    for part in &parts {
        let reader = ParquetObjectReader::new(storage.store(), part.clone());
        let builder = ParquetRecordBatchStreamBuilder::new(reader).await?;
        check_file_schema(relation, builder.schema())?;

        let part_rows = builder.metadata().file_metadata().num_rows() as usize;
        tracing::debug!(relation = %relation, part = %part.location, rows = part_rows, "Inspected part");
        rows += part_rows;
    }

    Ok(RelationSummary {
        relation,
        location: storage.relation_url(relation.name()),
        rows,
        parts: parts.len(),
    })
}
