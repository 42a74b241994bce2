//! Transform module
//!
//! The two batch steps of the job, in dependency order:
//!
//! - `songs` - song metadata → `songs`, `artists`
//! - `logs` - listening events → `users`, `time`, `songplays`
//!
//! Each relation is fully materialized in the session before its output
//! directory is reset, so a failing query leaves the previous output alone.

mod logs;
mod songs;

pub use logs::{process_log_data, start_time_expr};
pub use songs::process_song_data;

use crate::error::Result;
use crate::schema::Relation;
use crate::session::Session;
use crate::storage::Storage;
use serde::Serialize;

/// A relation written by one of the steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenRelation {
    /// Which relation
    pub relation: Relation,
    /// Location handed to the engine
    pub location: String,
    /// Rows written
    pub rows: usize,
}

/// Materialize `query`, then overwrite the relation's output with it
pub(crate) async fn write_relation(
    session: &Session,
    storage: &Storage,
    relation: Relation,
    query: &str,
) -> Result<WrittenRelation> {
    let table = format!("out_{}", relation.name());
    session.execute(&format!("CREATE OR REPLACE TEMP TABLE {table} AS {query};"))?;
    let rows = session.count(&format!("SELECT * FROM {table}"))?;

    let location = storage.relation_url(relation.name());
    storage.reset(relation.name()).await?;
    session.copy_to_parquet(
        &format!(
            "SELECT {} FROM {table} ORDER BY ALL",
            relation.column_list()
        ),
        &location,
        relation.partition_by(),
    )?;

    tracing::info!(relation = %relation, rows, location = %location, "Wrote relation");

    Ok(WrittenRelation {
        relation,
        location,
        rows,
    })
}
