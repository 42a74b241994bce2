//! Engine session support via DuckDB
//!
//! The job declares its transformations as SQL and lets DuckDB do the
//! scanning, deduplication, joins and partitioned Parquet writes.
//! DuckDB reads JSON and writes Parquet at any location (local or S3).

mod engine;

pub use engine::{sql_literal, Session};
