//! Schema module
//!
//! Arrow schemas for the source records and the five derived relations.
//!
//! # Overview
//!
//! - `song_record_schema` / `log_record_schema` - what the JSON readers enforce
//! - `Relation` - name, columns and partitioning of each output relation
//! - `json_columns` - rendering source schemas for the JSON reader
//! - `check_file_schema` - validating part files after they are written

mod mapping;
mod relations;
mod sources;

pub use mapping::{check_file_schema, engine_type, is_compatible, json_columns};
pub use relations::Relation;
pub use sources::{log_record_schema, song_record_schema};
