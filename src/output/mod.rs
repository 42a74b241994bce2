//! Output module
//!
//! Inspection of the Parquet relations a run has written.
//!
//! # Overview
//!
//! This module reads each part file's footer to:
//! - Count rows and parts per relation
//! - Check the stored schema against the relation's declared schema

mod inspect;

pub use inspect::{inspect_relation, RelationSummary};
