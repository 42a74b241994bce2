//! Job driver
//!
//! Runs the song-catalog step, then the event-log step (which reads the
//! former's output), then inspects all five relations. Any error aborts the
//! run; nothing is retried.

use crate::config::JobConfig;
use crate::error::{Error, Result};
use crate::output::{inspect_relation, RelationSummary};
use crate::schema::Relation;
use crate::session::Session;
use crate::storage::Storage;
use crate::transform::{process_log_data, process_song_data, WrittenRelation};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of a complete run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub relations: Vec<RelationSummary>,
}

impl RunSummary {
    /// Rows written for a relation
    pub fn rows(&self, relation: Relation) -> Option<usize> {
        self.relations
            .iter()
            .find(|r| r.relation == relation)
            .map(|r| r.rows)
    }
}

/// The ETL job
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: JobConfig,
}

impl Pipeline {
    /// Create a pipeline for a job config
    pub fn new(config: JobConfig) -> Self {
        Self { config }
    }

    /// Run both steps and summarize the output
    pub async fn run(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        tracing::info!(
            input = %self.config.input_data,
            output = %self.config.output_data,
            "Starting run"
        );

        let session = Session::new(&self.config)?;
        let storage = Storage::for_job(&self.config)?;

        let mut written = process_song_data(&session, &storage, &self.config).await?;
        written.extend(process_log_data(&session, &storage, &self.config).await?);

        let mut relations = Vec::with_capacity(Relation::ALL.len());
        for relation in Relation::ALL {
            let summary = inspect_relation(&storage, relation).await?;
            verify_row_count(&written, &summary)?;
            relations.push(summary);
        }

        let finished_at = Utc::now();
        tracing::info!(
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "Run complete"
        );

        Ok(RunSummary {
            started_at,
            finished_at,
            relations,
        })
    }
}

/// The footer row count must equal what the engine reported writing
fn verify_row_count(written: &[WrittenRelation], summary: &RelationSummary) -> Result<()> {
    let Some(expected) = written.iter().find(|w| w.relation == summary.relation) else {
        return Err(Error::Other(format!(
            "Relation '{}' was not written by this run",
            summary.relation
        )));
    };

    if expected.rows != summary.rows {
        return Err(Error::Other(format!(
            "Relation '{}' reported {} rows written but {} found in {} parts",
            summary.relation, expected.rows, summary.rows, summary.parts
        )));
    }

    Ok(())
}
