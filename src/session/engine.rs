//! DuckDB-based engine session
//!
//! One in-memory connection per run. Object storage credentials are set on
//! the connection from the job config, never through the environment.

use crate::config::JobConfig;
use crate::error::{Error, Result};
use duckdb::Connection;

/// Handle to the query engine
pub struct Session {
    /// DuckDB connection
    conn: Connection,
}

impl Session {
    /// Create a new session for a job
    pub fn new(config: &JobConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::config(format!("Failed to create DuckDB connection: {e}")))?;

        let session = Self { conn };

        if config.is_remote() {
            session.configure_cloud_storage(config)?;
        }

        Ok(session)
    }

    /// Configure S3 credentials on the connection
    fn configure_cloud_storage(&self, config: &JobConfig) -> Result<()> {
        let credentials = config
            .credentials
            .as_ref()
            .ok_or_else(|| Error::missing_field("ACCESS"))?;

        self.conn
            .execute_batch("INSTALL httpfs; LOAD httpfs;")
            .map_err(|e| Error::config(format!("Failed to load httpfs extension: {e}")))?;

        self.conn
            .execute_batch(&format!(
                "SET s3_access_key_id = {}; SET s3_secret_access_key = {}; SET s3_region = {};",
                sql_literal(&credentials.access_key_id),
                sql_literal(&credentials.secret_access_key),
                sql_literal(&config.region),
            ))
            .map_err(|e| Error::config(format!("Failed to configure S3: {e}")))?;

        tracing::debug!(region = %config.region, "Configured S3 access");
        Ok(())
    }

    /// Execute one or more statements
    pub fn execute(&self, sql: &str) -> Result<()> {
        tracing::debug!("Executing: {}", sql);
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Count the rows a query produces
    pub fn count(&self, query: &str) -> Result<usize> {
        let count_sql = format!("SELECT COUNT(*) FROM ({query}) AS q");
        let count: i64 = self.conn.query_row(&count_sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Write a query result as SNAPPY Parquet under a relation directory
    ///
    /// With partition columns the result becomes a Hive-partitioned tree
    /// (`year=2018/month=11/data_0.parquet`); without, a single
    /// `part-0.parquet`. The directory must already have been reset.
    pub fn copy_to_parquet(
        &self,
        query: &str,
        destination: &str,
        partition_by: &[&str],
    ) -> Result<()> {
        let copy_sql = if partition_by.is_empty() {
            format!(
                "COPY ({query}) TO {} (FORMAT PARQUET, COMPRESSION 'SNAPPY');",
                sql_literal(&format!("{}/part-0.parquet", destination.trim_end_matches('/')))
            )
        } else {
            format!(
                "COPY ({query}) TO {} (FORMAT PARQUET, COMPRESSION 'SNAPPY', PARTITION_BY ({}), OVERWRITE_OR_IGNORE true);",
                sql_literal(destination.trim_end_matches('/')),
                partition_by.join(", ")
            )
        };

        tracing::debug!("Executing: {}", copy_sql);
        if let Err(e) = self.conn.execute_batch(&copy_sql) {
            tracing::error!(destination, "Parquet write failed: {e}");
            return Err(e.into());
        }
        Ok(())
    }
}

/// Quote a value as a SQL string literal
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
