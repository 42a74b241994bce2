//! Song-catalog step
//!
//! Reads song metadata and writes the `songs` and `artists` dimensions.

use super::{write_relation, WrittenRelation};
use crate::config::JobConfig;
use crate::error::Result;
use crate::schema::{json_columns, song_record_schema, Relation};
use crate::session::{sql_literal, Session};
use crate::storage::Storage;

const SONGS_QUERY: &str =
    "SELECT DISTINCT song_id, title, artist_id, year, duration FROM song_data";

const ARTISTS_QUERY: &str = "SELECT DISTINCT artist_id, \
     artist_name AS name, \
     artist_location AS location, \
     artist_latitude AS latitude, \
     artist_longitude AS longitude \
     FROM song_data";

/// Read song files, write `songs` (partitioned by year, artist) and `artists`
pub async fn process_song_data(
    session: &Session,
    storage: &Storage,
    config: &JobConfig,
) -> Result<Vec<WrittenRelation>> {
    let source = config.song_data();
    tracing::info!(source = %source, "Processing song data");

    session.execute(&format!(
        "CREATE OR REPLACE TEMP TABLE song_data AS \
         SELECT * FROM read_json({}, format = 'auto', columns = {});",
        sql_literal(&source),
        json_columns(&song_record_schema())?
    ))?;
    tracing::info!(
        records = session.count("SELECT * FROM song_data")?,
        "Loaded song records"
    );

    let songs = write_relation(session, storage, Relation::Songs, SONGS_QUERY).await?;
    let artists = write_relation(session, storage, Relation::Artists, ARTISTS_QUERY).await?;

    Ok(vec![songs, artists])
}
