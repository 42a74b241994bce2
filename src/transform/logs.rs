//! Event-log step
//!
//! Reads listening events, keeps plays (`page = 'NextSong'`) and writes the
//! `users` and `time` dimensions plus the `songplays` fact table. `songplays`
//! joins against the `songs` and `artists` output of the song-catalog step,
//! read back from the output location.

use super::{write_relation, WrittenRelation};
use crate::config::JobConfig;
use crate::error::{Error, Result};
use crate::schema::{json_columns, log_record_schema, Relation};
use crate::session::{sql_literal, Session};
use crate::storage::Storage;

/// Page value marking an actual play
pub const NEXT_SONG: &str = "NextSong";

const USERS_QUERY: &str = "SELECT DISTINCT userId AS user_id, \
     firstName AS first_name, \
     lastName AS last_name, \
     gender, \
     level \
     FROM log_data";

/// Timestamp of the whole second containing an epoch-millisecond column
///
/// `floor(ms / 1000)` computed in integers so negative values round down too.
pub fn start_time_expr(column: &str) -> String {
    format!("epoch_ms({column} - ((({column} % 1000) + 1000) % 1000))")
}

fn time_query() -> String {
    format!(
        "WITH plays AS (SELECT DISTINCT {} AS start_time FROM log_data) \
         SELECT start_time, \
         CAST(hour(start_time) AS INTEGER) AS hour, \
         strftime(start_time, '%d') AS day, \
         CAST(weekofyear(start_time) AS INTEGER) AS weekofyear, \
         CAST(month(start_time) AS INTEGER) AS month, \
         CAST(year(start_time) AS INTEGER) AS year, \
         CAST(dayofweek(start_time) + 1 AS INTEGER) AS weekday \
         FROM plays",
        start_time_expr("ts")
    )
}

fn songplays_query(songs_location: &str, artists_location: &str) -> String {
    // Partition directories come back as VARCHAR; only artist_id is needed from them.
    let songs = format!(
        "read_parquet({}, hive_partitioning = true, hive_types_autocast = false)",
        sql_literal(&format!("{songs_location}/*/*/*.parquet"))
    );
    let artists = format!(
        "read_parquet({})",
        sql_literal(&format!("{artists_location}/*.parquet"))
    );

    format!(
        "WITH plays AS (\
         SELECT DISTINCT {} AS start_time, \
         e.userId AS user_id, \
         e.level AS level, \
         s.song_id AS song_id, \
         a.artist_id AS artist_id, \
         e.sessionId AS session_id, \
         e.location AS location, \
         e.userAgent AS user_agent \
         FROM log_data e \
         JOIN {songs} s ON e.song = s.title AND e.length = s.duration \
         JOIN {artists} a ON s.artist_id = a.artist_id) \
         SELECT *, \
         CAST(year(start_time) AS INTEGER) AS year, \
         CAST(month(start_time) AS INTEGER) AS month \
         FROM plays",
        start_time_expr("e.ts")
    )
}

/// Read event files, write `users`, `time` and `songplays`
///
/// Fails with [`Error::MissingDependency`] when the song-catalog output is
/// absent; an empty join result is written as an empty `songplays`.
pub async fn process_log_data(
    session: &Session,
    storage: &Storage,
    config: &JobConfig,
) -> Result<Vec<WrittenRelation>> {
    let source = config.log_data();
    tracing::info!(source = %source, "Processing log data");

    session.execute(&format!(
        "CREATE OR REPLACE TEMP TABLE log_data AS \
         SELECT * FROM read_json({}, format = 'auto', columns = {}) \
         WHERE page = {};",
        sql_literal(&source),
        json_columns(&log_record_schema())?,
        sql_literal(NEXT_SONG)
    ))?;
    tracing::info!(
        plays = session.count("SELECT * FROM log_data")?,
        "Loaded song plays"
    );

    for upstream in [Relation::Songs, Relation::Artists] {
        if !storage.has_parts(upstream.name()).await? {
            return Err(Error::missing_dependency(
                upstream.name(),
                storage.relation_url(upstream.name()),
            ));
        }
    }

    let users = write_relation(session, storage, Relation::Users, USERS_QUERY).await?;
    let time = write_relation(session, storage, Relation::Time, &time_query()).await?;

    let query = songplays_query(
        &storage.relation_url(Relation::Songs.name()),
        &storage.relation_url(Relation::Artists.name()),
    );
    let songplays = write_relation(session, storage, Relation::Songplays, &query).await?;

    Ok(vec![users, time, songplays])
}
