//! End-to-end pipeline tests
//!
//! Writes song and event fixtures in the nested source layout, runs the whole
//! job against the local filesystem, and checks the written relations with
//! DuckDB.

use duckdb::Connection;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use songplays_etl::{Error, JobConfig, Pipeline, Relation};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

const FIX_YOU_TS: i64 = 1_541_207_953_796;

fn write_json_lines(path: &Path, records: &[Value]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let body: Vec<String> = records.iter().map(ToString::to_string).collect();
    std::fs::write(path, body.join("\n") + "\n").unwrap();
}

fn song(song_id: &str, title: &str, artist_id: &str, artist_name: &str, duration: f64, year: i32) -> Value {
    json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": 51.5,
        "artist_longitude": -0.12,
        "artist_location": "London",
        "artist_name": artist_name,
        "song_id": song_id,
        "title": title,
        "duration": duration,
        "year": year
    })
}

fn play(user_id: &str, level: &str, song: &str, length: f64, ts: i64) -> Value {
    json!({
        "artist": "Coldplay",
        "auth": "Logged In",
        "firstName": format!("First{user_id}"),
        "gender": "M",
        "itemInSession": 3,
        "lastName": format!("Last{user_id}"),
        "length": length,
        "level": level,
        "location": "Portland, OR",
        "method": "PUT",
        "page": "NextSong",
        "registration": 1_540_919_166_796.0,
        "sessionId": 182,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0 (X11; Linux x86_64)",
        "userId": user_id
    })
}

fn page_view(user_id: &str, page: &str, ts: i64) -> Value {
    json!({
        "artist": null,
        "auth": "Logged In",
        "firstName": "Hidden",
        "gender": "F",
        "itemInSession": 0,
        "lastName": "Visitor",
        "length": null,
        "level": "free",
        "location": "Nowhere",
        "method": "GET",
        "page": page,
        "registration": null,
        "sessionId": 7,
        "song": null,
        "status": 200,
        "ts": ts,
        "userAgent": "curl",
        "userId": user_id
    })
}

/// Source tree and output root for one test
struct Lake {
    input: TempDir,
    output: TempDir,
}

impl Lake {
    fn new() -> Self {
        Self {
            input: tempfile::tempdir().unwrap(),
            output: tempfile::tempdir().unwrap(),
        }
    }

    fn config(&self) -> JobConfig {
        JobConfig::new(
            self.input.path().to_str().unwrap(),
            format!("{}/", self.output.path().display()),
        )
    }

    fn out(&self, relative: &str) -> PathBuf {
        self.output.path().join(relative)
    }

    fn add_song(&self, file: &str, record: Value) {
        let path = self
            .input
            .path()
            .join(format!("song_data/A/{}/{}/{file}.json", &file[2..3], &file[3..4]));
        write_json_lines(&path, &[record]);
    }

    fn add_events(&self, day: &str, records: &[Value]) {
        let path = self
            .input
            .path()
            .join(format!("log_data/2018/11/2018-11-{day}-events.json"));
        write_json_lines(&path, records);
    }

    /// The catalog and event set most tests share
    fn seed(&self) {
        self.add_song("TRXYZ01", song("SOXYZ", "Fix You", "ARXYZ", "Coldplay", 294.0, 2005));
        // Same song shipped twice under another file name
        self.add_song("TRXYZ02", song("SOXYZ", "Fix You", "ARXYZ", "Coldplay", 294.0, 2005));
        self.add_song("TRABC01", song("SOABC", "Yellow", "ARXYZ", "Coldplay", 269.0, 2000));
        self.add_song("TRDEF01", song("SODEF", "Creep", "ARRAD", "Radiohead", 238.6, 1992));

        self.add_events(
            "03",
            &[
                play("10", "free", "Fix You", 294.0, FIX_YOU_TS),
                // Same second as the play above, title matches but length does not
                play("12", "free", "Yellow", 269.5, 1_541_207_953_100),
                page_view("77", "Home", 1_541_207_000_000),
                page_view("78", "Logout", 1_541_207_100_000),
            ],
        );
        self.add_events(
            "04",
            &[
                play("10", "paid", "Unknown Song", 200.0, 1_541_300_000_000),
                play("15", "paid", "Creep", 238.6, 1_541_300_001_999),
            ],
        );
    }

    fn query_i64(&self, sql: &str) -> i64 {
        let conn = Connection::open_in_memory().unwrap();
        conn.query_row(&self.expand(sql), [], |row| row.get(0)).unwrap()
    }

    fn query_strings(&self, sql: &str) -> Vec<String> {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare(&self.expand(sql)).unwrap();
        stmt.query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .map(std::result::Result::unwrap)
            .collect()
    }

    /// Replace `{relation}` placeholders with a Parquet scan of that relation
    fn expand(&self, sql: &str) -> String {
        let mut sql = sql.to_string();
        for relation in Relation::ALL {
            let glob = if relation.is_partitioned() {
                format!("{}/*/*/*.parquet", relation.name())
            } else {
                format!("{}/*.parquet", relation.name())
            };
            sql = sql.replace(
                &format!("{{{}}}", relation.name()),
                &format!(
                    "read_parquet('{}', hive_partitioning = true)",
                    self.out(&glob).display()
                ),
            );
        }
        sql
    }

    /// Every relation rendered as sorted CSV text
    fn snapshot(&self) -> Vec<String> {
        let conn = Connection::open_in_memory().unwrap();
        let dump_dir = tempfile::tempdir().unwrap();
        Relation::ALL
            .iter()
            .map(|relation| {
                let csv = dump_dir.path().join(format!("{}.csv", relation.name()));
                let sql = self.expand(&format!(
                    "COPY (SELECT * FROM {{{}}} ORDER BY ALL) TO '{}' (HEADER true)",
                    relation.name(),
                    csv.display()
                ));
                conn.execute_batch(&sql).unwrap();
                std::fs::read_to_string(&csv).unwrap()
            })
            .collect()
    }
}

// ============================================================================
// Full Run
// ============================================================================

#[tokio::test]
async fn test_run_summary_counts() {
    let lake = Lake::new();
    lake.seed();

    let summary = Pipeline::new(lake.config()).run().await.unwrap();

    assert_eq!(summary.rows(Relation::Songs), Some(3));
    assert_eq!(summary.rows(Relation::Artists), Some(2));
    // user 10 appears once per level observed
    assert_eq!(summary.rows(Relation::Users), Some(4));
    assert_eq!(summary.rows(Relation::Time), Some(3));
    assert_eq!(summary.rows(Relation::Songplays), Some(2));
    assert!(summary.finished_at >= summary.started_at);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["relations"][4]["relation"], "songplays");
    assert_eq!(json["relations"][4]["rows"], 2);
}

#[tokio::test]
async fn test_dimensions_have_no_duplicate_rows() {
    let lake = Lake::new();
    lake.seed();
    Pipeline::new(lake.config()).run().await.unwrap();

    for relation in ["songs", "artists"] {
        let total = lake.query_i64(&format!("SELECT COUNT(*) FROM {{{relation}}}"));
        let distinct = lake.query_i64(&format!(
            "SELECT COUNT(*) FROM (SELECT DISTINCT * FROM {{{relation}}})"
        ));
        assert_eq!(total, distinct, "duplicates in {relation}");
    }
}

#[tokio::test]
async fn test_non_play_events_are_excluded() {
    let lake = Lake::new();
    lake.seed();
    Pipeline::new(lake.config()).run().await.unwrap();

    assert_eq!(
        lake.query_i64("SELECT COUNT(*) FROM {users} WHERE user_id IN ('77', '78')"),
        0
    );
    assert_eq!(
        lake.query_i64("SELECT COUNT(*) FROM {songplays} WHERE user_id IN ('77', '78')"),
        0
    );
    // page views at 1541207000 and 1541207100 never become time rows
    assert_eq!(
        lake.query_i64(
            "SELECT COUNT(*) FROM {time} \
             WHERE CAST(epoch(start_time) AS BIGINT) IN (1541207000, 1541207100)"
        ),
        0
    );
}

#[tokio::test]
async fn test_time_truncates_to_whole_seconds() {
    let lake = Lake::new();
    lake.seed();
    Pipeline::new(lake.config()).run().await.unwrap();

    let seconds = lake.query_strings(
        "SELECT CAST(CAST(epoch(start_time) AS BIGINT) AS VARCHAR) FROM {time} ORDER BY 1",
    );
    assert_eq!(seconds, vec!["1541207953", "1541300000", "1541300001"]);

    let fields = lake.query_strings(
        "SELECT concat_ws('|', hour, day, weekofyear, month, year, weekday) FROM {time} \
         WHERE CAST(epoch(start_time) AS BIGINT) = 1541207953",
    );
    // 2018-11-03 01:19:13 UTC, a Saturday in ISO week 44
    assert_eq!(fields, vec!["1|03|44|11|2018|7"]);
}

#[tokio::test]
async fn test_songplays_require_exact_title_and_length() {
    let lake = Lake::new();
    lake.seed();
    Pipeline::new(lake.config()).run().await.unwrap();

    let matched = lake.query_strings("SELECT song_id FROM {songplays} ORDER BY 1");
    assert_eq!(matched, vec!["SODEF", "SOXYZ"]);

    assert_eq!(
        lake.query_i64("SELECT COUNT(*) FROM {songplays} WHERE user_id = '12'"),
        0
    );
}

#[tokio::test]
async fn test_fix_you_play() {
    let lake = Lake::new();
    lake.seed();
    Pipeline::new(lake.config()).run().await.unwrap();

    let rows = lake.query_strings(
        "SELECT concat_ws('|', song_id, artist_id, user_id, level, session_id, \
         CAST(epoch(start_time) AS BIGINT), year, month) \
         FROM {songplays} WHERE user_id = '10'",
    );
    assert_eq!(rows, vec!["SOXYZ|ARXYZ|10|free|182|1541207953|2018|11"]);
    assert!(lake.out("songplays/year=2018/month=11").is_dir());
}

#[tokio::test]
async fn test_partition_layout() {
    let lake = Lake::new();
    lake.seed();
    Pipeline::new(lake.config()).run().await.unwrap();

    assert!(lake.out("songs/year=2005/artist_id=ARXYZ").is_dir());
    assert!(lake.out("songs/year=2000/artist_id=ARXYZ").is_dir());
    assert!(lake.out("songs/year=1992/artist_id=ARRAD").is_dir());
    assert!(lake.out("artists/part-0.parquet").is_file());
    assert!(lake.out("users/part-0.parquet").is_file());
    assert!(lake.out("time/part-0.parquet").is_file());
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let lake = Lake::new();
    lake.seed();

    Pipeline::new(lake.config()).run().await.unwrap();
    let first = lake.snapshot();

    Pipeline::new(lake.config()).run().await.unwrap();
    let second = lake.snapshot();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_rerun_replaces_previous_output() {
    let lake = Lake::new();
    lake.seed();
    Pipeline::new(lake.config()).run().await.unwrap();

    // Drop one song from the catalog and run again
    std::fs::remove_file(lake.input.path().join("song_data/A/D/E/TRDEF01.json")).unwrap();
    let summary = Pipeline::new(lake.config()).run().await.unwrap();

    assert_eq!(summary.rows(Relation::Songs), Some(2));
    assert_eq!(summary.rows(Relation::Songplays), Some(1));
    assert!(!lake.out("songs/year=1992").exists());
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_missing_event_logs_fail_the_run() {
    let lake = Lake::new();
    lake.add_song("TRXYZ01", song("SOXYZ", "Fix You", "ARXYZ", "Coldplay", 294.0, 2005));

    let result = Pipeline::new(lake.config()).run().await;

    assert!(matches!(result, Err(Error::Engine(_))));
    // The song step had already completed
    assert!(lake.out("artists/part-0.parquet").is_file());
}

#[tokio::test]
async fn test_remote_output_without_credentials_fails() {
    let lake = Lake::new();
    let config = JobConfig::new(lake.input.path().to_str().unwrap(), "s3://some-bucket/lake/");

    let result = Pipeline::new(config).run().await;

    assert!(matches!(result, Err(Error::MissingConfigField { .. })));
}
