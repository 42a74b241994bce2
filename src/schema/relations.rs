//! The five relations of the star schema

use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use serde::Serialize;
use std::fmt;

/// A derived relation written by the job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Song dimension
    Songs,
    /// Artist dimension
    Artists,
    /// User dimension
    Users,
    /// Time dimension, one row per distinct play second
    Time,
    /// Fact table of matched plays
    Songplays,
}

impl Relation {
    /// Every relation, in the order the job writes them
    pub const ALL: [Relation; 5] = [
        Relation::Songs,
        Relation::Artists,
        Relation::Users,
        Relation::Time,
        Relation::Songplays,
    ];

    /// Directory name under the output root
    pub fn name(self) -> &'static str {
        match self {
            Relation::Songs => "songs",
            Relation::Artists => "artists",
            Relation::Users => "users",
            Relation::Time => "time",
            Relation::Songplays => "songplays",
        }
    }

    /// Columns used for Hive-style directory partitioning
    pub fn partition_by(self) -> &'static [&'static str] {
        match self {
            Relation::Songs => &["year", "artist_id"],
            Relation::Songplays => &["year", "month"],
            Relation::Artists | Relation::Users | Relation::Time => &[],
        }
    }

    /// Whether the relation is written as a partitioned directory
    pub fn is_partitioned(self) -> bool {
        !self.partition_by().is_empty()
    }

    /// Full logical schema, partition columns included
    pub fn schema(self) -> Schema {
        let fields = match self {
            Relation::Songs => vec![
                utf8("song_id"),
                utf8("title"),
                utf8("artist_id"),
                Field::new("year", DataType::Int32, true),
                Field::new("duration", DataType::Float64, true),
            ],
            Relation::Artists => vec![
                utf8("artist_id"),
                utf8("name"),
                utf8("location"),
                Field::new("latitude", DataType::Float64, true),
                Field::new("longitude", DataType::Float64, true),
            ],
            Relation::Users => vec![
                utf8("user_id"),
                utf8("first_name"),
                utf8("last_name"),
                utf8("gender"),
                utf8("level"),
            ],
            Relation::Time => vec![
                start_time(),
                Field::new("hour", DataType::Int32, true),
                utf8("day"),
                Field::new("weekofyear", DataType::Int32, true),
                Field::new("month", DataType::Int32, true),
                Field::new("year", DataType::Int32, true),
                Field::new("weekday", DataType::Int32, true),
            ],
            Relation::Songplays => vec![
                start_time(),
                utf8("user_id"),
                utf8("level"),
                utf8("song_id"),
                utf8("artist_id"),
                Field::new("session_id", DataType::Int64, true),
                utf8("location"),
                utf8("user_agent"),
                Field::new("year", DataType::Int32, true),
                Field::new("month", DataType::Int32, true),
            ],
        };
        Schema::new(fields)
    }

    /// Schema stored inside each part file (partition columns live in the path)
    pub fn file_schema(self) -> Schema {
        let partition_by = self.partition_by();
        let fields: Vec<Field> = self
            .schema()
            .fields()
            .iter()
            .filter(|f| !partition_by.contains(&f.name().as_str()))
            .map(|f| f.as_ref().clone())
            .collect();
        Schema::new(fields)
    }

    /// Comma-separated column list in schema order
    pub fn column_list(self) -> String {
        self.schema()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn utf8(name: &str) -> Field {
    Field::new(name, DataType::Utf8, true)
}

fn start_time() -> Field {
    Field::new(
        "start_time",
        DataType::Timestamp(TimeUnit::Microsecond, None),
        true,
    )
}
