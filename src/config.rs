//! Job configuration
//!
//! Credentials come from a local YAML file (`dl.yaml`) and are carried
//! explicitly into the engine session and the object store. The process
//! environment is never modified.
//!
//! Input and output locations are fixed constants; [`JobConfig::new`] exists
//! so library callers can point the same job at other locations.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

// ============================================================================
// Fixed Locations
// ============================================================================

/// Default credentials file, relative to the working directory
pub const CONFIG_FILE: &str = "dl.yaml";

/// Source bucket holding `song_data/` and `log_data/`
pub const INPUT_DATA: &str = "s3://udacity-dend/";

/// Destination root for the five relations
pub const OUTPUT_DATA: &str = "lake/";

/// Region of the source bucket
pub const DEFAULT_REGION: &str = "us-west-2";

/// Song files fan out as `song_data/A/B/C/TRABCxxx.json`
pub const SONG_DATA_GLOB: &str = "song_data/*/*/*/*.json";

/// Event files fan out as `log_data/2018/11/2018-11-01-events.json`
pub const LOG_DATA_GLOB: &str = "log_data/*/*/*.json";

// ============================================================================
// Credentials
// ============================================================================

/// Access-key style credentials for object storage
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"****")
            .finish()
    }
}

/// On-disk layout of `dl.yaml`
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(rename = "ACCESS", default)]
    access: Option<AccessSection>,
}

#[derive(Debug, Deserialize)]
struct AccessSection {
    #[serde(rename = "AWS_ACCESS_KEY_ID", default)]
    access_key_id: Option<String>,

    #[serde(rename = "AWS_SECRET_ACCESS_KEY", default)]
    secret_access_key: Option<String>,

    #[serde(rename = "AWS_DEFAULT_REGION", default)]
    region: Option<String>,
}

/// Credentials plus the optional region override found in a config file
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub credentials: Credentials,
    pub region: Option<String>,
}

impl Credentials {
    /// Create credentials from a key pair
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// Load credentials from a YAML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<LoadedConfig> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse credentials from YAML text
    pub fn from_yaml(contents: &str) -> Result<LoadedConfig> {
        let file: ConfigFile = serde_yaml::from_str(contents)?;
        let access = file.access.ok_or_else(|| Error::missing_field("ACCESS"))?;

        let access_key_id = required(access.access_key_id, "ACCESS.AWS_ACCESS_KEY_ID")?;
        let secret_access_key =
            required(access.secret_access_key, "ACCESS.AWS_SECRET_ACCESS_KEY")?;
        let region = access.region.filter(|r| !r.trim().is_empty());

        Ok(LoadedConfig {
            credentials: Self::new(access_key_id, secret_access_key),
            region,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(Error::missing_field(field)),
    }
}

// ============================================================================
// Job Config
// ============================================================================

/// Everything the pipeline needs to run
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Root of the source JSON data
    pub input_data: String,
    /// Root of the Parquet output
    pub output_data: String,
    /// Object storage credentials (required for remote locations)
    pub credentials: Option<Credentials>,
    /// Object storage region
    pub region: String,
}

impl JobConfig {
    /// Create a config for arbitrary locations without credentials
    pub fn new(input_data: impl Into<String>, output_data: impl Into<String>) -> Self {
        Self {
            input_data: input_data.into(),
            output_data: output_data.into(),
            credentials: None,
            region: DEFAULT_REGION.to_string(),
        }
    }

    /// The fixed production locations with credentials from a config file
    pub fn default_locations(loaded: LoadedConfig) -> Self {
        Self {
            input_data: INPUT_DATA.to_string(),
            output_data: OUTPUT_DATA.to_string(),
            credentials: Some(loaded.credentials),
            region: loaded.region.unwrap_or_else(|| DEFAULT_REGION.to_string()),
        }
    }

    /// Attach credentials
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Glob matching every song metadata file
    pub fn song_data(&self) -> String {
        join_location(&self.input_data, SONG_DATA_GLOB)
    }

    /// Glob matching every event log file
    pub fn log_data(&self) -> String {
        join_location(&self.input_data, LOG_DATA_GLOB)
    }

    /// Whether any location lives in object storage
    pub fn is_remote(&self) -> bool {
        is_remote(&self.input_data) || is_remote(&self.output_data)
    }
}

/// Join a base location and a relative path with exactly one separator
pub fn join_location(base: &str, relative: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

/// Whether a location is served by S3 rather than the local filesystem
pub fn is_remote(location: &str) -> bool {
    location.starts_with("s3://") || location.starts_with("s3a://")
}
