//! Output location access (S3 or local filesystem)
//!
//! The query engine writes the Parquet parts itself; this module owns the
//! surrounding object-level work: clearing a relation before it is rewritten,
//! listing its parts, and handing the store to footer readers.

use crate::config::{is_remote, join_location, JobConfig};
use crate::error::{Error, Result};
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Output root parsed from a location URL
#[derive(Debug, Clone)]
pub struct Storage {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Location string as the engine sees it, without trailing slash
    base_url: String,
    /// Prefix within the bucket (empty for local roots)
    prefix: String,
    /// Local root directory, `None` for object storage
    local_root: Option<PathBuf>,
}

impl Storage {
    /// Parse the output location of a job
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` - AWS S3, credentials taken from the job config
    /// - `/local/path/`, `./path/` or `file:///path/` - Local filesystem
    pub fn for_job(config: &JobConfig) -> Result<Self> {
        Self::parse(&config.output_data, config)
    }

    /// Parse a location URL
    pub fn parse(url: &str, config: &JobConfig) -> Result<Self> {
        if is_remote(url) {
            Self::parse_s3(url, config)
        } else {
            Self::parse_local(url)
        }
    }

    fn parse_s3(url: &str, config: &JobConfig) -> Result<Self> {
        let without_scheme = url
            .strip_prefix("s3://")
            .or_else(|| url.strip_prefix("s3a://"))
            .ok_or_else(|| Error::config(format!("Invalid S3 URL: {url}")))?;

        let (bucket, prefix) = match without_scheme.find('/') {
            Some(idx) => (
                &without_scheme[..idx],
                without_scheme[idx + 1..].trim_end_matches('/').to_string(),
            ),
            None => (without_scheme, String::new()),
        };

        if bucket.is_empty() {
            return Err(Error::config(format!("Missing bucket in S3 URL: {url}")));
        }

        let credentials = config
            .credentials
            .as_ref()
            .ok_or_else(|| Error::missing_field("ACCESS"))?;

        let store = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_region(&config.region)
            .with_access_key_id(&credentials.access_key_id)
            .with_secret_access_key(&credentials.secret_access_key)
            .build()
            .map_err(|e| Error::config(format!("Failed to create S3 client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            base_url: url.trim_end_matches('/').to_string(),
            prefix,
            local_root: None,
        })
    }

    fn parse_local(path: &str) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);
        if path.is_empty() {
            return Err(Error::config("Empty output location"));
        }

        std::fs::create_dir_all(path)
            .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        let trimmed = if path == "/" {
            path
        } else {
            path.trim_end_matches('/')
        };

        Ok(Self {
            store: Arc::new(store),
            base_url: trimmed.to_string(),
            prefix: String::new(),
            local_root: Some(PathBuf::from(path)),
        })
    }

    /// Check if this is an object storage destination (not local)
    pub fn is_cloud(&self) -> bool {
        self.local_root.is_none()
    }

    /// The underlying object store
    pub fn store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }

    /// Location of a relation directory as passed to the engine
    pub fn relation_url(&self, name: &str) -> String {
        join_location(&self.base_url, name)
    }

    /// Object path of a relation directory
    fn relation_path(&self, name: &str) -> ObjectPath {
        if self.prefix.is_empty() {
            ObjectPath::from(name)
        } else {
            ObjectPath::from(format!("{}/{name}", self.prefix))
        }
    }

    /// Remove everything under a relation directory
    ///
    /// Local directories are recreated empty so single-file writes have a parent.
    pub async fn reset(&self, name: &str) -> Result<()> {
        if let Some(root) = &self.local_root {
            let dir = root.join(name);
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            std::fs::create_dir_all(&dir)?;
            tracing::debug!("Reset local directory {}", dir.display());
            return Ok(());
        }

        let prefix = self.relation_path(name);
        let existing: Vec<_> = self.store.list(Some(&prefix)).try_collect().await?;
        for meta in &existing {
            self.store.delete(&meta.location).await?;
        }
        tracing::debug!("Deleted {} objects under {}", existing.len(), prefix);
        Ok(())
    }

    /// List Parquet part files of a relation, sorted by path
    pub async fn list_parts(&self, name: &str) -> Result<Vec<ObjectMeta>> {
        let prefix = self.relation_path(name);

        if let Some(root) = &self.local_root {
            if !root.join(name).exists() {
                return Ok(Vec::new());
            }
        }

        let mut parts: Vec<ObjectMeta> = self
            .store
            .list(Some(&prefix))
            .try_filter(|meta| {
                futures::future::ready(
                    meta.location
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet")),
                )
            })
            .try_collect()
            .await?;

        parts.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(parts)
    }

    /// Whether a relation has at least one part file
    pub async fn has_parts(&self, name: &str) -> Result<bool> {
        Ok(!self.list_parts(name).await?.is_empty())
    }
}
