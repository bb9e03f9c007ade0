use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{CatalogSource, SourceError, parse_model_list};
use crate::{
    catalog::{EMBEDDED_SNAPSHOT, RawModel, SourceTag},
    config::SnapshotConfig,
};

/// Where the snapshot is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotLocation {
    /// The copy compiled into the binary.
    Embedded,
    /// A JSON file on disk.
    File(PathBuf),
}

/// Previously captured upstream model list.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    location: SnapshotLocation,
}

impl SnapshotSource {
    pub fn embedded() -> Self {
        Self {
            location: SnapshotLocation::Embedded,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            location: SnapshotLocation::File(path.as_ref().to_path_buf()),
        }
    }

    pub fn from_config(config: &SnapshotConfig) -> Self {
        match &config.path {
            Some(path) => Self::from_path(path),
            None => Self::embedded(),
        }
    }

    pub fn location(&self) -> &SnapshotLocation {
        &self.location
    }
}

impl Default for SnapshotSource {
    fn default() -> Self {
        Self::embedded()
    }
}

#[async_trait]
impl CatalogSource for SnapshotSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Snapshot
    }

    async fn fetch_raw(&self) -> Result<Vec<RawModel>, SourceError> {
        match &self.location {
            SnapshotLocation::Embedded => parse_model_list(EMBEDDED_SNAPSHOT),
            SnapshotLocation::File(path) => {
                let contents =
                    tokio::fs::read_to_string(path)
                        .await
                        .map_err(|source| SourceError::Io {
                            path: path.clone(),
                            source,
                        })?;
                let models = parse_model_list(&contents)?;
                tracing::debug!(
                    path = %path.display(),
                    model_count = models.len(),
                    "Loaded model snapshot from file"
                );
                Ok(models)
            }
        }
    }
}
