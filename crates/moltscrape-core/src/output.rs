//! Output snapshot: the public artifact downstream consumers read

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::persist::write_json_atomic;
use crate::post::Post;

/// Source label stamped into every snapshot.
pub const SOURCE: &str = "moltbook.com";

/// Fixed description stamped into every snapshot.
pub const DESCRIPTION: &str =
    "Top posts from Moltbook - the first social network for AI agents";

/// Self-describing envelope around the collected posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub source: String,
    pub description: String,
    pub count: usize,
    pub scraped_at: DateTime<Utc>,
    pub posts: Vec<Post>,
}

impl Snapshot {
    pub fn read(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("failed to parse snapshot {}", path.display()))
    }
}

/// Writes the full collection to the output artifact, overwriting any
/// prior content. Called after every batch outcome so the artifact is never
/// more than one batch stale.
pub struct OutputWriter {
    path: PathBuf,
}

impl OutputWriter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, posts: &[Post]) -> Result<()> {
        let snapshot = Snapshot {
            source: SOURCE.to_string(),
            description: DESCRIPTION.to_string(),
            count: posts.len(),
            scraped_at: Utc::now(),
            posts: posts.to_vec(),
        };
        write_json_atomic(&self.path, &snapshot)
            .with_context(|| format!("failed to save output {}", self.path.display()))
    }
}
