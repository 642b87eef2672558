//! Checkpoint persistence for crash recovery
//!
//! The checkpoint records the in-progress collection and the next offset to
//! request. It is rewritten after every batch outcome, deleted only when a
//! run completes cleanly, and left on disk otherwise so the next invocation
//! resumes instead of re-fetching.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::persist::write_json_atomic;
use crate::post::Post;

/// On-disk snapshot of harvest progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub offset: u64,
    pub posts: Vec<Post>,
    pub timestamp: DateTime<Utc>,
}

/// Loads, saves, and clears the checkpoint artifact for one output path.
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store whose artifact sits next to `output`, named
    /// `<stem>_checkpoint.json`.
    pub fn for_output(output: &Path) -> Self {
        Self::new(checkpoint_path(output))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the checkpoint if one exists. A missing, unreadable, or
    /// malformed artifact yields `None`; a bad checkpoint must never block
    /// a fresh run.
    pub fn load(&self) -> Option<Checkpoint> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("cannot read checkpoint {}: {e}", self.path.display());
                return None;
            }
        };

        match serde_json::from_str::<Checkpoint>(&json) {
            Ok(checkpoint) => Some(checkpoint),
            Err(e) => {
                log::warn!("checkpoint corrupted, starting fresh: {e}");
                None
            }
        }
    }

    /// Overwrite the checkpoint with the current collection and cursor.
    pub fn save(&self, posts: &[Post], offset: u64) -> Result<()> {
        let checkpoint = Checkpoint {
            offset,
            posts: posts.to_vec(),
            timestamp: Utc::now(),
        };
        write_json_atomic(&self.path, &checkpoint)
            .with_context(|| format!("failed to save checkpoint {}", self.path.display()))
    }

    /// Remove the checkpoint artifact; a no-op if it does not exist.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("failed to remove checkpoint {}", self.path.display())),
        }
    }
}

/// `posts.json` -> `posts_checkpoint.json`, in the same directory.
fn checkpoint_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!("{stem}_checkpoint.json"))
}
