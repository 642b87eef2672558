//! Atomic JSON persistence shared by the checkpoint and output artifacts

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

/// Serialize `value` as pretty JSON and replace `path` atomically.
///
/// The bytes go to a `.tmp` sibling first and are renamed over the target,
/// so a crash mid-write leaves either the old snapshot or the new one on
/// disk, never a truncated file.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize snapshot")?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let tmp = tmp_path(path);
    {
        let mut file = std::fs::File::create(&tmp)
            .with_context(|| format!("failed to create {}", tmp.display()))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        file.flush()
            .with_context(|| format!("failed to flush {}", tmp.display()))?;
    }

    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to rename {} to {}", tmp.display(), path.display()))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}
