//! Harvest orchestrator: the fetch-retry-checkpoint loop
//!
//! Drives sequential batch fetches against a [`BatchSource`], filters the
//! results, and persists both the checkpoint and the output snapshot after
//! every batch outcome so a process kill at any point leaves resumable,
//! internally consistent artifacts.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use indicatif::ProgressBar;

use crate::api::{BatchSource, FetchOutcome};
use crate::checkpoint::CheckpointStore;
use crate::output::OutputWriter;
use crate::post::Post;
use crate::shutdown::is_shutdown_requested;

/// Back-to-back retry-exhausted batches tolerated before the run aborts.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Tunables for one harvest run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Stop once this many valid posts are collected.
    pub target_count: usize,
    pub output_path: PathBuf,
    /// Posts requested per batch.
    pub batch_size: u64,
    /// Resume from an existing checkpoint when present.
    pub resume: bool,
    /// Rate-limit pause after a successful batch with more pages.
    pub success_pause: Duration,
    /// Pause after a batch exhausted its retries.
    pub failure_pause: Duration,
}

impl HarvestConfig {
    pub fn new(target_count: usize, output_path: PathBuf) -> Self {
        Self {
            target_count,
            output_path,
            batch_size: 25,
            resume: true,
            success_pause: Duration::from_secs(1),
            failure_pause: Duration::from_secs(5),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Target reached or source exhausted; checkpoint deleted.
    Complete,
    /// Too many consecutive batch failures; checkpoint kept for resume.
    Aborted,
    /// Shutdown signal received; checkpoint kept for resume.
    Interrupted,
}

/// Result of a harvest run.
#[derive(Debug)]
pub struct Harvest {
    pub posts: Vec<Post>,
    pub status: RunStatus,
    pub batches: u32,
    pub failed_batches: u32,
}

/// Sequential harvest loop over a batch source.
pub struct Harvester<S> {
    source: S,
    store: CheckpointStore,
    writer: OutputWriter,
    config: HarvestConfig,
}

impl<S: BatchSource> Harvester<S> {
    pub fn new(source: S, config: HarvestConfig) -> Self {
        let store = CheckpointStore::for_output(&config.output_path);
        let writer = OutputWriter::new(config.output_path.clone());
        Self {
            source,
            store,
            writer,
            config,
        }
    }

    /// Run batches until the target is reached, the source is exhausted,
    /// the failure threshold trips, or shutdown is requested.
    ///
    /// Errors only on local persistence failures; network trouble is
    /// absorbed as skipped batches and, past the threshold, an `Aborted`
    /// status with the checkpoint left on disk.
    pub fn run(&mut self, pb: &ProgressBar) -> Result<Harvest> {
        let target = self.config.target_count;

        let (mut posts, mut offset) = if self.config.resume {
            match self.store.load() {
                Some(checkpoint) => {
                    log::info!(
                        "resuming from checkpoint: {} posts, offset {}",
                        checkpoint.posts.len(),
                        checkpoint.offset
                    );
                    (checkpoint.posts, checkpoint.offset)
                }
                None => (Vec::new(), 0),
            }
        } else {
            (Vec::new(), 0)
        };

        pb.set_length(target as u64);
        pb.set_position(posts.len().min(target) as u64);

        let mut consecutive_failures = 0u32;
        let mut batches = 0u32;
        let mut failed_batches = 0u32;
        let mut status = RunStatus::Complete;

        while posts.len() < target {
            if is_shutdown_requested() {
                log::warn!("shutdown requested, stopping after {batches} batches");
                status = RunStatus::Interrupted;
                break;
            }

            batches += 1;
            log::info!("batch {batches}: fetching offset {offset}");
            pb.set_message(format!("batch {batches} (offset {offset})"));

            match self.source.fetch_batch(offset, self.config.batch_size) {
                FetchOutcome::RetryExhausted => {
                    consecutive_failures += 1;
                    failed_batches += 1;

                    // Skip the failed window so one bad page cannot stall
                    // the run forever. Persist first: the skip must survive
                    // a crash.
                    offset += self.config.batch_size;
                    self.store.save(&posts, offset)?;
                    self.writer.write(&posts)?;

                    if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                        log::warn!(
                            "{consecutive_failures} consecutive batch failures, giving up; \
                             run again to resume from the checkpoint"
                        );
                        status = RunStatus::Aborted;
                        break;
                    }

                    std::thread::sleep(self.config.failure_pause);
                }
                FetchOutcome::Batch(batch) => {
                    consecutive_failures = 0;

                    // The API signals exhaustion with success=false or an
                    // empty page, even though either could also be an
                    // anomaly; preserved as-is from the upstream contract.
                    if !batch.success || batch.posts.is_empty() {
                        log::info!("no more posts available");
                        break;
                    }

                    let before = posts.len();
                    posts.extend(batch.posts.into_iter().filter(|p| p.is_complete()));
                    log::info!("  got {} posts (total {})", posts.len() - before, posts.len());
                    pb.set_position(posts.len().min(target) as u64);

                    // Cursor never rewinds, whatever the server claims.
                    let next = batch
                        .next_offset
                        .unwrap_or(offset + self.config.batch_size)
                        .max(offset);
                    self.store.save(&posts, next)?;
                    self.writer.write(&posts)?;

                    if !batch.has_more {
                        break;
                    }

                    offset = next;
                    if posts.len() < target {
                        std::thread::sleep(self.config.success_pause);
                    }
                }
            }
        }

        if status == RunStatus::Complete {
            // Drop any surplus from an over-shooting final batch, publish
            // the final snapshot, and retire the checkpoint.
            posts.truncate(target);
            self.writer.write(&posts)?;
            self.store.clear()?;
            log::info!(
                "done: {} posts saved to {}",
                posts.len(),
                self.writer.path().display()
            );
        }

        Ok(Harvest {
            posts,
            status,
            batches,
            failed_batches,
        })
    }
}
