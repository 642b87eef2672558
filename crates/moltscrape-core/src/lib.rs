//! moltscrape core - incremental harvesting of Moltbook posts
//!
//! Turns the rate-limited, paginated Moltbook API into a durably growing
//! local JSON dataset: bounded retries with exponential backoff per batch,
//! a crash-recovery checkpoint rewritten after every batch, and an output
//! snapshot that is never more than one batch stale.

pub mod api;
pub mod checkpoint;
pub mod harvest;
pub mod logging;
pub mod output;
pub mod persist;
pub mod post;
pub mod retry;
pub mod shutdown;

// Re-exports for convenience
pub use api::{BatchResponse, BatchSource, FetchError, FetchOutcome, MoltbookClient};
pub use checkpoint::{Checkpoint, CheckpointStore};
pub use harvest::{Harvest, HarvestConfig, Harvester, RunStatus, MAX_CONSECUTIVE_FAILURES};
pub use logging::init_logging;
pub use output::{OutputWriter, Snapshot};
pub use post::{Author, Post, Submolt};
pub use retry::backoff_delay;
pub use shutdown::{is_shutdown_requested, request_shutdown, shutdown_flag};
