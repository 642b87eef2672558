//! Scenario tests for the harvest loop against a scripted batch source.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use indicatif::ProgressBar;
use moltscrape_core::{
    BatchResponse, BatchSource, CheckpointStore, FetchOutcome, Harvest, HarvestConfig, Harvester,
    Post, RunStatus, Snapshot,
};

fn post(id: &str) -> Post {
    Post {
        id: id.to_string(),
        title: Some(format!("title {id}")),
        content: Some(format!("content {id}")),
        author: Default::default(),
        submolt: Default::default(),
        upvotes: 0,
        downvotes: 0,
        comment_count: 0,
        created_at: String::new(),
        extra: Default::default(),
    }
}

fn incomplete_post(id: &str) -> Post {
    Post {
        title: None,
        ..post(id)
    }
}

fn batch(posts: Vec<Post>, has_more: bool, next_offset: Option<u64>) -> FetchOutcome {
    FetchOutcome::Batch(BatchResponse {
        success: true,
        posts,
        has_more,
        next_offset,
    })
}

fn posts(ids: std::ops::Range<u32>) -> Vec<Post> {
    ids.map(|i| post(&format!("p{i}"))).collect()
}

/// Replays a fixed sequence of outcomes and records each requested offset.
struct ScriptedSource {
    script: VecDeque<FetchOutcome>,
    offsets: Rc<RefCell<Vec<u64>>>,
}

impl BatchSource for ScriptedSource {
    fn fetch_batch(&mut self, offset: u64, _limit: u64) -> FetchOutcome {
        self.offsets.borrow_mut().push(offset);
        self.script.pop_front().expect("script exhausted")
    }
}

fn config(dir: &Path, target: usize) -> HarvestConfig {
    let mut config = HarvestConfig::new(target, dir.join("out.json"));
    config.batch_size = 5;
    config.success_pause = Duration::ZERO;
    config.failure_pause = Duration::ZERO;
    config
}

fn run_scripted(
    script: Vec<FetchOutcome>,
    config: HarvestConfig,
) -> (Harvest, Rc<RefCell<Vec<u64>>>) {
    let offsets = Rc::new(RefCell::new(Vec::new()));
    let source = ScriptedSource {
        script: script.into(),
        offsets: offsets.clone(),
    };
    let mut harvester = Harvester::new(source, config);
    let harvest = harvester.run(&ProgressBar::hidden()).unwrap();
    (harvest, offsets)
}

#[test]
fn reaches_target_and_clears_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 10);
    let output = config.output_path.clone();

    let script = vec![
        batch(posts(0..5), true, Some(5)),
        batch(posts(5..10), false, Some(10)),
    ];
    let (harvest, offsets) = run_scripted(script, config);

    assert_eq!(harvest.status, RunStatus::Complete);
    assert_eq!(harvest.posts.len(), 10);
    assert_eq!(harvest.batches, 2);
    assert_eq!(harvest.failed_batches, 0);
    assert_eq!(*offsets.borrow(), vec![0, 5]);

    let snapshot = Snapshot::read(&output).unwrap();
    assert_eq!(snapshot.count, 10);
    assert!(!CheckpointStore::for_output(&output).path().exists());
}

#[test]
fn skips_failed_window_then_completes() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 5);
    let output = config.output_path.clone();

    let script = vec![
        FetchOutcome::RetryExhausted,
        batch(posts(0..5), false, None),
    ];
    let (harvest, offsets) = run_scripted(script, config);

    assert_eq!(harvest.status, RunStatus::Complete);
    assert_eq!(harvest.posts.len(), 5);
    assert_eq!(harvest.failed_batches, 1);
    // The failed window at offset 0 is skipped, not retried
    assert_eq!(*offsets.borrow(), vec![0, 5]);
    assert!(!CheckpointStore::for_output(&output).path().exists());
}

#[test]
fn aborts_after_three_consecutive_failures() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 5);
    let output = config.output_path.clone();

    let script = vec![
        FetchOutcome::RetryExhausted,
        FetchOutcome::RetryExhausted,
        FetchOutcome::RetryExhausted,
    ];
    let (harvest, offsets) = run_scripted(script, config);

    assert_eq!(harvest.status, RunStatus::Aborted);
    assert!(harvest.posts.is_empty());
    assert_eq!(harvest.failed_batches, 3);
    assert_eq!(*offsets.borrow(), vec![0, 5, 10]);

    // Checkpoint survives the abort, pointing past the three failed windows
    let checkpoint = CheckpointStore::for_output(&output).load().unwrap();
    assert_eq!(checkpoint.offset, 15);
    assert!(checkpoint.posts.is_empty());

    // The output snapshot was still published, one batch at a time
    assert_eq!(Snapshot::read(&output).unwrap().count, 0);
}

#[test]
fn failure_counter_resets_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 20);

    let script = vec![
        FetchOutcome::RetryExhausted,
        FetchOutcome::RetryExhausted,
        batch(posts(0..5), true, Some(15)),
        FetchOutcome::RetryExhausted,
        FetchOutcome::RetryExhausted,
        FetchOutcome::RetryExhausted,
    ];
    let (harvest, _) = run_scripted(script, config);

    // Aborted by the post-success streak, not the first two failures
    assert_eq!(harvest.status, RunStatus::Aborted);
    assert_eq!(harvest.posts.len(), 5);
    assert_eq!(harvest.failed_batches, 5);
    assert_eq!(harvest.batches, 6);
}

#[test]
fn truncates_final_overshooting_batch() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 3);
    let output = config.output_path.clone();

    let script = vec![batch(posts(0..5), true, Some(5))];
    let (harvest, _) = run_scripted(script, config);

    assert_eq!(harvest.status, RunStatus::Complete);
    assert_eq!(harvest.posts.len(), 3);
    assert_eq!(Snapshot::read(&output).unwrap().count, 3);
    assert!(!CheckpointStore::for_output(&output).path().exists());
}

#[test]
fn filters_incomplete_posts() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 10);

    let page = vec![
        post("a"),
        incomplete_post("b"),
        post("c"),
        incomplete_post("d"),
        post("e"),
    ];
    let (harvest, _) = run_scripted(vec![batch(page, false, None)], config);

    assert_eq!(harvest.status, RunStatus::Complete);
    let ids: Vec<&str> = harvest.posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["a", "c", "e"]);
}

#[test]
fn empty_page_means_source_exhausted() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 10);
    let output = config.output_path.clone();

    let (harvest, _) = run_scripted(vec![batch(Vec::new(), true, None)], config);

    assert_eq!(harvest.status, RunStatus::Complete);
    assert!(harvest.posts.is_empty());
    assert_eq!(Snapshot::read(&output).unwrap().count, 0);
    assert!(!CheckpointStore::for_output(&output).path().exists());
}

#[test]
fn unsuccessful_response_means_source_exhausted() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 10);

    let script = vec![FetchOutcome::Batch(BatchResponse {
        success: false,
        posts: posts(0..5),
        has_more: true,
        next_offset: Some(5),
    })];
    let (harvest, _) = run_scripted(script, config);

    assert_eq!(harvest.status, RunStatus::Complete);
    assert!(harvest.posts.is_empty());
}

#[test]
fn resumes_from_checkpoint_without_duplication() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 10);
    let output = config.output_path.clone();

    let already = posts(0..5);
    CheckpointStore::for_output(&output).save(&already, 5).unwrap();

    let script = vec![batch(posts(5..10), false, None)];
    let (harvest, offsets) = run_scripted(script, config);

    // Picks up at the persisted cursor, not from zero
    assert_eq!(*offsets.borrow(), vec![5]);
    assert_eq!(harvest.status, RunStatus::Complete);
    assert_eq!(harvest.posts.len(), 10);

    let mut ids: Vec<&str> = harvest.posts.iter().map(|p| p.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 10, "no post fetched twice");
    assert!(!CheckpointStore::for_output(&output).path().exists());
}

#[test]
fn no_resume_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path(), 5);
    config.resume = false;
    let output = config.output_path.clone();

    CheckpointStore::for_output(&output).save(&posts(0..5), 5).unwrap();

    let script = vec![batch(posts(10..15), false, None)];
    let (harvest, offsets) = run_scripted(script, config);

    assert_eq!(*offsets.borrow(), vec![0]);
    assert_eq!(harvest.posts.len(), 5);
    assert_eq!(harvest.posts[0].id, "p10");
}

#[test]
fn cursor_never_decreases() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 20);

    let script = vec![
        batch(posts(0..5), true, Some(5)),
        FetchOutcome::RetryExhausted,
        batch(posts(5..10), true, Some(15)),
        batch(posts(10..15), false, None),
    ];
    let (harvest, offsets) = run_scripted(script, config);

    let offsets = offsets.borrow();
    assert!(
        offsets.windows(2).all(|w| w[0] <= w[1]),
        "offsets went backwards: {offsets:?}"
    );
    assert_eq!(*offsets, vec![0, 5, 10, 15]);
    // Source ran out before the target: keep everything that was valid
    assert_eq!(harvest.posts.len(), 15);
    assert_eq!(harvest.status, RunStatus::Complete);
}

#[test]
fn checkpoint_written_before_success_is_removed_at_completion() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 5);
    let output = config.output_path.clone();
    let store = CheckpointStore::for_output(&output);

    // First batch fails all retries: a checkpoint lands on disk mid-run.
    // After the second batch completes the run, it must be gone.
    let script = vec![
        FetchOutcome::RetryExhausted,
        batch(posts(0..5), false, None),
    ];
    let (harvest, _) = run_scripted(script, config);

    assert_eq!(harvest.status, RunStatus::Complete);
    assert_eq!(harvest.posts.len(), 5);
    assert!(!store.path().exists());
    assert_eq!(Snapshot::read(&output).unwrap().count, 5);
}

#[test]
fn target_zero_writes_empty_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 0);
    let output = config.output_path.clone();

    let (harvest, offsets) = run_scripted(Vec::new(), config);

    assert_eq!(harvest.status, RunStatus::Complete);
    assert!(offsets.borrow().is_empty());
    assert_eq!(Snapshot::read(&output).unwrap().count, 0);
}
