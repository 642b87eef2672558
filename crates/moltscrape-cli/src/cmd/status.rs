//! Status subcommand - inspect the output and checkpoint artifacts

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use moltscrape_core::{CheckpointStore, Snapshot};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output file whose artifacts to inspect
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: StatusArgs, config: &Config) -> Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| config.output.default_path.clone());
    let store = CheckpointStore::for_output(&output);

    let output_state = if output.exists() {
        match Snapshot::read(&output) {
            Ok(snapshot) => format!(
                "{} posts, scraped {}",
                snapshot.count,
                snapshot.scraped_at.format("%Y-%m-%d %H:%M UTC")
            ),
            Err(e) => format!("unreadable: {e}"),
        }
    } else {
        "absent".to_string()
    };

    let checkpoint_state = if store.path().exists() {
        match store.load() {
            Some(checkpoint) => format!(
                "{} posts, next offset {}, saved {}",
                checkpoint.posts.len(),
                checkpoint.offset,
                checkpoint.timestamp.format("%Y-%m-%d %H:%M UTC")
            ),
            None => "corrupted (a fresh run will start over)".to_string(),
        }
    } else {
        "none (no run in progress)".to_string()
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Artifact").fg(Color::Cyan),
            Cell::new("State").fg(Color::Cyan),
        ]);
    table.add_row(vec![
        Cell::new(format!("Output ({})", output.display())),
        Cell::new(output_state),
    ]);
    table.add_row(vec![
        Cell::new(format!("Checkpoint ({})", store.path().display())),
        Cell::new(checkpoint_state),
    ]);

    eprintln!("\n{table}");
    Ok(())
}
