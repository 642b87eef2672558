//! Scrape subcommand - run one harvest against the Moltbook API

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use moltscrape_core::{HarvestConfig, Harvester, MoltbookClient, RunStatus};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// Number of posts to fetch
    #[arg(short = 'n', long, default_value_t = 500)]
    pub count: usize,

    /// Output JSON file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Posts per API request
    #[arg(long)]
    pub batch_size: Option<u64>,

    /// Max retry attempts per batch
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Base delay between retries in seconds
    #[arg(long)]
    pub retry_delay: Option<u64>,

    /// Ignore any existing checkpoint and start fresh
    #[arg(long)]
    pub no_resume: bool,
}

fn harvest_bar(multi: Option<&MultiProgress>) -> ProgressBar {
    let Some(multi) = multi else {
        return ProgressBar::hidden();
    };
    let pb = multi.add(ProgressBar::new(0));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:<6.cyan.bold} {bar:30.green/dim} {pos:>6}/{len:6} {wide_msg:.dim}")
            .expect("invalid template")
            .progress_chars("--"),
    );
    pb.set_prefix("posts");
    pb
}

/// Print a key-value summary table on stderr
fn print_summary(title: &str, rows: &[(&str, String)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new(title).fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    eprintln!("\n{table}");
}

pub fn run(args: ScrapeArgs, config: &Config, multi: Option<&MultiProgress>) -> Result<ExitCode> {
    let output = args
        .output
        .unwrap_or_else(|| config.output.default_path.clone());
    let batch_size = args.batch_size.unwrap_or(config.scrape.batch_size);
    let max_retries = args.max_retries.unwrap_or(config.scrape.max_retries);
    let base_delay =
        Duration::from_secs(args.retry_delay.unwrap_or(config.scrape.retry_delay_secs));

    log::info!("scraping top {} posts from Moltbook", args.count);
    log::info!("  batch size: {batch_size} | output: {}", output.display());

    let mut harvest_config = HarvestConfig::new(args.count, output.clone());
    harvest_config.batch_size = batch_size;
    harvest_config.resume = !args.no_resume;

    let client = MoltbookClient::new(config.api.base_url.clone(), max_retries, base_delay);
    let mut harvester = Harvester::new(client, harvest_config);

    let pb = harvest_bar(multi);
    let harvest = harvester.run(&pb)?;
    pb.finish_and_clear();

    let status = match harvest.status {
        RunStatus::Complete => "complete",
        RunStatus::Aborted => "aborted (resumable)",
        RunStatus::Interrupted => "interrupted (resumable)",
    };
    print_summary(
        "Scrape",
        &[
            ("Posts", harvest.posts.len().to_string()),
            (
                "Batches",
                format!("{} ({} failed)", harvest.batches, harvest.failed_batches),
            ),
            ("Status", status.to_string()),
            ("Output", output.display().to_string()),
        ],
    );

    match harvest.status {
        RunStatus::Complete => Ok(ExitCode::SUCCESS),
        RunStatus::Aborted => {
            log::error!("too many consecutive failures; run the same command again to resume");
            Ok(ExitCode::from(1))
        }
        RunStatus::Interrupted => Ok(ExitCode::from(130)),
    }
}
