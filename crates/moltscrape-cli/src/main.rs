//! moltscrape - checkpointed harvester for Moltbook top posts
//!
//! Fetches paginated batches from the Moltbook API into a local JSON
//! dataset, surviving transient failures and interruptions through an
//! on-disk checkpoint.

use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::MultiProgress;

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "moltscrape")]
#[command(about = "Harvest top posts from Moltbook into a local JSON dataset")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./moltscrape.toml or ~/.config/moltscrape/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape posts into the output file, resuming from any checkpoint
    Scrape(cmd::scrape::ScrapeArgs),
    /// Inspect the on-disk output and checkpoint artifacts
    Status(cmd::status::StatusArgs),
    /// Show current configuration
    Config,
}

fn setup_signal_handlers() {
    // First signal: graceful stop after the current batch lands.
    // Second signal: force exit.
    // SAFETY: AtomicBool::swap and process::exit are async-signal-safe
    unsafe {
        for sig in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
            signal_hook::low_level::register(sig, || {
                if moltscrape_core::shutdown_flag().swap(true, Ordering::Relaxed) {
                    std::process::exit(130);
                }
            })
            .expect("failed to register signal handler");
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let is_tty = std::io::stderr().is_terminal();
    let multi = is_tty.then(MultiProgress::new);

    // TTY: the progress bar shows activity, keep logs quiet unless --debug.
    // Non-TTY: logs are the only progress indicator.
    let quiet = is_tty && !cli.debug;
    moltscrape_core::init_logging(quiet, cli.debug, multi.as_ref());

    setup_signal_handlers();

    let config = match cli.config {
        Some(path) => Config::from_file(&path)?,
        None => Config::load()?,
    };

    match cli.command {
        Command::Scrape(args) => cmd::scrape::run(args, &config, multi.as_ref()),
        Command::Status(args) => {
            cmd::status::run(args, &config)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config => {
            use comfy_table::{
                modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec!["API base URL", &config.api.base_url]);
            table.add_row(vec![
                "Output file",
                &config.output.default_path.display().to_string(),
            ]);
            table.add_row(vec!["Batch size", &config.scrape.batch_size.to_string()]);
            table.add_row(vec!["Max retries", &config.scrape.max_retries.to_string()]);
            table.add_row(vec![
                "Retry delay",
                &format!("{}s", config.scrape.retry_delay_secs),
            ]);

            eprintln!("\n{table}");
            Ok(ExitCode::SUCCESS)
        }
    }
}
