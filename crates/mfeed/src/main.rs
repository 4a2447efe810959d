//! # mfeed
//! Command-line client for the magnet feed service: list tracked files, trigger
//! metadata re-syncs, move files between download locations and remove them.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use futures::StreamExt;
use indicatif::ProgressBar;
use magnet_feed::api::FeedConfig;
use magnet_feed::sync::SyncEvent;
use magnet_feed::view::FeedView;
use magnet_feed::MagnetFeed;
use std::future::Future;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Feed service base URL (overrides MAGNET_FEED_BASE_URL and config.toml)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tracked files
    List,
    /// List download locations
    Locations,
    /// Remove a file from the feed
    Remove {
        /// File id
        id: String,
    },
    /// Re-sync torrent metadata for one file, or all of them
    Refresh {
        /// File id
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<String>,
        /// Refresh every file
        #[arg(long)]
        all: bool,
    },
    /// Move a file to another download location
    Move {
        /// File id
        file_id: String,
        /// Location id
        location_id: String,
    },
    /// Reload periodically and print the listing whenever it changes
    Watch {
        /// Seconds between reloads
        #[arg(long, default_value = "60")]
        interval: u64,
    },
    /// Show the resolved service URL and config file location
    Config,
}

#[async_std::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("❌ {}", format!("{:#}", e).red());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = FeedConfig::load(cli.base_url.as_deref())
        .context("Failed to resolve feed configuration")?;
    let feed = MagnetFeed::connect(&config);

    match cli.command {
        Commands::List => {
            with_spinner("Loading files...", feed.start()).await;
            let view = feed.view().await;
            print_files(&view);
            fail_on_error(&view)?;
        }
        Commands::Locations => {
            with_spinner("Loading locations...", feed.registry().load()).await;
            let snapshot = feed.registry().snapshot().await;
            if let Some(e) = snapshot.error {
                bail!("Failed to load locations: {}", e);
            }
            if snapshot.locations.is_empty() {
                println!("{}", "No locations configured".dimmed());
            }
            for location in snapshot.locations {
                println!("📁 {} {}", location.name.bold(), format!("({})", location.id).dimmed());
            }
        }
        Commands::Remove { id } => {
            with_spinner("Loading files...", feed.start()).await;
            with_spinner("Removing...", feed.remove(&id)).await?;
            println!("🗑  Removed {}", id.cyan());
            let view = feed.view().await;
            print_files(&view);
            fail_on_error(&view)?;
        }
        Commands::Refresh { id, all } => {
            with_spinner("Loading files...", feed.start()).await;
            match id {
                Some(id) if !all => {
                    with_spinner("Refreshing...", feed.refresh_one(&id)).await?;
                    println!("🔄 Refreshed {}", id.cyan());
                }
                _ => {
                    with_spinner("Refreshing all files...", feed.refresh_all()).await?;
                    println!("🔄 Refreshed all files");
                }
            }
            let view = feed.view().await;
            print_files(&view);
            fail_on_error(&view)?;
        }
        Commands::Move {
            file_id,
            location_id,
        } => {
            with_spinner("Loading files...", feed.start()).await;
            with_spinner(
                "Moving...",
                feed.change_file_location(&file_id, &location_id),
            )
            .await?;
            let view = feed.view().await;
            let label = view
                .row(&file_id)
                .and_then(|r| r.location_label.clone())
                .unwrap_or(location_id);
            println!("📦 Moved {} to {}", file_id.cyan(), label.green());
        }
        Commands::Config => print_config(&config),
        Commands::Watch { interval } => {
            ctrlc::set_handler(|| {
                println!("\n👋 Stopped watching");
                std::process::exit(0);
            })?;

            feed.start().await;
            print_files(&feed.view().await);

            let mut events = feed.subscribe();
            let directory = feed.directory().clone();
            async_std::task::spawn(async move {
                loop {
                    async_std::task::sleep(Duration::from_secs(interval)).await;
                    directory.reload().await;
                }
            });

            println!(
                "{}",
                format!("Watching every {}s (Ctrl-C to stop)", interval).dimmed()
            );
            while let Some(event) = events.next().await {
                if let SyncEvent::Directory(snapshot) = event {
                    if snapshot.loading {
                        continue;
                    }
                    let view = feed.view().await;
                    print_files(&view);
                    if let Some(e) = view.error() {
                        eprintln!("⚠️  {}", e.to_string().yellow());
                    }
                }
            }
        }
    }

    Ok(())
}

async fn with_spinner<F: Future>(message: &'static str, fut: F) -> F::Output {
    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message);
    let output = fut.await;
    spinner.finish_and_clear();
    output
}

fn print_config(config: &FeedConfig) {
    println!("Base URL:    {}", config.base_url.as_str().green());
    match config.config_file() {
        Some(path) => {
            let state = if path.exists() { "" } else { " (not found)" };
            println!("Config file: {}{}", path.display(), state.dimmed());
        }
        None => println!("Config file: {}", "no config directory".dimmed()),
    }
}

fn fail_on_error(view: &FeedView) -> Result<()> {
    match view.error() {
        Some(e) => bail!("{}", e),
        None => Ok(()),
    }
}

fn print_files(view: &FeedView) {
    if view.rows.is_empty() {
        println!("{}", "No files".dimmed());
        return;
    }

    for row in &view.rows {
        let busy = if row.busy { " ⏳" } else { "" };
        println!(
            "📄 {} {}{}",
            row.file.name.bold(),
            format!("({})", row.file.id).dimmed(),
            busy
        );
        println!(
            "   Location: {}",
            row.location_label.as_deref().unwrap_or("-").green()
        );
        println!(
            "   Updated:  {}   Synced: {}",
            row.file.torrent_updated_at, row.file.last_sync_at
        );
        println!("   Comment:  {}", row.comment_label());
        println!("   Source:   {}", row.file.original_url.underline());
    }
}
