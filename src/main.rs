use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use inquire::{Confirm, Text};
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};
use yt_smpl::{Application, Config, Event, FailurePolicy, SkipReason};

/// Download playlist audio and generate an SMPL playlist
#[derive(Parser, Debug)]
#[command(name = "yt-smpl", version, about)]
struct Args {
    /// Playlist URL (prompts interactively when omitted)
    playlist_url: Option<String>,

    /// Custom playlist name (defaults to the playlist title)
    #[arg(short = 'n', long)]
    playlist_name: Option<String>,

    /// Reverse playlist order
    #[arg(short, long)]
    reverse: bool,

    /// Configuration file (TOML)
    #[arg(short, long, env = "YT_SMPL_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

struct Request {
    url: String,
    name: Option<String>,
    reverse: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        tracing::error!(error = %e, "Run failed");
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::from_toml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let request = match args.playlist_url {
        Some(url) => Request {
            url,
            name: args.playlist_name,
            reverse: args.reverse,
        },
        None => prompt_request()?,
    };

    let app = Application::new(config)
        .await
        .context("failed to initialize")?;
    println!("{}", "✔ Application initialized.".green().bold());
    println!("{} {}", "➜ Reversed:".blue().bold(), request.reverse);
    if let Some(name) = &request.name {
        println!("{} {}", "➜ Custom Playlist Name:".blue().bold(), name);
    }

    let mut events = app.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let outcome = app
        .run(&request.url, request.name.as_deref(), request.reverse)
        .await;
    // Dropping the application closes the event channel and ends the printer
    app.close().await;
    printer.await.ok();

    let summary = outcome?;
    let report = summary.report;
    println!(
        "\n{} {} new, {} already downloaded, {} unavailable, {} failed",
        "✔ All done!".green().bold(),
        report.ingested,
        report.already_cataloged,
        report.unavailable,
        report.failed
    );
    Ok(())
}

fn prompt_request() -> Result<Request> {
    let url = Text::new("Enter playlist URL:").prompt()?;
    let name = Text::new("Enter custom playlist name (optional):")
        .prompt_skippable()?
        .filter(|name| !name.trim().is_empty());
    let reverse = Confirm::new("Reverse playlist order?")
        .with_default(false)
        .prompt()?;

    Ok(Request { url, name, reverse })
}

fn print_event(event: &Event) {
    match event {
        Event::PlaylistFetched { title, entries } => {
            println!(
                "{} {} ({} entries)",
                "➜ Playlist:".blue().bold(),
                title.as_deref().unwrap_or("(untitled)"),
                entries
            );
        }
        Event::EntryStarted {
            position,
            total,
            video_id,
            title,
        } => {
            println!(
                "\n{}",
                format!("⬇ Downloading {} ({}) ({}/{})", title, video_id, position, total)
                    .green()
                    .bold()
            );
        }
        Event::EntrySkipped {
            video_id, reason, ..
        } => {
            let why = match reason {
                SkipReason::Unavailable => "unavailable",
                SkipReason::AlreadyCataloged => "already downloaded",
            };
            println!("    {} {} ({})", "⏭ Skipping:".dimmed(), video_id, why);
        }
        Event::Converted { path, .. } => {
            println!("    {} {}", "✔ Converted:".cyan().bold(), path.display());
        }
        Event::Tagged { with_artwork, .. } => {
            let cover = if *with_artwork { "with cover" } else { "without cover" };
            println!("    {} {}", "✔ Tagged".cyan().bold(), cover);
        }
        Event::StageFailed {
            video_id,
            stage,
            error,
            policy,
        } => {
            let label = format!("✘ {} failed for {}:", stage, video_id);
            match policy {
                FailurePolicy::SkipEntry => println!("    {} {}", label.yellow().bold(), error),
                FailurePolicy::AbortRun => println!("    {} {}", label.red().bold(), error),
            }
        }
        Event::PlaylistWritten { path, members } => {
            println!(
                "{} {} ({} tracks)",
                "✔ SMPL saved:".green().bold(),
                path.display(),
                members
            );
        }
        Event::Downloaded { .. } | Event::Cataloged { .. } => {}
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
