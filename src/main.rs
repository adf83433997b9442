//! YouLearn CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use youlearn::cli::{Cli, Commands};
use youlearn::config::Settings;
use youlearn::frontend::{
    is_caller_allowed, split_message, ChatFrontEnd, StdoutFrontEnd, MESSAGE_CHUNK_LIMIT,
};
use youlearn::job::{Action, Job};
use youlearn::pipeline::Pipeline;
use youlearn::reference::VideoId;
use youlearn::summarize::{SummaryOutcome, SummaryProvider};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("youlearn={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    match &cli.command {
        Commands::Init => {
            let path = Settings::default_config_path();
            settings.save_to(&path)?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }

        Commands::Transcript { url } => run_job(url, Action::Transcript, &settings).await,

        Commands::Summarize { url, provider } => {
            let provider: SummaryProvider = provider.parse().map_err(anyhow::Error::from)?;
            run_job(url, Action::Summary(provider), &settings).await
        }
    }
}

async fn run_job(url: &str, action: Action, settings: &Settings) -> Result<()> {
    let front_end = StdoutFrontEnd;

    // The CLI has no caller identity; a configured allow-list closes it.
    if !is_caller_allowed(&settings.frontend.allowed_callers, None) {
        eprintln!("You are not authorized to use this service.");
        std::process::exit(1);
    }

    let outcome = async {
        let video_id = VideoId::parse(url)?;
        let pipeline = Pipeline::from_settings(settings)?;
        let mut job = Job::new(video_id, action, None);
        pipeline.run(&mut job).await
    }
    .await;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("{}", err.user_message());
            std::process::exit(1);
        }
    };

    match outcome.summary {
        None => {
            let header = format!("Transcript: {}\n\n", outcome.title);
            let chunks = split_message(Some(&header), &outcome.transcript.text, MESSAGE_CHUNK_LIMIT);
            front_end.deliver_text(&chunks).await?;
        }
        Some(SummaryOutcome::Summary(summary)) => {
            let header = format!("Summary: {}\n\n", outcome.title);
            let chunks = split_message(Some(&header), &summary, MESSAGE_CHUNK_LIMIT);
            front_end.deliver_text(&chunks).await?;
        }
        Some(SummaryOutcome::Unavailable(reason)) => {
            // The transcript still came through; deliver it with the reason
            // the summary could not be produced.
            eprintln!("{}", reason);
            let header = format!("Transcript: {}\n\n", outcome.title);
            let chunks = split_message(Some(&header), &outcome.transcript.text, MESSAGE_CHUNK_LIMIT);
            front_end.deliver_text(&chunks).await?;
        }
    }

    Ok(())
}
