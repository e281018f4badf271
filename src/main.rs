//! cdm-narrative CLI binary entry point.

use std::future::Future;

use clap::Parser;
use cdm_narrative::api::NarrativeApi;
use cdm_narrative::cli::{Cli, Commands, GenerateArgs, ShowArgs};
use cdm_narrative::config::NarrativeConfig;
use cdm_narrative::stream::{CacheHitPacing, NarrativeStream, StreamSnapshot};
use cdm_narrative::types::{NarrativeTarget, ProgressEvent};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cdm_narrative=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match load_config(cli.api_url) {
        Ok(config) => match cli.command {
            Commands::Generate(args) => handle_generate(config, args).await,
            Commands::Show(args) => handle_show(config, args).await,
            Commands::Invalidate(args) => handle_invalidate(config, &args.trade_id).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_config(api_url: Option<String>) -> Result<NarrativeConfig, Box<dyn std::error::Error>> {
    let mut config = NarrativeConfig::load()?;
    if let Some(url) = api_url {
        config.api_base_url = url;
    }
    Ok(config)
}

async fn handle_generate(
    config: NarrativeConfig,
    args: GenerateArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let pacing = CacheHitPacing::from_config(&config);
    let stream = NarrativeStream::new(config)?;
    stream.generate(&args.target()).await?;

    let Some(settled) = follow_stream(&stream, tokio::signal::ctrl_c(), args.verbose).await?
    else {
        eprintln!("Stopped.");
        return Ok(());
    };

    if let Some(error) = settled.error.as_ref() {
        return Err(error.clone().into());
    }
    if let Some(narrative) = pacing.reveal(&settled).await {
        println!();
        println!("{narrative}");
    }
    if args.verbose {
        if let Some(metadata) = settled.metadata.as_ref() {
            eprintln!(
                "model={} tokens={} time={:.0}ms from_storage={}",
                metadata.model,
                metadata.tokens_used.total,
                metadata.generation_time_ms,
                metadata.from_storage
            );
        }
    }
    Ok(())
}

/// Print progress until the stream settles. Returns `None` if `interrupt`
/// fired first, after stopping the stream.
async fn follow_stream<F>(
    stream: &NarrativeStream,
    interrupt: F,
    verbose: bool,
) -> Result<Option<StreamSnapshot>, Box<dyn std::error::Error>>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(interrupt);
    let mut updates = stream.watch();
    let mut printed = 0;
    loop {
        let snapshot = updates.borrow_and_update().clone();
        for event in snapshot.progress.iter().skip(printed) {
            if let Some(line) = progress_line(event, verbose) {
                eprintln!("{line}");
            }
        }
        printed = snapshot.progress.len();
        if snapshot.is_settled() {
            return Ok(Some(snapshot));
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(Some(stream.snapshot()));
                }
            }
            interrupted = &mut interrupt => {
                stream.stop().await;
                interrupted?;
                return Ok(None);
            }
        }
    }
}

/// Console line for one progress entry, if it has anything to show.
fn progress_line(event: &ProgressEvent, verbose: bool) -> Option<String> {
    match &event.message {
        Some(message) => Some(message.clone()),
        None if verbose && event.is_tool_event() => Some(format!(
            "  [{}] {} {}",
            event.kind,
            event.tool.as_deref().unwrap_or("?"),
            event
                .duration_ms
                .map(|ms| format!("({ms:.0}ms)"))
                .unwrap_or_default()
        )),
        None => None,
    }
}

async fn handle_show(config: NarrativeConfig, args: ShowArgs) -> Result<(), Box<dyn std::error::Error>> {
    let api = NarrativeApi::new(&config)?;
    let stored = match args.event.as_deref() {
        Some(event_id) => api.get_event_narrative(&args.trade_id, event_id).await?,
        None => api.get_stored(&NarrativeTarget::trade(&args.trade_id)).await?,
    };

    if let Some(error) = stored.error {
        eprintln!("Storage lookup failed: {error}");
    }
    match stored.narrative {
        Some(narrative) => {
            if let Some(cached_at) = stored.metadata.and_then(|m| m.cached_at) {
                eprintln!("Stored at {cached_at}");
            }
            println!("{narrative}");
        }
        None => eprintln!("No narrative stored yet. Run `cdm-narrative generate` first."),
    }
    Ok(())
}

async fn handle_invalidate(
    config: NarrativeConfig,
    trade_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let api = NarrativeApi::new(&config)?;
    let receipt = api.invalidate_trade_narratives(trade_id).await?;
    println!(
        "Deleted {} stored narrative(s) for {}",
        receipt.deleted, receipt.trade_id
    );
    Ok(())
}
