//! CLI definitions for cdm-narrative.

use clap::{Args, Parser, Subcommand};

use crate::types::NarrativeTarget;

/// CDM trade narrative client
#[derive(Parser, Debug)]
#[command(name = "cdm-narrative", version, about = "Generate and inspect CDM trade narratives")]
pub struct Cli {
    /// Override the narrative service base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream a narrative generation, printing progress as it arrives
    Generate(GenerateArgs),
    /// Show a stored narrative without generating one
    Show(ShowArgs),
    /// Delete all stored narratives for a trade
    Invalidate(InvalidateArgs),
}

/// Arguments for `cdm-narrative generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    pub trade_id: String,

    /// Narrate a single business event instead of the whole trade
    #[arg(long, requires = "state")]
    pub event: Option<String>,

    /// Trade state ID of the event (required with --event)
    #[arg(long, requires = "event")]
    pub state: Option<String>,

    /// Print tool calls and their durations
    #[arg(short, long)]
    pub verbose: bool,
}

impl GenerateArgs {
    pub fn target(&self) -> NarrativeTarget {
        match (&self.event, &self.state) {
            (Some(event), Some(state)) => {
                NarrativeTarget::event(self.trade_id.clone(), event.clone(), state.clone())
            }
            _ => NarrativeTarget::trade(self.trade_id.clone()),
        }
    }
}

/// Arguments for `cdm-narrative show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    pub trade_id: String,

    /// Show the narrative of one event
    #[arg(long)]
    pub event: Option<String>,
}

/// Arguments for `cdm-narrative invalidate`.
#[derive(Args, Debug)]
pub struct InvalidateArgs {
    pub trade_id: String,
}
