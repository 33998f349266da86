use std::path::PathBuf;

use clap::Parser;
use crate::prelude::*;

/// Command-line options for the replay verifier.
#[derive(Clone, Debug, Parser)]
pub struct ReplayOptions {
    /// The CCL level archive to load.
    pub levels: PathBuf,

    /// The TWS solution archive to play back.
    pub solutions: PathBuf,

    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Override the ruleset recorded in the solution archive (ms | lynx).
    #[arg(short, long)]
    pub ruleset: Option<RulesetId>,

    /// Emulate the additional quirks of the original Lynx hardware.
    #[arg(short, long, default_value_t = false)]
    pub pedantic: bool,

    /// Verify a single level number instead of the whole set.
    #[arg(long)]
    pub level: Option<u16>,
}
