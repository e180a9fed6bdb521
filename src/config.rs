// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Command-line options and the settings derived from them.

use crate::controller::DEFAULT_SPAN_DAYS;
use crate::frame::MAX_SPAN_DAYS;
use crate::timer::POLL_INTERVAL;
use clap::Parser;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable that turns on debug logging when set to any value.
pub const DEBUG_ENV: &str = "FLUBBER_DEBUG";

#[derive(Debug, Parser)]
#[command(name = "flubber", version, about = "Desktop front-end for the Watson time tracker")]
pub struct Args {
    /// Watson data directory [default: <config dir>/watson]
    #[arg(long, env = "WATSON_DIR", value_name = "DIR")]
    pub watson_dir: Option<PathBuf>,

    /// Number of days shown, counting today (at most 3650)
    #[arg(long, value_name = "N", default_value_t = DEFAULT_SPAN_DAYS,
          value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_SPAN_DAYS)))]
    pub days: u32,

    /// Seconds between checks for changes made outside flubber
    #[arg(long, value_name = "SECS", default_value_t = POLL_INTERVAL.as_secs(),
          value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub watson_dir: PathBuf,
    pub span_days: u32,
    pub poll_interval: Duration,
    pub debug: bool,
}

/// Watson's own default: `<config dir>/watson` (`~/.config/watson` on Linux), or `./watson`
/// when no config directory can be determined.
pub fn default_watson_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("watson")
}

impl Config {
    pub fn from_args(args: Args) -> Self {
        Config {
            watson_dir: args.watson_dir.unwrap_or_else(default_watson_dir),
            span_days: args.days,
            poll_interval: Duration::from_secs(args.poll_secs),
            debug: env::var_os(DEBUG_ENV).is_some(),
        }
    }
}
