// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! # flubber — desktop front-end for Watson
//!
//! Shows the frames recorded by the Watson time tracker grouped by day, and lets you start,
//! stop, add, edit, and delete them. Data is read from and written back to Watson's own
//! `frames` and `state` files, so the `watson` command line sees every change.
//!
//! ## Options
//!
//! | Option              | Description |
//! |---------------------|-------------|
//! | `--watson-dir DIR`  | Watson data directory (also `$WATSON_DIR`; default `<config dir>/watson`). |
//! | `--days N`          | Days shown, counting today (default 7). |
//! | `--poll-secs N`     | Seconds between checks for changes made outside flubber (default 5). |
//!
//! ## Environment
//!
//! `FLUBBER_DEBUG` (any value) logs debug messages to stderr. Otherwise `RUST_LOG` applies,
//! defaulting to warnings only.
//!
//! ## Keys
//!
//! Ctrl+Q quits, F11 toggles maximized, F5 reloads.

mod config;
mod controller;
mod datetime;
mod days;
mod dialog;
mod error;
mod frame;
mod gui;
mod timer;
mod tree;
mod watson;

use anyhow::{anyhow, Context};
use clap::Parser;
use config::{Args, Config};
use controller::MainView;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use watson::WatsonDir;

/// Logs to stderr. Debug level for this crate when `debug`, else `RUST_LOG` or `warn`.
fn init_logging(debug: bool) -> anyhow::Result<()> {
    let filter = if debug {
        EnvFilter::new("warn,flubber=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("failed to initialize logging")
}

fn main() -> anyhow::Result<()> {
    let config = Config::from_args(Args::parse());
    init_logging(config.debug)?;

    let source = WatsonDir::new(&config.watson_dir);
    info!(
        dir = %source.path().display(),
        days = config.span_days,
        poll_secs = config.poll_interval.as_secs(),
        "starting"
    );
    let view = MainView::new(source, config.span_days);
    gui::run(view, config.poll_interval).map_err(|err| anyhow!("failed to run flubber: {err}"))
}
