// SPDX-License-Identifier: MIT OR Apache-2.0
//! Blueprint Editor demo
//!
//! Drives the blueprint node editor widgets headlessly:
//! - Lays out every node of a blueprint with the node builder
//! - Replays scripted link, node and delete interactions
//! - Steps the evaluator with the debug overlay attached
//! - Writes a per-frame JSON report
//!
//! ## Usage
//!
//! ```text
//! blueprint_editor [CONFIG.ron]
//! blueprint_editor --write-config CONFIG.ron
//! ```

mod blueprint_view;
mod config;
mod sample;
mod session;

use config::DemoConfig;
use session::{DemoSession, SessionError};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new("blueprint_editor_app=debug,blueprint_editor=info")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Blueprint Editor v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run() {
        tracing::error!("Blueprint editor failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), SessionError> {
    let mut args = std::env::args().skip(1);
    let config_path = match args.next().as_deref() {
        Some("--write-config") => {
            let path = args
                .next()
                .map_or_else(|| PathBuf::from("blueprint_demo.ron"), PathBuf::from);
            DemoConfig::default().save(&path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            return Ok(());
        }
        Some(path) => Some(PathBuf::from(path)),
        None => None,
    };

    let config = DemoConfig::load_or_default(config_path.as_deref())?;
    let report_path = config.report_path.clone();

    let mut session = DemoSession::from_config(config)?;
    session.run();

    if let Some(path) = report_path {
        session.write_report(&path)?;
    }
    Ok(())
}
