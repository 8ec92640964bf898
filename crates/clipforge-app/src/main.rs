//! ClipForge - clip authoring engine
//!
//! Entry point for the headless driver.

mod replay;
mod settings;

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const USAGE: &str = "\
usage: clipforge [--config <path>] <command>

commands:
  replay <script.json>   run an editing script and print the clips it creates
  config                 print the effective configuration";

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config_path: Option<PathBuf> = None;
    let mut rest = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().context("--config needs a path")?;
            config_path = Some(PathBuf::from(path));
        } else {
            rest.push(arg);
        }
    }

    let config = settings::load(config_path.as_deref())?;

    match rest.first().map(String::as_str) {
        Some("replay") => {
            let script_path = rest.get(1).context("replay needs a script path")?;
            let data = std::fs::read(script_path)
                .with_context(|| format!("Failed to read script {script_path}"))?;
            let script: replay::Script =
                serde_json::from_slice(&data).context("Failed to parse replay script")?;
            info!(steps = script.steps.len(), "Replaying script");

            let report = replay::run(&script, &config)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some("config") => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Some(other) => bail!("unknown command '{other}'\n\n{USAGE}"),
        None => bail!("{USAGE}"),
    }

    Ok(())
}
