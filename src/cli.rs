//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "tapedeck")]
#[command(about = "A terminal music player: add local files and play them in order", version)]
pub struct Args {
    /// Files or directories to add at startup (directories are walked).
    pub paths: Vec<PathBuf>,

    /// Config file to use instead of the default location.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Initial volume in [0, 1]; overrides `playback.volume`.
    #[arg(long, value_parser = parse_volume)]
    pub volume: Option<f32>,

    /// Do not register on the session bus.
    #[arg(long)]
    pub no_mpris: bool,

    /// Print the effective settings as TOML and exit.
    #[arg(long)]
    pub print_config: bool,
}

fn parse_volume(s: &str) -> Result<f32, String> {
    let v: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(format!("volume must be within [0, 1], got {v}"))
    }
}
