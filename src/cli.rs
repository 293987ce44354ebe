// Command-line interface definitions for voxcap
//
// This module is separate so it can be used by both the binary (main.rs)
// and build.rs for generating man pages.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "voxcap")]
#[command(author, version, about = "Silence-aware voice capture")]
#[command(long_about = "
Voxcap records a voice clip from your microphone and stops automatically
once you go quiet, writing the result as a 16-bit PCM WAV file. It is the
capture side of a push-to-ask assistant: record a question, hand the bytes
to whatever consumes them.

USAGE:
  Run `voxcap` (or `voxcap record`) and speak. Recording ends after the
  configured span of silence, at the maximum length, or on Ctrl-C.
  Run `voxcap devices` to list microphones.
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Override audio input device (name or substring)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Disable start/stop chimes
    #[arg(long)]
    pub no_chime: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record until silence and write a WAV file (default if no command specified)
    Record {
        /// Output file path
        #[arg(short, long, value_name = "FILE", default_value = "recording.wav")]
        output: std::path::PathBuf,

        /// Seconds of silence before the recording auto-stops
        #[arg(long, value_name = "SECS")]
        silence: Option<f32>,

        /// Maximum recording length in seconds
        #[arg(long, value_name = "SECS")]
        max_secs: Option<f32>,
    },

    /// List available audio input devices
    Devices,

    /// Show current configuration
    Config {
        /// Write the default config file if none exists
        #[arg(long)]
        init: bool,
    },
}
