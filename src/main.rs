//! Voxcap - silence-aware voice capture
//!
//! Run `voxcap` to record until silence and write a WAV file.
//! Use `voxcap devices` to list microphones and `voxcap config` to inspect
//! the active configuration.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use voxcap::cli::{Cli, Commands};
use voxcap::config::{self, Config};
use voxcap::error::RecorderError;
use voxcap::VoiceRecorder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("voxcap={},warn", log_level))),
        )
        .with_target(false)
        .init();

    // Load configuration
    let mut config = config::load_config(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(device) = cli.device {
        config.audio.device = device;
    }
    if cli.no_chime {
        config.feedback.enabled = false;
    }

    // Run the appropriate command
    match cli.command.unwrap_or(Commands::Record {
        output: PathBuf::from("recording.wav"),
        silence: None,
        max_secs: None,
    }) {
        Commands::Record {
            output,
            silence,
            max_secs,
        } => {
            if let Some(secs) = silence {
                config.recording.silence_duration_secs = secs;
            }
            if let Some(secs) = max_secs {
                config.recording.max_recording_secs = secs;
            }
            run_record(&config, &output).await?;
        }

        Commands::Devices => {
            list_devices()?;
        }

        Commands::Config { init } => {
            if init {
                init_config()?;
            } else {
                show_config(&config)?;
            }
        }
    }

    Ok(())
}

/// Record one clip and write it to disk
async fn run_record(config: &Config, output: &PathBuf) -> anyhow::Result<()> {
    let mut recorder = VoiceRecorder::new(config);
    recorder.start()?;

    tracing::info!(
        "Recording... auto-stops after {:.1}s of silence (max {:.0}s), Ctrl-C to stop early",
        config.recording.silence_duration_secs,
        config.recording.max_recording_secs
    );

    // Poll at the monitor's cadence until the monitor (or the user) ends
    // the session
    let poll = Duration::from_millis(config.recording.poll_interval_ms);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted, finalizing recording");
                break;
            }
            _ = tokio::time::sleep(poll) => {
                if !recorder.is_active() || recorder.stop_requested() {
                    break;
                }
            }
        }
    }

    match recorder.stop() {
        Ok(wav) => {
            std::fs::write(output, &wav)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            tracing::info!("Wrote {} ({} bytes)", output.display(), wav.len());
            println!("{}", output.display());
            Ok(())
        }
        Err(RecorderError::EmptyRecording) => {
            // Reported, not fatal: callers fall back to non-voice input
            tracing::warn!("No audio captured, nothing written");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// List input devices with their default stream configs
fn list_devices() -> anyhow::Result<()> {
    use cpal::traits::{DeviceTrait, HostTrait};

    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let mut found = false;
    for device in host.input_devices()? {
        let name = match device.name() {
            Ok(name) => name,
            Err(_) => continue,
        };
        found = true;

        let marker = if Some(&name) == default_name.as_ref() {
            " (default)"
        } else {
            ""
        };

        match device.default_input_config() {
            Ok(cfg) => println!(
                "{}{}  [{} Hz, {} ch, {:?}]",
                name,
                marker,
                cfg.sample_rate().0,
                cfg.channels(),
                cfg.sample_format()
            ),
            Err(_) => println!("{}{}", name, marker),
        }
    }

    if !found {
        println!("No audio input devices found.");
    }
    Ok(())
}

/// Print the resolved configuration as TOML
fn show_config(config: &Config) -> anyhow::Result<()> {
    if let Some(path) = Config::default_path() {
        println!("# Config file: {}", path.display());
        if !path.exists() {
            println!("# (not present, showing defaults)");
        }
        println!();
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Write the default config file if none exists
fn init_config() -> anyhow::Result<()> {
    let path = Config::default_path().context("Could not determine config directory")?;

    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, config::DEFAULT_CONFIG)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
