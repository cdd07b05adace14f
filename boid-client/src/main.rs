use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use boid_client::{run, HoverWindow, ResizeEvent, RunPlan, Variant};
use boid_shared::{FlockSettings, SurfaceSize};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless boid flock driver", long_about = None)]
struct Args {
    /// Which flock to run
    #[arg(long, value_enum, default_value = "canvas")]
    variant: Variant,

    /// JSON settings file, merged over the variant's preset
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Number of frames to run
    #[arg(short, long, default_value_t = 600)]
    frames: u64,

    /// Seed for the initial positions and velocities
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Surface width in pixels
    #[arg(long, default_value_t = 800.0)]
    width: f32,

    /// Surface height in pixels
    #[arg(long, default_value_t = 600.0)]
    height: f32,

    /// Hovered frame range START:END (repeatable)
    #[arg(long)]
    hover: Vec<HoverWindow>,

    /// Resize before a frame, FRAME:WIDTHxHEIGHT (repeatable)
    #[arg(long)]
    resize: Vec<ResizeEvent>,

    /// Write one JSON snapshot per frame to this file
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn load_settings(variant: Variant, path: Option<&PathBuf>) -> Result<FlockSettings> {
    let preset = variant.preset();
    let Some(path) = path else {
        return Ok(preset);
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    FlockSettings::from_json_with_base(&json, &preset)
        .with_context(|| format!("Invalid settings in {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let plan = RunPlan {
        variant: args.variant,
        settings: load_settings(args.variant, args.settings.as_ref())?,
        frames: args.frames,
        seed: args.seed,
        size: SurfaceSize::new(args.width, args.height),
        hover: args.hover,
        resizes: args.resize,
    };

    let report = match &args.dump {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            let report = run(&plan, Some(&mut writer))?;
            writer.flush().context("Failed to flush frame dump")?;
            log::info!("Wrote {} frames to {}", report.frames, path.display());
            report
        }
        None => run(&plan, None)?,
    };

    log::info!(
        "Ran {} frames: max speed {:.3}, max overshoot {:.3}, {} violations",
        report.frames,
        report.max_speed,
        report.max_overshoot,
        report.violation_count
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_clean() {
        anyhow::bail!("{} invariant violations", report.violation_count);
    }

    Ok(())
}
