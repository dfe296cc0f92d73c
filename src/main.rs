use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use tannenbaum::console::{run_console, ConsoleArgs};
use tannenbaum::raster::{render_frame, unpremultiplied_rgba, RenderOptions};
use tannenbaum::{Simulation, Tuning};

#[derive(Debug, Parser)]
#[command(name = "tannenbaum")]
#[command(about = "Animated Christmas-tree overlay")]
#[command(version = build_version())]
struct Cli {
    /// Optional JSON file overriding scene tuning constants.
    #[arg(long, global = true)]
    tuning: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Borderless always-on-top desktop overlay window.
    Overlay {
        #[arg(long, default_value = "420x520", value_parser = parse_size)]
        size: (u32, u32),
        /// Start with mouse input passing through the window.
        #[arg(long)]
        click_through: bool,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// ANSI renderer in the current terminal.
    Console {
        #[arg(long, default_value_t = 30)]
        fps: u32,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Render one frame to a PNG and exit.
    Snapshot {
        #[arg(long, default_value = "800x600", value_parser = parse_size)]
        size: (u32, u32),
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
        /// Simulation ticks to advance before rendering.
        #[arg(long, default_value_t = 0)]
        ticks: u32,
        /// Fill a night-sky background instead of transparency.
        #[arg(long)]
        backdrop: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let tuning = match &cli.tuning {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };

    match cli.command {
        Commands::Overlay {
            size,
            click_through,
            seed,
        } => run_overlay_command(tuning, size, click_through, seed),
        Commands::Console { fps, seed } => run_console(tuning, ConsoleArgs { fps, seed }),
        Commands::Snapshot {
            size,
            output,
            seed,
            ticks,
            backdrop,
        } => run_snapshot(tuning, size, &output, seed, ticks, backdrop),
    }
}

#[cfg(feature = "overlay")]
fn run_overlay_command(
    tuning: Tuning,
    size: (u32, u32),
    click_through: bool,
    seed: Option<u64>,
) -> Result<()> {
    tannenbaum::window::run_overlay(
        tuning,
        tannenbaum::window::OverlayArgs {
            width: size.0,
            height: size.1,
            click_through,
            seed,
        },
    )
}

#[cfg(not(feature = "overlay"))]
fn run_overlay_command(
    _tuning: Tuning,
    _size: (u32, u32),
    _click_through: bool,
    _seed: Option<u64>,
) -> Result<()> {
    anyhow::bail!("this build has no overlay support; rebuild with the 'overlay' feature")
}

fn run_snapshot(
    tuning: Tuning,
    size: (u32, u32),
    output: &Path,
    seed: Option<u64>,
    ticks: u32,
    backdrop: bool,
) -> Result<()> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut sim = Simulation::with_tuning(size.0, size.1, tuning, rng);
    for _ in 0..ticks {
        sim.step();
    }

    let pixmap = render_frame(&sim, RenderOptions { backdrop })?;
    let rgba = unpremultiplied_rgba(&pixmap);
    let image = image::RgbaImage::from_raw(pixmap.width(), pixmap.height(), rgba)
        .context("rendered frame has an inconsistent byte length")?;
    image
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("Wrote {}", output.display());
    Ok(())
}

fn parse_size(raw: &str) -> Result<(u32, u32), String> {
    let (width, height) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{raw}'"))?;
    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width in '{raw}'"))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height in '{raw}'"))?;
    Ok((width, height))
}

fn build_version() -> String {
    match option_env!("TANNENBAUM_GIT_HASH") {
        Some(hash) => format!("{} ({hash})", env!("CARGO_PKG_VERSION")),
        None => env!("CARGO_PKG_VERSION").to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_size;

    #[test]
    fn parse_size_accepts_both_separators() {
        assert_eq!(parse_size("800x600"), Ok((800, 600)));
        assert_eq!(parse_size("1920X1080"), Ok((1920, 1080)));
    }

    #[test]
    fn parse_size_rejects_garbage() {
        assert!(parse_size("800").is_err());
        assert!(parse_size("x600").is_err());
        assert!(parse_size("800xabc").is_err());
    }
}
