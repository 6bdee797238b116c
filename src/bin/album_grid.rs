use std::fs;
use std::path::PathBuf;

use album_grid_wasm::config::grid_for;
use album_grid_wasm::{MosaicConfig, compose_canvas_files, extract_palette_bytes};
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

/// Compose album covers into one grid image, brightest dominant color first.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Grid rows (defaults to a near-square grid for the inputs)
    #[arg(short, long)]
    rows: Option<u32>,

    /// Grid columns (defaults to a near-square grid for the inputs)
    #[arg(short, long)]
    cols: Option<u32>,

    /// Number of k-means clusters per image
    #[arg(short = 'k', long)]
    clusters: Option<usize>,

    /// Seed for centroid sampling, for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Pixel length of the longer canvas side
    #[arg(short, long)]
    extent: Option<u32>,

    /// JSON config file; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output PNG path
    #[arg(short, long, default_value = album_grid_wasm::DEFAULT_EXPORT_FILENAME)]
    output: PathBuf,

    /// Write a JSON report of the tile layout to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print each image's cluster colors instead of composing a canvas
    #[arg(long)]
    palette: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn mosaic_config(&self) -> Result<MosaicConfig> {
        let mut config = match &self.config {
            Some(path) => MosaicConfig::from_json_file(path)?,
            None => {
                let (rows, cols) = grid_for(self.inputs.len());
                MosaicConfig::new(rows, cols)
            }
        };
        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if let Some(cols) = self.cols {
            config.cols = cols;
        }
        if let Some(k) = self.clusters {
            config.clusters.k = k;
        }
        if let Some(extent) = self.extent {
            config.canvas_extent = extent;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

fn print_palettes(args: &Args, config: &MosaicConfig) -> Result<()> {
    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        let palette = extract_palette_bytes(&bytes, &config.clusters, config.seed)
            .with_context(|| format!("palette extraction failed for {}", input.display()))?;
        let cells: Vec<&str> = palette.iter().map(|c| c.as_deref().unwrap_or("-")).collect();
        println!("{}: {}", input.display(), cells.join(" "));
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt().with_env_filter(filter).with_target(false).init();

    let config = args.mosaic_config()?;

    if args.palette {
        return print_palettes(&args, &config);
    }

    let composite = compose_canvas_files(&args.inputs, &config)?;
    let png = composite.to_png()?;

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&args.output, png)?;
    println!("Saved → {}", args.output.display());

    if let Some(report) = &args.report {
        let json = serde_json::to_string_pretty(&composite.placements)?;
        fs::write(report, json).with_context(|| format!("writing {}", report.display()))?;
    }

    for p in composite.placements.iter().filter(|p| p.error.is_some()) {
        eprintln!("warning: {} drawn as {} ({})", p.locator, p.color, p.error.as_deref().unwrap_or(""));
    }

    Ok(())
}
