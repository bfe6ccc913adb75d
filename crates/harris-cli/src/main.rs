//! harris-cli: corner and edge maps for 8-bit grayscale images.

use anyhow::Result;
use clap::Parser;
use harris::app::{load_config, run_detection, DetectionConfig, Filter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Structure-tensor corners and classical edge maps for grayscale images")]
#[command(version)]
struct Cli {
    /// Input image: headerless 8-bit `.raw` or any format `image` decodes.
    input: Option<PathBuf>,

    /// JSON config; command-line flags override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output path (`.raw` for a flat buffer, otherwise encoded by extension).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// harris | sobel | dilation | erosion | unbias | unbias-threshold |
    /// entropy | probability
    #[arg(short, long)]
    filter: Option<Filter>,

    /// Raw input width (default 550 for harris, 512 otherwise).
    #[arg(long)]
    width: Option<usize>,

    /// Raw input height (default 550 for harris, 512 otherwise).
    #[arg(long)]
    height: Option<usize>,

    /// Odd window width (and height unless --window-height is given).
    #[arg(short, long)]
    window: Option<usize>,

    /// Odd window height.
    #[arg(long)]
    window_height: Option<usize>,

    /// Trace penalty of the corner response.
    #[arg(long)]
    lambda: Option<f64>,

    /// Minimum corner response (exclusive).
    #[arg(long)]
    threshold: Option<f64>,

    /// Fraction of pixels the percentile threshold aims to mark.
    #[arg(long)]
    edge_ratio: Option<f64>,

    /// Keep the normalized edge map instead of binarizing it.
    #[arg(long)]
    no_binarize: bool,

    /// Write detected corners as JSON.
    #[arg(long)]
    corners_json: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<DetectionConfig> {
        let mut cfg = match &self.config {
            Some(path) => load_config(path)?,
            None => DetectionConfig::default(),
        };

        if let Some(v) = self.input {
            cfg.input = v;
        }
        if cfg.input.as_os_str().is_empty() {
            anyhow::bail!("no input image given (positional argument or `input` in --config)");
        }
        if self.output.is_some() {
            cfg.output = self.output;
        }
        if self.filter.is_some() {
            cfg.filter = self.filter;
        }
        if self.width.is_some() {
            cfg.width = self.width;
        }
        if self.height.is_some() {
            cfg.height = self.height;
        }
        if self.window.is_some() {
            cfg.window = self.window;
        }
        if self.window_height.is_some() {
            cfg.window_height = self.window_height;
        }
        if self.lambda.is_some() {
            cfg.lambda = self.lambda;
        }
        if self.threshold.is_some() {
            cfg.threshold = self.threshold;
        }
        if self.edge_ratio.is_some() {
            cfg.edge_ratio = self.edge_ratio;
        }
        if self.no_binarize {
            cfg.binarize = Some(false);
        }
        if self.corners_json.is_some() {
            cfg.corners_json = self.corners_json;
        }
        if self.log_level.is_some() {
            cfg.log_level = self.log_level;
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    let cfg = Cli::parse().into_config()?;

    let level = cfg.log_level.clone().unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
    tracing::debug!(?cfg, "resolved configuration");

    let report = run_detection(cfg)?;
    match report.corners {
        Some(n) => println!(
            "{} {}x{}: {n} corners -> {}",
            report.filter,
            report.width,
            report.height,
            report.output.display()
        ),
        None => println!(
            "{} {}x{} -> {}",
            report.filter,
            report.width,
            report.height,
            report.output.display()
        ),
    }
    Ok(())
}
