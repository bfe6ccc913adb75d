//! Shared application-level helpers for the CLI.
//!
//! These functions wire up I/O (raw or encoded input, raw/PNG output and the
//! optional JSON corner dump) around the `harris-core` detectors and edge
//! filters, so every front end gets the same behavior.

use crate::image::{grid_from_image, image_from_grid};
use crate::raw::{read_raw, write_raw};
use anyhow::{bail, Context, Result};
use harris_core::detect::find_corners_u8_with_trace;
use harris_core::edges;
use harris_core::normalize::{min_max, normalize_to_u8};
use harris_core::threshold::{
    check_ratio, max_ratio_threshold, min_ratio_threshold, DEFAULT_EDGE_RATIO,
};
use harris_core::{Grid, HarrisParams, Window};
use image::ImageReader;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Filter {
    /// Structure-tensor corner map.
    Harris,
    Sobel,
    Dilation,
    Erosion,
    /// Zero crossings of the morphological Laplacian.
    Unbias,
    /// Zero crossings restricted to high local variance.
    UnbiasThreshold,
    Entropy,
    /// Difference of probability.
    Probability,
}

impl Filter {
    pub const ALL: [Filter; 8] = [
        Filter::Harris,
        Filter::Sobel,
        Filter::Dilation,
        Filter::Erosion,
        Filter::Unbias,
        Filter::UnbiasThreshold,
        Filter::Entropy,
        Filter::Probability,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Filter::Harris => "harris",
            Filter::Sobel => "sobel",
            Filter::Dilation => "dilation",
            Filter::Erosion => "erosion",
            Filter::Unbias => "unbias",
            Filter::UnbiasThreshold => "unbias-threshold",
            Filter::Entropy => "entropy",
            Filter::Probability => "probability",
        }
    }

    /// Side length assumed for square raw inputs when the configuration
    /// gives no dimensions.
    pub fn default_raw_side(self) -> usize {
        match self {
            Filter::Harris => 550,
            _ => 512,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "harris" | "corner" => Ok(Filter::Harris),
            "sobel" => Ok(Filter::Sobel),
            "dilation" => Ok(Filter::Dilation),
            "erosion" => Ok(Filter::Erosion),
            "unbias" | "laplacian" => Ok(Filter::Unbias),
            "unbias-threshold" | "variance" => Ok(Filter::UnbiasThreshold),
            "entropy" => Ok(Filter::Entropy),
            "probability" | "dp" => Ok(Filter::Probability),
            other => Err(format!(
                "invalid filter '{other}', expected \
                 harris|sobel|dilation|erosion|unbias|unbias-threshold|entropy|probability"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DetectionConfig {
    #[serde(default)]
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub filter: Option<Filter>,
    /// Raw input width; checked against decoded images when set.
    pub width: Option<usize>,
    pub height: Option<usize>,
    /// Odd width of the averaging / neighborhood window; also its height
    /// unless `window_height` is set.
    pub window: Option<usize>,
    pub window_height: Option<usize>,
    pub lambda: Option<f64>,
    pub threshold: Option<f64>,
    pub edge_ratio: Option<f64>,
    pub binarize: Option<bool>,
    pub corners_json: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CornerOut {
    pub x: usize,
    pub y: usize,
    pub response: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CornerDump {
    pub image: String,
    pub width: usize,
    pub height: usize,
    pub window: usize,
    pub window_height: usize,
    pub lambda: f64,
    pub threshold: f64,
    pub resp_ms: f64,
    pub detect_ms: f64,
    pub corners: Vec<CornerOut>,
}

/// What a [`run_detection`] call produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub filter: Filter,
    pub width: usize,
    pub height: usize,
    pub output: PathBuf,
    /// Number of classified corners; `None` for edge filters.
    pub corners: Option<usize>,
}

pub fn run_detection(cfg: DetectionConfig) -> Result<RunReport> {
    let filter = cfg.filter.unwrap_or(Filter::Harris);
    let img = load_input(&cfg, filter)?;
    let (width, height) = img.dimensions();
    info!(%filter, width, height, input = %cfg.input.display(), "loaded input");

    let (map, corners) = match filter {
        Filter::Harris => {
            let (map, n) = run_harris(&cfg, &img)?;
            (map, Some(n))
        }
        edge => (run_edge_filter(&cfg, edge, &img)?, None),
    };

    let output = cfg
        .output
        .clone()
        .unwrap_or_else(|| default_output(&cfg.input, filter));
    save_grid(&output, &map)?;
    info!(output = %output.display(), "saved {filter} map");

    Ok(RunReport {
        filter,
        width,
        height,
        output,
        corners,
    })
}

/// Window from `window` / `window_height`, falling back to `default` for
/// whichever side is unset.
fn config_window(cfg: &DetectionConfig, default: Window) -> Result<Window> {
    if cfg.window.is_none() && cfg.window_height.is_none() {
        return Ok(default);
    }
    let width = cfg.window.unwrap_or(default.width());
    let height = cfg.window_height.or(cfg.window).unwrap_or(default.height());
    Window::new(width, height).context("invalid window")
}

/// Corner parameters with the configuration's overrides applied.
pub fn harris_params(cfg: &DetectionConfig) -> Result<HarrisParams> {
    let mut params = HarrisParams::default();
    let window = config_window(cfg, params.window())?;
    params = params.with_window(window);
    if let Some(lambda) = cfg.lambda {
        params = params.with_lambda(lambda).context("invalid lambda")?;
    }
    if let Some(threshold) = cfg.threshold {
        params = params
            .with_threshold(threshold)
            .context("invalid response threshold")?;
    }
    Ok(params)
}

fn run_harris(cfg: &DetectionConfig, img: &Grid<u8>) -> Result<(Grid<u8>, usize)> {
    let params = harris_params(cfg)?;
    debug!(
        window_w = params.window().width(),
        window_h = params.window().height(),
        lambda = params.lambda(),
        threshold = params.threshold(),
        "running corner detector"
    );

    let res = find_corners_u8_with_trace(img, &params);
    info!(
        corners = res.corners.len(),
        resp_ms = res.resp_ms,
        detect_ms = res.detect_ms,
        "corner detection finished"
    );

    if let Some(path) = &cfg.corners_json {
        let dump = CornerDump {
            image: cfg.input.to_string_lossy().into_owned(),
            width: img.width(),
            height: img.height(),
            window: params.window().width(),
            window_height: params.window().height(),
            lambda: params.lambda(),
            threshold: params.threshold(),
            resp_ms: res.resp_ms,
            detect_ms: res.detect_ms,
            corners: res
                .corners
                .iter()
                .map(|c| CornerOut {
                    x: c.x,
                    y: c.y,
                    response: c.response,
                })
                .collect(),
        };
        write_json(path, &dump)?;
        info!(path = %path.display(), "saved corner list");
    }

    let count = res.corners.len();
    Ok((res.map, count))
}

/// Which histogram tail the percentile threshold marks.
#[derive(Clone, Copy)]
enum Tail {
    Bright,
    Dark,
}

struct EdgeOptions {
    window: Window,
    ratio: f64,
    binarize: bool,
}

impl EdgeOptions {
    fn from_config(cfg: &DetectionConfig) -> Result<Self> {
        let window = config_window(cfg, Window::default())?;
        let ratio = cfg.edge_ratio.unwrap_or(DEFAULT_EDGE_RATIO);
        check_ratio(ratio).context("invalid edge ratio")?;
        Ok(Self {
            window,
            ratio,
            binarize: cfg.binarize.unwrap_or(true),
        })
    }

    /// Normalize `measure` to bytes and, unless disabled, binarize it.
    fn finish<T: Copy + Into<f64>>(
        &self,
        filter: Filter,
        measure: &Grid<T>,
        tail: Tail,
    ) -> Result<Grid<u8>> {
        let (lo, hi) = min_max(measure);
        if hi <= lo {
            bail!("{filter} response is constant ({lo}) over the whole image");
        }
        let bytes = normalize_to_u8(measure);
        if !self.binarize {
            return Ok(bytes);
        }
        let out = match tail {
            Tail::Bright => max_ratio_threshold(&bytes, self.ratio),
            Tail::Dark => min_ratio_threshold(&bytes, self.ratio),
        }
        .context("binarizing edge map")?;
        Ok(out)
    }
}

fn run_edge_filter(cfg: &DetectionConfig, filter: Filter, img: &Grid<u8>) -> Result<Grid<u8>> {
    let opts = EdgeOptions::from_config(cfg)?;
    let win = opts.window;
    debug!(
        %filter,
        window = win.width(),
        ratio = opts.ratio,
        binarize = opts.binarize,
        "running edge filter"
    );

    let map = match filter {
        Filter::Harris => bail!("{filter} is not an edge filter"),
        Filter::Sobel => opts.finish(filter, &edges::sobel_magnitude(img), Tail::Bright)?,
        Filter::Dilation => {
            opts.finish(filter, &edges::dilation_residue(img, win), Tail::Bright)?
        }
        Filter::Erosion => opts.finish(filter, &edges::erosion_residue(img, win), Tail::Bright)?,
        Filter::Probability => opts.finish(
            filter,
            &edges::difference_of_probability(img, win),
            Tail::Bright,
        )?,
        Filter::Entropy => opts.finish(filter, &edges::local_entropy(img, win), Tail::Dark)?,
        Filter::Unbias => edges::unbias_edge(img, win),
        Filter::UnbiasThreshold => {
            if win.area() < 2 {
                bail!("{filter} needs a window of at least two pixels");
            }
            edges::local_variance_threshold(img, win)
        }
    };
    Ok(map)
}

fn is_raw(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("raw"))
}

fn load_input(cfg: &DetectionConfig, filter: Filter) -> Result<Grid<u8>> {
    if is_raw(&cfg.input) {
        let side = filter.default_raw_side();
        let width = cfg.width.unwrap_or(side);
        let height = cfg.height.unwrap_or(side);
        return read_raw(&cfg.input, width, height);
    }

    let img = ImageReader::open(&cfg.input)
        .with_context(|| format!("opening image {}", cfg.input.display()))?
        .decode()
        .with_context(|| format!("decoding image {}", cfg.input.display()))?
        .to_luma8();
    let (w, h) = (img.width() as usize, img.height() as usize);
    if cfg.width.is_some_and(|v| v != w) || cfg.height.is_some_and(|v| v != h) {
        bail!(
            "{} is {w}x{h}, configuration expects {}x{}",
            cfg.input.display(),
            cfg.width.unwrap_or(w),
            cfg.height.unwrap_or(h)
        );
    }
    let grid = grid_from_image(&img).with_context(|| format!("image {}", cfg.input.display()))?;
    Ok(grid)
}

/// `<input stem>.<filter>.raw` for raw inputs, `.png` otherwise.
pub fn default_output(input: &Path, filter: Filter) -> PathBuf {
    let ext = if is_raw(input) { "raw" } else { "png" };
    input.with_extension(format!("{filter}.{ext}"))
}

/// Write a byte map as raw bytes (`.raw`) or through `image` (any other
/// extension it can encode).
pub fn save_grid(path: &Path, grid: &Grid<u8>) -> Result<()> {
    if is_raw(path) {
        return write_raw(path, grid);
    }
    image_from_grid(grid)
        .save(path)
        .with_context(|| format!("saving image {}", path.display()))?;
    Ok(())
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let mut json_file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(&mut json_file, value)
        .with_context(|| format!("writing {}", path.display()))?;
    json_file.write_all(b"\n")?;
    Ok(())
}

pub fn load_config(path: &Path) -> Result<DetectionConfig> {
    let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    let cfg: DetectionConfig = serde_json::from_reader(file)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
