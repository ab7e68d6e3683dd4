use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use emoji_cloud::{
    Canvas, CanvasShape, CloudOptions, EmojiCloudRenderer, EmojiItem, Instrument, MaskShape,
    RelaxStrategy, Vendor, VendorDirectory,
};
use image::Rgba;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Render weighted emoji clouds to PNG")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lay out weighted emoji on a canvas and write the result to disk
    Render(RenderArgs),
    /// List vendors and the emoji available for them
    List(ListArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Emoji weights as CODE=WEIGHT[@VENDOR] (e.g. 1f602=2.5 or 😂=2.5@Google)
    weights: Vec<String>,
    /// File with one CODE=WEIGHT[@VENDOR] entry per line
    #[arg(long)]
    weights_file: Option<PathBuf>,
    /// Output PNG path
    #[arg(short, long)]
    output: PathBuf,
    /// Root directory holding one sub-directory of PNGs per vendor
    #[arg(long, default_value = "data")]
    assets: PathBuf,
    /// Vendor for entries that do not name one
    #[arg(long, default_value = "Twitter")]
    vendor: String,
    #[command(flatten)]
    canvas: CanvasSettings,
    #[command(flatten)]
    layout: LayoutSettings,
}

#[derive(Parser, Debug)]
struct ListArgs {
    /// Root directory holding one sub-directory of PNGs per vendor
    #[arg(long, default_value = "data")]
    assets: PathBuf,
    /// Only list emoji for this vendor
    #[arg(long)]
    vendor: Option<String>,
}

#[derive(Parser, Debug, Clone)]
struct CanvasSettings {
    /// Canvas shape
    #[arg(long, value_enum, default_value = "rectangle")]
    shape: ShapeChoice,
    /// Canvas width in pixels (rectangle and ellipse)
    #[arg(long, default_value_t = 720)]
    width: u32,
    /// Canvas height in pixels (rectangle and ellipse)
    #[arg(long, default_value_t = 288)]
    height: u32,
    /// Silhouette image for the mask shape
    #[arg(long, required_if_eq("shape", "mask"))]
    mask: Option<PathBuf>,
    /// Contour width around the mask silhouette
    #[arg(long, default_value_t = 5)]
    contour_width: u32,
    /// Contour color as RRGGBB or RRGGBBAA
    #[arg(long, default_value = "00acee")]
    contour_color: String,
    /// Alpha jump that counts as a contour edge
    #[arg(long, default_value_t = 10)]
    contour_threshold: u8,
    /// Background color as RRGGBB or RRGGBBAA
    #[arg(long, default_value = "ffffff")]
    background: String,
}

#[derive(Parser, Debug, Clone)]
struct LayoutSettings {
    /// Alpha threshold for cropping emoji to their bounding box (0-255)
    #[arg(long, default_value_t = 4)]
    alpha_threshold: u8,
    /// Number of relaxation attempts
    #[arg(long, default_value_t = 20)]
    num_try: usize,
    /// Relax ratio increment between attempts
    #[arg(long, default_value_t = 0.1)]
    step_size: f64,
    /// Run relaxation attempts in parallel
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ShapeChoice {
    Rectangle,
    Ellipse,
    Mask,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Render(args) => render(args),
        Commands::List(args) => list(args),
    }
}

fn render(args: RenderArgs) -> Result<()> {
    let vendor = args.vendor.parse::<Vendor>()?;
    let store = VendorDirectory::new(&args.assets);

    let mut entries = Vec::new();
    for entry in &args.weights {
        entries.push(parse_weight(entry)?);
    }
    if let Some(path) = &args.weights_file {
        entries.extend(load_weights_file(path)?);
    }
    if entries.is_empty() {
        anyhow::bail!("no emoji weights given");
    }

    let requested = entries.len();
    let entries = entries.into_iter().map(|entry| {
        let vendor = entry.vendor.unwrap_or_else(|| vendor.clone());
        (entry.code, entry.weight, vendor)
    });
    let items = EmojiItem::from_entries(entries, &store)?;
    info!("{} of {} emoji found", items.len(), requested);

    let canvas = args.canvas.build()?;

    let progress = ProgressBar::new(args.layout.num_try as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} attempts",
        )?
        .progress_chars("=> "),
    );
    let options = args.layout.to_options(&progress);

    let output = EmojiCloudRenderer
        .render_with_store(&store, &canvas, &items, &options)
        .context("failed to lay out emoji cloud")?;

    output
        .image
        .save(&args.output)
        .with_context(|| format!("failed to write {:?}", args.output))?;

    progress.finish_with_message(format!(
        "Emoji cloud written to {:?} (relax ratio {:.2})",
        args.output, output.relax_ratio
    ));
    Ok(())
}

fn list(args: ListArgs) -> Result<()> {
    let store = VendorDirectory::new(&args.assets);
    let vendors = match &args.vendor {
        Some(vendor) => vec![vendor.parse::<Vendor>()?],
        None => store.vendors()?,
    };

    if vendors.is_empty() {
        anyhow::bail!("no vendor directories found in {:?}", args.assets);
    }

    for vendor in vendors {
        let names = store
            .list(&vendor)
            .with_context(|| format!("failed to list emoji for {}", vendor))?;
        println!("{} ({}): {} emoji", vendor, vendor.code(), names.len());
        if args.vendor.is_some() {
            for name in names {
                println!("  {}", name);
            }
        }
    }
    Ok(())
}

/// One `CODE=WEIGHT[@VENDOR]` argument.
#[derive(Debug, PartialEq)]
struct WeightEntry {
    code: String,
    weight: f64,
    vendor: Option<Vendor>,
}

fn parse_weight(entry: &str) -> Result<WeightEntry> {
    let (code, rest) = entry
        .rsplit_once('=')
        .with_context(|| format!("expected CODE=WEIGHT[@VENDOR], got {:?}", entry))?;
    let (weight, vendor) = match rest.split_once('@') {
        Some((weight, vendor)) if !vendor.trim().is_empty() => {
            (weight, Some(vendor.parse::<Vendor>()?))
        },
        Some(_) => anyhow::bail!("missing vendor after '@' in {:?}", entry),
        None => (rest, None),
    };
    let weight = weight
        .trim()
        .parse::<f64>()
        .with_context(|| format!("invalid weight in {:?}", entry))?;
    Ok(WeightEntry { code: code.trim().to_owned(), weight, vendor })
}

fn load_weights_file(path: &Path) -> Result<Vec<WeightEntry>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read weights {:?}", path))?;
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(parse_weight)
        .collect()
}

fn parse_color(value: &str) -> Result<Rgba<u8>> {
    let hex = value.trim().trim_start_matches('#');
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
            .with_context(|| format!("invalid color {:?}", value))
    };
    match hex.len() {
        6 => Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, 255])),
        8 => Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, channel(6)?])),
        _ => anyhow::bail!("invalid color {:?}, expected RRGGBB or RRGGBBAA", value),
    }
}

impl CanvasSettings {
    fn build(&self) -> Result<Canvas> {
        let background = parse_color(&self.background)?;
        let shape = match self.shape {
            ShapeChoice::Rectangle => {
                CanvasShape::Rectangle { width: self.width, height: self.height }
            },
            ShapeChoice::Ellipse => CanvasShape::Ellipse { width: self.width, height: self.height },
            ShapeChoice::Mask => {
                let path = self.mask.as_ref().context("--mask is required for the mask shape")?;
                let silhouette = image::open(path)
                    .with_context(|| format!("failed to open mask {:?}", path))?
                    .into_rgba8();
                let mut mask = MaskShape::new(silhouette)
                    .with_contour(self.contour_width, parse_color(&self.contour_color)?);
                mask.contour_threshold = self.contour_threshold;
                CanvasShape::Mask(mask)
            },
        };
        Ok(Canvas::new(&shape, background)?)
    }
}

impl LayoutSettings {
    fn to_options(&self, progress: &ProgressBar) -> CloudOptions {
        let progress = progress.clone();
        let instrument = Instrument::new(move |operation, duration| {
            debug!("{operation} took {:.4}s", duration.as_secs_f64());
            if operation == "attempt" {
                progress.inc(1);
            }
        });
        CloudOptions {
            alpha_threshold: self.alpha_threshold,
            num_try: self.num_try,
            step_size: self.step_size,
            strategy: if self.parallel {
                RelaxStrategy::Parallel
            } else {
                RelaxStrategy::Sequential
            },
            instrument: Some(instrument),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_weight_entries() {
        let entry = |code: &str, weight, vendor| WeightEntry {
            code: code.to_owned(),
            weight,
            vendor,
        };
        assert_eq!(parse_weight("1f602=2.5").unwrap(), entry("1f602", 2.5, None));
        assert_eq!(parse_weight(" 😂 = 1 ").unwrap(), entry("😂", 1.0, None));
        assert!(parse_weight("1f602").is_err());
        assert!(parse_weight("1f602=heavy").is_err());
    }

    #[test]
    fn parses_per_entry_vendor() {
        let parsed = parse_weight("1f602=2@google").unwrap();
        assert_eq!(parsed.weight, 2.0);
        assert_eq!(parsed.vendor, Some(Vendor::Google));
        assert_eq!(parse_weight("1f603=1@Twtr").unwrap().vendor, Some(Vendor::Twitter));
        assert!(parse_weight("1f602=2@").is_err());
    }

    #[test]
    fn parses_colors() {
        assert_eq!(parse_color("00acee").unwrap(), Rgba([0, 172, 238, 255]));
        assert_eq!(parse_color("#ffffff80").unwrap(), Rgba([255, 255, 255, 128]));
        assert!(parse_color("fff").is_err());
        assert!(parse_color("zzzzzz").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
