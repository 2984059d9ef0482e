use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use glyph_atlas_core::prelude::*;
use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "glyph-atlas",
    about = "Pack glyph rectangles into a fixed-size atlas",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack a JSON glyph list, optionally resuming from a saved state
    Pack(PackArgs),
    /// Decode a saved state file and print its config, skyline and stats
    Inspect(InspectArgs),
    /// Simple timing bench over random glyph sizes
    Bench(BenchArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// JSON array of glyphs: [{"index": 36, "width": 12, "height": 18}, ...]
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output JSON with placements and stats
    #[arg(short, long, default_value = "atlas.json", help_heading = "Input/Output")]
    output: PathBuf,
    /// YAML config file path (fields override the layout options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Resume from a binary state written by --save-state
    #[arg(long, help_heading = "Input/Output")]
    state: Option<PathBuf>,
    /// Write the packer state after this batch
    #[arg(long, help_heading = "Input/Output")]
    save_state: Option<PathBuf>,
    /// Write a PNG showing placed boxes and the consumed region
    #[arg(long, help_heading = "Input/Output")]
    preview: Option<PathBuf>,

    // Layout
    /// Atlas side length in pixels
    #[arg(long, default_value_t = 1024, help_heading = "Layout")]
    size: i32,
    /// Padding carried for the rasterizer
    #[arg(long, default_value_t = 4, help_heading = "Layout")]
    padding: i32,
    /// Gap kept around every glyph and along the border
    #[arg(long, default_value_t = 1, help_heading = "Layout")]
    margin: i32,
    /// Nominal glyph size in pixels per em
    #[arg(long, default_value_t = 32, help_heading = "Layout")]
    glyph_size: i32,
    /// Sort order: height_desc|area_desc|max_side_desc|none
    #[arg(long, default_value = "height_desc", help_heading = "Layout")]
    sort_order: String,

    // Export
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: pack and report, but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct InspectArgs {
    /// Binary state file
    input: PathBuf,
    /// Reject a skyline that breaks the ordering/coverage invariants
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Output format: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"])]
    format: String,
}

#[derive(Parser, Debug, Clone)]
struct BenchArgs {
    /// Number of random glyphs
    #[arg(long, default_value_t = 2000)]
    count: usize,
    /// Smallest glyph side
    #[arg(long, default_value_t = 4)]
    min_side: i32,
    /// Largest glyph side
    #[arg(long, default_value_t = 48)]
    max_side: i32,
    /// Atlas side length in pixels
    #[arg(long, default_value_t = 2048)]
    size: i32,
    #[arg(long, default_value_t = 1)]
    margin: i32,
    /// Sort order: height_desc|area_desc|max_side_desc|none
    #[arg(long, default_value = "height_desc")]
    sort_order: String,
    /// Fixed RNG seed for repeatable runs
    #[arg(long)]
    seed: Option<u64>,
}

/// One `pack` run: the final config and stats plus every glyph of the batch.
#[derive(Debug, Serialize)]
struct PackReport {
    config: AtlasConfig,
    placed: usize,
    total: usize,
    stats: AtlasStats,
    glyphs: Vec<GlyphRequest>,
}

#[derive(Debug, Serialize)]
struct InspectReport {
    state: AtlasState,
    stats: AtlasStats,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args),
        Commands::Inspect(args) => run_inspect(args),
        Commands::Bench(args) => run_bench(args),
    }
}

fn run_pack(cli: &PackArgs) -> anyhow::Result<()> {
    let base = AtlasConfig {
        size: cli.size,
        padding: cli.padding,
        margin: cli.margin,
        glyph_size: cli.glyph_size,
    };
    let mut sort_order = parse_sort_order(&cli.sort_order)?;
    let cfg = if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        if let Some(v) = &y.sort_order {
            sort_order = parse_sort_order(v).unwrap_or(sort_order);
        }
        y.into_atlas_config(base)
    } else {
        base
    };

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let mut atlas = match &cli.state {
        Some(path) => {
            let bytes = fs::read(path).with_context(|| format!("read state {}", path.display()))?;
            let atlas = AtlasPacker::decode(&bytes)
                .with_context(|| format!("decode state {}", path.display()))?;
            if *atlas.config() != cfg {
                warn!(
                    stored = ?atlas.config(),
                    requested = ?cfg,
                    "resuming with the stored atlas config; layout options ignored"
                );
            }
            info!(segments = atlas.segments().len(), "resumed atlas state");
            atlas
        }
        None => {
            if let Err(e) = cfg.validate() {
                warn!(error = %e, "atlas config leaves no room to pack");
            }
            AtlasPacker::new(cfg)
        }
    };

    let text = fs::read_to_string(&cli.input)
        .with_context(|| format!("read glyph list {}", cli.input.display()))?;
    let mut glyphs: Vec<GlyphRequest> = serde_json::from_str(&text)
        .with_context(|| format!("parse glyph list {}", cli.input.display()))?;
    info!(count = glyphs.len(), "loaded glyphs");

    sort_glyphs(&mut glyphs, sort_order);
    let start = Instant::now();
    let placed = atlas.pack_glyphs(&mut glyphs);
    let dur = start.elapsed();
    let stats = atlas.stats();
    info!(placed, total = glyphs.len(), time = %fmt_dur(dur), "packed");
    let stranded = stranded_count(&glyphs);
    if stranded > 0 {
        warn!(
            unplaced = stranded,
            "atlas is full; remaining glyphs were not placed"
        );
    }

    let report = PackReport {
        config: *atlas.config(),
        placed,
        total: glyphs.len(),
        stats,
        glyphs,
    };

    if cli.dry_run {
        println!("placed={}/{} {}", report.placed, report.total, stats.summary());
        return Ok(());
    }

    fs::write(&cli.output, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("write {}", cli.output.display()))?;
    info!(output = ?cli.output, "placements written");

    if let Some(path) = &cli.save_state {
        let mut file =
            fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
        atlas
            .write_to(&mut file)
            .with_context(|| format!("write state {}", path.display()))?;
        info!(state = ?path, bytes = atlas.encoded_len(), "state saved");
    }

    if let Some(path) = &cli.preview {
        render_preview(&atlas, &report.glyphs, path)?;
        info!(preview = ?path, "preview written");
    }
    Ok(())
}

fn run_inspect(cli: &InspectArgs) -> anyhow::Result<()> {
    let bytes = fs::read(&cli.input).with_context(|| format!("read {}", cli.input.display()))?;
    let atlas = if cli.strict {
        AtlasPacker::decode_strict(&bytes)
    } else {
        AtlasPacker::decode(&bytes)
    }
    .with_context(|| format!("decode {}", cli.input.display()))?;
    debug!(bytes = bytes.len(), "decoded state file");

    let report = InspectReport {
        state: atlas.snapshot(),
        stats: atlas.stats(),
    };
    match cli.format.as_str() {
        "yaml" => println!("{}", serde_yaml::to_string(&report)?),
        _ => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn run_bench(b: &BenchArgs) -> anyhow::Result<()> {
    if b.min_side < 1 || b.max_side < b.min_side {
        anyhow::bail!("invalid side range {}..={}", b.min_side, b.max_side);
    }
    let mut rng = match b.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut glyphs: Vec<GlyphRequest> = (0..b.count)
        .map(|i| {
            let w = rng.gen_range(b.min_side..=b.max_side);
            let h = rng.gen_range(b.min_side..=b.max_side);
            GlyphRequest::new(i as i32, w, h)
        })
        .collect();
    sort_glyphs(&mut glyphs, parse_sort_order(&b.sort_order)?);

    let cfg = AtlasConfig::builder().size(b.size).margin(b.margin).build();
    let mut atlas = AtlasPacker::new(cfg);
    let start = Instant::now();
    let placed = atlas.pack_glyphs(&mut glyphs);
    let dur = start.elapsed();
    let stats = atlas.stats();
    println!(
        "placed={}/{} segments={} fill={:.2}% time={}",
        placed,
        glyphs.len(),
        stats.num_segments,
        stats.fill_ratio * 100.0,
        fmt_dur(dur)
    );
    Ok(())
}

/// Glyphs with a real box that the batch left unplaced.
fn stranded_count(glyphs: &[GlyphRequest]) -> usize {
    glyphs
        .iter()
        .filter(|g| g.width > 0 && g.height > 0 && !g.is_placed())
        .count()
}

fn render_preview(atlas: &AtlasPacker, glyphs: &[GlyphRequest], path: &Path) -> anyhow::Result<()> {
    let cfg = atlas.config();
    let side = u32::try_from(cfg.size)
        .ok()
        .filter(|s| (1..=16384).contains(s))
        .with_context(|| format!("cannot render a {}px preview", cfg.size))?;
    let mut img = RgbaImage::from_pixel(side, side, Rgba([24, 24, 28, 255]));

    // Region above the skyline, top-down rows.
    for seg in atlas.segments() {
        fill_rect(&mut img, seg.x, 0, seg.width, seg.y, Rgba([56, 56, 64, 255]));
    }
    for g in glyphs.iter().filter(|g| g.is_placed()) {
        let top = cfg.size - (g.y + g.height);
        fill_rect(&mut img, g.x, top, g.width, g.height, glyph_color(g.index));
    }
    img.save(path)
        .with_context(|| format!("write preview {}", path.display()))?;
    Ok(())
}

fn fill_rect(img: &mut RgbaImage, x: i32, y: i32, w: i32, h: i32, color: Rgba<u8>) {
    let (iw, ih) = (img.width() as i64, img.height() as i64);
    let x0 = i64::from(x).clamp(0, iw);
    let y0 = i64::from(y).clamp(0, ih);
    let x1 = (i64::from(x) + i64::from(w)).clamp(0, iw);
    let y1 = (i64::from(y) + i64::from(h)).clamp(0, ih);
    for py in y0..y1 {
        for px in x0..x1 {
            img.put_pixel(px as u32, py as u32, color);
        }
    }
}

fn glyph_color(index: i32) -> Rgba<u8> {
    let h = (index as u32).wrapping_mul(2_654_435_761);
    Rgba([
        96 + (h & 0x7f) as u8,
        96 + ((h >> 8) & 0x7f) as u8,
        96 + ((h >> 16) & 0x7f) as u8,
        255,
    ])
}

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    size: Option<i32>,
    padding: Option<i32>,
    margin: Option<i32>,
    glyph_size: Option<i32>,
    sort_order: Option<String>,
}

impl YamlConfig {
    fn into_atlas_config(self, mut cfg: AtlasConfig) -> AtlasConfig {
        if let Some(v) = self.size {
            cfg.size = v;
        }
        if let Some(v) = self.padding {
            cfg.padding = v;
        }
        if let Some(v) = self.margin {
            cfg.margin = v;
        }
        if let Some(v) = self.glyph_size {
            cfg.glyph_size = v;
        }
        cfg
    }
}

fn parse_sort_order(s: &str) -> anyhow::Result<SortOrder> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown sort order: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fields_override_cli_values() {
        let y: YamlConfig = serde_yaml::from_str("size: 256\nmargin: 2\n").unwrap();
        let cfg = y.into_atlas_config(AtlasConfig::default());
        assert_eq!(cfg.size, 256);
        assert_eq!(cfg.margin, 2);
        assert_eq!(cfg.padding, AtlasConfig::default().padding);
    }

    #[test]
    fn sort_order_names_parse() {
        assert_eq!(parse_sort_order("area_desc").unwrap(), SortOrder::AreaDesc);
        assert!(parse_sort_order("name_asc").is_err());
    }

    #[test]
    fn skipped_empty_glyphs_are_not_stranded() {
        let mut atlas = AtlasPacker::new(AtlasConfig::builder().size(64).margin(1).build());
        let mut glyphs = vec![
            GlyphRequest::new(0, 8, 8),
            GlyphRequest::new(1, 0, 12),
            GlyphRequest::new(2, 5, 0),
        ];
        assert_eq!(atlas.pack_glyphs(&mut glyphs), 1);
        assert_eq!(stranded_count(&glyphs), 0);

        let mut overflow = vec![GlyphRequest::new(3, 100, 4), GlyphRequest::new(4, 0, 0)];
        atlas.pack_glyphs(&mut overflow);
        assert_eq!(stranded_count(&overflow), 1);
    }

    #[test]
    fn fill_rect_clips_to_image() {
        let mut img = RgbaImage::new(4, 4);
        fill_rect(&mut img, 2, -1, 10, 2, Rgba([255, 0, 0, 255]));
        assert_eq!(img.get_pixel(3, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(img.get_pixel(1, 0), &Rgba([0, 0, 0, 0]));
        assert_eq!(img.get_pixel(3, 1), &Rgba([0, 0, 0, 0]));
    }
}
