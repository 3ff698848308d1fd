// Xenos Framebuffer Viewer - Main Entry Point
//
// Loads a tiled framebuffer dump and either shows it in a window or exports
// the detiled frame as PNG.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::{Path, PathBuf};
use xenos_fb::config::CONFIG_FILE;
use xenos_fb::display::run_viewer;
use xenos_fb::{
    save_png, ConversionStrategy, CpuConverter, FrameConverter, FrameGeometry, GpuConverter,
    LoadPolicy, Resolution, TiledFramebuffer, ViewerConfig,
};

/// xenos-fb - Xenos framebuffer dump viewer
#[derive(Parser, Debug)]
#[command(
    name = "xenos-fb",
    version,
    about = "Viewer for tiled Xbox 360 (Xenos) framebuffer dumps"
)]
struct Args {
    /// Tiled framebuffer dump to display (overrides the config file)
    #[arg(short, long)]
    dump: Option<PathBuf>,

    /// Path to config file, created with defaults if missing
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Console render resolution, e.g. 1280x720
    #[arg(long, value_name = "WxH")]
    internal: Option<Resolution>,

    /// Window resolution, e.g. 640x360
    #[arg(long, value_name = "WxH")]
    output: Option<Resolution>,

    /// Where conversion runs (cpu or gpu)
    #[arg(long)]
    strategy: Option<ConversionStrategy>,

    /// Show missing or short dumps over the fill color instead of failing
    #[arg(long)]
    best_effort: bool,

    /// Convert without opening a window and write the frame to this PNG
    #[arg(long, value_name = "PNG")]
    export: Option<PathBuf>,

    /// Replace the dump with a synthetic tiled test pattern
    #[arg(long)]
    test_pattern: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Apply command-line overrides on top of the file configuration
    fn apply(&self, config: &mut ViewerConfig) {
        if let Some(dump) = &self.dump {
            config.dump.path = dump.clone();
        }
        if let Some(internal) = self.internal {
            config.video.set_internal_resolution(internal);
        }
        if let Some(output) = self.output {
            config.video.set_output_resolution(output);
        }
        if let Some(strategy) = self.strategy {
            config.video.strategy = strategy;
        }
        if self.best_effort {
            config.dump.load_policy = LoadPolicy::BestEffort;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    info!("xenos-fb v{}", env!("CARGO_PKG_VERSION"));

    let mut config = ViewerConfig::load_or_default(&args.config);
    args.apply(&mut config);
    let geometry = config
        .geometry()
        .context("Invalid resolution settings")?;

    let source = config.dump.source(args.test_pattern);
    let tiled = source
        .load(&geometry)
        .with_context(|| format!("Failed to load {}", source))?;

    if let Some(path) = &args.export {
        return export(path, &config, &geometry, &tiled);
    }

    run_viewer(config, geometry, source, tiled).context("Viewer stopped with an error")?;

    info!("Viewer closed.");
    Ok(())
}

/// Convert one frame headlessly and write it as PNG
fn export(
    path: &Path,
    config: &ViewerConfig,
    geometry: &FrameGeometry,
    tiled: &TiledFramebuffer,
) -> Result<()> {
    let order = config.dump.channel_order;
    let force_opaque = config.dump.force_opaque;

    let mut converter: Box<dyn FrameConverter> = match config.video.strategy {
        ConversionStrategy::Cpu => Box::new(CpuConverter::new(order, force_opaque)),
        ConversionStrategy::Gpu => match GpuConverter::new(order, force_opaque) {
            Ok(converter) => Box::new(converter),
            Err(err) => {
                warn!("GPU unavailable ({}), converting on the CPU", err);
                Box::new(CpuConverter::new(order, force_opaque))
            }
        },
    };

    let frame = converter
        .convert(tiled, geometry)
        .context("Conversion failed")?;
    save_png(path, &frame).with_context(|| format!("Failed to write {}", path.display()))?;

    info!(
        "Exported {} frame to {} ({} conversion)",
        frame.resolution(),
        path.display(),
        converter.name()
    );
    Ok(())
}
