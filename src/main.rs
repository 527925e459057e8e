use anyhow::{Context, Result};
use clap::Parser;
use freddy::config::Config;
use freddy::media::{check_ffmpeg, check_ffprobe, ScratchDir};
use freddy::pipeline::{print_summary, Collaborators, Pipeline};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "freddy")]
#[command(version, about = "Turn a text story into a narrated video")]
#[command(long_about = "Freddy generates a narrated film from a text story. \
Each phrase is spoken with espeak over a matching clip retrieved from Giphy.

Example usage:

  GIPHY_API_KEY=XXX freddy -i stories/jack_and_jill.txt out.mp4")]
struct Cli {
    /// Input text file of the story or script
    #[arg(short, long)]
    input_file: PathBuf,

    /// Output video file
    #[arg(value_name = "OUTPUT_FILE")]
    output_file: PathBuf,

    /// Cache directory for intermediate files [default: .freddy_cache]
    #[arg(short, long)]
    cache_dir: Option<PathBuf>,

    /// Remove the cache directory after a successful run
    #[arg(long)]
    clean: bool,

    /// espeak voice (e.g. en-us)
    #[arg(long)]
    voice: Option<String>,

    /// Side of the square output frame in pixels
    #[arg(long)]
    size: Option<u32>,

    /// Caption font size
    #[arg(long)]
    font_size: Option<u32>,

    /// Speaking rate in words per minute
    #[arg(long)]
    speed: Option<u32>,

    /// Giphy content rating (g, pg, pg-13, r)
    #[arg(long)]
    rating: Option<String>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(ref dir) = cli.cache_dir {
        config.cache_dir = dir.clone();
    }
    if let Some(ref voice) = cli.voice {
        config.voice = Some(voice.clone());
    }
    if let Some(size) = cli.size {
        config.frame_size = size;
    }
    if let Some(font_size) = cli.font_size {
        config.font_size = font_size;
    }
    if let Some(speed) = cli.speed {
        config.speed = Some(speed);
    }
    if let Some(ref rating) = cli.rating {
        config.rating = rating.clone();
    }
}

/// Absolute form of `path`, resolving symlinks of the longest existing prefix.
fn resolve_path(path: &Path) -> std::io::Result<PathBuf> {
    if let Ok(resolved) = path.canonicalize() {
        return Ok(resolved);
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => Ok(resolve_path(parent)?.join(name)),
        _ => Ok(absolute),
    }
}

/// The cache is wiped on every run, so neither the story nor the film may live in it.
fn ensure_outside_cache(cache_dir: &Path, input: &Path, output: &Path) -> Result<()> {
    let cache = resolve_path(cache_dir)
        .with_context(|| format!("Failed to resolve cache directory {}", cache_dir.display()))?;

    for (role, path) in [("Input file", input), ("Output file", output)] {
        let resolved = resolve_path(path)
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        if resolved.starts_with(&cache) {
            anyhow::bail!(
                "{role} {} is inside the cache directory {}, which is emptied on every run",
                path.display(),
                cache_dir.display()
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if !cli.input_file.exists() {
        anyhow::bail!("Input file not found: {}", cli.input_file.display());
    }

    let mut config = Config::load().context("Failed to load configuration")?;
    apply_overrides(&mut config, &cli);
    config.validate().context("Configuration validation failed")?;

    check_ffmpeg().context("FFmpeg is required")?;
    check_ffprobe().context("FFprobe is required")?;

    info!("Input:   {}", cli.input_file.display());
    info!("Output:  {}", cli.output_file.display());
    info!("Cache:   {}", config.cache_dir.display());

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        ctrlc::set_handler(move || {
            warn!("Interrupt received, stopping after the current step");
            cancelled.store(true, Ordering::Relaxed);
        })
        .context("Failed to install Ctrl+C handler")?;
    }

    ensure_outside_cache(&config.cache_dir, &cli.input_file, &cli.output_file)?;

    // Every run starts from an empty cache
    let scratch = ScratchDir::persistent(&config.cache_dir, true)
        .with_context(|| format!("Failed to prepare cache directory {}", config.cache_dir.display()))?;

    let collaborators = Collaborators::from_config(&config)?;
    let pipeline = Pipeline::new(collaborators, scratch)
        .with_progress(!cli.no_progress)
        .with_cancel_flag(cancelled);

    let result = pipeline
        .render_file(&cli.input_file, &cli.output_file)
        .await
        .context("Failed to render story")?;

    print_summary(&result);

    if cli.clean {
        let dir = pipeline.scratch().path().to_path_buf();
        drop(pipeline);
        std::fs::remove_dir_all(&dir)
            .with_context(|| format!("Failed to remove cache directory {}", dir.display()))?;
        info!("Removed cache directory {}", dir.display());
    }

    Ok(())
}
