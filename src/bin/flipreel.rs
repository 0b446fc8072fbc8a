use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use flipreel::{
    CpuSurface, FrameCache, FrameIndex, FrameLoader, FsFetcher, Player, PlayerConfig, Renderer,
    SurfaceSize,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "flipreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Draw a single frame with its overlay and write it as a PNG.
    Frame(FrameArgs),
    /// Play the sequence headlessly and report playback stats.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct SourceArgs {
    /// Directory serving the static assets (frame directory and overlay sprite).
    #[arg(long)]
    root: PathBuf,

    /// Player config JSON. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Frame index (1-based).
    #[arg(long)]
    index: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Surface width; defaults to the configured base width.
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Surface height; defaults to the configured base height.
    #[arg(long, requires = "width")]
    height: Option<u32>,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Number of ticks to step, waiting for prefetch between ticks.
    #[arg(long, default_value_t = 150)]
    ticks: u32,

    /// Run the scheduled loop in real time for this many milliseconds instead of stepping.
    #[arg(long, conflicts_with = "ticks")]
    live_ms: Option<u64>,

    /// Scripted click `TICK:X,Y`, applied after the given tick. Repeatable.
    #[arg(long = "click", value_parser = parse_click)]
    clicks: Vec<ScriptedClick>,

    /// Write the final surface to this PNG.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug)]
struct ScriptedClick {
    after_tick: u32,
    x: f64,
    y: f64,
}

fn parse_click(s: &str) -> Result<ScriptedClick, String> {
    let (tick, xy) = s
        .split_once(':')
        .ok_or_else(|| format!("expected TICK:X,Y, got '{s}'"))?;
    let (x, y) = xy
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y after ':', got '{xy}'"))?;
    Ok(ScriptedClick {
        after_tick: tick.trim().parse().map_err(|e| format!("tick: {e}"))?,
        x: x.trim().parse().map_err(|e| format!("x: {e}"))?,
        y: y.trim().parse().map_err(|e| format!("y: {e}"))?,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args).await,
        Command::Play(args) => cmd_play(args).await,
    }
}

fn read_config(path: Option<&Path>) -> anyhow::Result<PlayerConfig> {
    let mut config = match path {
        Some(path) => PlayerConfig::from_json_file(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => PlayerConfig::default(),
    };
    config.apply_env_overrides();
    config.validate().context("validate config after env overrides")?;
    Ok(config)
}

fn make_loader(source: &SourceArgs, config: &PlayerConfig) -> FrameLoader {
    FrameLoader::from_config(Arc::new(FsFetcher::new(&source.root)), config)
}

async fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let config = read_config(args.source.config.as_deref())?;
    let loader = make_loader(&args.source, &config);
    let index = FrameIndex::new(args.index, config.total_frames)?;
    let size = match (args.width, args.height) {
        (Some(w), Some(h)) => SurfaceSize::new(w, h)?,
        _ => config.base_size(),
    };

    let frame = loader
        .load_frame(index)
        .await
        .with_context(|| format!("load frame {index}"))?;
    let overlay = match loader.load_overlay().await {
        Ok(img) => Some(img),
        Err(err) => {
            tracing::warn!(error = %err, "overlay unavailable, drawing frame only");
            None
        }
    };

    let mut cache = FrameCache::new();
    cache.put(index, frame);
    let mut surface = CpuSurface::new(size)?;
    let mut geometry = None;
    let outcome = Renderer::from_config(&config).draw_frame(
        index,
        &cache,
        overlay.as_ref(),
        Some(&mut surface),
        &mut geometry,
    );
    tracing::debug!(?outcome, ?geometry, "frame drawn");

    surface.write_png(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

async fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let config = read_config(args.source.config.as_deref())?;
    let base = config.base_size();
    let player = Player::new(config.clone(), make_loader(&args.source, &config))?;
    player.attach_surface(Box::new(CpuSurface::new(base)?));

    if let Some(ms) = args.live_ms {
        player.mount()?;
        tokio::time::sleep(Duration::from_millis(ms)).await;
        player.pause();
    } else {
        player.mount_stepped()?;
        player.settle().await;
        for tick in 1..=args.ticks {
            if player.tick_once().await.is_none() {
                tracing::info!(tick, "player paused, stepping stopped");
                break;
            }
            player.settle().await;
            for click in args.clicks.iter().filter(|c| c.after_tick == tick) {
                let toggled = player.click(click.x, click.y);
                tracing::info!(tick, x = click.x, y = click.y, toggled, "scripted click");
            }
        }
    }

    let stats = player.stats();
    println!(
        "{}",
        serde_json::to_string_pretty(&stats).context("serialize stats")?
    );

    if let Some(out) = &args.out {
        let (size, rgba) = player
            .snapshot_rgba8()
            .context("surface has no pixels to write")?;
        flipreel::render::surface::write_png(out, size, &rgba)?;
        eprintln!("wrote {}", out.display());
    }
    player.unmount();
    Ok(())
}
