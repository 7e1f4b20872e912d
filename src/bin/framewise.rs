use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use framewise::{
    Engine, EngineConfig, Fps, FrameIndex, FrameRange, JsonLinesSink, RenderThreading, Scene,
};

#[derive(Parser, Debug)]
#[command(name = "framewise", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a single frame and print it as JSON.
    Frame(FrameArgs),
    /// Evaluate a frame range into a JSON-lines file.
    Render(RenderArgs),
    /// Parse and validate a scene without evaluating it.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct TimelineArgs {
    /// Input scene JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Override the frame rate (`30` or `30000/1001`).
    #[arg(long, value_parser = parse_fps)]
    fps: Option<Fps>,

    /// Override the total frame count.
    #[arg(long)]
    frames: Option<u64>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    timeline: TimelineArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    timeline: TimelineArgs,

    /// Output JSON-lines path.
    #[arg(long)]
    out: PathBuf,

    /// First frame (inclusive). Defaults to 0.
    #[arg(long)]
    start: Option<u64>,

    /// Last frame (exclusive). Defaults to the total frame count.
    #[arg(long)]
    end: Option<u64>,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Evaluation chunk size.
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input scene JSON.
    #[arg(long)]
    scene: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn parse_fps(s: &str) -> Result<Fps, String> {
    let (num, den) = match s.split_once('/') {
        Some((n, d)) => (n.trim(), d.trim()),
        None => (s.trim(), "1"),
    };
    let num: u32 = num.parse().map_err(|e| format!("invalid fps numerator: {e}"))?;
    let den: u32 = den.parse().map_err(|e| format!("invalid fps denominator: {e}"))?;
    Fps::new(num, den).map_err(|e| e.to_string())
}

fn load_engine(args: &TimelineArgs) -> anyhow::Result<Engine> {
    let scene = Scene::from_path(&args.scene)
        .with_context(|| format!("load scene '{}'", args.scene.display()))?;
    let mut config = scene.config().copied().unwrap_or_default();
    if let Some(fps) = args.fps {
        config.fps = fps;
    }
    if let Some(frames) = args.frames {
        config.total_frames = frames;
    }
    let config = EngineConfig::new(config.fps, config.total_frames)?;
    Ok(Engine::from_scene(scene)?.with_config(config)?)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let engine = load_engine(&args.timeline)?;
    let state = engine
        .render_frame(FrameIndex(args.frame))
        .with_context(|| format!("evaluate frame {}", args.frame))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &state).context("write frame JSON")?;
    writeln!(out)?;
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let engine = load_engine(&args.timeline)?;
    let total = engine.config().total_frames;
    let range = FrameRange::new(
        FrameIndex(args.start.unwrap_or(0)),
        FrameIndex(args.end.unwrap_or(total)),
    )?;
    let threading = RenderThreading {
        parallel: args.parallel,
        chunk_size: args.chunk_size,
        threads: args.threads,
    };

    let f = File::create(&args.out)
        .with_context(|| format!("create output '{}'", args.out.display()))?;
    let mut sink = JsonLinesSink::new(BufWriter::new(f));
    let stats = engine
        .render_to_sink(range, &threading, &mut sink)
        .context("render frames")?;

    eprintln!(
        "wrote {} frames ({} layers, {} empty frames) to {}",
        stats.frames_total,
        stats.layers_total,
        stats.frames_empty,
        args.out.display()
    );
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let scene = Scene::from_path(&args.scene)
        .with_context(|| format!("validate scene '{}'", args.scene.display()))?;
    let tree = scene.tree();
    let layers: usize = tree.iter().map(|(_, w)| w.layers.len()).sum();
    println!("ok: {} windows, {} layers", tree.len(), layers);
    Ok(())
}
