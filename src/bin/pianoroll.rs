use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use pianoroll::{
    CancelToken, DecodeDiagnostics, EventStream, FfmpegSink, FfmpegSinkOpts, FrameIndex,
    PngSequenceSink, RenderSession, RenderSessionOpts, RenderStats, Timeline, ViewConfig,
};

#[derive(Parser, Debug)]
#[command(name = "pianoroll", version, about = "Render MIDI files as piano-roll videos")]
struct Cli {
    /// Log debug detail to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an MP4 video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render every frame as a PNG sequence.
    Frames(FramesArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Print a JSON summary of a MIDI file.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Input Standard MIDI File.
    #[arg(long)]
    midi: PathBuf,

    /// View configuration JSON. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// Rasterize frames in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Frames swept per chunk (parallel mode only).
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,
}

impl PipelineArgs {
    fn opts(&self) -> RenderSessionOpts {
        RenderSessionOpts {
            parallel: self.parallel,
            threads: self.threads,
            chunk_size: self.chunk_size,
            ..RenderSessionOpts::default()
        }
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Fail instead of replacing an existing output.
    #[arg(long, default_value_t = false)]
    no_overwrite: bool,

    /// x264 constant rate factor.
    #[arg(long, default_value_t = pianoroll::encode::ffmpeg::DEFAULT_CRF)]
    crf: u8,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
struct FramesArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output directory for `%08d.png` frames.
    #[arg(long)]
    out_dir: PathBuf,

    /// Fail instead of replacing an existing directory.
    #[arg(long, default_value_t = false)]
    no_overwrite: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Input Standard MIDI File.
    #[arg(long)]
    midi: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frames(args) => cmd_frames(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn load_timeline(midi: &Path) -> anyhow::Result<(Timeline, DecodeDiagnostics)> {
    let stream = EventStream::from_path(midi)?;
    let decoded = pianoroll::decode(&stream)
        .with_context(|| format!("decode '{}'", midi.display()))?;
    Ok(decoded.into_timeline())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ViewConfig> {
    let config = match path {
        Some(path) => ViewConfig::from_path(path)?,
        None => ViewConfig::from_def(&pianoroll::ViewConfigDef::default())?,
    };
    Ok(config)
}

fn report(stats: &RenderStats, out: &Path) {
    eprintln!(
        "wrote {} ({} frames, {} notes drawn)",
        out.display(),
        stats.frames_rendered,
        stats.notes_drawn
    );
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (timeline, _diagnostics) = load_timeline(&args.input.midi)?;
    let config = load_config(args.input.config.as_deref())?;
    let session = RenderSession::new(&timeline, &config, args.pipeline.opts())?;

    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        out_path: args.out.clone(),
        overwrite: !args.no_overwrite,
        crf: args.crf,
    });
    let stats = session.render(&mut sink, &CancelToken::new())?;
    report(&stats, &args.out);
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let (timeline, _diagnostics) = load_timeline(&args.input.midi)?;
    let config = load_config(args.input.config.as_deref())?;
    let session = RenderSession::new(&timeline, &config, args.pipeline.opts())?;

    let mut sink = PngSequenceSink::new(&args.out_dir);
    if args.no_overwrite {
        sink = sink.no_overwrite();
    }
    let stats = session.render(&mut sink, &CancelToken::new())?;
    report(&stats, &args.out_dir);
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (timeline, _diagnostics) = load_timeline(&args.input.midi)?;
    let config = load_config(args.input.config.as_deref())?;
    let session = RenderSession::new(&timeline, &config, RenderSessionOpts::default())?;

    let frame = session.render_frame(FrameIndex(args.frame))?;
    pianoroll::save_png(&args.out, &frame)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

#[derive(serde::Serialize)]
struct Summary<'a> {
    resolution: u16,
    tempo_bpm: f64,
    tempo_events: u32,
    lanes: usize,
    notes: usize,
    pitch_min: Option<u8>,
    pitch_max: Option<u8>,
    last_end_time: Option<f64>,
    unmatched_note_offs: usize,
    unfinished_notes: usize,
    diagnostics: &'a DecodeDiagnostics,
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let (timeline, diagnostics) = load_timeline(&args.midi)?;
    let tempo = timeline.tempo();
    let range = timeline.pitch_range();
    let summary = Summary {
        resolution: tempo.resolution,
        tempo_bpm: tempo.tempo_bpm,
        tempo_events: tempo.tempo_events,
        lanes: timeline.lanes().len(),
        notes: timeline.note_count(),
        pitch_min: range.map(|(lo, _)| lo),
        pitch_max: range.map(|(_, hi)| hi),
        last_end_time: timeline.max_end_time(),
        unmatched_note_offs: diagnostics.unmatched_note_offs(),
        unfinished_notes: diagnostics.unfinished_notes(),
        diagnostics: &diagnostics,
    };
    let json = serde_json::to_string_pretty(&summary).context("serialize summary")?;
    println!("{json}");
    Ok(())
}
