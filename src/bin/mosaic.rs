use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "mosaic", version)]
struct Cli {
    /// Log filter level written to stderr (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn")]
    log: tracing::Level,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite the sources of a job into one image.
    Compose(ComposeArgs),
    /// Print the reconciled layout and per-source weighting of a job.
    Layout(LayoutArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Input job JSON.
    #[arg(long)]
    job: PathBuf,

    /// Output image path (format from extension).
    #[arg(long)]
    out: PathBuf,

    /// Compute tiles in parallel.
    #[arg(long)]
    parallel: bool,

    /// Worker thread count for parallel rendering.
    #[arg(long)]
    threads: Option<usize>,

    /// Square tile edge in pixels.
    #[arg(long)]
    tile: Option<u32>,
}

#[derive(Parser, Debug)]
struct LayoutArgs {
    /// Input job JSON.
    #[arg(long)]
    job: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Layout(args) => cmd_layout(args),
    }
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let mut job = mosaic::MosaicJob::load(&args.job)?;
    if args.parallel {
        job.threading.parallel = true;
    }
    if let Some(n) = args.threads {
        job.threading.threads = Some(n);
    }
    if let Some(edge) = args.tile {
        job.threading.tile_width = edge;
        job.threading.tile_height = edge;
    }

    let session = job.build_session()?;
    let mut sink = mosaic::RasterSink::for_session(&session)?;
    let report = mosaic::render(&session, &mut sink, &job.threading)?;
    if let Some(first) = report.failures.first() {
        anyhow::bail!(
            "{} of {} tiles failed; first at {:?}: {}",
            report.stats.tiles_failed,
            report.stats.tiles_total,
            first.tile,
            first.error
        );
    }

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    mosaic::save_raster(&sink.into_raster(), &args.out)?;

    eprintln!(
        "wrote {} ({} tiles, {} empty)",
        args.out.display(),
        report.stats.tiles_total,
        report.stats.tiles_empty
    );
    Ok(())
}

fn cmd_layout(args: LayoutArgs) -> anyhow::Result<()> {
    let job = mosaic::MosaicJob::load(&args.job)?;
    let session = job.build_session()?;
    let layout = session.layout();

    println!("bounds: {:?}", session.bounds());
    println!("layout: {} (rule {:?})", layout.layout, layout.rule);
    println!("mode: {:?}", session.mode());
    println!("dest_no_data: {:?}", session.dest_no_data());
    for (i, src) in session.sources().iter().enumerate() {
        println!(
            "source {i}: bounds={:?} strategy={} roi={} alpha={} no_data={}",
            src.bounds(),
            src.strategy().kind(),
            src.has_roi(),
            src.has_alpha(),
            src.has_no_data()
        );
    }
    Ok(())
}
