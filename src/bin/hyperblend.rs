use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "hyperblend", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite image files given on the command line.
    Composite(CompositeArgs),
    /// Run a JSON job file.
    Run(RunArgs),
    /// Print the flat-index <-> (channel, depth) mapping of a stack shape.
    Index(IndexArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BlendChoice {
    /// Maximum-intensity projection.
    Max,
    /// Saturating back-to-front alpha accumulation.
    LimitedAlpha,
    /// Single-layer fog approximation.
    Fog,
}

#[derive(Parser, Debug)]
struct CompositeArgs {
    /// Input images in depth-major order (c0z1, c1z1, ..., c0z2, ...).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Blend law.
    #[arg(long, value_enum, default_value_t = BlendChoice::Max)]
    blend: BlendChoice,

    /// Limited-alpha attenuation constant.
    #[arg(long, default_value_t = hyperblend::LIMITED_ALPHA_M)]
    m: f32,

    /// Fog strength.
    #[arg(long, default_value_t = hyperblend::FOG_STRENGTH)]
    fog: f32,

    /// Fog full-scale intensity.
    #[arg(long, default_value_t = hyperblend::FOG_MAX)]
    max: f32,

    /// Channels per depth (default 1, or 3 with --split-rgb).
    #[arg(long)]
    channels: Option<usize>,

    /// Depth count (default: slices / channels).
    #[arg(long)]
    depths: Option<usize>,

    /// Split every RGB input into three channels.
    #[arg(long, default_value_t = false)]
    split_rgb: bool,

    /// Parallelize within depth steps.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Output bit depth (8 or 16).
    #[arg(long, default_value_t = 8)]
    bit_depth: u8,

    /// Scale output so the brightest sample is full scale instead of clamping.
    #[arg(long, default_value_t = false)]
    normalize: bool,

    /// Write a 3-channel composite as a single RGB PNG.
    #[arg(long, default_value_t = false)]
    rgb_out: bool,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Job JSON file.
    #[arg(long)]
    job: PathBuf,
}

#[derive(Parser, Debug)]
struct IndexArgs {
    /// Channels per depth.
    #[arg(long)]
    channels: usize,

    /// Depth count.
    #[arg(long)]
    depths: usize,

    /// Only print the coordinate of this flat index.
    #[arg(long)]
    linear: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Composite(args) => cmd_composite(args),
        Command::Run(args) => cmd_run(args),
        Command::Index(args) => cmd_index(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_composite(args: CompositeArgs) -> anyhow::Result<()> {
    let kind = match args.blend {
        BlendChoice::Max => hyperblend::BlendKind::MaxIntensity,
        BlendChoice::LimitedAlpha => hyperblend::BlendKind::LimitedAlpha { m: args.m },
        BlendChoice::Fog => hyperblend::BlendKind::SimpleAlphaFog {
            fog: args.fog,
            max: args.max,
        },
    };
    // Non-finite flags must fail here; JSON would turn them into null.
    kind.compile()?;
    let blend = hyperblend::BlendSpec::from(kind);
    let job = hyperblend::CompositeJob {
        inputs: args.inputs,
        color: if args.split_rgb {
            hyperblend::ColorHandling::SplitRgb
        } else {
            hyperblend::ColorHandling::Luma
        },
        channels: args.channels,
        depths: args.depths,
        blend,
        parallel: args.parallel,
        threads: args.threads,
        output: args.out,
        quantize: hyperblend::QuantizeOpts {
            bit_depth: args.bit_depth,
            policy: if args.normalize {
                hyperblend::QuantizePolicy::Normalize
            } else {
                hyperblend::QuantizePolicy::Clamp
            },
            rgb: args.rgb_out,
        },
    };
    run_job(&job)
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let job = hyperblend::CompositeJob::from_path(&args.job)
        .with_context(|| format!("load job '{}'", args.job.display()))?;
    run_job(&job)
}

fn run_job(job: &hyperblend::CompositeJob) -> anyhow::Result<()> {
    let (result, written) = job.run(&mut hyperblend::TracingProgress)?;
    eprintln!(
        "composited {} channel(s) of {}x{} (max {})",
        result.channel_count(),
        result.dims().width,
        result.dims().height,
        result.max_value()
    );
    for path in written {
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_index(args: IndexArgs) -> anyhow::Result<()> {
    let shape = hyperblend::StackShape::new(args.channels, args.depths);
    let total = shape.slice_count()?;
    let indexer = hyperblend::StackIndexer::new(shape, total)?;
    match args.linear {
        Some(index) => println!("{index}\t{}", indexer.coord_of(index)?),
        None => {
            for index in 0..total {
                println!("{index}\t{}", indexer.coord_of(index)?);
            }
        }
    }
    Ok(())
}
