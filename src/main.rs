//! Flo Warp CLI - Inspect `.flo` files and warp images with them.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};

use flo_warp::{
    compute::FlowStats,
    format::{FlowError, read_flow_file},
    imaging::{ImageIoError, load_rgb, save_rgb},
    pipeline::{FlowObserver, PipelineError, StatsLogObserver, TextDumpObserver, WarpPipeline},
    schema::WarpConfig,
};

#[derive(Parser, Debug)]
#[command(name = "flo-warp", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Warp an image by a flow field and save the result.
    Warp(WarpArgs),
    /// Print dimensions and statistics of a flow file.
    Info {
        /// Input .flo file.
        flow: PathBuf,
    },
    /// Append the u and v planes of a flow file to two text files.
    Dump(DumpArgs),
    /// Print an example warp configuration.
    ExampleConfig,
}

#[derive(Parser, Debug)]
struct WarpArgs {
    /// Input .flo file.
    #[arg(long)]
    flow: PathBuf,

    /// Image to sample from.
    #[arg(long)]
    source: PathBuf,

    /// Output image path.
    #[arg(long)]
    out: PathBuf,

    /// Warp configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Warp rows on the current thread only.
    #[arg(long)]
    sequential: bool,
}

#[derive(Parser, Debug)]
struct DumpArgs {
    /// Input .flo file.
    flow: PathBuf,

    /// File receiving the u plane.
    #[arg(long, default_value = "x.txt")]
    x: PathBuf,

    /// File receiving the v plane.
    #[arg(long, default_value = "y.txt")]
    y: PathBuf,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Flow(#[from] FlowError),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("{0}")]
    Image(#[from] ImageIoError),

    #[error("Error reading config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Error parsing config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Error writing flow dump: {0}")]
    Dump(#[source] std::io::Error),
}

impl CliError {
    /// Short classification printed next to the message.
    fn label(&self) -> String {
        match self {
            CliError::Flow(e) | CliError::Pipeline(PipelineError::Flow(e)) => {
                format!("{:?}", e.kind())
            }
            CliError::Pipeline(PipelineError::Config(_)) => "Config".to_string(),
            CliError::Pipeline(_) => "Pipeline".to_string(),
            CliError::Image(_) => "Image".to_string(),
            CliError::ConfigRead { .. } | CliError::ConfigParse(_) => "Config".to_string(),
            CliError::Dump(_) => "Dump".to_string(),
        }
    }

    /// Line printed on stderr before exiting with a failure status.
    fn report(&self) -> String {
        format!("error [{}]: {}", self.label(), self)
    }
}

fn main() -> ExitCode {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.cmd {
        Command::Warp(args) => cmd_warp(args),
        Command::Info { flow } => cmd_info(flow),
        Command::Dump(args) => cmd_dump(args),
        Command::ExampleConfig => cmd_example_config(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.report());
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<WarpConfig, CliError> {
    let Some(path) = path else {
        return Ok(WarpConfig::default());
    };
    let config_str = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.clone(),
        source,
    })?;
    Ok(serde_json::from_str(&config_str)?)
}

fn cmd_warp(args: WarpArgs) -> Result<(), CliError> {
    let mut config = load_config(args.config.as_ref())?;
    if args.sequential {
        config.parallel = false;
    }

    let mut pipeline = WarpPipeline::new(config)?.with_observer(Box::new(StatsLogObserver));

    let source = load_rgb(&args.source)?;
    log::info!("loaded {}", args.source.display());

    let start = Instant::now();
    let flow = pipeline.load_flow(&args.flow)?;
    let output = pipeline.warp(&flow, &source)?;
    log::info!("warp finished in {:.3}s", start.elapsed().as_secs_f32());

    save_rgb(&output, &args.out)?;
    println!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_info(path: PathBuf) -> Result<(), CliError> {
    let flow = read_flow_file(&path)?;
    let stats = FlowStats::compute(&flow);

    println!("{}", path.display());
    println!("  Size: {}x{} (2 bands)", flow.width(), flow.height());
    println!("  Known vectors: {}", stats.known_count);
    println!("  Unknown vectors: {}", stats.unknown_count);
    println!("  Mean magnitude: {:.6}", stats.mean_magnitude);
    println!("  Max magnitude: {:.6}", stats.max_magnitude);
    Ok(())
}

fn cmd_dump(args: DumpArgs) -> Result<(), CliError> {
    let flow = read_flow_file(&args.flow)?;
    TextDumpObserver::new(&args.x, &args.y)
        .on_flow(&flow)
        .map_err(CliError::Dump)?;

    println!(
        "dumped {}x{} flow to {} and {}",
        flow.width(),
        flow.height(),
        args.x.display(),
        args.y.display()
    );
    Ok(())
}

fn cmd_example_config() -> Result<(), CliError> {
    let config = WarpConfig::default();
    println!("Example configuration (config.json):");
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
