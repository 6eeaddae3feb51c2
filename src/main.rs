use clap::{Parser, Subcommand};
use resize_bench::report::ReportFormat;
use resize_bench::runner::{RunOptions, run_all};
use resize_bench::{config, corpus, logging, output, report, strategies};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "resize-bench")]
#[command(about = "Benchmark image thumbnailing strategies against each other")]
#[command(long_about = "\
Benchmark image thumbnailing strategies against each other

Every strategy available on this machine thumbnails the same JPEGs (the
first 10 by name in the directory). Strategies are then ranked by average
time per file, next to the average thumbnail size as a percentage of the
source.

Strategies:
  image_*                   Pure Rust, built in (marked * in the report)
  GraphicsMagick_thumbnail  needs `gm`
  ImageMagick_thumbnail     needs `convert`
  ImageMagick_resize        needs `convert`
  vipsthumbnail             needs `vipsthumbnail`
  djpeg_downsample          needs `djpeg` (libjpeg)

Thumbnails are written next to each source as <file>.thumb.<strategy>.jpg.

Set RESIZE_BENCH_LOG=resize_bench=debug for detailed diagnostics.
Run 'resize-bench gen-config' to generate a documented resize-bench.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: resize-bench.toml in the image directory, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every available strategy over a directory of JPEGs
    Run(RunArgs),
    /// List the strategies available on this machine
    List,
    /// Print a stock resize-bench.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Directory containing the source images
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Maximum number of files to benchmark
    #[arg(long)]
    limit: Option<usize>,

    /// Per-file time limit in seconds (0 = no limit)
    #[arg(long)]
    timeout: Option<u64>,

    /// Only print the final report
    #[arg(long, short)]
    quiet: bool,

    /// Run strategies concurrently
    #[arg(long)]
    parallel: bool,

    /// Only run these strategies (comma-separated)
    #[arg(long, value_delimiter = ',')]
    only: Vec<String>,

    /// Skip these strategies (comma-separated)
    #[arg(long, value_delimiter = ',')]
    skip: Vec<String>,

    /// Write thumbnails here instead of next to the sources
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Table)]
    format: ReportFormat,
}

impl RunArgs {
    /// Flags override whatever the config file says.
    fn apply(&self, config: &mut config::BenchConfig) {
        if let Some(limit) = self.limit {
            config.corpus.max_files = limit;
        }
        if let Some(secs) = self.timeout {
            config.runner.timeout_secs = secs;
        }
        if self.quiet {
            config.runner.verbose = false;
        }
        if self.parallel {
            config.runner.parallel_strategies = true;
        }
        if !self.only.is_empty() {
            config.strategies.only = self.only.clone();
        }
        config.strategies.disabled.extend(self.skip.iter().cloned());
        if let Some(dir) = &self.output_dir {
            config.runner.output_dir = Some(dir.clone());
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_tracing();

    match cli.command {
        Command::Run(args) => {
            let mut config = load_config(cli.config.as_deref(), &args.dir)?;
            args.apply(&mut config);
            config.validate()?;

            let corpus = corpus::scan_corpus(&args.dir, &config.corpus)?;
            if corpus.is_empty() {
                println!("no jpg files found in {}", args.dir.display());
                return Ok(());
            }

            let registry = strategies::build_registry(&config);
            if registry.is_empty() {
                println!("No strategies available");
                return Ok(());
            }

            if let Some(dir) = &config.runner.output_dir {
                std::fs::create_dir_all(dir)?;
            }
            if config.runner.parallel_strategies {
                init_thread_pool(&config.processing);
            }

            let show_progress = config.runner.verbose && args.format == ReportFormat::Table;
            let tagged = config.runner.parallel_strategies;
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    if show_progress {
                        output::print_run_event(&event, tagged);
                    }
                }
            });
            let stats = run_all(&registry, &corpus, &RunOptions::from_config(&config), Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;

            if show_progress {
                println!();
            }
            report::write_report(&mut std::io::stdout().lock(), stats, args.format)?;
        }
        Command::List => {
            let config = load_config(cli.config.as_deref(), Path::new("."))?;
            output::print_registry(&strategies::build_registry(&config));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// An explicit `--config` must exist; otherwise look next to the images.
fn load_config(
    explicit: Option<&Path>,
    dir: &Path,
) -> Result<config::BenchConfig, config::ConfigError> {
    match explicit {
        Some(path) => config::load_config_file(path),
        None => config::load_config(dir),
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. User can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
