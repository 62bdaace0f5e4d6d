use clap::{Parser, Subcommand};
use phototable::config::{self, PhotoTableConfig};
use phototable::imaging::RustDecoder;
use phototable::output::{self, RunSummary};
use phototable::runtime::Runtime;
use phototable::source::{
    AlbumSettings, Catalog, LocalCatalog, QueuedSource, SourcePlexor, StockCatalog,
};
use phototable::table::{Table, TableEvent};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Longest the run loop blocks when the table has nothing scheduled sooner.
const IDLE: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "phototable")]
#[command(about = "Ambient photo table: photos drop onto a surface and pile up")]
#[command(long_about = "\
Ambient photo table: photos drop onto a surface and pile up

Images are pulled from local album directories (or a generated stock set
when none are available), decoded to fit the surface, and tossed onto the
table at a random spot and angle. Old images fade out as new ones arrive.

Album ids are provider-prefixed: every subdirectory of a local root is an
album `local:<dir>`. When no album of a provider is enabled, all of its
albums are used.

Set RUST_LOG (e.g. RUST_LOG=phototable=debug) for detailed logs.

Run 'phototable gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Album settings file (overrides sources.settings_file)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the table headless and report what happens
    Run {
        #[arg(long, default_value_t = 1920)]
        width: u32,
        #[arg(long, default_value_t = 1080)]
        height: u32,
        /// Stop after this many seconds
        #[arg(long, default_value_t = 30)]
        seconds: u64,
        /// Seed for placement and queue shuffling (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List albums from every configured provider
    Albums,
    /// Enable an album by id
    Enable { id: String },
    /// Disable an album by id
    Disable { id: String },
    /// Validate the config and sources
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("phototable=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            width,
            height,
            seconds,
            seed,
        } => {
            let (config, settings) = load(&cli)?;
            let seed = seed.unwrap_or_else(rand::random);
            run(&config, &settings, width, height, Duration::from_secs(seconds), seed)?;
        }
        Command::Albums => {
            let (config, settings) = load(&cli)?;
            let plexor = build_plexor(&config, &settings, 0);
            output::print_albums(&plexor.albums()?, &settings);
        }
        Command::Enable { ref id } => {
            let (_, mut settings) = load(&cli)?;
            settings.set_album_enabled(id, true)?;
            println!("Enabled {id}");
        }
        Command::Disable { ref id } => {
            let (_, mut settings) = load(&cli)?;
            settings.set_album_enabled(id, false)?;
            println!("Disabled {id}");
        }
        Command::Check => {
            println!("==> Checking {}", cli.config.display());
            let (config, settings) = load(&cli)?;
            let plexor = build_plexor(&config, &settings, 0);
            output::print_check_output(&config, &plexor.albums()?);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config file and the album settings it points at.
fn load(cli: &Cli) -> Result<(PhotoTableConfig, AlbumSettings), Box<dyn std::error::Error>> {
    let config = config::load_config(&cli.config)?;
    let path = cli
        .settings
        .clone()
        .unwrap_or_else(|| config.sources.settings_file.clone());
    let settings = AlbumSettings::load(&path)?;
    Ok((config, settings))
}

/// Wire the configured providers into the façade.
fn build_plexor(config: &PhotoTableConfig, settings: &AlbumSettings, seed: u64) -> SourcePlexor {
    let sources = &config.sources;
    let mut plexor = SourcePlexor::new(RustDecoder::new());
    if !sources.local_roots.is_empty() {
        let local: Box<dyn Catalog> =
            Box::new(LocalCatalog::new(sources.local_roots.clone(), settings));
        plexor = plexor.with_local(QueuedSource::new(local, sources.queue_capacity, seed));
    }
    let stock: Box<dyn Catalog> = Box::new(StockCatalog::new(
        sources.stock_count,
        sources.stock_width,
        sources.stock_height,
    ));
    plexor.with_stock(QueuedSource::new(
        stock,
        sources.queue_capacity,
        seed.wrapping_add(1),
    ))
}

fn run(
    config: &PhotoTableConfig,
    settings: &AlbumSettings,
    width: u32,
    height: u32,
    duration: Duration,
    seed: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(width, height, seed, "starting table");
    let table = Table::new(config.table_options(), width, height, seed);
    let supplier = Arc::new(build_plexor(config, settings, seed));
    let threads = config::effective_threads(&config.processing);
    let mut runtime = Runtime::new(table, config.gesture_thresholds(), supplier, threads)?;

    let mut summary = RunSummary::default();
    runtime.start();
    while runtime.now() < duration {
        // Sleep until the next scheduled transition or an arriving load
        let wait = runtime
            .table()
            .next_deadline()
            .map_or(IDLE, |deadline| deadline.saturating_sub(runtime.now()).min(IDLE));
        runtime.wait(wait);
        if record(runtime.pump(), &mut summary) {
            break;
        }
    }

    println!();
    output::print_table(runtime.table());
    let report = runtime.shutdown();
    record(report.events, &mut summary);
    println!();
    output::print_run_summary(&summary);
    Ok(())
}

/// Print and tally `events`. Returns whether exit was requested.
fn record(events: Vec<TableEvent>, summary: &mut RunSummary) -> bool {
    let mut exit = false;
    for event in &events {
        summary.record(event);
        exit |= *event == TableEvent::ExitRequested;
        if let Some(line) = output::format_table_event(event) {
            println!("{line}");
        }
    }
    exit
}
