//! Yearshift CLI Tool
//!
//! Command-line interface for inspecting transition assets, warming them from
//! disk and simulating year navigation against headless video slots.

mod simulate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use yearshift_core::{AssetResolver, Direction, MediaFamily, SequencerConfig, Year};
use yearshift_preload::{FsAssetLoader, PreloadConfig, PreloadGate};

#[derive(Parser)]
#[command(name = "yearshift")]
#[command(about = "Yearshift - video-bridged year navigator toolkit")]
#[command(version)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum StepArg {
    Forward,
    Back,
}

impl From<StepArg> for Direction {
    fn from(arg: StepArg) -> Self {
        match arg {
            StepArg::Forward => Direction::Forward,
            StepArg::Back => Direction::Back,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show resolved transition clips and the preload manifest
    Assets {
        /// User agent to probe for the media family
        #[arg(long, default_value = "")]
        user_agent: String,

        /// Public asset prefix
        #[arg(long, default_value = AssetResolver::DEFAULT_BASE)]
        base: String,

        /// Sequencer config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Warm every manifest asset from a local public directory
    Preload {
        /// Directory that URLs are resolved against
        #[arg(long)]
        root: PathBuf,

        #[arg(long, default_value = "")]
        user_agent: String,

        #[arg(long, default_value = AssetResolver::DEFAULT_BASE)]
        base: String,

        /// Minimum splash time in milliseconds
        #[arg(long, default_value = "400")]
        min_display_ms: u64,

        /// Fade-out time in milliseconds
        #[arg(long, default_value = "400")]
        fade_ms: u64,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Drive the sequencer through simulated clips, printing visits as JSON lines
    Simulate {
        /// Jump to this year
        #[arg(long, conflicts_with = "step", required_unless_present = "step")]
        to: Option<u16>,

        /// Move one year in this direction
        #[arg(long, value_enum)]
        step: Option<StepArg>,

        /// Starting year (defaults to the configured initial year)
        #[arg(long)]
        from: Option<u16>,

        #[arg(long, default_value = "")]
        user_agent: String,

        /// Clip length in seconds
        #[arg(long, default_value = "2.0")]
        clip_secs: f64,

        /// Interval between time updates in seconds
        #[arg(long, default_value = "0.25")]
        tick_secs: f64,

        /// Report NaN as clip duration, as before metadata loads
        #[arg(long)]
        unknown_duration: bool,

        /// Refuse playback on both slots
        #[arg(long)]
        block_autoplay: bool,

        /// Freeze the clip at this position (seconds)
        #[arg(long)]
        stall_at: Option<f64>,

        /// Playback speed multiplier for the simulation clock
        #[arg(long, default_value = "1.0")]
        speed: f64,

        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Assets {
            user_agent,
            base,
            config,
        } => show_assets(&user_agent, base, config)?,

        Commands::Preload {
            root,
            user_agent,
            base,
            min_display_ms,
            fade_ms,
            config,
        } => {
            let timing = PreloadConfig {
                min_display: std::time::Duration::from_millis(min_display_ms),
                fade_out: std::time::Duration::from_millis(fade_ms),
            };
            preload(root, &user_agent, base, timing, config).await?
        }

        Commands::Simulate {
            to,
            step,
            from,
            user_agent,
            clip_secs,
            tick_secs,
            unknown_duration,
            block_autoplay,
            stall_at,
            speed,
            config,
        } => {
            let mut config = load_config(config)?;
            if let Some(from) = from {
                config.initial_year = Year(from);
            }
            let request = match (to, step) {
                (Some(year), _) => simulate::Request::Jump(Year(year)),
                (None, Some(step)) => simulate::Request::Step(step.into()),
                (None, None) => anyhow::bail!("either --to or --step is required"),
            };
            let clip = simulate::ClipProfile {
                duration: clip_secs,
                tick: tick_secs,
                known_duration: !unknown_duration,
                stall_at,
                speed,
            };
            let resolver = AssetResolver::for_user_agent(&user_agent);
            simulate::run(config, resolver, request, clip, block_autoplay).await?
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<SequencerConfig> {
    let Some(path) = path else {
        return Ok(SequencerConfig::default());
    };
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    SequencerConfig::from_json_str(&json).context("Invalid sequencer config")
}

fn resolver_for(user_agent: &str, base: String) -> AssetResolver {
    AssetResolver::new(base, MediaFamily::from_user_agent(user_agent))
}

fn show_assets(user_agent: &str, base: String, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config)?;
    let resolver = resolver_for(user_agent, base);

    println!("\n=== Environment ===");
    println!("Media family: {:?}", resolver.family());
    println!(
        "Years: {}..={} (initial {})",
        config.range.min(),
        config.range.max(),
        config.initial_year
    );

    println!("\n=== Transitions ===");
    for direction in Direction::ALL {
        println!(
            "  {:<8} {} (commit at {:.0}%)",
            direction,
            resolver.resolve_transition(direction),
            config.threshold(direction) * 100.0
        );
    }

    let manifest = resolver.preload_manifest(&config.range);
    println!("\n=== Preload manifest ({} assets) ===", manifest.len());
    for (i, (url, kind)) in manifest.entries().enumerate() {
        println!("  [{}] {:?} {}", i, kind, url);
    }

    Ok(())
}

async fn preload(
    root: PathBuf,
    user_agent: &str,
    base: String,
    timing: PreloadConfig,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config)?;
    let resolver = resolver_for(user_agent, base);
    let manifest = resolver.preload_manifest(&config.range);

    println!("Preloading {} assets from {}", manifest.len(), root.display());

    let gate = PreloadGate::new(FsAssetLoader::new(root), timing);
    let mut progress = gate.subscribe_progress();
    let run = gate.run(&manifest);
    tokio::pin!(run);

    let report = loop {
        tokio::select! {
            report = &mut run => break report,
            Ok(()) = progress.changed() => {
                let current = *progress.borrow_and_update();
                println!("  Preloading {}", current);
            }
        }
    };

    println!("{}", report);
    for url in &report.failed {
        println!("  failed: {}", url);
    }

    Ok(())
}
