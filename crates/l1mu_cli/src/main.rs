//! l1mu CLI
//!
//! Efficiency and rate studies over JSON-lines event dumps, plus preset
//! config export.

#[cfg(feature = "cli")]
mod input;
#[cfg(feature = "cli")]
mod summary;

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};
#[cfg(feature = "cli")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(feature = "cli")]
use l1mu_core::prelude::*;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "l1mu")]
#[command(about = "L1 displaced-muon trigger efficiency and rate studies", long_about = None)]
#[command(version = l1mu_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Signal dimuon efficiency per trigger definition
    Efficiency {
        /// Input JSON-lines event file
        #[arg(long)]
        events: PathBuf,

        /// Analysis config (.yaml/.yml/.json); efficiency preset if omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Stop after this many decoded events (overrides the config)
        #[arg(long)]
        max_events: Option<u64>,

        /// Process events on the rayon pool
        #[arg(long, default_value = "false")]
        parallel: bool,

        /// Output summary JSON file
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Zero-bias rate per seed
    Rate {
        /// Input JSON-lines event file
        #[arg(long)]
        events: PathBuf,

        /// Analysis config (.yaml/.yml/.json); rate preset if omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Stop after this many decoded events (overrides the config)
        #[arg(long)]
        max_events: Option<u64>,

        /// Output summary JSON file
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Write a preset config
    Config {
        #[arg(long, value_enum, default_value = "efficiency")]
        preset: Preset,

        /// Destination (.yaml/.yml/.json); YAML on stdout if omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Efficiency,
    Rate,
}

#[cfg(feature = "cli")]
impl Preset {
    fn config(self) -> AnalysisConfig {
        match self {
            Preset::Efficiency => AnalysisConfig::efficiency(),
            Preset::Rate => AnalysisConfig::rate(),
        }
    }
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Efficiency {
            events,
            config,
            max_events,
            parallel,
            out,
        } => {
            let config = load_config(config.as_deref(), Preset::Efficiency)?;
            let limit = max_events.or(config.run.max_events);
            let mut stream = input::open_events(&events)?;

            let analyzer = EfficiencyAnalyzer::new(config.clone());
            let counters = if parallel {
                // The rayon pool needs the batch in memory
                let take = limit.map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
                let records: Vec<EventRecord> = stream.by_ref().take(take).collect();
                run_events_parallel(&analyzer, &records)
            } else {
                run_events(&analyzer, stream.by_ref(), limit)
            };
            let stats = input::finish_events(stream, &events)?;
            let report = EfficiencyReport::from_counters(&counters, &config);

            println!("{report}");
            let summary = summary::Summary::new(analyzer.name(), &events, stats, &counters, &report);
            if let Some(path) = out {
                summary.save(&path)?;
            }
        }

        Commands::Rate {
            events,
            config,
            max_events,
            out,
        } => {
            let config = load_config(config.as_deref(), Preset::Rate)?;
            let limit = max_events.or(config.run.max_events);
            let mut stream = input::open_events(&events)?;

            let analyzer = RateAnalyzer::new(config.clone());
            let counters = run_events(&analyzer, stream.by_ref(), limit);
            let stats = input::finish_events(stream, &events)?;
            let report = RateReport::from_counters(&counters, &config);

            println!("{report}");
            let summary = summary::Summary::new(analyzer.name(), &events, stats, &counters, &report);
            if let Some(path) = out {
                summary.save(&path)?;
            }
        }

        Commands::Config { preset, out } => {
            let config = preset.config();
            match out {
                Some(path) => {
                    config
                        .save(&path)
                        .with_context(|| format!("Failed to write config: {}", path.display()))?;
                    println!("Config written to: {}", path.display());
                }
                None => print!("{}", serde_yaml::to_string(&config)?),
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn load_config(path: Option<&Path>, preset: Preset) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(preset.config()),
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("l1mu CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
