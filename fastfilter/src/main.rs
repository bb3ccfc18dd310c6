//! fastfilter command line entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fastfilter::config::{CliArgs, Command, load_config, parse_values};
use fastfilter::{DecodedSet, FilterFactory, FilterMetrics, Result, Searcher, decode_terms, encode_terms};

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Encode { values } => {
            let set = DecodedSet::from_values(parse_values(&values)?);
            tracing::info!(
                "Encoded {} values into {} containers",
                set.len(),
                set.container_count()
            );
            println!("{}", encode_terms(&set));
        }
        Command::Decode { terms, limit } => {
            let set = decode_terms(&terms)?;
            println!("cardinality: {}", set.len());
            println!(
                "containers: {} ({} run)",
                set.container_count(),
                set.run_container_count()
            );
            for value in set.iter().take(limit) {
                println!("{}", value);
            }
            if set.len() > limit as u64 {
                println!("... {} more", set.len() - limit as u64);
            }
        }
        Command::Run {
            config,
            parallel,
            metrics,
        } => {
            let run_config = load_config(&config)?;
            tracing::info!("Loaded run config from {}", config);

            let factory = FilterFactory::new(&run_config.params)?;
            let segments = run_config.build_segments();
            let filter_metrics = Arc::new(FilterMetrics::new());
            let searcher = Searcher::new(&factory).with_metrics(Arc::clone(&filter_metrics));

            let hits = if parallel {
                searcher.search_parallel(&segments)?
            } else {
                searcher.search(&segments)?
            };
            for hit in &hits {
                println!("{}", hit);
            }
            tracing::info!(
                "{} documents passed across {} segments",
                hits.len(),
                segments.len()
            );
            if metrics {
                print!("{}", filter_metrics.encode());
            }
        }
    }
    Ok(())
}
