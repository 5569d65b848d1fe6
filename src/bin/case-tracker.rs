//! Command-line front end: `case-tracker prices` and `case-tracker events`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use steam_case_tracker::{config, CaseTracker};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info,steam_case_tracker=debug";

#[derive(Parser)]
#[command(name = "case-tracker")]
#[command(about = "Collect weapon case price history and S-Tier tournament dates")]
struct Cli {
    /// Directory output files are written to
    #[arg(long, global = true, default_value = ".")]
    output_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape price history for every listing on the given search pages
    Prices {
        /// Search page URL (repeatable); defaults to the weapon case pages
        #[arg(long = "page")]
        pages: Vec<String>,

        /// Output CSV (defaults to a timestamped name)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Scrape the S-Tier tournament calendar
    Events {
        #[arg(long, default_value = config::EVENTS_URL)]
        url: String,

        /// Output CSV (defaults to a timestamped name)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> steam_case_tracker::Result<()> {
    let tracker = CaseTracker::builder().output_dir(&cli.output_dir).build()?;
    tracing::info!("{}", tracker);

    match cli.command {
        Commands::Prices { pages, output } => {
            let pages = if pages.is_empty() {
                config::default_catalog_pages()
            } else {
                pages
            };
            let summary = tracker.collect_prices(&pages, output.as_deref())?;
            match &summary.output {
                Some(path) => tracing::info!(
                    records = summary.records,
                    scraped = summary.entries_scraped,
                    of = summary.entries_found,
                    path = %path.display(),
                    "price data saved"
                ),
                None => tracing::info!("no price data collected"),
            }
            for skipped in &summary.skipped {
                tracing::info!(item = skipped.name.as_str(), reason = skipped.reason.as_str(), "skipped");
            }
        }
        Commands::Events { url, output } => {
            let summary = tracker.collect_events(&url, output.as_deref())?;
            for (idx, e) in summary.events.iter().enumerate() {
                tracing::info!(
                    "{}. {} | {} to {} | prize {} | {}",
                    idx + 1,
                    e.tournament_name,
                    e.start_date,
                    e.end_date,
                    e.prize_pool,
                    e.location
                );
            }
            if summary.events.is_empty() {
                tracing::info!("no tournaments found; the page structure may have changed");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_verbose_for_this_crate() {
        let filter = tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).unwrap();
        assert!(filter.to_string().contains("steam_case_tracker=debug"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
