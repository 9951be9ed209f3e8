mod config;
mod extract;
mod harvest;
mod market;
mod models;
mod pipeline;
mod storage;
mod utils;

use anyhow::Result;
use chrono::{Local, Months, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;
use crate::pipeline::Pipeline;
use crate::storage::RecordStore;

#[derive(Parser)]
#[command(name = "ipo-miner", about = "IPO pricing harvester", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Mine monthly IPO pricings, newest month first, into the output file
    Mine {
        /// Output file (default: storage.output_path from config)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// From date (mm/dd/yyyy), default six months ago
        #[arg(short = 'f', long = "from", value_parser = parse_cli_date)]
        from_date: Option<NaiveDate>,

        /// To date (mm/dd/yyyy), default today
        #[arg(short = 't', long = "to", value_parser = parse_cli_date)]
        to_date: Option<NaiveDate>,
    },

    /// Summarise a mined output file
    Stats {
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Flatten a mined output file to CSV
    Export {
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// CSV file to write
        #[arg(long)]
        csv: PathBuf,
    },
}

fn parse_cli_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%m/%d/%Y").map_err(|e| format!("expected mm/dd/yyyy: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "ipo_miner=info,warn",
        1 => "ipo_miner=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load();

    match cli.command {
        Command::Mine {
            output,
            from_date,
            to_date,
        } => {
            let _t = utils::Timer::start("IPO mining");
            let output = output.unwrap_or_else(|| config.storage.output_path.clone());
            let today = Local::now().date_naive();
            let to = to_date.unwrap_or(today);
            let from = from_date
                .or_else(|| today.checked_sub_months(Months::new(6)))
                .unwrap_or(today);

            let stats = Pipeline::from_config(&config, &output)?.run(from, to).await?;
            info!(
                "Done: {} months, {} rows, {} new records ({} duplicates, {} without company data, {} without market data), {} total",
                stats.months_visited,
                stats.rows_seen,
                stats.records_appended,
                stats.duplicates_skipped,
                stats.detail_failures,
                stats.market_failures,
                stats.total_records,
            );
        }

        Command::Stats { output } => {
            let store = RecordStore::new(output.unwrap_or_else(|| config.storage.output_path.clone()));
            let records = store.try_load()?;
            let s = storage::summarize(&records);
            println!("─────────────────────────────────");
            println!("  IPO miner — {}", store.path().display());
            println!("─────────────────────────────────");
            println!("  Records       : {}", utils::fmt_number(s.records));
            println!("  With profile  : {}", utils::fmt_number(s.with_profile));
            println!("  With trades   : {}", utils::fmt_number(s.with_trade_data));
            println!("  Up on day one : {}", utils::fmt_number(s.positive_first_day));
            println!(
                "  Mean vs offer : {}",
                s.mean_ipo_change_pct
                    .map(|p| format!("{:+.2}%", p))
                    .unwrap_or("—".into())
            );
            println!("─────────────────────────────────");
        }

        Command::Export { output, csv } => {
            let _t = utils::Timer::start("CSV export");
            let store = RecordStore::new(output.unwrap_or_else(|| config.storage.output_path.clone()));
            let records = store.try_load()?;
            let n = storage::export_csv(&records, &csv)?;
            info!("Exported {} records to {:?}", n, csv);
        }
    }

    Ok(())
}
