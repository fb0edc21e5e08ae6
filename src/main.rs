use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use thiserror::Error;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use trip_settle::csv::{CsvError, read_transactions, write_balances, write_settlements};
use trip_settle::{Balances, Settlement, TripLedgers, match_balances};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

/// Compute who pays whom to settle each trip of a ledger.
#[derive(Debug, Parser)]
#[command(name = "trip-settle")]
struct Args {
    /// Ledger csv (trip_id,payer,receiver,amount,type,is_deleted,description).
    path: PathBuf,
    /// Only use rows of this trip.
    #[arg(long)]
    trip: Option<String>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,
    /// Print net balances instead of settlements.
    #[arg(long)]
    balances: bool,
}

#[derive(Debug, Error)]
enum OutputError {
    #[error(transparent)]
    Csv(#[from] CsvError),
    #[error("failed to write json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if args.path.extension().is_none_or(|ext| ext != "csv") {
        warn!(path = %args.path.display(), "input file seems to not be a csv file");
    }

    let records = match read_transactions(args.path.clone()) {
        Ok(records) => records,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut trips = TripLedgers::new();
    let (tx_sender, tx_receiver) = tokio::sync::mpsc::channel(16);
    let trip = args.trip.clone();

    tokio::spawn(async move {
        for result in records {
            match result {
                Ok(raw) => {
                    if let Some(trip) = &trip {
                        if raw.trip_id.as_ref() != Some(trip) {
                            continue;
                        }
                    }
                    if tx_sender.send(raw).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    trips.run(ReceiverStream::new(tx_receiver)).await;

    if trips.unassigned() > 0 {
        warn!(rows = trips.unassigned(), "rows without a trip id were ignored");
    }

    match write_output(&args, &trips) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn write_output(args: &Args, trips: &TripLedgers) -> Result<(), OutputError> {
    let mut out = io::stdout().lock();

    if args.balances {
        let balances: BTreeMap<&str, &Balances> = trips
            .iter()
            .map(|(trip_id, ledger)| (trip_id, ledger.balances()))
            .collect();
        match args.format {
            Format::Csv => write_balances(&mut out, balances.iter().map(|(id, b)| (*id, *b)))?,
            Format::Json => {
                serde_json::to_writer_pretty(&mut out, &balances)?;
                writeln!(out)?;
            }
        }
    } else {
        let settlements: BTreeMap<&str, Vec<Settlement>> = trips
            .iter()
            .map(|(trip_id, ledger)| (trip_id, match_balances(ledger.balances())))
            .collect();
        match args.format {
            Format::Csv => write_settlements(
                &mut out,
                settlements.iter().map(|(id, s)| (*id, s.as_slice())),
            )?,
            Format::Json => {
                serde_json::to_writer_pretty(&mut out, &settlements)?;
                writeln!(out)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}
