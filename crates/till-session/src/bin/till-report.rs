//! # Sales Report Exporter
//!
//! Prints the sales report for a period as JSON.
//!
//! ## Usage
//! ```bash
//! # Month to date (store's local date)
//! cargo run -p till-session --bin till-report
//!
//! # Explicit period, inclusive
//! cargo run -p till-session --bin till-report -- --from 2026-03-01 --to 2026-03-31
//!
//! # Another database
//! cargo run -p till-session --bin till-report -- --db ./till_dev.db
//! ```
//!
//! On failure the error is printed as `{"code": ..., "message": ...}` on
//! stderr and the exit status is 1.

use chrono::{NaiveDate, Utc};
use std::env;
use std::process::ExitCode;
use tracing::info;

use till_core::{ReportPeriod, StoreError};
use till_db::{Database, DbConfig};
use till_session::{init_tracing, sales_report, ErrorResponse, SessionConfig, SessionError};

#[derive(Debug, Default)]
struct Args {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    db: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => return ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::from(2);
        }
    };

    match run(args).await {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let body = ErrorResponse::from(&err);
            match serde_json::to_string(&body) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}", err),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<String, SessionError> {
    let mut config = SessionConfig::from_env();
    if let Some(db) = args.db {
        config.db_path = db.into();
    }

    let today = config.local_date(Utc::now());
    let period = match (args.from, args.to) {
        (None, None) => ReportPeriod::new(ReportPeriod::current_month(today).inicio, today),
        (Some(from), None) => ReportPeriod::new(from, today),
        (None, Some(to)) => ReportPeriod::new(ReportPeriod::current_month(to).inicio, to),
        (Some(from), Some(to)) => ReportPeriod::new(from, to),
    };

    info!(
        store = %config.store_name,
        db = %config.db_path.display(),
        inicio = %period.inicio,
        fim = %period.fim,
        "Building sales report"
    );

    let db = Database::new(DbConfig::new(config.db_path.clone()))
        .await
        .map_err(StoreError::from)?;

    let report = sales_report(&db.sales(), period, config.utc_offset()).await;
    db.close().await;

    let json = serde_json::to_string_pretty(&report?).map_err(StoreError::from)?;
    Ok(json)
}

/// `Ok(None)` when help was printed.
fn parse_args() -> Result<Option<Args>, String> {
    let argv: Vec<String> = env::args().skip(1).collect();
    let mut args = Args::default();

    let mut i = 0;
    while i < argv.len() {
        let flag = argv[i].as_str();
        match flag {
            "--from" | "--to" | "--db" | "-d" => {
                let value = argv
                    .get(i + 1)
                    .ok_or_else(|| format!("{} needs a value", flag))?;
                match flag {
                    "--from" => args.from = Some(parse_date(value)?),
                    "--to" => args.to = Some(parse_date(value)?),
                    _ => args.db = Some(value.clone()),
                }
                i += 1;
            }
            "--help" | "-h" => {
                println!("Till POS Sales Report");
                println!();
                println!("Usage: till-report [OPTIONS]");
                println!();
                println!("Options:");
                println!("      --from <YYYY-MM-DD>  First day (default: first day of month)");
                println!("      --to <YYYY-MM-DD>    Last day, inclusive (default: today)");
                println!("  -d, --db <PATH>          Database file (default: TILL_DB_PATH)");
                println!("  -h, --help               Show this help message");
                return Ok(None);
            }
            other => return Err(format!("Unknown argument: {}", other)),
        }
        i += 1;
    }

    if let (Some(from), Some(to)) = (args.from, args.to) {
        if from > to {
            return Err(format!("--from {} is after --to {}", from, to));
        }
    }

    Ok(Some(args))
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {}", value, e))
}
