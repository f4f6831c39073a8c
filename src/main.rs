use std::process::exit;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::level_filters::LevelFilter;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use nfl_transactions::config::Config;
use nfl_transactions::fetch::Fetcher;
use nfl_transactions::pipeline::{Pipeline, RunReport};
use nfl_transactions::sheets::{GoogleSheetsClient, SheetsWriter};

enum Command {
    Run(Option<NaiveDate>),
    Backfill(NaiveDate, NaiveDate)
}

#[tokio::main]
async fn main() -> Result<()> {
    //NOTE: Two subcommands and a date argument do not justify pulling in clap;
    //      the arguments are parsed by hand below.
    let command = parse_args();

    setup_logging(log_level_from_env());

    let config = Config::from_env();
    let fetcher = Fetcher::new()?;

    let writer = match &config.sheets {
        Some(sheets) => match GoogleSheetsClient::connect(sheets).await {
            Ok(client) => Some(SheetsWriter::new(client, sheets.worksheet.clone())),
            Err(error) => {
                warn!("google sheets unavailable, falling back to csv only: {error}");
                None
            }
        },
        None => None
    };

    let pipeline: Pipeline<Fetcher, GoogleSheetsClient> =
        Pipeline::new(fetcher, writer, config.data_dir.clone());

    match command {
        Command::Run(date) => {
            let report = pipeline.run(date).await?;
            print_summary(&report);
        }
        Command::Backfill(start, end) => {
            let total = pipeline.backfill(start, end).await?;
            println!("Backfill complete: {total} transactions found");
        }
    }

    Ok(())
}

fn parse_args() -> Command {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        None => Command::Run(None),
        Some("run") => match args.get(2) {
            None => Command::Run(None),
            Some(raw) => Command::Run(Some(parse_date(raw)))
        },
        Some("backfill") => match (args.get(2), args.get(3)) {
            (Some(start), Some(end)) => Command::Backfill(parse_date(start), parse_date(end)),
            _ => usage(&args[0])
        },
        Some(_) => usage(&args[0])
    }
}

fn parse_date(raw: &str) -> NaiveDate {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            eprintln!("Invalid date '{raw}', expected YYYY-MM-DD");
            exit(1);
        }
    }
}

fn usage(binary: &str) -> ! {
    eprintln!("Usage: {binary} [command]");
    eprintln!("  (no command)          run for today");
    eprintln!("  run [YYYY-MM-DD]      run for an explicit date");
    eprintln!("  backfill START END    re-run each day in the inclusive range");
    exit(1);
}

fn log_level_from_env() -> LevelFilter {
    match std::env::var("LOG_LEVEL") {
        Ok(level) => parse_log_level(&level),
        Err(_) => LevelFilter::INFO
    }
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'info'", level);
            LevelFilter::INFO
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: The summary report goes to stdout, so logging goes to stderr to keep the two separable
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

fn print_summary(report: &RunReport) {
    println!("\nNFL TRANSACTION SUMMARY");
    println!("Date: {}", report.date);
    println!("Total transactions found: {}", report.records.len());

    if report.records.is_empty() {
        return;
    }

    println!("\nTransaction types:");
    for (kind, count) in report.type_counts() {
        println!("  {kind}: {count}");
    }

    println!("\nMost active teams:");
    for (team, count) in report.team_counts().into_iter().take(5) {
        println!("  {team}: {count}");
    }

    if let Some(path) = &report.csv_path {
        println!("\nCSV backup: {}", path.display());
    }

    if let Some(summary) = report.sheet_summary {
        println!("Added to sheet: {}", summary.new);
        println!("Duplicates skipped: {}", summary.duplicate);
    }
}
