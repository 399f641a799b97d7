use anyhow::Context;
use api_client::{Interval, PriceProvider, PriceRequest, YahooClient};
use backtester::BacktestEngine;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::Config;
use core_types::{Frame, ReturnSeries, WeightPolicy};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The main entry point for the Exante backtest tool.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; it only carries optional overrides.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = configuration::load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let _log_guard = configuration::init_logging(&config.logging)?;

    // Execute the appropriate command
    let result = match cli.command {
        Commands::Fetch(args) => handle_fetch(args, &config).await,
        Commands::Run(args) => handle_run(args, &config),
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed.");
    }
    result
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Look-ahead-free portfolio return engine.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file (optional).
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download close prices and write them as a split-JSON frame.
    Fetch(FetchArgs),
    /// Validate a price/weight pair and compute portfolio returns.
    Run(RunArgs),
}

#[derive(Parser)]
struct FetchArgs {
    /// Comma separated ticker symbols (e.g., "SPY,TLT,GLD").
    #[arg(long, value_delimiter = ',', required = true)]
    tickers: Vec<String>,

    /// The first date to load (format: YYYY-MM-DD, inclusive).
    #[arg(long)]
    from: NaiveDate,

    /// The last date to load (format: YYYY-MM-DD, exclusive).
    #[arg(long)]
    to: NaiveDate,

    /// Sampling interval (e.g., "1d", "1wk"). Defaults to `provider.interval`.
    #[arg(long)]
    interval: Option<Interval>,

    /// Use raw closes instead of dividend/split adjusted closes.
    #[arg(long)]
    raw: bool,

    /// Destination file. Writes to stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Parser)]
struct RunArgs {
    /// Price matrix in split-JSON layout.
    #[arg(long)]
    prices: PathBuf,

    /// Weight matrix in split-JSON layout, same index and columns as the prices.
    #[arg(long)]
    weights: PathBuf,

    /// Overrides `engine.weight_policy` ("no_leverage" or "fully_invested").
    #[arg(long)]
    policy: Option<WeightPolicy>,

    /// Overrides `engine.exposure_tolerance`.
    #[arg(long)]
    tolerance: Option<f64>,

    /// Also print the per-asset contribution matrix.
    #[arg(long)]
    contributions: bool,

    /// Print JSON instead of tables.
    #[arg(long)]
    json: bool,
}

// ==============================================================================
// Fetch Command Logic
// ==============================================================================

async fn handle_fetch(args: FetchArgs, config: &Config) -> anyhow::Result<()> {
    let interval = match args.interval {
        Some(interval) => interval,
        None => config.provider.interval.parse()?,
    };
    let request = PriceRequest {
        tickers: args.tickers,
        start: args.from,
        end: args.to,
        interval,
        adjusted: config.provider.adjusted && !args.raw,
    };

    let client = YahooClient::new(&config.provider)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    spinner.set_message(format!("Fetching {} ticker(s)...", request.tickers.len()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let loaded = client.load_prices(&request).await;
    spinner.finish_and_clear();
    let loaded = loaded?;

    match &args.output {
        Some(path) => {
            let writer = BufWriter::new(
                File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
            );
            write_json(writer, &loaded.prices)?;
            println!(
                "Wrote {} date(s) x {} ticker(s) to {} ({} value(s) missing)",
                loaded.prices.n_rows(),
                loaded.prices.n_cols(),
                path.display(),
                loaded.missing_cells
            );
        }
        None => write_json(std::io::stdout().lock(), &loaded.prices)?,
    }

    Ok(())
}

// ==============================================================================
// Run Command Logic
// ==============================================================================

fn handle_run(args: RunArgs, config: &Config) -> anyhow::Result<()> {
    let prices = read_frame(&args.prices)?;
    let weights = read_frame(&args.weights)?;

    let mut settings = config.engine.clone();
    if let Some(policy) = args.policy {
        settings.weight_policy = policy;
    }
    if let Some(tolerance) = args.tolerance {
        anyhow::ensure!(
            tolerance.is_finite() && tolerance >= 0.0,
            "--tolerance must be a finite, non-negative number"
        );
        settings.exposure_tolerance = tolerance;
    }

    let mut engine = BacktestEngine::from_settings(&prices, &weights, &settings);
    engine.run()?;
    let returns = engine.returns()?;
    let contributions = engine.contributions()?;

    if args.json {
        let body = if args.contributions {
            serde_json::json!({ "returns": returns, "contributions": contributions })
        } else {
            serde_json::to_value(&returns)?
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    if args.contributions {
        println!("{}", contributions_table(contributions));
    }
    println!("{}", returns_table(&returns));
    Ok(())
}

fn read_frame(path: &Path) -> anyhow::Result<Frame> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let frame = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {} as a split-JSON frame", path.display()))?;
    Ok(frame)
}

fn write_json<W: Write>(mut writer: W, frame: &Frame) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut writer, frame)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn returns_table(returns: &ReturnSeries) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Date", "Portfolio Return"]);
    for (date, value) in returns.iter() {
        table.add_row(vec![format_timestamp(date), format!("{:.6}", value)]);
    }
    table
}

fn contributions_table(contributions: &Frame) -> Table {
    let mut table = Table::new();
    let mut header = vec!["Date".to_string()];
    header.extend(contributions.columns().iter().cloned());
    table.set_header(header);

    for (date, row) in contributions.rows() {
        let mut cells = vec![format_timestamp(date)];
        cells.extend(row.iter().map(|c| c.map_or_else(String::new, |v| format!("{:.6}", v))));
        table.add_row(cells);
    }
    table
}

/// Daily data prints as a plain date; intraday data keeps its time.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    if ts.time() == NaiveTime::default() {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
