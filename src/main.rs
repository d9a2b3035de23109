use anyhow::Result;
use clap::{Parser, ValueEnum};
use config_manager::SystemConfig;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use volume_core::{total_volume, ChainId, ScanResult};

/// Estimate the USD volume a wallet moved across chains
#[derive(Parser, Debug)]
#[command(name = "wallet_volume")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Wallet address, passed to the indexing API as-is
    address: String,

    /// Comma-separated chain names or numeric ids (configured defaults when omitted)
    #[arg(short, long, value_delimiter = ',')]
    chains: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Include per-page trace lines (JSON output only)
    #[arg(long)]
    trace: bool,

    /// Path to configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WalletReport {
    address: String,
    chains: BTreeMap<ChainId, ScanResult>,
    #[serde(with = "rust_decimal::serde::float")]
    total_volume: Decimal,
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    chain: &'a str,
    volume: String,
    tx_count: u64,
    error: &'a str,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries the report
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = SystemConfig::load_from_path(&cli.config)?;

    let names = if cli.chains.is_empty() {
        config.scan.default_chains.clone()
    } else {
        cli.chains.clone()
    };
    let chains = names
        .iter()
        .map(|name| ChainId::resolve(name.trim()))
        .collect::<Result<Vec<_>, _>>()?;

    let engine = goldrush_client::volume_engine(&config)?;
    info!("Scanning {} on {} chains", cli.address, chains.len());
    let mut results = engine.scan_wallet(&cli.address, &chains).await;
    if !cli.trace {
        results.values_mut().for_each(|result| result.trace.clear());
    }

    let report = WalletReport {
        address: cli.address.clone(),
        total_volume: total_volume(&results),
        chains: results,
    };

    let stdout = std::io::stdout();
    match cli.format {
        OutputFormat::Json => {
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => write_csv(stdout.lock(), &report)?,
    }

    Ok(())
}

/// One row per chain followed by a `total` row
fn write_csv<W: Write>(out: W, report: &WalletReport) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for (chain, result) in &report.chains {
        writer.serialize(CsvRow {
            chain: chain.as_str(),
            volume: format!("{:.2}", result.volume),
            tx_count: result.tx_count,
            error: result.error.as_deref().unwrap_or(""),
        })?;
    }
    writer.serialize(CsvRow {
        chain: "total",
        volume: format!("{:.2}", report.total_volume),
        tx_count: report.chains.values().map(|result| result.tx_count).sum(),
        error: "",
    })?;
    writer.flush()?;
    Ok(())
}
