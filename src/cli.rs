//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_price_adapter::CsvPriceAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report_adapter::{render, TextReportAdapter};
use crate::domain::config::SimulationConfig;
use crate::domain::error::AdaptraderError;
use crate::domain::pipeline::{run_pipeline, PipelineReport};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "adaptrader", about = "Regime-adaptive signal scoring and backtesting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full pipeline and report the results
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory containing <SYMBOL>.csv price files
        #[arg(short, long)]
        prices: PathBuf,
        #[arg(long)]
        symbol: String,
        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a configuration file without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the per-bar signal rationale for the most recent bars
    Explain {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        prices: PathBuf,
        #[arg(long)]
        symbol: String,
        /// How many trailing bars to explain
        #[arg(long, default_value_t = 5)]
        bars: usize,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            prices,
            symbol,
            output,
        } => cmd_backtest(&config, &prices, &symbol, output.as_deref()),
        Command::Validate { config } => cmd_validate(&config),
        Command::Explain {
            config,
            prices,
            symbol,
            bars,
        } => cmd_explain(&config, &prices, &symbol, bars),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}

fn cmd_backtest(
    config_path: &Path,
    prices_dir: &Path,
    symbol: &str,
    output: Option<&Path>,
) -> Result<(), AdaptraderError> {
    let report = pipeline_for(config_path, prices_dir, symbol)?;
    match output {
        Some(path) => {
            TextReportAdapter.write(&report, symbol, path)?;
            println!("report written to {}", path.display());
        }
        None => print!("{}", render(&report, symbol)),
    }
    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<(), AdaptraderError> {
    let (_, config) = load_config(config_path)?;
    config.validate()?;
    println!("configuration OK");
    Ok(())
}

fn cmd_explain(
    config_path: &Path,
    prices_dir: &Path,
    symbol: &str,
    bars: usize,
) -> Result<(), AdaptraderError> {
    let report = pipeline_for(config_path, prices_dir, symbol)?;
    let len = report.explanation.rows.len();
    for index in len.saturating_sub(bars)..len {
        if let Some(line) = report.explanation.describe_bar(index) {
            println!("[{index}] {line}");
        }
    }
    Ok(())
}

fn pipeline_for(
    config_path: &Path,
    prices_dir: &Path,
    symbol: &str,
) -> Result<PipelineReport, AdaptraderError> {
    let (adapter, config) = load_config(config_path)?;
    let (start, end) = date_range(&adapter)?;
    let data = CsvPriceAdapter::new(prices_dir.to_path_buf());
    let prices = data.fetch_prices(symbol, start, end)?;
    run_pipeline(&prices, &config)
}

fn load_config(path: &Path) -> Result<(FileConfigAdapter, SimulationConfig), AdaptraderError> {
    let adapter =
        FileConfigAdapter::from_file(path).map_err(|e| AdaptraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
    let config = SimulationConfig::from_config(&adapter)?;
    Ok((adapter, config))
}

/// Optional `[data] start_date` / `end_date` keys bound the series fetch.
fn date_range(adapter: &FileConfigAdapter) -> Result<(NaiveDate, NaiveDate), AdaptraderError> {
    let parse = |key: &str, default: NaiveDate| -> Result<NaiveDate, AdaptraderError> {
        match adapter.get_string("data", key) {
            None => Ok(default),
            Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                AdaptraderError::ConfigInvalid {
                    section: "data".into(),
                    key: key.into(),
                    reason: e.to_string(),
                }
            }),
        }
    };

    let start = parse("start_date", NaiveDate::MIN)?;
    let end = parse("end_date", NaiveDate::MAX)?;
    if start > end {
        return Err(AdaptraderError::ConfigInvalid {
            section: "data".into(),
            key: "start_date".into(),
            reason: "start_date is after end_date".into(),
        });
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backtest_command() {
        let cli = Cli::try_parse_from([
            "adaptrader",
            "backtest",
            "--config",
            "sim.ini",
            "--prices",
            "data/",
            "--symbol",
            "AAPL",
        ])
        .unwrap();

        match cli.command {
            Command::Backtest { symbol, output, .. } => {
                assert_eq!(symbol, "AAPL");
                assert!(output.is_none());
            }
            other => panic!("expected backtest, got {other:?}"),
        }
    }

    #[test]
    fn parses_explain_with_default_bars() {
        let cli = Cli::try_parse_from([
            "adaptrader",
            "explain",
            "--config",
            "sim.ini",
            "--prices",
            "data/",
            "--symbol",
            "AAPL",
        ])
        .unwrap();

        match cli.command {
            Command::Explain { bars, .. } => assert_eq!(bars, 5),
            other => panic!("expected explain, got {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_symbol() {
        let result = Cli::try_parse_from([
            "adaptrader",
            "backtest",
            "--config",
            "sim.ini",
            "--prices",
            "data/",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn date_range_defaults_to_open_interval() {
        let adapter = FileConfigAdapter::from_string("[simulation]\n").unwrap();
        let (start, end) = date_range(&adapter).unwrap();
        assert_eq!(start, NaiveDate::MIN);
        assert_eq!(end, NaiveDate::MAX);
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\nstart_date = 2024-06-01\nend_date = 2024-01-01\n",
        )
        .unwrap();
        assert!(date_range(&adapter).is_err());
    }

    #[test]
    fn date_range_parses_bounds() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\nstart_date = 2024-01-01\nend_date = 2024-06-01\n",
        )
        .unwrap();
        let (start, end) = date_range(&adapter).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }
}
