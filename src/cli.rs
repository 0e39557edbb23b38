//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_adapter;
use crate::domain::analytics::instrument_metrics;
use crate::domain::config::build_engine_config;
use crate::domain::engine::ExecutionEngine;
use crate::domain::error::PapertraderError;
use crate::domain::instrument::Instrument;
use crate::domain::ledger::{LedgerError, OrderLedger};
use crate::domain::portfolio::{PortfolioNode, PortfolioTree};
use crate::domain::series::{MarketTick, PriceSeries};
use crate::domain::signal::{AlertObserver, LoggerObserver};
use crate::domain::strategy::build_strategy;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "papertrader", about = "Toy trading platform simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation pass over the configured data
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Override the data directory from [data] base_dir
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Override the portfolio structure file from [data] portfolio
        #[arg(long)]
        portfolio: Option<PathBuf>,
        /// Override the configured strategy
        #[arg(short, long)]
        strategy: Option<String>,
        /// Cap the number of ticks fed to the engine
        #[arg(long)]
        limit: Option<usize>,
        /// Run a second pass with this strategy after the first
        #[arg(long)]
        switch_to: Option<String>,
        /// Undo the last N executed orders after the passes
        #[arg(long)]
        undo: Option<usize>,
    },
    /// Validate an engine configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show instruments and tick counts in a data directory
    Info {
        #[arg(long)]
        data_dir: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Run {
            config,
            data_dir,
            portfolio,
            strategy,
            limit,
            switch_to,
            undo,
        } => run_simulation(
            &config,
            data_dir,
            portfolio,
            strategy.as_deref(),
            limit,
            switch_to.as_deref(),
            undo,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Info { data_dir } => run_info(&data_dir),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, PapertraderError> {
    FileConfigAdapter::from_file(path).map_err(|e| PapertraderError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[allow(clippy::too_many_arguments)]
fn run_simulation(
    config_path: &PathBuf,
    data_dir: Option<PathBuf>,
    portfolio_path: Option<PathBuf>,
    strategy_override: Option<&str>,
    limit: Option<usize>,
    switch_to: Option<&str>,
    undo: Option<usize>,
) -> Result<(), PapertraderError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    let cfg = build_engine_config(&adapter)?;

    let data_dir = resolve_data_dir(data_dir, &adapter)?;
    let data_port = CsvAdapter::new(data_dir);

    let instruments = data_port.load_instruments()?;
    eprintln!("Loaded {} instruments", instruments.len());

    let tree = match portfolio_path.or_else(|| {
        adapter
            .get_string("data", "portfolio")
            .map(PathBuf::from)
    }) {
        Some(path) => {
            eprintln!("Loading portfolio from {}", path.display());
            json_adapter::load_portfolio(&path)?
        }
        None => PortfolioTree::new("Portfolio", None),
    };

    let symbols: Vec<String> = instruments
        .iter()
        .map(|instrument| instrument.symbol.clone())
        .collect();
    let ticks = data_port.load_ticks(&symbols, limit)?;
    eprintln!("Loaded {} ticks for {} symbols", ticks.len(), symbols.len());

    // Building the per-symbol series enforces the ordering invariant on the
    // feed before the engine sees it.
    let series = build_series(&ticks)?;

    let strategy_name = strategy_override.unwrap_or(&cfg.strategy_name).to_string();
    let strategy = build_strategy(&strategy_name, cfg.strategy_params(&strategy_name))?;
    eprintln!("Running strategy: {strategy_name}");

    let ledger = OrderLedger::new(cfg.ledger_policy());
    let mut engine = ExecutionEngine::new(strategy, tree, ledger);
    engine.subscribe(Box::new(LoggerObserver::new()));
    engine.subscribe(Box::new(AlertObserver::new(cfg.alert_notional)));

    let summary = engine.run_pass(&ticks)?;
    eprintln!(
        "Pass complete: {} ticks, {} intents, {} executed, {} rejected",
        summary.ticks, summary.intents, summary.executed, summary.rejected
    );

    if let Some(name) = switch_to {
        let next = build_strategy(name, cfg.strategy_params(name))?;
        engine.switch_strategy(next);
        eprintln!("Switched strategy to {name}");
        let summary = engine.run_pass(&ticks)?;
        eprintln!(
            "Pass complete: {} ticks, {} intents, {} executed, {} rejected",
            summary.ticks, summary.intents, summary.executed, summary.rejected
        );
    }

    for _ in 0..undo.unwrap_or(0) {
        match engine.undo_last() {
            Ok(receipt) => eprintln!("Undid {} {} x {}", receipt.side, receipt.symbol, receipt.quantity),
            Err(PapertraderError::Ledger(LedgerError::NothingToUndo)) => {
                eprintln!("Nothing left to undo");
                break;
            }
            Err(e) => return Err(e),
        }
    }

    let benchmark = adapter.get_string("data", "benchmark");
    print_report(&engine, benchmark.as_deref(), &instruments, &series);
    Ok(())
}

fn resolve_data_dir(
    data_dir: Option<PathBuf>,
    adapter: &FileConfigAdapter,
) -> Result<PathBuf, PapertraderError> {
    match data_dir.or_else(|| adapter.get_string("data", "base_dir").map(PathBuf::from)) {
        Some(dir) => Ok(dir),
        None => Err(PapertraderError::ConfigMissing {
            section: "data".into(),
            key: "base_dir".into(),
        }),
    }
}

fn build_series(ticks: &[MarketTick]) -> Result<HashMap<String, PriceSeries>, PapertraderError> {
    let mut series: HashMap<String, PriceSeries> = HashMap::new();
    for tick in ticks {
        series
            .entry(tick.symbol.clone())
            .or_insert_with(|| PriceSeries::new(tick.symbol.clone()))
            .push(tick.timestamp, tick.price)?;
    }
    Ok(series)
}

fn print_report(
    engine: &ExecutionEngine,
    benchmark: Option<&str>,
    instruments: &[Instrument],
    series: &HashMap<String, PriceSeries>,
) {
    println!("Portfolio: {}", engine.tree().root_name());
    println!("{:<30} {:>14} {:>8}", "path", "value", "weight");
    let prices = engine.latest_prices();
    for (path, node) in engine.tree().traverse() {
        let marker = match node {
            PortfolioNode::Group(_) => "+",
            PortfolioNode::Position(_) => " ",
        };
        let value = engine.tree().value_of(&path, prices).unwrap_or(0.0);
        let weight = engine.tree().weight_of(&path, prices).unwrap_or(0.0);
        println!("{marker}{path:<29} {value:>14.2} {weight:>7.1}%", weight = weight * 100.0);
    }

    let summary = engine.tree().summary(prices);
    println!(
        "Total value: {:.2} across {} positions ({} symbols)",
        summary.total_value, summary.positions, summary.symbols
    );

    println!("Order history ({} receipts):", engine.ledger().history().len());
    for receipt in engine.ledger().history() {
        println!(
            "  {} {} {} x {} @ {:.2}",
            receipt.kind, receipt.side, receipt.symbol, receipt.quantity, receipt.price
        );
    }

    if let Some(benchmark) = benchmark.and_then(|symbol| series.get(symbol)) {
        let benchmark_prices: Vec<f64> = benchmark.prices().collect();
        println!("Instrument metrics (benchmark {}):", benchmark.symbol);
        for instrument in instruments {
            let Some(history) = series.get(&instrument.symbol) else {
                continue;
            };
            let history_prices: Vec<f64> = history.prices().collect();
            let last = history.last_price().unwrap_or(0.0);
            let metrics = instrument_metrics(last, &history_prices, &benchmark_prices);
            println!(
                "  {:<8} vol={:.4} beta={:.2} max_dd={:.2}%",
                instrument.symbol,
                metrics["volatility"],
                metrics["beta"],
                metrics["max_drawdown"] * 100.0
            );
        }
    }
}

fn run_validate(config_path: &PathBuf) -> Result<(), PapertraderError> {
    let adapter = load_config(config_path)?;
    let cfg = build_engine_config(&adapter)?;
    build_strategy(&cfg.strategy_name, cfg.strategy_params(&cfg.strategy_name))?;
    eprintln!(
        "Config OK: strategy={} window={} shorting={}",
        cfg.strategy_name, cfg.lookback_window, cfg.allow_shorting
    );
    Ok(())
}

fn run_info(data_dir: &PathBuf) -> Result<(), PapertraderError> {
    let data_port = CsvAdapter::new(data_dir.clone());
    let instruments = data_port.load_instruments()?;
    let ticks = data_port.load_ticks(&[], None)?;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tick in &ticks {
        *counts.entry(tick.symbol.as_str()).or_default() += 1;
    }

    println!("{:<8} {:<8} {:>8}", "symbol", "kind", "ticks");
    for instrument in &instruments {
        println!(
            "{:<8} {:<8} {:>8}",
            instrument.symbol,
            instrument.kind.label(),
            counts.get(instrument.symbol.as_str()).copied().unwrap_or(0)
        );
    }
    Ok(())
}
