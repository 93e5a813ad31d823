//! CLI definition and dispatch.

use chrono::{DateTime, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_chart_adapter::JsonChartAdapter;
use crate::domain::candle::MarketKey;
use crate::domain::config_validation::{
    parse_date, validate_data_config, validate_dates, validate_engine_config,
    validate_market_config,
};
use crate::domain::engine::EngineConfig;
use crate::domain::error::FvgError;
use crate::domain::registry::{DEFAULT_PRUNE_RETAIN, DEFAULT_PRUNE_THRESHOLD, PruneLimits};
use crate::domain::replay::{ReplayResult, run_replay};
use crate::domain::signal::entry_side;
use crate::domain::trend::{DEFAULT_FAST_PERIOD, DEFAULT_SLOW_PERIOD};
use crate::logging::init_logging;
use crate::ports::chart_port::ChartPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

const DAY_MS: i64 = 86_400_000;

#[derive(Parser, Debug)]
#[command(name = "fvgtrader", about = "Fair value gap tracker over an EMA trend filter")]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error); overrides [logging] level
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay stored candles through the gap engine and write the chart
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        exchange: Option<String>,
        #[arg(long)]
        timeframe: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List available symbols on an exchange
    ListSymbols {
        #[arg(long)]
        exchange: String,
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the stored data range for a symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        exchange: Option<String>,
        #[arg(long)]
        timeframe: Option<String>,
    },
}

/// Overrides for the `[market]` section taken from the command line.
#[derive(Debug, Default, Clone)]
pub struct MarketOverrides<'a> {
    pub exchange: Option<&'a str>,
    pub symbol: Option<&'a str>,
    pub timeframe: Option<&'a str>,
}

pub fn run(cli: Cli) -> ExitCode {
    let log_level = cli.log_level.as_deref();
    match cli.command {
        Command::Run {
            config,
            symbol,
            exchange,
            timeframe,
            output,
            dry_run,
        } => {
            let overrides = MarketOverrides {
                exchange: exchange.as_deref(),
                symbol: symbol.as_deref(),
                timeframe: timeframe.as_deref(),
            };
            if dry_run {
                run_dry_run(&config, &overrides, log_level)
            } else {
                run_command(&config, &overrides, output.as_deref(), log_level)
            }
        }
        Command::Validate { config } => run_validate(&config, log_level),
        Command::ListSymbols { exchange, config } => {
            run_list_symbols(&exchange, &config, log_level)
        }
        Command::Info {
            config,
            symbol,
            exchange,
            timeframe,
        } => {
            let overrides = MarketOverrides {
                exchange: exchange.as_deref(),
                symbol: symbol.as_deref(),
                timeframe: timeframe.as_deref(),
            };
            run_info(&config, &overrides, log_level)
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path)
        .map(FileConfigAdapter::with_env_overrides)
        .map_err(|err| {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        })
}

/// CLI flag wins over `[logging] level`.
pub fn setup_logging(cli_level: Option<&str>, config: &dyn ConfigPort) {
    let level = cli_level
        .map(str::to_string)
        .or_else(|| config.get_non_empty("logging", "level"))
        .unwrap_or_else(|| "info".to_string());
    let json = config.get_bool("logging", "json", false);
    init_logging(&level, json);
}

fn report(err: FvgError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn build_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, FvgError> {
    validate_engine_config(config)?;
    Ok(EngineConfig {
        fast_period: config.get_int("engine", "fast_period", DEFAULT_FAST_PERIOD as i64) as usize,
        slow_period: config.get_int("engine", "slow_period", DEFAULT_SLOW_PERIOD as i64) as usize,
        prune: PruneLimits {
            threshold: config.get_int(
                "engine",
                "prune_threshold",
                DEFAULT_PRUNE_THRESHOLD as i64,
            ) as usize,
            retain: config.get_int("engine", "prune_retain", DEFAULT_PRUNE_RETAIN as i64)
                as usize,
        },
    })
}

pub fn build_market_key(
    config: &dyn ConfigPort,
    overrides: &MarketOverrides<'_>,
) -> Result<MarketKey, FvgError> {
    let resolve = |value: Option<&str>, key: &str| -> Result<String, FvgError> {
        value
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| config.get_non_empty("market", key))
            .ok_or_else(|| FvgError::ConfigMissing {
                section: "market".into(),
                key: key.into(),
            })
    };

    let exchange = resolve(overrides.exchange, "exchange")?;
    let symbol = resolve(overrides.symbol, "symbol")?.to_uppercase();
    let timeframe = overrides
        .timeframe
        .map(str::to_string)
        .or_else(|| config.get_non_empty("market", "timeframe"))
        .unwrap_or_else(|| "1m".to_string());

    Ok(MarketKey {
        exchange,
        symbol,
        timeframe,
    })
}

fn day_start_ms(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Inclusive millisecond range from `[market] start_date` / `end_date`.
/// A missing start is open to the past, a missing end open to the future.
pub fn resolve_time_range(config: &dyn ConfigPort) -> Result<(i64, i64), FvgError> {
    validate_dates(config)?;
    let start = parse_date(config.get_string("market", "start_date").as_deref(), "start_date")?;
    let end = parse_date(config.get_string("market", "end_date").as_deref(), "end_date")?;

    let start_ms = start.map(day_start_ms).unwrap_or(i64::MIN);
    let end_ms = end
        .map(|d| day_start_ms(d) + DAY_MS - 1)
        .unwrap_or(i64::MAX);
    Ok((start_ms, end_ms))
}

pub fn open_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, FvgError> {
    validate_data_config(config)?;
    let source = config
        .get_non_empty("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();

    match source.as_str() {
        "csv" => {
            let dir = config
                .get_non_empty("data", "csv_dir")
                .ok_or_else(|| FvgError::ConfigMissing {
                    section: "data".into(),
                    key: "csv_dir".into(),
                })?;
            tracing::info!(dir = %dir, "reading candles from csv");
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            let adapter = SqliteAdapter::from_config(config)?;
            adapter.initialize_schema()?;
            Ok(Box::new(adapter))
        }
        other => Err(FvgError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("source '{}' is not available in this build", other),
        }),
    }
}

pub fn resolve_output(config: &dyn ConfigPort, output: Option<&Path>) -> PathBuf {
    output
        .map(Path::to_path_buf)
        .or_else(|| config.get_non_empty("output", "chart_path").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("chart.json"))
}

/// Fetch, replay and write the chart for one market.
pub fn run_pipeline(
    data_port: &dyn DataPort,
    chart_port: &dyn ChartPort,
    key: &MarketKey,
    range: (i64, i64),
    engine_config: &EngineConfig,
    output: &Path,
) -> Result<ReplayResult, FvgError> {
    let candles = data_port.fetch_candles(key, range.0, range.1)?;
    if candles.is_empty() {
        return Err(FvgError::NoData {
            symbol: key.symbol.clone(),
            exchange: key.exchange.clone(),
        });
    }

    let warmup = engine_config.slow_period.max(engine_config.fast_period);
    if candles.len() < warmup {
        tracing::warn!(
            market = %key,
            candles = candles.len(),
            warmup,
            "not enough candles to define both averages; chart will have no status"
        );
    }

    tracing::info!(market = %key, candles = candles.len(), "replaying candles");
    let result = run_replay(&candles, engine_config)?;

    chart_port.write(&result.chart, output)?;
    Ok(result)
}

pub fn format_timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn print_summary(key: &MarketKey, result: &ReplayResult) {
    let c = &result.counters;
    println!("=== {} ===", key);
    println!("Candles:          {} ({} warmup)", c.warmup_steps + c.evaluated_steps, c.warmup_steps);
    println!("Trend changes:    {}", c.trend_changes);
    println!(
        "Gaps detected:    {} ({} admitted, {} discarded)",
        c.gaps_detected, c.gaps_admitted, c.gaps_discarded
    );
    println!(
        "Invalidated:      {} by trend, {} by close",
        c.invalidated_by_trend, c.invalidated_by_close
    );
    println!("Pruned:           {}", c.pruned);
    println!(
        "Exit signals:     {} long, {} short",
        c.long_exits, c.short_exits
    );

    if let Some(status) = &result.status {
        println!();
        for (label, value) in status.watch_list() {
            println!("{:<17} {}", format!("{label}:"), value);
        }
        println!("{:<17} {}", "Bias:", entry_side(status.trend));
    }
}

fn run_command(
    config_path: &Path,
    overrides: &MarketOverrides<'_>,
    output: Option<&Path>,
    log_level: Option<&str>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    setup_logging(log_level, &config);
    tracing::info!(config = config.origin(), "config loaded");

    let engine_config = match build_engine_config(&config) {
        Ok(c) => c,
        Err(e) => return report(e),
    };
    let key = match build_market_key(&config, overrides) {
        Ok(k) => k,
        Err(e) => return report(e),
    };
    let range = match resolve_time_range(&config) {
        Ok(r) => r,
        Err(e) => return report(e),
    };
    let data_port = match open_data_port(&config) {
        Ok(p) => p,
        Err(e) => return report(e),
    };
    let output = resolve_output(&config, output);

    match run_pipeline(
        data_port.as_ref(),
        &JsonChartAdapter::default(),
        &key,
        range,
        &engine_config,
        &output,
    ) {
        Ok(result) => {
            print_summary(&key, &result);
            println!("\nChart written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => report(e),
    }
}

pub fn run_dry_run(
    config_path: &Path,
    overrides: &MarketOverrides<'_>,
    log_level: Option<&str>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    setup_logging(log_level, &config);

    let plan = build_engine_config(&config).and_then(|engine| {
        let key = build_market_key(&config, overrides)?;
        let range = resolve_time_range(&config)?;
        validate_data_config(&config)?;
        Ok((engine, key, range))
    });
    let (engine, key, (start_ms, end_ms)) = match plan {
        Ok(p) => p,
        Err(e) => return report(e),
    };

    println!("Market:     {}", key);
    println!(
        "Range:      {} .. {}",
        if start_ms == i64::MIN {
            "beginning".to_string()
        } else {
            format_timestamp(start_ms)
        },
        if end_ms == i64::MAX {
            "end".to_string()
        } else {
            format_timestamp(end_ms)
        },
    );
    println!(
        "Engine:     EMA {} / EMA {}, prune above {} to {}",
        engine.fast_period, engine.slow_period, engine.prune.threshold, engine.prune.retain
    );
    println!("Output:     {}", resolve_output(&config, None).display());
    println!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path, log_level: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    setup_logging(log_level, &config);

    let checks: [(&str, fn(&dyn ConfigPort) -> Result<(), FvgError>); 3] = [
        ("engine", validate_engine_config),
        ("market", validate_market_config),
        ("data", validate_data_config),
    ];

    for (name, check) in checks {
        match check(&config) {
            Ok(()) => println!("[{}] ok", name),
            Err(e) => {
                println!("[{}] {}", name, e);
                return (&e).into();
            }
        }
    }

    println!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(exchange: &str, config_path: &Path, log_level: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    setup_logging(log_level, &config);

    let symbols = match open_data_port(&config).and_then(|port| port.list_symbols(exchange)) {
        Ok(s) => s,
        Err(e) => return report(e),
    };

    if symbols.is_empty() {
        tracing::warn!(exchange, "no symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        tracing::info!(exchange, count = symbols.len(), "symbols listed");
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, overrides: &MarketOverrides<'_>, log_level: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    setup_logging(log_level, &config);

    let lookup = build_market_key(&config, overrides).and_then(|key| {
        let range = open_data_port(&config)?.get_data_range(&key)?;
        Ok((key, range))
    });

    match lookup {
        Ok((key, Some((first, last, count)))) => {
            println!(
                "{}: {} candles, {} to {}",
                key,
                count,
                format_timestamp(first),
                format_timestamp(last)
            );
            ExitCode::SUCCESS
        }
        Ok((key, None)) => {
            println!("{}: no data found", key);
            ExitCode::SUCCESS
        }
        Err(e) => report(e),
    }
}
