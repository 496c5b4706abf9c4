//! Replay driver - main entry point
//!
//! Streams CSV bars through the decision engine with a simulated account and
//! logs every intent the engine emits. This is a deterministic diagnostic
//! harness, not a backtester: fills are naive and no performance accounting
//! is done.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fx_strategies::engine::{Engine, EvaluationInput};
use fx_strategies::{data, Bar, Config, OpenPosition, Side};

#[derive(Parser, Debug)]
#[command(name = "fx-strategies")]
#[command(about = "Forex trading decision engine replay driver", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a CSV of closed bars through the engine
    Replay {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/eurusd_m15.json")]
        config: String,

        /// Primary-timeframe CSV (timestamp,open,high,low,close,volume)
        #[arg(short, long)]
        data: String,

        /// Optional higher-timeframe CSV for the reaction cycle
        #[arg(long)]
        higher_data: Option<String>,

        /// Simulated account balance
        #[arg(long, default_value = "10000.0")]
        balance: f64,
    },

    /// Validate a bar CSV without running the engine
    Check {
        /// Bar CSV to validate
        #[arg(short, long)]
        data: String,
    },
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Replay {
            config,
            data,
            higher_data,
            balance,
        } => replay(config, data, higher_data, balance),
        Commands::Check { data } => check(data),
    }
}

fn load_validated(path: &str) -> Result<Vec<Bar>> {
    let bars = data::load_csv(path).context(format!("Failed to load {}", path))?;
    let result = data::validate_bars(&bars);
    for warning in &result.warnings {
        warn!("{}: {}", path, warning);
    }
    if !result.is_valid() {
        for error in &result.errors {
            warn!("{}: {}", path, error);
        }
        bail!("{} failed validation with {} errors", path, result.errors.len());
    }
    Ok(bars)
}

fn check(data: String) -> Result<()> {
    let bars = load_validated(&data)?;
    info!("{}: {} bars, OK", data, bars.len());
    Ok(())
}

fn replay(
    config_path: String,
    data_path: String,
    higher_path: Option<String>,
    balance: f64,
) -> Result<()> {
    let config = Config::from_file(&config_path)?;
    let engine = Engine::from_config(&config);
    let mut state = engine.new_session();
    let spec = config.symbol.clone();

    let bars = load_validated(&data_path)?;
    let higher_bars = match &higher_path {
        Some(path) => load_validated(path)?,
        None => Vec::new(),
    };

    let mut positions: Vec<OpenPosition> = Vec::new();
    let mut next_position_id: u64 = 1;
    let mut higher_idx = 0;
    let mut orders = 0usize;
    let mut stop_moves = 0usize;

    for bar in bars {
        // Close simulated positions whose stop was touched this bar
        positions.retain(|p| {
            let stopped = match (p.side, p.stop_loss) {
                (Side::Buy, Some(stop)) => bar.low <= stop,
                (Side::Sell, Some(stop)) => bar.high >= stop,
                _ => false,
            };
            if stopped {
                info!(position = p.id, stop = ?p.stop_loss, "position stopped out");
            }
            !stopped
        });

        // Feed higher-timeframe bars that have closed by now
        let mut higher_bar = None;
        while higher_idx < higher_bars.len()
            && higher_bars[higher_idx].timestamp <= bar.timestamp
        {
            higher_bar = Some(higher_bars[higher_idx].clone());
            higher_idx += 1;
        }

        let input = EvaluationInput {
            bid: bar.close,
            ask: bar.close + spec.pip_size,
            server_time: bar.timestamp,
            balance,
            positions: &positions,
            spec: &spec,
            higher_bar,
            bar: bar.clone(),
        };

        let eval = engine.evaluate(&mut state, &input);

        for update in &eval.stop_updates {
            if let Some(p) = positions.iter_mut().find(|p| p.id == update.position_id) {
                p.stop_loss = Some(update.new_stop_loss);
                stop_moves += 1;
            }
        }

        if let Some(order) = eval.order {
            info!(
                side = %order.side,
                volume = order.volume,
                context = %eval.context,
                "order intent at {}",
                bar.timestamp
            );
            let stop_distance = order.stop_loss_pips * spec.pip_size;
            let entry_price = bar.close;
            positions.push(OpenPosition {
                id: next_position_id,
                symbol: order.symbol.clone(),
                side: order.side,
                entry_price,
                stop_loss: Some(match order.side {
                    Side::Buy => entry_price - stop_distance,
                    Side::Sell => entry_price + stop_distance,
                }),
                take_profit: None,
                volume: order.volume,
                label: order.label.clone(),
            });
            next_position_id += 1;
            orders += 1;
            engine.record_execution(&mut state, bar.timestamp);
        }
    }

    info!(
        orders,
        stop_moves,
        open_positions = positions.len(),
        "replay finished"
    );
    Ok(())
}
