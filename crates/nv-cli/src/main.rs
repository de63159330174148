use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use nv_config::Config;
use nv_ingest::ChartTailConfig;
use nv_runtime::{run_replay, Engine, ReplayChart};
use std::path::PathBuf;
use std::process::Command;

/// Fixed chart-ID wiring the CLI hands to `Engine`/ingestion: spec §6
/// fixes only the VIX chart (8); basedata and MenthorQ-levels chart
/// numbers are a deployment convention documented in DESIGN.md.
const ES_BASEDATA_CHART: i32 = 1;
const NQ_BASEDATA_CHART: i32 = 2;
const ES_MENTHORQ_CHART: i32 = 3;
const VIX_CHART: i32 = 8;
const ATR_PERIOD: usize = 14;

#[derive(Parser)]
#[command(name = "nv")]
#[command(about = "Intraday CME ES/NQ decision engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live decision loop, emitting one JSON decision per line.
    Run {
        #[arg(long)]
        config: PathBuf,
        #[arg(long, default_value = "ES")]
        symbol: String,
    },
    /// Deterministically replay historical chart files over a time range.
    Replay {
        #[arg(long)]
        from: DateTime<Utc>,
        #[arg(long)]
        to: DateTime<Utc>,
        #[arg(long)]
        config: PathBuf,
        #[arg(long, default_value = "ES")]
        symbol: String,
    },
    /// Diagnostic inspection commands.
    Inspect {
        #[command(subcommand)]
        cmd: InspectCmd,
    },
}

#[derive(Subcommand)]
enum InspectCmd {
    /// Reconstruct state from today's chart files and print the current
    /// `Snapshot` as JSON.
    Snapshot {
        #[arg(long)]
        config: PathBuf,
        #[arg(long, default_value = "ES")]
        symbol: String,
    },
}

fn charts_for(chart_dir: &str, dedupe_window: usize) -> Vec<ChartTailConfig> {
    vec![
        chart_tail(ES_BASEDATA_CHART, chart_dir, dedupe_window),
        chart_tail(NQ_BASEDATA_CHART, chart_dir, dedupe_window),
        chart_tail(ES_MENTHORQ_CHART, chart_dir, dedupe_window),
        chart_tail(VIX_CHART, chart_dir, dedupe_window),
    ]
}

fn chart_tail(chart_id: i32, chart_dir: &str, dedupe_window: usize) -> ChartTailConfig {
    let mut cfg = ChartTailConfig::new(chart_id, chart_dir);
    cfg.dedupe_window = dedupe_window;
    cfg
}

fn replay_charts() -> Vec<ReplayChart> {
    vec![
        ReplayChart::new(ES_BASEDATA_CHART),
        ReplayChart::new(NQ_BASEDATA_CHART),
        ReplayChart::new(ES_MENTHORQ_CHART),
        ReplayChart::new(VIX_CHART),
    ]
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_engine(config_path: &PathBuf, symbol: &str, peer: &str) -> Result<(Engine, Config, nv_config::LoadedConfig)> {
    let (config, loaded) = nv_config::load_config(&[config_path])?;
    let engine = Engine::new(config.clone(), symbol, peer, ES_BASEDATA_CHART, ATR_PERIOD)
        .context("constructing engine from config")?;
    Ok((engine, config, loaded))
}

async fn run_cmd(config: PathBuf, symbol: String) -> i32 {
    let peer = if symbol == "ES" { "NQ" } else { "ES" };
    let (engine, config, loaded) = match load_engine(&config, &symbol, peer) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("config error: {e:#}");
            return 2;
        }
    };

    let git_hash = get_git_hash().unwrap_or_else(|| "UNKNOWN".to_string());
    tracing::info!(git_hash = %git_hash, config_hash = %loaded.config_hash, host = %host_fingerprint(), "starting run");

    let chart_dir = config.ingestion.chart_dir.clone();
    let charts = charts_for(&chart_dir, config.ingestion.dedupe_window);

    let sink: Box<dyn FnMut(&nv_schemas::TradingDecision) + Send> = Box::new(|decision| {
        match serde_json::to_string(decision) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!(error = %e, "failed to serialize decision"),
        }
    });

    let handle = engine.run(charts, sink);

    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to install ctrl-c handler, running until killed");
        std::future::pending::<()>().await;
    }

    tracing::info!("shutdown requested, draining in-flight events");
    handle.stop();
    handle.join().await;
    0
}

async fn replay_cmd(from: DateTime<Utc>, to: DateTime<Utc>, config: PathBuf, symbol: String) -> i32 {
    let peer = if symbol == "ES" { "NQ" } else { "ES" };
    let (mut engine, config, loaded) = match load_engine(&config, &symbol, peer) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("config error: {e:#}");
            return 2;
        }
    };
    tracing::info!(config_hash = %loaded.config_hash, %from, %to, "starting replay");

    let chart_dir = PathBuf::from(config.ingestion.chart_dir.clone());
    let charts = replay_charts();
    let mut sink = |decision: &nv_schemas::TradingDecision| match serde_json::to_string(decision) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::error!(error = %e, "failed to serialize decision"),
    };

    run_replay(&mut engine, &chart_dir, &charts, from, to, &mut sink);
    0
}

async fn inspect_snapshot_cmd(config: PathBuf, symbol: String) -> i32 {
    let peer = if symbol == "ES" { "NQ" } else { "ES" };
    let (mut engine, config, _loaded) = match load_engine(&config, &symbol, peer) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("config error: {e:#}");
            return 2;
        }
    };

    let now = Utc::now();
    let chart_dir = PathBuf::from(config.ingestion.chart_dir.clone());
    let charts = replay_charts();
    let start_of_day = now.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
    let mut sink = |_: &nv_schemas::TradingDecision| {};
    run_replay(&mut engine, &chart_dir, &charts, start_of_day, now, &mut sink);

    match engine.current_snapshot(now) {
        Some(snapshot) => match serde_json::to_string_pretty(&snapshot) {
            Ok(s) => {
                println!("{s}");
                0
            }
            Err(e) => {
                eprintln!("failed to serialize snapshot: {e:#}");
                4
            }
        },
        None => {
            eprintln!("no snapshot yet: no bar has closed for {symbol} today");
            0
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let code = match cli.cmd {
        Commands::Run { config, symbol } => run_cmd(config, symbol).await,
        Commands::Replay { from, to, config, symbol } => replay_cmd(from, to, config, symbol).await,
        Commands::Inspect { cmd } => match cmd {
            InspectCmd::Snapshot { config, symbol } => inspect_snapshot_cmd(config, symbol).await,
        },
    };

    std::process::exit(code);
}

/// Best-effort git hash for run attribution; absence is never fatal.
fn get_git_hash() -> Option<String> {
    let out = Command::new("git").args(["rev-parse", "--short", "HEAD"]).output().ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8(out.stdout).ok().map(|s| s.trim().to_string())
}

/// Non-sensitive host fingerprint for run attribution, paired with
/// `config_hash` in startup logs.
fn host_fingerprint() -> String {
    let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "UNKNOWN_HOST".to_string());
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    format!("{hostname}|{os}|{arch}")
}
