mod input;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use ltp_scoring::scoring::{
    calculate_legacy_score, determine_trend, explain_score, identify_key_levels, score_batch, ScoreRequest,
    ScorerFactory, ScoringStrategy, StrategyScore, SymbolInput,
};
use ltp_scoring::{KeyLevel, MarketContext, MtfAnalysis, ScoreHysteresisState};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ltp-score")]
#[command(about = "Level / Trend / Patience setup scoring")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Print verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON scoring config override, camelCase keys (missing fields use defaults)
    #[arg(short, long, global = true, env = "LTP_SCORING_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score one market context (JSON) and explain it
    Score {
        /// MarketContext JSON file
        context: PathBuf,

        /// Symbol used in the explanation
        #[arg(short, long, default_value = "SPY")]
        symbol: String,

        /// Scoring strategy: ltp-v2 or legacy-v1
        #[arg(long, default_value = "ltp-v2")]
        strategy: ScoringStrategy,

        /// Key levels JSON (used by legacy-v1)
        #[arg(long)]
        levels: Option<PathBuf>,

        /// Multi-timeframe analyses JSON (used by legacy-v1)
        #[arg(long)]
        mtf: Option<PathBuf>,

        /// Previous hysteresis state JSON
        #[arg(long)]
        state: Option<PathBuf>,

        /// Write the next hysteresis state here
        #[arg(long)]
        state_out: Option<PathBuf>,
    },

    /// Identify key levels and trend from a bars CSV
    Levels {
        /// CSV with timestamp,open,high,low,close,volume
        bars: PathBuf,

        /// Timeframe label attached to each level
        #[arg(short, long, default_value = "5m")]
        timeframe: String,
    },

    /// Legacy v1 letter grade from its three inputs (0-100 each)
    Legacy {
        #[arg(long)]
        level: f64,

        #[arg(long)]
        trend: f64,

        #[arg(long)]
        patience: f64,
    },

    /// Score a list of symbol inputs (JSON or .json.zst) in parallel
    Batch {
        /// Symbol inputs file
        input: PathBuf,

        /// Output file (.json or .json.zst); stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective scoring config
    Config,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let directive = if args.verbose { "ltp_scoring=debug" } else { "ltp_scoring=info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = input::load_config(args.config.as_deref())?;

    match args.command {
        Commands::Score { context, symbol, strategy, levels, mtf, state, state_out } => {
            let ctx: MarketContext = input::read_json(&context)?;
            let previous: Option<ScoreHysteresisState> = state.as_deref().map(input::read_json::<ScoreHysteresisState>).transpose()?;
            let levels: Vec<KeyLevel> = levels.as_deref().map(input::read_json::<Vec<KeyLevel>>).transpose()?.unwrap_or_default();
            let mtf: Vec<MtfAnalysis> = mtf.as_deref().map(input::read_json::<Vec<MtfAnalysis>>).transpose()?.unwrap_or_default();

            let scorer = ScorerFactory::create(strategy, config.clone());
            let request = ScoreRequest {
                symbol: &symbol,
                context: &ctx,
                levels: &levels,
                mtf: &mtf,
                previous_state: previous.as_ref(),
            };
            let result = scorer.score(&request);
            info!("{} {}: {} ({:.1})", symbol, scorer.name(), result.label(), result.value());

            match &result {
                StrategyScore::LtpV2(evaluation) => {
                    let explanation = explain_score(&symbol, &ctx, &evaluation.score);
                    info!(
                        "{} {} (confidence {:.0})",
                        symbol, evaluation.score.direction, evaluation.score.confidence
                    );

                    if let Some(path) = state_out.as_deref() {
                        input::write_json(&evaluation.next_state, Some(path))?;
                    }
                    input::write_json(
                        &json!({
                            "score": evaluation.score,
                            "explanation": explanation,
                            "nextState": evaluation.next_state,
                        }),
                        None,
                    )?;
                }
                StrategyScore::LegacyV1(_) => {
                    if state_out.is_some() {
                        warn!("{} keeps no hysteresis state; --state-out ignored", strategy);
                    }
                    input::write_json(&result, None)?;
                }
            }
        }
        Commands::Levels { bars, timeframe } => {
            let bars = input::load_bars_csv(&bars)?;
            let levels = identify_key_levels(&bars, &timeframe, &config.levels);
            let trend = determine_trend(&bars, &config.trend);
            info!("{} levels, trend {}", levels.len(), trend);
            input::write_json(&json!({ "trend": trend, "levels": levels }), None)?;
        }
        Commands::Legacy { level, trend, patience } => {
            let score = calculate_legacy_score(level, trend, patience, &config.legacy);
            info!("Legacy grade {} ({:.1})", score.grade, score.overall);
            input::write_json(&score, None)?;
        }
        Commands::Batch { input: path, output } => {
            let inputs: Vec<SymbolInput> = input::read_json(&path)?;
            info!("Scoring {} symbols from {:?}", inputs.len(), path);

            let results = score_batch(&inputs, &config, Utc::now());
            let mut reports = Vec::with_capacity(results.len());
            let mut failed = 0usize;
            for result in results {
                match result {
                    Ok(report) => reports.push(report),
                    Err(e) => {
                        warn!("{}", e);
                        failed += 1;
                    }
                }
            }
            info!("Scored {} symbols ({} skipped)", reports.len(), failed);

            input::write_json(&reports, output.as_deref()).context("Failed to write batch reports")?;
        }
        Commands::Config => {
            input::write_json(&config, None)?;
        }
    }

    Ok(())
}
