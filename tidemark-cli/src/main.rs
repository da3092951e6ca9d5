//! Tidemark CLI — analyze and train commands over CSV candle files.
//!
//! Commands:
//! - `analyze` — run the full pipeline for one ticker and print the report
//! - `train` — (re)train the sequence-model artifact for one ticker
//! - `history` — show artifact metadata for a ticker

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use tidemark_core::config::EngineConfig;
use tidemark_core::data::{CandleProvider, DataError, NarrativeGenerator, TemplateNarrative};
use tidemark_core::domain::{Candle, CandleSeries, Timeframe};
use tidemark_core::forecast::sequence::{ArtifactStore, SequenceForecaster};
use tidemark_core::pipeline::{AnalysisReport, Analyzer};

#[derive(Parser)]
#[command(
    name = "tidemark",
    about = "Tidemark CLI — forecast-blending trading signals"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis pipeline for one ticker.
    Analyze {
        /// Ticker symbol (e.g., SOL-USD, WEGE3).
        ticker: String,

        /// Candle interval (15min, 30min, 45min, 1h, 2h, 6h, 1d, 1wk, 1mo).
        #[arg(long, default_value = "1d")]
        interval: String,

        /// Requested lookback period label (e.g., 5d, 1d, 4h).
        #[arg(long, default_value = "5d")]
        period: String,

        /// CSV candle file: ts,open,high,low,close,volume.
        #[arg(long)]
        data: PathBuf,

        /// Optional TOML engine configuration.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Artifact directory for trained sequence models.
        #[arg(long, default_value = "artifacts")]
        artifact_dir: PathBuf,

        /// Append fit metrics to this CSV journal.
        #[arg(long)]
        metrics: Option<PathBuf>,

        /// Print the full report as JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Train (or retrain) the sequence-model artifact for one ticker.
    Train {
        /// Ticker symbol.
        ticker: String,

        /// CSV candle file: ts,open,high,low,close,volume.
        #[arg(long)]
        data: PathBuf,

        /// Optional TOML engine configuration.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Artifact directory for trained sequence models.
        #[arg(long, default_value = "artifacts")]
        artifact_dir: PathBuf,
    },
    /// Show artifact metadata for a ticker.
    History {
        /// Ticker symbol.
        ticker: String,

        /// Artifact directory for trained sequence models.
        #[arg(long, default_value = "artifacts")]
        artifact_dir: PathBuf,

        /// Optional TOML engine configuration (for the window length).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Candle provider backed by a single CSV file.
struct CsvCandleProvider {
    path: PathBuf,
}

impl CandleProvider for CsvCandleProvider {
    fn name(&self) -> &str {
        "csv-file"
    }

    fn fetch(
        &self,
        ticker: &str,
        _timeframe: Timeframe,
        _period: &str,
    ) -> Result<CandleSeries, DataError> {
        let mut reader = csv::Reader::from_path(&self.path)
            .map_err(|e| DataError::Unavailable(format!("{}: {e}", self.path.display())))?;
        let mut candles = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| DataError::Unavailable(e.to_string()))?;
            let ts = row
                .get(0)
                .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok())
                .ok_or_else(|| DataError::Unavailable("bad timestamp column".into()))?;
            let number = |i: usize| row.get(i).and_then(|s| s.trim().parse::<f64>().ok());
            let (Some(open), Some(high), Some(low), Some(close)) =
                (number(1), number(2), number(3), number(4))
            else {
                return Err(DataError::Unavailable("bad price column".into()));
            };
            candles.push(Candle {
                ts,
                open,
                high,
                low,
                close,
                volume: number(5),
            });
        }
        if candles.is_empty() {
            return Err(DataError::EmptySeries {
                ticker: ticker.to_string(),
            });
        }
        CandleSeries::new(candles).map_err(|e| DataError::Unavailable(e.to_string()))
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn parse_timeframe(text: &str) -> Result<Timeframe> {
    match text.parse::<Timeframe>() {
        Ok(tf) => Ok(tf),
        Err(e) => bail!(e),
    }
}

fn print_report(report: &AnalysisReport) {
    println!("== {} ({} / {}) ==", report.ticker, report.timeframe, report.period);
    println!("price: {:.2}   score: {:+.2}", report.price, report.score);
    println!(
        "models: {}   consensus: {}",
        report.reconciliation.agreement.label(),
        report
            .reconciliation
            .weighted_mean
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "n/a".into())
    );

    let rec = &report.recommendation;
    println!(
        "call: {:?} [{}] confidence {:?}",
        rec.direction,
        rec.context.describe(),
        rec.confidence
    );
    if let Some(levels) = &rec.levels {
        println!(
            "levels: entry {:.2}  tp {:.2} / {:.2} / {:.2}  stop {:.2}",
            rec.entry, levels.tp1, levels.tp2, levels.tp3, levels.stop
        );
    }
    println!("rationale: {}", rec.rationale);
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    match TemplateNarrative.generate(report) {
        Ok(text) => println!("\n{text}"),
        Err(e) => println!("narrative unavailable: {e}"),
    }
}

/// Append one metrics row per run, creating the journal with a header on
/// first use.
fn append_metrics(path: &Path, report: &AnalysisReport) -> Result<()> {
    let new_file = !path.exists();
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening metrics journal {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    if new_file {
        writer.write_record([
            "ticker",
            "timeframe",
            "period",
            "price",
            "score",
            "direction",
            "confidence",
            "best_scale",
        ])?;
    }
    writer.write_record([
        report.ticker.clone(),
        report.timeframe.to_string(),
        report.period.clone(),
        format!("{:.2}", report.price),
        format!("{:.2}", report.score),
        format!("{:?}", report.recommendation.direction),
        format!("{:?}", report.recommendation.confidence),
        report
            .fit
            .as_ref()
            .map(|f| format!("{}", f.best_flexibility))
            .unwrap_or_default(),
    ])?;
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            ticker,
            interval,
            period,
            data,
            config,
            artifact_dir,
            metrics,
            json,
        } => {
            let timeframe = parse_timeframe(&interval)?;
            let cfg = load_config(config.as_ref())?;
            let provider = CsvCandleProvider { path: data };
            let analyzer = Analyzer::new(&provider, ArtifactStore::new(artifact_dir), cfg);

            let report = analyzer.run(&ticker, timeframe, &period)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            if let Some(path) = metrics {
                append_metrics(&path, &report)?;
            }
            Ok(())
        }
        Commands::Train {
            ticker,
            data,
            config,
            artifact_dir,
        } => {
            let cfg = load_config(config.as_ref())?;
            let provider = CsvCandleProvider { path: data };
            let series = provider.fetch(&ticker, Timeframe::D1, "train")?;

            let mut forecaster = SequenceForecaster::new(
                &ticker,
                cfg.sequence.window,
                cfg.sequence.network,
                ArtifactStore::new(artifact_dir),
            );
            forecaster.load_training_data(&series)?;
            forecaster.train()?;
            println!("trained artifact for {ticker} (window {})", cfg.sequence.window);
            Ok(())
        }
        Commands::History {
            ticker,
            artifact_dir,
            config,
        } => {
            let cfg = load_config(config.as_ref())?;
            let store = ArtifactStore::new(artifact_dir);
            match store.meta(&ticker, cfg.sequence.window) {
                Some(meta) => {
                    println!(
                        "{}: window {} hidden {} trained {} hash {}",
                        meta.ticker,
                        meta.window,
                        meta.hidden,
                        meta.trained_at,
                        &meta.data_hash[..16.min(meta.data_hash.len())]
                    );
                }
                None => println!("no artifact for {ticker}"),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, rows: usize) -> PathBuf {
        let path = dir.join("candles.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "ts,open,high,low,close,volume").unwrap();
        for i in 0..rows {
            let close = 100.0 + (i as f64 * 0.3).sin() * 3.0;
            writeln!(
                file,
                "2024-01-{:02} {:02}:00:00,{:.2},{:.2},{:.2},{:.2},{}",
                1 + i / 24,
                i % 24,
                close,
                close + 1.0,
                close - 1.0,
                close,
                1000 + i
            )
            .unwrap();
        }
        path
    }

    #[test]
    fn csv_provider_parses_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), 48);
        let provider = CsvCandleProvider { path };
        let series = provider.fetch("WEGE3", Timeframe::H1, "5d").unwrap();
        assert_eq!(series.len(), 48);
        assert!(series.last_close().is_some());
    }

    #[test]
    fn csv_provider_rejects_missing_file() {
        let provider = CsvCandleProvider {
            path: PathBuf::from("/nonexistent/candles.csv"),
        };
        assert!(provider.fetch("WEGE3", Timeframe::H1, "5d").is_err());
    }

    #[test]
    fn metrics_journal_appends_with_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = write_csv(dir.path(), 60);
        let provider = CsvCandleProvider { path: csv_path };
        let mut cfg = EngineConfig::default();
        cfg.sequence.window = 8;
        cfg.sequence.network.hidden = 4;
        cfg.sequence.network.epochs = 1;
        cfg.horizon_units = 1;
        let analyzer = Analyzer::new(
            &provider,
            ArtifactStore::new(dir.path().join("artifacts")),
            cfg,
        );
        let report = analyzer.run("WEGE3", Timeframe::H1, "5d").unwrap();

        let journal = dir.path().join("metrics.csv");
        append_metrics(&journal, &report).unwrap();
        append_metrics(&journal, &report).unwrap();

        let content = std::fs::read_to_string(&journal).unwrap();
        let headers = content.lines().filter(|l| l.starts_with("ticker")).count();
        assert_eq!(headers, 1);
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn timeframe_parse_errors_are_reported() {
        assert!(parse_timeframe("1h").is_ok());
        assert!(parse_timeframe("90min").is_err());
    }
}
