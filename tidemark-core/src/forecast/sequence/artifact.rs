//! Trained-artifact store.
//!
//! Layout: `{dir}/{ticker}_w{window}_model.json` plus a normalizer sidecar
//! and a metadata sidecar. Writes are atomic (write to .tmp, rename into
//! place). An advisory `.training` marker prevents two callers from racing
//! the same artifact: the loser observes `TrainingInProgress` and may serve
//! the stale artifact instead. Stale markers are reclaimed after an hour.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::super::ForecastError;
use super::network::SequenceNetwork;
use super::scaler::MinMaxScaler;

const STALE_LOCK_SECS: u64 = 3600;

/// Metadata sidecar for a trained artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub ticker: String,
    pub window: usize,
    pub hidden: usize,
    /// Content hash of the normalized training window.
    pub data_hash: String,
    pub trained_at: NaiveDateTime,
}

/// File-presence-based artifact cache: no TTL, no invalidation — a stale
/// artifact is served until an explicit retrain overwrites it.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn stem(&self, ticker: &str, window: usize) -> String {
        let safe: String = ticker
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        format!("{safe}_w{window}")
    }

    fn model_path(&self, ticker: &str, window: usize) -> PathBuf {
        self.dir.join(format!("{}_model.json", self.stem(ticker, window)))
    }

    fn scaler_path(&self, ticker: &str, window: usize) -> PathBuf {
        self.dir.join(format!("{}_scaler.json", self.stem(ticker, window)))
    }

    fn meta_path(&self, ticker: &str, window: usize) -> PathBuf {
        self.dir.join(format!("{}_meta.json", self.stem(ticker, window)))
    }

    fn lock_path(&self, ticker: &str, window: usize) -> PathBuf {
        self.dir.join(format!("{}.training", self.stem(ticker, window)))
    }

    /// Whether a complete artifact (model + normalizer) exists on disk.
    pub fn has(&self, ticker: &str, window: usize) -> bool {
        self.model_path(ticker, window).exists() && self.scaler_path(ticker, window).exists()
    }

    /// Persist the artifact atomically, overwriting any previous one.
    pub fn save(
        &self,
        ticker: &str,
        window: usize,
        network: &SequenceNetwork,
        scaler: &MinMaxScaler,
        meta: &ArtifactMeta,
    ) -> Result<(), ForecastError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| ForecastError::Artifact(format!("create dir: {e}")))?;

        write_atomic(&self.model_path(ticker, window), network)?;
        write_atomic(&self.scaler_path(ticker, window), scaler)?;
        write_atomic(&self.meta_path(ticker, window), meta)?;
        Ok(())
    }

    pub fn load(
        &self,
        ticker: &str,
        window: usize,
    ) -> Result<(SequenceNetwork, MinMaxScaler), ForecastError> {
        let network = read_json(&self.model_path(ticker, window))?;
        let scaler = read_json(&self.scaler_path(ticker, window))?;
        Ok((network, scaler))
    }

    pub fn meta(&self, ticker: &str, window: usize) -> Option<ArtifactMeta> {
        read_json(&self.meta_path(ticker, window)).ok()
    }

    /// Acquire the advisory training lock. The returned guard removes the
    /// marker when dropped. A fresh marker held elsewhere yields
    /// `TrainingInProgress`; a marker older than an hour is reclaimed.
    pub fn acquire_training_lock(
        &self,
        ticker: &str,
        window: usize,
    ) -> Result<TrainingGuard, ForecastError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| ForecastError::Artifact(format!("create dir: {e}")))?;
        let path = self.lock_path(ticker, window);

        if let Ok(metadata) = fs::metadata(&path) {
            let stale = metadata
                .modified()
                .ok()
                .and_then(|m| m.elapsed().ok())
                .is_some_and(|age| age.as_secs() > STALE_LOCK_SECS);
            if !stale {
                return Err(ForecastError::TrainingInProgress {
                    ticker: ticker.to_string(),
                });
            }
            let _ = fs::remove_file(&path);
        }

        fs::write(&path, b"training")
            .map_err(|e| ForecastError::Artifact(format!("lock write: {e}")))?;
        Ok(TrainingGuard { path })
    }
}

/// Holds the training marker for the duration of one training run.
#[derive(Debug)]
pub struct TrainingGuard {
    path: PathBuf,
}

impl Drop for TrainingGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), ForecastError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| ForecastError::Artifact(format!("serialize: {e}")))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| ForecastError::Artifact(format!("write: {e}")))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        ForecastError::Artifact(format!("atomic rename: {e}"))
    })
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ForecastError> {
    let content =
        fs::read_to_string(path).map_err(|e| ForecastError::Artifact(format!("read: {e}")))?;
    serde_json::from_str(&content)
        .map_err(|e| ForecastError::Artifact(format!("deserialize: {e}")))
}

/// Content hash of a training window, stored in the metadata sidecar.
pub fn hash_training_window(values: &[f64]) -> String {
    let mut bytes = Vec::with_capacity(values.len() * 8);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    blake3::hash(&bytes).to_hex().to_string()
}
