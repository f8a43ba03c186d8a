use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use fuelmap_core::{AggregateResult, StationRecord};

use crate::error::CacheError;

/// Persisted cache slot contents.
///
/// Serialized as `{"timestamp": <epoch-ms>, "data": [...], "totalStations": n}`.
/// There is no version field; an envelope that no longer parses is a miss.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEnvelope {
    pub timestamp: i64,
    pub data: AggregateResult,
    pub total_stations: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeRef<'a> {
    timestamp: i64,
    data: &'a [StationRecord],
    total_stations: usize,
}

/// File-backed single-slot cache with a staleness threshold.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
    duration_ms: i64,
}

impl CacheStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, duration_ms: i64) -> Self {
        Self {
            path: path.into(),
            duration_ms,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the slot if it is present, parseable and fresh at the current time.
    #[must_use]
    pub fn load(&self) -> Option<CacheEnvelope> {
        self.load_at(now_ms())
    }

    /// Load the slot as of `now_ms`.
    ///
    /// Returns `None` when the slot is missing, unreadable, corrupt, or
    /// `now_ms - timestamp >= duration`. None of these is an error.
    #[must_use]
    pub fn load_at(&self, now_ms: i64) -> Option<CacheEnvelope> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no cache slot");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read cache slot");
                return None;
            }
        };

        let envelope: CacheEnvelope = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "cache slot is corrupt, treating as miss"
                );
                return None;
            }
        };

        let age_ms = now_ms.saturating_sub(envelope.timestamp);
        if age_ms >= self.duration_ms {
            tracing::info!(age_ms, duration_ms = self.duration_ms, "cache slot is stale");
            return None;
        }

        tracing::info!(
            stations = envelope.data.len(),
            age_ms,
            "using cached stations"
        );
        Some(envelope)
    }

    /// Store `stations` stamped with the current time.
    ///
    /// # Errors
    ///
    /// See [`CacheStore::save_at`].
    pub fn save(&self, stations: &[StationRecord]) -> Result<(), CacheError> {
        self.save_at(stations, now_ms())
    }

    /// Replace the slot with `stations` stamped `now_ms`.
    ///
    /// Parent directories are created as needed and the slot is replaced
    /// atomically: a uniquely named temp file is written beside it and
    /// renamed over it, so concurrent writers never share a temp file.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the directory, temp file or rename fails,
    /// and [`CacheError::Serialize`] if the envelope cannot be encoded.
    pub fn save_at(&self, stations: &[StationRecord], now_ms: i64) -> Result<(), CacheError> {
        let envelope = EnvelopeRef {
            timestamp: now_ms,
            data: stations,
            total_stations: stations.len(),
        };
        let body = serde_json::to_vec(&envelope)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let tmp = temp_path(&self.path);
        if let Err(e) = std::fs::write(&tmp, body) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_error(&tmp, e));
        }
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_error(&self.path, e));
        }

        tracing::debug!(
            path = %self.path.display(),
            stations = stations.len(),
            "cache slot written"
        );
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// `<slot>.<random>.tmp` beside the slot.
fn temp_path(slot: &Path) -> PathBuf {
    let mut name = slot.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{:016x}.tmp", rand::random::<u64>()));
    slot.with_file_name(name)
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
