//! Live tuning sources
//!
//! A tuning source is polled by LatCtrl at a fixed cadence and may request
//! that the controller gains and deadzone are overridden at runtime. Sources
//! never fail: if the tuning can't be read they return a no-op payload, and
//! the controller keeps its current gains.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of live tuning values.
pub trait TuningSource {
    /// Get the current tuning.
    ///
    /// This is called from the control loop so it must complete in a short,
    /// bounded time. On any failure a payload with `apply_override = false`
    /// shall be returned.
    fn fetch(&mut self) -> TuningPayload;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tuning values supplied by a tuning source.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningPayload {
    /// If true the values below replace the controller's current gains.
    pub apply_override: bool,

    /// Proportional gain, applied at all speeds
    pub k_p: f64,

    /// Integral gain, applied at all speeds
    pub k_i: f64,

    /// Feedforward gain
    pub k_f: f64,

    /// Error deadzone.
    ///
    /// Units: degrees
    pub deadzone_deg: f64,
}

/// A tuning source which never overrides the controller.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoTuning;

/// A tuning source which always returns the same payload.
#[derive(Debug, Default, Clone)]
pub struct StaticTuning {
    payload: TuningPayload,

    /// Number of times the source has been fetched
    num_fetches: u64,
}

/// A tuning source backed by a JSON file, which is re-read on every fetch so
/// that it can be edited while the controller is running.
#[derive(Debug, Clone)]
pub struct FileTuningSource {
    path: PathBuf,

    /// True if the last read failed, used to avoid repeating warnings.
    last_read_failed: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while reading a tuning file.
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("Cannot read the tuning file {0:?}: {1}")]
    ReadError(PathBuf, std::io::Error),

    #[error("Cannot parse the tuning file {0:?}: {1}")]
    ParseError(PathBuf, serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TuningPayload {
    /// A payload which doesn't override anything.
    pub fn no_op() -> Self {
        Self::default()
    }
}

impl TuningSource for NoTuning {
    fn fetch(&mut self) -> TuningPayload {
        TuningPayload::no_op()
    }
}

impl StaticTuning {
    pub fn new(payload: TuningPayload) -> Self {
        Self {
            payload,
            num_fetches: 0,
        }
    }

    /// Number of times this source has been fetched.
    pub fn num_fetches(&self) -> u64 {
        self.num_fetches
    }
}

impl TuningSource for StaticTuning {
    fn fetch(&mut self) -> TuningPayload {
        self.num_fetches += 1;
        self.payload
    }
}

impl FileTuningSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            last_read_failed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the tuning file.
    pub fn read(&self) -> Result<TuningPayload, TuningError> {
        let s = read_to_string(&self.path)
            .map_err(|e| TuningError::ReadError(self.path.clone(), e))?;

        serde_json::from_str(&s).map_err(|e| TuningError::ParseError(self.path.clone(), e))
    }
}

impl TuningSource for FileTuningSource {
    fn fetch(&mut self) -> TuningPayload {
        match self.read() {
            Ok(p) => {
                self.last_read_failed = false;
                p
            }
            Err(e) => {
                if self.last_read_failed {
                    debug!("{}", e);
                } else {
                    warn!("{}, keeping current tuning", e);
                }
                self.last_read_failed = true;

                TuningPayload::no_op()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("lat_tuning_{}_{}.json", name, std::process::id()));
        path
    }

    #[test]
    fn test_file_source() {
        let path = temp_path("valid");
        std::fs::write(
            &path,
            r#"{"apply_override": true, "k_p": 0.3, "k_i": 0.1, "k_f": 0.00005, "deadzone_deg": 0.5}"#,
        )
        .unwrap();

        let mut src = FileTuningSource::new(&path);
        let payload = src.fetch();

        assert_eq!(
            payload,
            TuningPayload {
                apply_override: true,
                k_p: 0.3,
                k_i: 0.1,
                k_f: 0.00005,
                deadzone_deg: 0.5
            }
        );

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_source_missing() {
        let mut src = FileTuningSource::new(temp_path("missing"));

        assert!(src.read().is_err());
        assert_eq!(src.fetch(), TuningPayload::no_op());
        assert_eq!(src.fetch(), TuningPayload::no_op());
    }

    #[test]
    fn test_file_source_malformed() {
        let path = temp_path("malformed");
        std::fs::write(&path, r#"{"apply_override": true, "k_p": "#).unwrap();

        let mut src = FileTuningSource::new(&path);
        assert!(matches!(src.read(), Err(TuningError::ParseError(_, _))));
        assert!(!src.fetch().apply_override);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_static_source() {
        let payload = TuningPayload {
            apply_override: true,
            k_p: 1.0,
            ..Default::default()
        };
        let mut src = StaticTuning::new(payload);

        assert_eq!(src.fetch(), payload);
        assert_eq!(src.fetch(), payload);
        assert_eq!(src.num_fetches(), 2);

        assert_eq!(NoTuning.fetch(), TuningPayload::no_op());
    }
}
