//! Network and replication parameters, with validation and TOML loading.
//!
//! ```toml
//! [network]
//! horizon = { until = 5000.0 }
//! arrival_rate = 0.142857
//! service_rates = [0.25, 0.5, 1.0]
//! feedback = [0.0, 0.1, 0.0]
//!
//! [replication]
//! min_replications = 20
//! max_replications = 500
//! convergence_threshold = 0.005
//! seed = 7
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// When a run stops admitting external arrivals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    /// Admit external arrivals strictly before this time.
    Until(f64),
    /// Never stop on time; only an admission limit ends the run.
    Unbounded,
}

impl Horizon {
    /// Whether an arrival at `time` falls inside the horizon.
    pub fn admits(&self, time: f64) -> bool {
        match self {
            Horizon::Until(limit) => time < *limit,
            Horizon::Unbounded => true,
        }
    }

    /// Whether the clock has reached the horizon.
    pub fn reached(&self, time: f64) -> bool {
        !self.admits(time)
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Horizon::Until(5000.0)
    }
}

/// Parameters of a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub horizon: Horizon,
    /// Rate of the external Poisson arrival process feeding station 0.
    pub arrival_rate: f64,
    /// Exponential service rate of each station; its length is the station count.
    pub service_rates: Vec<f64>,
    /// Probability of routing backward after each station. Entry 0 is ignored, as is the last entry since clients
    /// leaving the last station exit the network. Empty means no feedback anywhere.
    #[serde(default)]
    pub feedback: Vec<f64>,
    /// Keep dispatching past the horizon until every admitted client has left.
    #[serde(default)]
    pub drain: bool,
    /// Stop admitting external arrivals once this many clients have been created.
    #[serde(default)]
    pub max_admissions: Option<u64>,
}

impl NetworkConfig {
    /// A feedback-free network with the default horizon that does not drain.
    pub fn new(arrival_rate: f64, service_rates: Vec<f64>) -> Self {
        Self {
            horizon: Horizon::default(),
            arrival_rate,
            service_rates,
            feedback: Vec::new(),
            drain: false,
            max_admissions: None,
        }
    }

    pub fn with_horizon(mut self, horizon: Horizon) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_feedback(mut self, feedback: Vec<f64>) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn draining(mut self, drain: bool) -> Self {
        self.drain = drain;
        self
    }

    pub fn with_max_admissions(mut self, limit: u64) -> Self {
        self.max_admissions = Some(limit);
        self
    }

    /// Number of stations in the network.
    pub fn stations(&self) -> usize {
        self.service_rates.len()
    }

    /// Feedback probability after `station`, zero when none was configured.
    pub fn feedback_at(&self, station: usize) -> f64 {
        self.feedback.get(station).copied().unwrap_or(0.0)
    }

    /// Check every parameter before anything is scheduled.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let stations = self.stations();
        if stations == 0 {
            return Err(ConfigError::NoStations);
        }

        check_rate("arrival rate".to_string(), self.arrival_rate)?;
        for (station, rate) in self.service_rates.iter().enumerate() {
            check_rate(format!("service rate of station {station}"), *rate)?;
        }

        if !self.feedback.is_empty() && self.feedback.len() != stations {
            return Err(ConfigError::LengthMismatch {
                field: "feedback",
                expected: stations,
                found: self.feedback.len(),
            });
        }
        for (station, p) in self.feedback.iter().enumerate() {
            if !(0.0..=1.0).contains(p) {
                return Err(ConfigError::FeedbackOutOfRange { station, value: *p });
            }
            // a client leaving a middle station with certain feedback never reaches the last one
            let middle = station > 0 && station + 1 < stations;
            if middle && *p == 1.0 && self.runs_until_empty() {
                return Err(ConfigError::CertainFeedback { station });
            }
        }

        match self.horizon {
            Horizon::Until(limit) if limit.is_nan() || limit < 0.0 => Err(ConfigError::InvalidHorizon(limit)),
            Horizon::Until(limit) if limit.is_infinite() && self.max_admissions.is_none() => {
                Err(ConfigError::UnboundedRun)
            }
            Horizon::Unbounded if self.max_admissions.is_none() => Err(ConfigError::UnboundedRun),
            _ => Ok(()),
        }
    }
}

impl NetworkConfig {
    /// Whether only an empty schedule ends the run, because it drains or because no finite horizon stops it.
    fn runs_until_empty(&self) -> bool {
        self.drain || !matches!(self.horizon, Horizon::Until(limit) if limit.is_finite())
    }
}

fn check_rate(which: String, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveRate { which, value })
    }
}

/// Parameters of the replication controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    #[serde(default = "default_min_replications")]
    pub min_replications: usize,
    #[serde(default = "default_max_replications")]
    pub max_replications: usize,
    /// Largest tolerated ratio of the standard deviation of run-level system times to their count.
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f64,
    /// Master seed; each replication derives its own stream from it. Drawn from the OS when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Run replications in parallel batches on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
}

fn default_min_replications() -> usize {
    10
}

fn default_max_replications() -> usize {
    1000
}

fn default_convergence_threshold() -> f64 {
    0.01
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            min_replications: default_min_replications(),
            max_replications: default_max_replications(),
            convergence_threshold: default_convergence_threshold(),
            seed: None,
            parallel: false,
        }
    }
}

impl ReplicationConfig {
    pub fn with_bounds(mut self, min: usize, max: usize) -> Self {
        self.min_replications = min;
        self.max_replications = max;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// # Errors
    ///
    /// Rejects a zero minimum, a maximum below the minimum, and thresholds that are not positive and finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_replications == 0 || self.max_replications < self.min_replications {
            return Err(ConfigError::ReplicationBounds {
                min: self.min_replications,
                max: self.max_replications,
            });
        }
        if !(self.convergence_threshold.is_finite() && self.convergence_threshold > 0.0) {
            return Err(ConfigError::NonPositiveThreshold(self.convergence_threshold));
        }
        Ok(())
    }
}

/// A network together with how to estimate its metrics; the shape of a TOML study file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyConfig {
    pub network: NetworkConfig,
    #[serde(default)]
    pub replication: ReplicationConfig,
}

impl StudyConfig {
    /// Parse and validate a study from TOML text.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML or on any parameter [`validate`](NetworkConfig::validate) rejects.
    pub fn from_toml_str(text: &str) -> crate::Result<Self> {
        let study: StudyConfig = toml::from_str(text)?;
        study.network.validate()?;
        study.replication.validate()?;
        Ok(study)
    }

    /// Read a study file from disk.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, plus everything [`from_toml_str`](StudyConfig::from_toml_str) rejects.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
