//! Monte-Carlo replication of drained runs until the run-level system time stabilises.
//!
//! Each replication contributes one run-level average per metric. The controller reports the mean and the variance of
//! those averages, which describe how stable the estimate is, not how spread out individual clients are within a run.

use crate::config::{NetworkConfig, ReplicationConfig};
use crate::metrics::{mean, summarize, RunSummary};
use crate::model::{simulate, ExponentialVariates};
use crate::Result;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Mean and population variance of a sequence of run-level averages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub mean: f64,
    pub variance: f64,
}

impl Estimate {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let mean = mean(samples.iter().copied())?;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;
        Some(Self { mean, variance })
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }
}

/// Whether the stopping rule was met, with the last observed ratio of standard deviation to sample count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Convergence {
    Converged { ratio: f64 },
    /// The maximum replication count was reached first. Estimates are still reported.
    Unconverged { ratio: Option<f64> },
}

impl Convergence {
    pub fn is_converged(&self) -> bool {
        matches!(self, Convergence::Converged { .. })
    }
}

/// Run-level averages collected so far, one sequence per metric.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    wait: Vec<f64>,
    service: Vec<f64>,
    system: Vec<f64>,
}

impl Accumulator {
    /// Append a run's averages. A metric the run could not define is skipped rather than recorded as zero.
    pub fn fold(&mut self, summary: &RunSummary) {
        self.wait.extend(summary.mean_wait());
        self.service.extend(summary.mean_service());
        self.system.extend(summary.mean_system_time());
    }

    /// `std_dev(system) / len(system)`, or `None` before any run defined a system time.
    pub fn convergence_ratio(&self) -> Option<f64> {
        let estimate = Estimate::from_samples(&self.system)?;
        Some(estimate.std_dev() / self.system.len() as f64)
    }

    pub fn wait(&self) -> &[f64] {
        &self.wait
    }

    pub fn service(&self) -> &[f64] {
        &self.service
    }

    pub fn system(&self) -> &[f64] {
        &self.system
    }
}

/// Outcome of an estimation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicationReport {
    pub wait: Option<Estimate>,
    pub service: Option<Estimate>,
    pub system: Option<Estimate>,
    pub replications: usize,
    pub convergence: Convergence,
}

/// Runs independent, drained replications of one network.
#[derive(Debug, Clone)]
pub struct ReplicationController {
    network: NetworkConfig,
    config: ReplicationConfig,
}

impl ReplicationController {
    /// Every replication drains to completion regardless of `network.drain`.
    ///
    /// # Errors
    ///
    /// [`Error::Config`](crate::Error::Config) if either configuration is invalid.
    pub fn new(network: NetworkConfig, config: ReplicationConfig) -> Result<Self> {
        let network = network.draining(true);
        network.validate()?;
        config.validate()?;
        Ok(Self { network, config })
    }

    /// Run and summarise a single replication with its own seeded stream.
    ///
    /// # Errors
    ///
    /// Propagates any failure of the run.
    pub fn replicate(&self, seed: u64) -> Result<RunSummary> {
        let variates = ExponentialVariates::seeded(&self.network, seed)?;
        let outcome = simulate(&self.network, variates)?;
        Ok(summarize(&outcome))
    }

    /// Decide whether to stop after `completed` replications.
    fn verdict(&self, accumulator: &Accumulator, completed: usize) -> Option<Convergence> {
        let ratio = accumulator.convergence_ratio();
        if completed >= self.config.min_replications {
            if let Some(ratio) = ratio.filter(|r| *r < self.config.convergence_threshold) {
                return Some(Convergence::Converged { ratio });
            }
        }
        (completed >= self.config.max_replications).then_some(Convergence::Unconverged { ratio })
    }

    /// Replicate until the stopping rule fires.
    ///
    /// Seeds for every replication come from one master stream in replication order, and results are folded in that
    /// same order, so a parallel estimation reports exactly what a sequential one with the same seed would.
    ///
    /// # Errors
    ///
    /// The first failing replication aborts the estimation.
    pub fn run(&self) -> Result<ReplicationReport> {
        let mut master = match self.config.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_rng(&mut rand::rng()),
        };
        let batch_size = if self.config.parallel {
            rayon::current_num_threads().max(1)
        } else {
            1
        };
        info!(
            stations = self.network.stations(),
            min = self.config.min_replications,
            max = self.config.max_replications,
            threshold = self.config.convergence_threshold,
            batch_size,
            "starting replications"
        );

        let mut accumulator = Accumulator::default();
        let mut completed = 0;
        loop {
            let batch = batch_size.min(self.config.max_replications - completed);
            let seeds: Vec<u64> = (0..batch).map(|_| master.random()).collect();
            let summaries: Vec<Result<RunSummary>> = if self.config.parallel {
                seeds.par_iter().map(|seed| self.replicate(*seed)).collect()
            } else {
                seeds.iter().map(|seed| self.replicate(*seed)).collect()
            };

            for summary in summaries {
                accumulator.fold(&summary?);
                completed += 1;
                debug!(completed, ratio = ?accumulator.convergence_ratio(), "replication folded");

                if let Some(convergence) = self.verdict(&accumulator, completed) {
                    return Ok(Self::report(&accumulator, completed, convergence));
                }
            }
        }
    }

    fn report(accumulator: &Accumulator, replications: usize, convergence: Convergence) -> ReplicationReport {
        let report = ReplicationReport {
            wait: Estimate::from_samples(accumulator.wait()),
            service: Estimate::from_samples(accumulator.service()),
            system: Estimate::from_samples(accumulator.system()),
            replications,
            convergence,
        };

        match convergence {
            Convergence::Converged { ratio } => info!(replications, ratio, "estimates converged"),
            Convergence::Unconverged { ratio } => warn!(
                replications,
                ratio = ?ratio,
                "replication limit reached before convergence; estimates are unconverged"
            ),
        }
        report
    }
}

/// Estimate a network's metrics with a fresh [`ReplicationController`].
///
/// # Errors
///
/// See [`ReplicationController::new`] and [`ReplicationController::run`].
pub fn estimate(network: NetworkConfig, config: ReplicationConfig) -> Result<ReplicationReport> {
    ReplicationController::new(network, config)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Horizon;
    use crate::metrics::StationStats;
    use crate::model::ClientId;
    use crate::Error;
    use std::collections::BTreeMap;

    fn summary(wait: f64, service: f64, system: Option<f64>) -> RunSummary {
        RunSummary {
            stations: vec![StationStats {
                station: 0,
                clients: 1,
                mean_wait: Some(wait),
                mean_service: Some(service),
                served: 1,
            }],
            system_times: system.map(|s| (ClientId(0), s)).into_iter().collect::<BTreeMap<_, _>>(),
        }
    }

    fn small_network() -> NetworkConfig {
        NetworkConfig::new(0.5, vec![1.0]).with_horizon(Horizon::Until(50.0))
    }

    #[test]
    fn estimate_uses_population_variance() {
        let estimate = Estimate::from_samples(&[1.0, 3.0]).unwrap();
        assert_eq!(2.0, estimate.mean);
        assert_eq!(1.0, estimate.variance);
        assert_eq!(None, Estimate::from_samples(&[]));
    }

    #[test]
    fn accumulator_skips_undefined_metrics() {
        let mut accumulator = Accumulator::default();
        accumulator.fold(&summary(1.0, 2.0, Some(3.0)));
        accumulator.fold(&summary(1.0, 2.0, None));

        assert_eq!(2, accumulator.wait().len());
        assert_eq!(1, accumulator.system().len());
        assert_eq!(Some(0.0), accumulator.convergence_ratio());
    }

    #[test]
    fn ratio_divides_deviation_by_count() {
        let mut accumulator = Accumulator::default();
        for system in [2.0, 4.0, 2.0, 4.0] {
            accumulator.fold(&summary(0.0, 0.0, Some(system)));
        }
        assert_eq!(Some(0.25), accumulator.convergence_ratio());
    }

    #[test]
    fn minimum_gates_convergence() {
        let controller = ReplicationController::new(
            small_network(),
            ReplicationConfig::default().with_bounds(3, 10).with_threshold(1.0),
        )
        .unwrap();
        let mut accumulator = Accumulator::default();
        accumulator.fold(&summary(0.0, 0.0, Some(1.0)));

        assert_eq!(None, controller.verdict(&accumulator, 1));
        assert_eq!(
            Some(Convergence::Converged { ratio: 0.0 }),
            controller.verdict(&accumulator, 3)
        );
    }

    #[test]
    fn maximum_stops_unconditionally() {
        let controller = ReplicationController::new(
            small_network(),
            ReplicationConfig::default().with_bounds(1, 2).with_threshold(1e-12),
        )
        .unwrap();
        let mut accumulator = Accumulator::default();
        accumulator.fold(&summary(0.0, 0.0, Some(1.0)));
        accumulator.fold(&summary(0.0, 0.0, Some(3.0)));

        assert_eq!(
            Some(Convergence::Unconverged { ratio: Some(0.5) }),
            controller.verdict(&accumulator, 2)
        );
    }

    #[test]
    fn controller_rejects_bad_configuration() {
        let result = ReplicationController::new(small_network(), ReplicationConfig::default().with_bounds(5, 2));
        assert!(matches!(result, Err(Error::Config(_))));

        let result = ReplicationController::new(NetworkConfig::new(0.0, vec![1.0]), ReplicationConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn forced_draining_rejects_certain_feedback() {
        // fine for a single fixed-horizon run, but replications always drain
        let network = NetworkConfig::new(0.5, vec![1.0, 1.0, 1.0]).with_feedback(vec![0.0, 1.0, 0.0]);
        assert_eq!(Ok(()), network.validate());

        let result = ReplicationController::new(network, ReplicationConfig::default());
        assert!(matches!(
            result,
            Err(Error::Config(crate::ConfigError::CertainFeedback { station: 1 }))
        ));
    }

    #[test]
    fn seeded_estimation_is_reproducible() {
        let config = ReplicationConfig::default().with_bounds(4, 4).with_seed(99);
        let first = estimate(small_network(), config.clone()).unwrap();
        let second = estimate(small_network(), config).unwrap();
        assert_eq!(first, second);
        assert_eq!(4, first.replications);
    }
}
