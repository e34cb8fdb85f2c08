use crate::config::NetworkConfig;
use crate::{Error, Result};
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};
use rand_pcg::Pcg64;

/// Source of every random draw a run makes.
///
/// Each call yields a fresh, independent draw. Implementations must not share a stream with another replication.
pub trait Variates {
    /// Gap until the next external arrival at station 0.
    fn inter_arrival_gap(&mut self) -> Result<f64>;

    /// Service duration for a client starting service at `station`.
    fn service_duration(&mut self, station: usize) -> Result<f64>;

    /// Uniform draw on `(0, 1]`, compared against a station's feedback probability.
    fn unit_uniform(&mut self) -> f64;

    /// Uniform pick among the stations `0..below`. `below` is always at least 1.
    fn backward_target(&mut self, below: usize) -> usize;
}

/// Exponential inter-arrival and service times drawn from a seeded [`Pcg64`].
#[derive(Debug, Clone)]
pub struct ExponentialVariates {
    rng: Pcg64,
    arrivals: Exp<f64>,
    services: Vec<Exp<f64>>,
}

impl ExponentialVariates {
    /// # Errors
    ///
    /// [`Error::Distribution`] if any rate is rejected by [`Exp::new`].
    pub fn new(config: &NetworkConfig, rng: Pcg64) -> Result<Self> {
        let arrivals = exponential(config.arrival_rate)?;
        let services = config
            .service_rates
            .iter()
            .map(|rate| exponential(*rate))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rng, arrivals, services })
    }

    pub fn seeded(config: &NetworkConfig, seed: u64) -> Result<Self> {
        Self::new(config, Pcg64::seed_from_u64(seed))
    }
}

fn exponential(rate: f64) -> Result<Exp<f64>> {
    Exp::new(rate).map_err(|e| Error::Distribution(format!("exponential with rate {rate}: {e}")))
}

/// Guard against draws no clock can use.
fn usable(draw: f64) -> Result<f64> {
    if draw.is_finite() && draw >= 0.0 {
        Ok(draw)
    } else {
        Err(Error::Distribution(format!("draw {draw} is not a non-negative finite time")))
    }
}

impl Variates for ExponentialVariates {
    fn inter_arrival_gap(&mut self) -> Result<f64> {
        usable(self.arrivals.sample(&mut self.rng))
    }

    fn service_duration(&mut self, station: usize) -> Result<f64> {
        let distribution = self
            .services
            .get(station)
            .ok_or_else(|| Error::Distribution(format!("no service distribution for station {station}")))?;
        usable(distribution.sample(&mut self.rng))
    }

    fn unit_uniform(&mut self) -> f64 {
        1.0 - self.rng.random::<f64>()
    }

    fn backward_target(&mut self, below: usize) -> usize {
        self.rng.random_range(0..below)
    }
}

/// Replays fixed draws so the state machine can be checked against hand-computed timelines.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedVariates {
    pub gaps: std::collections::VecDeque<f64>,
    pub services: Vec<std::collections::VecDeque<f64>>,
    pub uniforms: std::collections::VecDeque<f64>,
    pub targets: std::collections::VecDeque<usize>,
}

#[cfg(test)]
impl ScriptedVariates {
    /// Once the scripted gaps run out, the next arrival lands at infinity and is never admitted.
    pub fn new(gaps: &[f64], services: &[&[f64]]) -> Self {
        Self {
            gaps: gaps.iter().copied().collect(),
            services: services.iter().map(|s| s.iter().copied().collect()).collect(),
            ..Self::default()
        }
    }

    pub fn with_routing(mut self, uniforms: &[f64], targets: &[usize]) -> Self {
        self.uniforms = uniforms.iter().copied().collect();
        self.targets = targets.iter().copied().collect();
        self
    }
}

#[cfg(test)]
impl Variates for ScriptedVariates {
    fn inter_arrival_gap(&mut self) -> Result<f64> {
        Ok(self.gaps.pop_front().unwrap_or(f64::INFINITY))
    }

    fn service_duration(&mut self, station: usize) -> Result<f64> {
        self.services[station]
            .pop_front()
            .ok_or_else(|| Error::Distribution(format!("script ran out of service times at station {station}")))
    }

    fn unit_uniform(&mut self) -> f64 {
        self.uniforms.pop_front().expect("script ran out of uniform draws")
    }

    fn backward_target(&mut self, below: usize) -> usize {
        let target = self.targets.pop_front().expect("script ran out of backward targets");
        assert!(target < below, "scripted target {target} is not below {below}");
        target
    }
}
