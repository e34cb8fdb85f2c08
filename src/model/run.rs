use super::event::StationEvent;
use super::network::{Routing, Station};
use super::trace::Trace;
use super::variates::Variates;
use super::{clock, ClientId, Clock};
use crate::config::{Horizon, NetworkConfig};
use crate::engine::{EventQueue, Simulation};
use crate::{Result, SimState};
use serde::Serialize;
use tracing::debug;

/// Everything one replication mutates: station queues, routing, counters, the trace and its own random draws.
///
/// A `Network` is created per run and never shared, so independent replications can execute on separate threads.
#[derive(Debug)]
pub struct Network<V> {
    pub(crate) stations: Vec<Station>,
    pub(crate) routing: Routing,
    pub(crate) variates: V,
    pub(crate) trace: Trace,
    pub(crate) arrivals: u64,
    pub(crate) departures: u64,
    horizon: Horizon,
    drain: bool,
    max_admissions: Option<u64>,
    next_client: u64,
}

impl<V> Network<V>
where
    V: Variates + 'static,
{
    /// Build an empty network from an already validated configuration.
    pub fn new(config: &NetworkConfig, variates: V) -> Self {
        let stations = config.stations();
        Self {
            stations: vec![Station::default(); stations],
            routing: Routing::new(stations, &config.feedback),
            variates,
            trace: Trace::new(stations),
            arrivals: 0,
            departures: 0,
            horizon: config.horizon,
            drain: config.drain,
            max_admissions: config.max_admissions,
            next_client: 0,
        }
    }

    fn admission_open(&self, time: f64) -> bool {
        self.horizon.admits(time) && self.max_admissions.map_or(true, |limit| self.next_client < limit)
    }

    /// Draw the gap to the next external arrival and, if it lands inside the horizon and under the admission limit,
    /// schedule a fresh client's entry into station 0.
    pub(crate) fn schedule_external_arrival(&mut self, events: &mut EventQueue<Self, Clock>) -> Result {
        let time = events.current_time().into_inner() + self.variates.inter_arrival_gap()?;
        if !self.admission_open(time) {
            return Ok(());
        }

        let client = ClientId(self.next_client);
        self.next_client += 1;
        events.schedule(StationEvent::assigned(client, 0), clock(time)?)
    }

    pub fn arrivals(&self) -> u64 {
        self.arrivals
    }

    pub fn departures(&self) -> u64 {
        self.departures
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn station(&self, station: usize) -> &Station {
        &self.stations[station]
    }
}

impl<V> SimState<Clock> for Network<V> {
    /// Without draining, dispatch stops once the clock reaches the horizon.
    fn is_complete(&self, current_time: &Clock) -> bool {
        !self.drain && self.horizon.reached(current_time.into_inner())
    }
}

/// What a single run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    /// Clock time of the last dispatched event.
    pub final_time: f64,
    pub stations: usize,
    pub arrivals: u64,
    pub departures: u64,
    pub trace: Trace,
}

/// Run one replication of the network described by `config`, drawing randomness from `variates`.
///
/// # Errors
///
/// Configuration problems are reported before anything is scheduled. Random-draw failures abort the run.
pub fn simulate<V>(config: &NetworkConfig, variates: V) -> Result<RunOutcome>
where
    V: Variates + 'static,
{
    config.validate()?;

    let mut sim = Simulation::new(Network::new(config, variates), clock(0.0)?);
    let (network, events) = sim.parts_mut();
    network.schedule_external_arrival(events)?;

    sim.run()?;

    let final_time = sim.event_queue().current_time().into_inner();
    let network = sim.into_state();
    debug!(
        final_time,
        arrivals = network.arrivals,
        departures = network.departures,
        "run complete"
    );

    Ok(RunOutcome {
        final_time,
        stations: config.stations(),
        arrivals: network.arrivals,
        departures: network.departures,
        trace: network.trace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::variates::ScriptedVariates;
    use crate::Error;

    fn times(list: Option<&[f64]>) -> Vec<f64> {
        list.map(<[f64]>::to_vec).unwrap_or_default()
    }

    #[test]
    fn two_station_timeline_matches_hand_computation() {
        let config = NetworkConfig::new(1.0, vec![1.0, 1.0]).with_horizon(Horizon::Until(10.0));
        let variates = ScriptedVariates::new(&[1.0, 2.0], &[&[3.0, 1.0], &[2.0, 2.0]]);

        let outcome = simulate(&config, variates).unwrap();

        assert_eq!(2, outcome.arrivals);
        assert_eq!(2, outcome.departures);
        assert_eq!(8.0, outcome.final_time);

        let (c0, c1) = (ClientId(0), ClientId(1));
        let first = outcome.trace.station(0);
        assert_eq!(vec![1.0], times(first.queued(c0)));
        assert_eq!(vec![1.0], times(first.started(c0)));
        assert_eq!(vec![4.0], times(first.departed(c0)));
        assert_eq!(vec![3.0], times(first.queued(c1)));
        assert_eq!(vec![4.0], times(first.started(c1)));
        assert_eq!(vec![5.0], times(first.departed(c1)));

        let second = outcome.trace.station(1);
        assert_eq!(vec![4.0], times(second.queued(c0)));
        assert_eq!(vec![4.0], times(second.started(c0)));
        assert_eq!(vec![6.0], times(second.departed(c0)));
        assert_eq!(vec![5.0], times(second.queued(c1)));
        assert_eq!(vec![6.0], times(second.started(c1)));
        assert_eq!(vec![8.0], times(second.departed(c1)));
    }

    #[test]
    fn feedback_revisits_earlier_station_without_counting_new_arrival() {
        let config = NetworkConfig::new(1.0, vec![1.0, 1.0, 1.0])
            .with_feedback(vec![0.0, 0.5, 0.0])
            .with_horizon(Horizon::Until(10.0));
        let variates =
            ScriptedVariates::new(&[1.0], &[&[1.0, 1.0], &[1.0, 1.0], &[1.0]]).with_routing(&[0.25, 0.75], &[0]);

        let outcome = simulate(&config, variates).unwrap();

        assert_eq!(1, outcome.arrivals);
        assert_eq!(1, outcome.departures);
        assert_eq!(6.0, outcome.final_time);

        let c0 = ClientId(0);
        let first = outcome.trace.station(0);
        assert_eq!(vec![1.0, 3.0], times(first.queued(c0)));
        assert_eq!(vec![1.0, 3.0], times(first.started(c0)));
        assert_eq!(vec![2.0, 4.0], times(first.departed(c0)));
        assert_eq!(vec![2.0, 4.0], times(outcome.trace.station(1).queued(c0)));
        assert_eq!(vec![5.0], times(outcome.trace.station(2).queued(c0)));
        assert_eq!(vec![6.0], times(outcome.trace.station(2).departed(c0)));
    }

    #[test]
    fn same_instant_departure_hands_station_to_next_client() {
        // client 1 joins exactly when client 0 finishes
        let config = NetworkConfig::new(1.0, vec![1.0]).with_horizon(Horizon::Until(10.0));
        let variates = ScriptedVariates::new(&[1.0, 2.0], &[&[2.0, 1.0]]);

        let outcome = simulate(&config, variates).unwrap();

        let station = outcome.trace.station(0);
        assert_eq!(vec![3.0], times(station.queued(ClientId(1))));
        assert_eq!(vec![3.0], times(station.started(ClientId(1))));
        assert_eq!(vec![4.0], times(station.departed(ClientId(1))));
    }

    #[test]
    fn zero_horizon_admits_nobody() {
        let config = NetworkConfig::new(1.0 / 7.0, vec![0.25]).with_horizon(Horizon::Until(0.0));
        let outcome = simulate(&config, ScriptedVariates::new(&[0.5], &[&[]])).unwrap();

        assert_eq!(0, outcome.arrivals);
        assert_eq!(0, outcome.departures);
        assert!(outcome.trace.is_empty());
        assert_eq!(0.0, outcome.final_time);
    }

    #[test]
    fn fixed_horizon_stops_dispatch_once_clock_passes_horizon() {
        let config = NetworkConfig::new(1.0, vec![1.0]).with_horizon(Horizon::Until(4.0));
        let variates = ScriptedVariates::new(&[1.0, 1.0], &[&[10.0, 10.0]]);

        let outcome = simulate(&config, variates).unwrap();

        // the clock is checked before each pop, so the finish at 11 still runs
        // but the second client's service start at the same instant does not
        assert_eq!(2, outcome.arrivals);
        assert_eq!(1, outcome.departures);
        assert_eq!(11.0, outcome.final_time);
        assert_eq!(vec![2.0], times(outcome.trace.station(0).queued(ClientId(1))));
        assert_eq!(None, outcome.trace.station(0).started(ClientId(1)));
    }

    #[test]
    fn draining_finishes_admitted_clients() {
        let config = NetworkConfig::new(1.0, vec![1.0])
            .with_horizon(Horizon::Until(4.0))
            .draining(true);
        let variates = ScriptedVariates::new(&[1.0, 1.0], &[&[10.0, 10.0]]);

        let outcome = simulate(&config, variates).unwrap();

        assert_eq!(2, outcome.arrivals);
        assert_eq!(2, outcome.departures);
        assert_eq!(21.0, outcome.final_time);
    }

    #[test]
    fn admission_limit_caps_unbounded_runs() {
        let config = NetworkConfig::new(1.0, vec![1.0])
            .with_horizon(Horizon::Unbounded)
            .with_max_admissions(3);
        let variates = ScriptedVariates::new(&[1.0, 1.0, 1.0, 1.0, 1.0], &[&[0.5, 0.5, 0.5]]);

        let outcome = simulate(&config, variates).unwrap();

        assert_eq!(3, outcome.arrivals);
        assert_eq!(3, outcome.departures);
    }

    #[test]
    fn invalid_configuration_is_rejected_up_front() {
        let config = NetworkConfig::new(1.0, vec![]);
        let result = simulate(&config, ScriptedVariates::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn draining_run_with_inescapable_feedback_is_rejected_before_scheduling() {
        let config = NetworkConfig::new(1.0, vec![1.0, 1.0, 1.0])
            .with_feedback(vec![0.0, 1.0, 0.0])
            .with_horizon(Horizon::Until(3.0))
            .draining(true);
        // nothing scripted: any draw would panic
        let result = simulate(&config, ScriptedVariates::default());
        assert!(matches!(
            result,
            Err(Error::Config(crate::ConfigError::CertainFeedback { station: 1 }))
        ));
    }

    #[test]
    fn distribution_failures_abort_the_run() {
        let config = NetworkConfig::new(1.0, vec![1.0]).with_horizon(Horizon::Until(10.0));
        // one arrival, no scripted service time
        let result = simulate(&config, ScriptedVariates::new(&[1.0], &[&[]]));
        assert!(matches!(result, Err(Error::Distribution(_))));
    }
}
