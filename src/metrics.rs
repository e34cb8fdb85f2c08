//! Reduce a finished run's trace to wait, service and system-time statistics.

use crate::model::{ClientId, RunOutcome, StationTrace};
use serde::Serialize;
use std::collections::BTreeMap;

/// Statistics of one station over a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationStats {
    pub station: usize,
    /// Clients that queued here at least once.
    pub clients: usize,
    /// Mean over clients of each client's average wait per visit.
    pub mean_wait: Option<f64>,
    /// Mean over clients of each client's average service time per completed visit.
    pub mean_service: Option<f64>,
    /// Clients contributing to `mean_service`, those with at least one completed visit.
    pub served: usize,
}

/// Scalar aggregates of a single run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub stations: Vec<StationStats>,
    /// Time from first entering station 0 to leaving the last station, for every client that did both.
    pub system_times: BTreeMap<ClientId, f64>,
}

impl RunSummary {
    /// Run-level wait: the mean over every (station, client) pair of that client's average wait at that station.
    /// `None` if no station saw a client.
    pub fn mean_wait(&self) -> Option<f64> {
        pooled(self.stations.iter().map(|s| (s.mean_wait, s.clients)))
    }

    /// Run-level service time, pooled over (station, client) pairs with a completed visit.
    pub fn mean_service(&self) -> Option<f64> {
        pooled(self.stations.iter().map(|s| (s.mean_service, s.served)))
    }

    /// Mean system time over completed clients.
    pub fn mean_system_time(&self) -> Option<f64> {
        mean(self.system_times.values().copied())
    }
}

/// Weighted mean of per-station means, each weighted by how many clients it averages over.
fn pooled(means: impl Iterator<Item = (Option<f64>, usize)>) -> Option<f64> {
    let (total, count) = means
        .filter_map(|(mean, n)| mean.map(|m| (m * n as f64, n)))
        .fold((0.0, 0usize), |(total, count), (sum, n)| (total + sum, count + n));
    (count > 0).then(|| total / count as f64)
}

pub(crate) fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Average wait per visit of `client`. Visits that never reached service wait until `end`.
fn client_wait(trace: &StationTrace, client: ClientId, end: f64) -> Option<f64> {
    let queued = trace.queued(client)?;
    let started = trace.started(client).unwrap_or_default();
    mean(
        queued
            .iter()
            .enumerate()
            .map(|(visit, entry)| started.get(visit).copied().unwrap_or(end) - entry),
    )
}

/// Average service time per completed visit of `client`.
fn client_service(trace: &StationTrace, client: ClientId) -> Option<f64> {
    let started = trace.started(client)?;
    let departed = trace.departed(client)?;
    mean(departed.iter().zip(started).map(|(departure, start)| departure - start))
}

fn station_stats(station: usize, trace: &StationTrace, end: f64) -> StationStats {
    let services: Vec<f64> = trace.clients().filter_map(|c| client_service(trace, c)).collect();
    StationStats {
        station,
        clients: trace.clients().count(),
        mean_wait: mean(trace.clients().filter_map(|c| client_wait(trace, c, end))),
        mean_service: mean(services.iter().copied()),
        served: services.len(),
    }
}

/// Summarise a finished run.
pub fn summarize(outcome: &RunOutcome) -> RunSummary {
    let trace = &outcome.trace;
    let stations = trace
        .stations()
        .iter()
        .enumerate()
        .map(|(i, station)| station_stats(i, station, outcome.final_time))
        .collect();

    let system_times = match (trace.stations().first(), trace.stations().last()) {
        (Some(first), Some(last)) => first
            .clients()
            .filter_map(|client| {
                let entered = *first.queued(client)?.first()?;
                let left = *last.departed(client)?.last()?;
                Some((client, left - entered))
            })
            .collect(),
        _ => BTreeMap::new(),
    };

    RunSummary { stations, system_times }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Trace;

    fn outcome(trace: Trace, final_time: f64) -> RunOutcome {
        RunOutcome {
            final_time,
            stations: trace.stations().len(),
            arrivals: 0,
            departures: 0,
            trace,
        }
    }

    fn record(trace: &mut Trace, station: usize, client: u64, queued: f64, started: Option<f64>, left: Option<f64>) {
        let station = trace.station_mut(station);
        station.record_queued(ClientId(client), queued);
        if let Some(t) = started {
            station.record_started(ClientId(client), t);
        }
        if let Some(t) = left {
            station.record_departed(ClientId(client), t);
        }
    }

    #[test]
    fn two_station_run_reduces_to_expected_means() {
        let mut trace = Trace::new(2);
        record(&mut trace, 0, 0, 1.0, Some(1.0), Some(4.0));
        record(&mut trace, 0, 1, 3.0, Some(4.0), Some(5.0));
        record(&mut trace, 1, 0, 4.0, Some(4.0), Some(6.0));
        record(&mut trace, 1, 1, 5.0, Some(6.0), Some(8.0));

        let summary = summarize(&outcome(trace, 8.0));

        assert_eq!(Some(0.5), summary.stations[0].mean_wait);
        assert_eq!(Some(2.0), summary.stations[0].mean_service);
        assert_eq!(Some(0.5), summary.stations[1].mean_wait);
        assert_eq!(Some(2.0), summary.stations[1].mean_service);
        assert_eq!(Some(0.5), summary.mean_wait());
        assert_eq!(Some(2.0), summary.mean_service());
        assert_eq!(Some(5.0), summary.mean_system_time());
        assert_eq!(2, summary.system_times.len());
    }

    #[test]
    fn run_means_weight_every_station_client_pair_equally() {
        let mut trace = Trace::new(2);
        record(&mut trace, 0, 0, 1.0, Some(1.0), Some(2.0));
        record(&mut trace, 0, 1, 1.0, Some(4.0), Some(5.0));
        record(&mut trace, 1, 0, 2.0, Some(5.0), Some(9.0));

        let summary = summarize(&outcome(trace, 9.0));

        // waits 0 and 3 at station 0, 3 at station 1
        assert_eq!(Some(1.5), summary.stations[0].mean_wait);
        assert_eq!(Some(2.0), summary.mean_wait());
        // services 1 and 1 at station 0, 4 at station 1
        assert_eq!(2, summary.stations[0].served);
        assert_eq!(Some(2.0), summary.mean_service());
    }

    #[test]
    fn unserved_client_waits_until_run_end() {
        let mut trace = Trace::new(1);
        record(&mut trace, 0, 0, 1.0, Some(1.0), None);
        record(&mut trace, 0, 1, 2.0, None, None);

        let summary = summarize(&outcome(trace, 11.0));

        // client 0 waited 0, client 1 waited 11 - 2
        assert_eq!(Some(4.5), summary.stations[0].mean_wait);
        assert_eq!(None, summary.stations[0].mean_service);
        assert!(summary.system_times.is_empty());
        assert_eq!(None, summary.mean_system_time());
    }

    #[test]
    fn revisits_are_averaged_per_client() {
        let mut trace = Trace::new(2);
        record(&mut trace, 0, 0, 1.0, Some(1.0), Some(2.0));
        record(&mut trace, 0, 0, 3.0, Some(5.0), Some(6.0));
        record(&mut trace, 1, 0, 6.0, Some(6.0), Some(9.0));

        let summary = summarize(&outcome(trace, 9.0));

        assert_eq!(Some(1.0), summary.stations[0].mean_wait);
        assert_eq!(Some(1.0), summary.stations[0].mean_service);
        assert_eq!(Some(8.0), summary.system_times.get(&ClientId(0)).copied());
    }

    #[test]
    fn empty_stations_are_excluded_not_zero() {
        let mut trace = Trace::new(2);
        record(&mut trace, 0, 0, 1.0, Some(3.0), None);

        let summary = summarize(&outcome(trace, 4.0));

        assert_eq!(0, summary.stations[1].clients);
        assert_eq!(None, summary.stations[1].mean_wait);
        assert_eq!(Some(2.0), summary.mean_wait());
        assert_eq!(None, summary.mean_service());
    }

    #[test]
    fn single_station_system_time_spans_queue_and_service() {
        let mut trace = Trace::new(1);
        record(&mut trace, 0, 0, 2.0, Some(3.0), Some(7.0));

        let summary = summarize(&outcome(trace, 7.0));
        assert_eq!(Some(5.0), summary.mean_system_time());
    }
}
