use super::ClientId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Timestamps recorded at one station, keyed by client.
///
/// Each list holds one entry per visit, so index `j` is the `j`-th visit of that client to this station. A client with
/// no entry never reached the corresponding step here, which is distinct from a step recorded at time zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StationTrace {
    queued: BTreeMap<ClientId, Vec<f64>>,
    started: BTreeMap<ClientId, Vec<f64>>,
    departed: BTreeMap<ClientId, Vec<f64>>,
}

impl StationTrace {
    pub(crate) fn record_queued(&mut self, client: ClientId, time: f64) {
        self.queued.entry(client).or_default().push(time);
    }

    pub(crate) fn record_started(&mut self, client: ClientId, time: f64) {
        self.started.entry(client).or_default().push(time);
    }

    pub(crate) fn record_departed(&mut self, client: ClientId, time: f64) {
        self.departed.entry(client).or_default().push(time);
    }

    /// Queue-entry times of `client`, one per visit.
    pub fn queued(&self, client: ClientId) -> Option<&[f64]> {
        self.queued.get(&client).map(Vec::as_slice)
    }

    /// Service-start times of `client`, one per visit that reached service.
    pub fn started(&self, client: ClientId) -> Option<&[f64]> {
        self.started.get(&client).map(Vec::as_slice)
    }

    /// Departure times of `client`, one per completed visit.
    pub fn departed(&self, client: ClientId) -> Option<&[f64]> {
        self.departed.get(&client).map(Vec::as_slice)
    }

    /// Every client that queued here at least once, in ascending id order.
    pub fn clients(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.queued.keys().copied()
    }

    pub fn queue_entries(&self) -> &BTreeMap<ClientId, Vec<f64>> {
        &self.queued
    }

    pub fn service_starts(&self) -> &BTreeMap<ClientId, Vec<f64>> {
        &self.started
    }

    pub fn departures(&self) -> &BTreeMap<ClientId, Vec<f64>> {
        &self.departed
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}

/// Per-station timestamps for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trace {
    stations: Vec<StationTrace>,
}

impl Trace {
    pub fn new(stations: usize) -> Self {
        Self {
            stations: vec![StationTrace::default(); stations],
        }
    }

    /// # Panics
    ///
    /// If `station` is out of range.
    pub fn station(&self, station: usize) -> &StationTrace {
        &self.stations[station]
    }

    pub(crate) fn station_mut(&mut self, station: usize) -> &mut StationTrace {
        &mut self.stations[station]
    }

    pub fn stations(&self) -> &[StationTrace] {
        &self.stations
    }

    pub fn is_empty(&self) -> bool {
        self.stations.iter().all(StationTrace::is_empty)
    }
}
