use super::network::Route;
use super::run::Network;
use super::variates::Variates;
use super::{ClientId, Clock};
use crate::engine::{Event, EventQueue};
use crate::{Error, Result};
use tracing::trace;

/// The three things that can happen to a client at a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The client joins the station's queue.
    Assigned,
    /// The client starts service.
    Arrival,
    /// The client completes service and is routed on.
    Finish,
}

impl EventKind {
    /// Precedence among events sharing a timestamp. Queue membership is recorded before any service starts, and a
    /// service starts before a same-instant departure is processed.
    ///
    /// | kind     | rank |
    /// |----------|------|
    /// | Assigned | 0    |
    /// | Arrival  | 1    |
    /// | Finish   | 2    |
    pub const fn rank(self) -> u8 {
        match self {
            EventKind::Assigned => 0,
            EventKind::Arrival => 1,
            EventKind::Finish => 2,
        }
    }
}

/// An event concerning one client at one station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationEvent {
    pub kind: EventKind,
    pub client: ClientId,
    pub station: usize,
}

impl StationEvent {
    pub fn assigned(client: ClientId, station: usize) -> Self {
        Self {
            kind: EventKind::Assigned,
            client,
            station,
        }
    }

    pub fn arrival(client: ClientId, station: usize) -> Self {
        Self {
            kind: EventKind::Arrival,
            client,
            station,
        }
    }

    pub fn finish(client: ClientId, station: usize) -> Self {
        Self {
            kind: EventKind::Finish,
            client,
            station,
        }
    }

    /// Record the queue entry and start service right away if the station was idle. A client's first entry into
    /// station 0 is an external arrival, which counts towards the arrival total and schedules the next one.
    fn on_assigned<V>(&self, network: &mut Network<V>, events: &mut EventQueue<Network<V>, Clock>, now: f64) -> Result
    where
        V: Variates + 'static,
    {
        let external = self.station == 0 && network.trace.station(0).queued(self.client).is_none();
        network.trace.station_mut(self.station).record_queued(self.client, now);

        if network.stations[self.station].admit(self.client) {
            events.schedule_now(StationEvent::arrival(self.client, self.station))?;
        }

        if external {
            network.arrivals += 1;
            network.schedule_external_arrival(events)?;
        }
        Ok(())
    }

    fn on_arrival<V>(&self, network: &mut Network<V>, events: &mut EventQueue<Network<V>, Clock>, now: f64) -> Result
    where
        V: Variates + 'static,
    {
        network.trace.station_mut(self.station).record_started(self.client, now);

        let duration = network.variates.service_duration(self.station)?;
        events.schedule(
            StationEvent::finish(self.client, self.station),
            super::clock(now + duration)?,
        )
    }

    /// Vacate the station, start the next client in line, and route the finished client.
    fn on_finish<V>(&self, network: &mut Network<V>, events: &mut EventQueue<Network<V>, Clock>, now: f64) -> Result
    where
        V: Variates + 'static,
    {
        let station = &mut network.stations[self.station];
        let finished = station.complete_head();
        if finished != Some(self.client) {
            return Err(Error::BadExecution(
                format!(
                    "client {} finished station {} but {:?} was in service",
                    self.client, self.station, finished
                )
                .into(),
            ));
        }
        if let Some(next) = station.head() {
            events.schedule_now(StationEvent::arrival(next, self.station))?;
        }

        network.trace.station_mut(self.station).record_departed(self.client, now);

        let route = network.routing.successor(self.station, &mut network.variates);
        trace!(client = %self.client, from = self.station, ?route, "routed");
        match route {
            Route::Exit => {
                network.departures += 1;
                Ok(())
            }
            Route::Forward(next) | Route::Backward(next) => {
                events.schedule_now(StationEvent::assigned(self.client, next))
            }
        }
    }
}

impl<V> Event<Network<V>, Clock> for StationEvent
where
    V: Variates + 'static,
{
    fn execute(&mut self, network: &mut Network<V>, events: &mut EventQueue<Network<V>, Clock>) -> Result {
        let now = events.current_time().into_inner();
        trace!(kind = ?self.kind, client = %self.client, station = self.station, time = now, "dispatch");

        match self.kind {
            EventKind::Assigned => self.on_assigned(network, events, now),
            EventKind::Arrival => self.on_arrival(network, events, now),
            EventKind::Finish => self.on_finish(network, events, now),
        }
    }

    fn precedence(&self) -> u8 {
        self.kind.rank()
    }
}
