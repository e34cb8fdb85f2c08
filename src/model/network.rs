use super::variates::Variates;
use super::ClientId;
use std::collections::VecDeque;

/// FIFO of clients at one station. The head, if any, is the client in service.
#[derive(Debug, Clone, Default)]
pub struct Station {
    queue: VecDeque<ClientId>,
}

impl Station {
    /// Append `client` to the queue. Returns `true` when the station was idle, meaning the client starts service
    /// immediately.
    pub fn admit(&mut self, client: ClientId) -> bool {
        self.queue.push_back(client);
        self.queue.len() == 1
    }

    /// The client currently eligible for service.
    pub fn head(&self) -> Option<ClientId> {
        self.queue.front().copied()
    }

    /// Remove the client in service. Whoever is next in line becomes the new [`head()`](Station::head).
    pub fn complete_head(&mut self) -> Option<ClientId> {
        self.queue.pop_front()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Clients queued or in service.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

/// Where a client goes after finishing a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Forward(usize),
    Backward(usize),
    Exit,
}

impl Route {
    /// The next station, or `None` when the client leaves the network.
    pub fn station(self) -> Option<usize> {
        match self {
            Route::Forward(station) | Route::Backward(station) => Some(station),
            Route::Exit => None,
        }
    }
}

/// Feedback probabilities of a tandem network.
#[derive(Debug, Clone)]
pub struct Routing {
    feedback: Vec<f64>,
}

impl Routing {
    /// `feedback[i]` is the probability of routing backward after station `i`; missing entries mean zero.
    pub fn new(stations: usize, feedback: &[f64]) -> Self {
        let feedback = (0..stations)
            .map(|station| feedback.get(station).copied().unwrap_or(0.0))
            .collect();
        Self { feedback }
    }

    pub fn stations(&self) -> usize {
        self.feedback.len()
    }

    /// Route a client that just finished `station`.
    ///
    /// The last station always exits. Station 0 always goes forward without consuming a draw. Elsewhere a uniform
    /// draw greater than the station's feedback probability goes forward, and anything else picks uniformly among
    /// the strictly earlier stations.
    pub fn successor<V: Variates>(&self, station: usize, variates: &mut V) -> Route {
        if station + 1 >= self.stations() {
            return Route::Exit;
        }
        if station == 0 || variates.unit_uniform() > self.feedback[station] {
            Route::Forward(station + 1)
        } else {
            Route::Backward(variates.backward_target(station))
        }
    }
}
