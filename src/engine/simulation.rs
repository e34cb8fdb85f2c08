use super::{Event, EventQueue};
use crate::{SimState, SimTime};
use std::fmt;

/// A state together with the queue of events that will mutate it.
///
/// Typical use: build the state, call [`new()`](Simulation::new) with the start time, seed the first events through
/// [`schedule()`](Simulation::schedule) or [`parts_mut()`](Simulation::parts_mut), [`run()`](Simulation::run), then
/// take the state back with [`into_state()`](Simulation::into_state).
#[derive(Debug)]
pub struct Simulation<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    events: EventQueue<State, Time>,
    state: State,
}

impl<State, Time> Simulation<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    pub fn new(state: State, start: Time) -> Self {
        Self {
            events: EventQueue::new(start),
            state,
        }
    }

    /// Dispatch events in order until the state reports completion or nothing is left to dispatch.
    ///
    /// Completion is checked before every pop, against the time of the event dispatched last.
    ///
    /// # Errors
    ///
    /// Stops at the first failing event and returns its error.
    pub fn run(&mut self) -> crate::Result {
        while !self.state.is_complete(self.events.current_time()) && !self.events.is_empty() {
            self.step()?;
        }
        Ok(())
    }

    /// Dispatch exactly one event, whether or not the state reports completion.
    ///
    /// # Errors
    ///
    /// [`Error::EmptySchedule`](crate::Error::EmptySchedule) on an empty queue, or the event's own error.
    pub fn step(&mut self) -> crate::Result {
        let mut event = self.events.pop_min()?;
        event.execute(&mut self.state, &mut self.events)
    }

    /// # Errors
    ///
    /// [`Error::BackInTime`](crate::Error::BackInTime) if `time` precedes the clock.
    pub fn schedule<E>(&mut self, event: E, time: Time) -> crate::Result
    where
        E: Event<State, Time> + 'static,
    {
        self.events.schedule(event, time)
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub fn event_queue(&self) -> &EventQueue<State, Time> {
        &self.events
    }

    /// Borrow state and queue together, the way an executing event sees them. Handy for seeding events whose time
    /// depends on the state.
    pub fn parts_mut(&mut self) -> (&mut State, &mut EventQueue<State, Time>) {
        (&mut self.state, &mut self.events)
    }

    pub fn into_state(self) -> State {
        self.state
    }
}

impl<State, Time> fmt::Display for Simulation<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Simulation at {:?} with {} pending", self.events.current_time(), self.events.len())
    }
}
