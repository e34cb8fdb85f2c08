use super::EventQueue;
use crate::{SimState, SimTime};
use std::fmt::Debug;

/// Something that happens at one instant of a simulation.
///
/// When it runs, an event may change the state and schedule further events. `Debug` is required so a stuck queue can
/// be dumped.
pub trait Event<State, Time>: Debug
where
    State: SimState<Time>,
    Time: SimTime,
{
    /// Apply this event. The queue's clock already reads this event's execution time.
    ///
    /// # Errors
    ///
    /// An error aborts [`Simulation::run()`](crate::engine::Simulation::run) and is returned from it as is.
    fn execute(&mut self, state: &mut State, events: &mut EventQueue<State, Time>) -> crate::Result;

    /// Tie-break among events due at the same time; lower runs first. Events of equal rank keep scheduling order.
    fn precedence(&self) -> u8 {
        0
    }
}

/// An infallible [`Event`], for events that only touch state.
///
/// Every `OkEvent` is an `Event` with the default precedence.
pub trait OkEvent<State, Time>: Debug
where
    State: SimState<Time>,
    Time: SimTime,
{
    fn execute(&mut self, state: &mut State, events: &mut EventQueue<State, Time>);
}

impl<State, Time, E> Event<State, Time> for E
where
    State: SimState<Time>,
    Time: SimTime,
    E: OkEvent<State, Time>,
{
    fn execute(&mut self, state: &mut State, events: &mut EventQueue<State, Time>) -> crate::Result {
        OkEvent::execute(self, state, events);
        Ok(())
    }
}
