use super::Event;
use crate::{SimState, SimTime};
use std::cmp::Ordering;

/// A boxed event waiting in the queue, with the key it is ordered by.
#[derive(Debug)]
pub(super) struct Scheduled<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    pub time: Time,
    pub precedence: u8,
    /// Position in scheduling order; unique per queue, so no two entries compare equal.
    pub sequence: usize,
    pub event: Box<dyn Event<State, Time>>,
}

impl<State, Time> Scheduled<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    fn key(&self) -> (&Time, u8, usize) {
        (&self.time, self.precedence, self.sequence)
    }
}

impl<State, Time> PartialEq for Scheduled<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<State, Time> Eq for Scheduled<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
}

impl<State, Time> PartialOrd for Scheduled<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<State, Time> Ord for Scheduled<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}
