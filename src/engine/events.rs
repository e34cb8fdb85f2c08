pub(super) mod event_traits;
mod scheduled;

use crate::{Error, SimState, SimTime};
use event_traits::Event;
use scheduled::Scheduled;

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

/// Pending events of a simulation, plus its clock.
///
/// Events come out in ascending `(time, precedence, scheduling order)`, where precedence is
/// [`Event::precedence()`]. The clock only moves when an event is popped, and it never moves backward: scheduling
/// before the current time fails with [`Error::BackInTime`] and leaves the queue untouched.
#[derive(Debug)]
pub struct EventQueue<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    heap: BinaryHeap<Reverse<Scheduled<State, Time>>>,
    clock: Time,
    scheduled: usize,
}

impl<State, Time> EventQueue<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    pub(crate) fn new(start: Time) -> Self {
        Self {
            heap: BinaryHeap::new(),
            clock: start,
            scheduled: 0,
        }
    }

    /// # Errors
    ///
    /// [`Error::BackInTime`] if `time` precedes the clock.
    pub fn schedule<E>(&mut self, event: E, time: Time) -> crate::Result
    where
        E: Event<State, Time> + 'static,
    {
        self.schedule_from_boxed(Box::new(event), time)
    }

    /// Same as [`schedule()`](EventQueue::schedule) for an event that is already boxed.
    ///
    /// # Errors
    ///
    /// [`Error::BackInTime`] if `time` precedes the clock.
    pub fn schedule_from_boxed(&mut self, event: Box<dyn Event<State, Time>>, time: Time) -> crate::Result {
        if time < self.clock {
            return Err(Error::BackInTime);
        }

        let sequence = self.scheduled;
        self.scheduled += 1;
        self.heap.push(Reverse(Scheduled {
            time,
            precedence: event.precedence(),
            sequence,
            event,
        }));
        Ok(())
    }

    /// Remove the next event and advance the clock to its time.
    ///
    /// # Errors
    ///
    /// [`Error::EmptySchedule`] if nothing is pending. Dispatch loops check [`is_empty()`](EventQueue::is_empty)
    /// first, so seeing this from one points at broken termination logic.
    pub fn pop_min(&mut self) -> crate::Result<Box<dyn Event<State, Time>>> {
        let Reverse(next) = self.heap.pop().ok_or(Error::EmptySchedule)?;
        self.clock = next.time;
        Ok(next.event)
    }

    /// Time of the event popped last, or the start time before any pop.
    pub fn current_time(&self) -> &Time {
        &self.clock
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

impl<State, Time> EventQueue<State, Time>
where
    State: SimState<Time>,
    Time: SimTime + Clone,
{
    /// Schedule at the current time. It still runs after anything already due now with equal or lower precedence.
    ///
    /// # Errors
    ///
    /// Only if cloning the clock yields an earlier time.
    pub fn schedule_now<E>(&mut self, event: E) -> crate::Result
    where
        E: Event<State, Time> + 'static,
    {
        let now = self.clock.clone();
        self.schedule(event, now)
    }
}

impl<State, Time> fmt::Display for EventQueue<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} events pending at {:?}", self.heap.len(), self.clock)
    }
}
