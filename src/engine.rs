//! Generic discrete-event machinery: an event trait, a priority queue that orders events by time and precedence, and a
//! [`Simulation`] that owns the queue together with the state events mutate.

mod events;
mod simulation;

pub use events::event_traits::{Event, OkEvent};
pub use events::EventQueue;
pub use simulation::Simulation;
