//! The tandem network: clients visit stations `0..n` in order, and after any station other than the first and the
//! last they may be sent back to an earlier one.

mod event;
mod network;
mod run;
mod trace;
mod variates;

pub use event::{EventKind, StationEvent};
pub use network::{Route, Routing, Station};
pub use run::{simulate, Network, RunOutcome};
pub use trace::{StationTrace, Trace};
pub use variates::{ExponentialVariates, Variates};

use crate::{Error, Result};
use ordered_float::NotNan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Simulation clock of the tandem model.
pub type Clock = NotNan<f64>;

pub(crate) fn clock(time: f64) -> Result<Clock> {
    NotNan::new(time).map_err(|_| Error::NotANumber)
}

/// Identifier of a client, unique within a run and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
