//! # Overview
//!
//! tandem simulates a network of service stations visited in sequence by clients arriving from outside, with optional
//! probabilistic feedback: a client finishing station `i` may be sent back to an earlier station instead of moving on
//! to `i + 1`. Repeated stochastic runs estimate steady-state wait, service and total time in system until the
//! estimates stabilise.
//!
//! The crate has three layers:
//!
//! * [`engine`] is a small, generic discrete-event framework. An [`Event`] gets exclusive access to the simulation's
//!   state and its [`EventQueue`] while it executes; the queue orders events by time, then by each event's precedence,
//!   then by insertion order. A [`Simulation`] owns both and runs events until its [`SimState`] says it is complete or
//!   the queue empties.
//! * [`model`] builds the tandem network on top of the engine. Every replication owns a private [`Network`] holding
//!   station queues, routing, counters, the timestamp [`Trace`] and its own random draws, so replications are isolated
//!   from each other and can run on separate threads.
//! * [`metrics`] reduces a run to per-station and per-client statistics, and [`replication`] repeats drained runs
//!   until the spread of the run-level system times, relative to their count, falls below a threshold.
//!
//! ```no_run
//! use tandem::config::{Horizon, NetworkConfig, ReplicationConfig};
//!
//! let network = NetworkConfig::new(1.0 / 7.0, vec![0.25, 0.5, 1.0]).with_horizon(Horizon::Until(5000.0));
//! let report = tandem::replication::estimate(network, ReplicationConfig::default().with_seed(1))?;
//! println!("{:?}", report.system);
//! # Ok::<(), tandem::Error>(())
//! ```
//!
//! [`Event`]: engine::Event
//! [`EventQueue`]: engine::EventQueue
//! [`Simulation`]: engine::Simulation
//! [`Network`]: model::Network
//! [`Trace`]: model::Trace

pub mod config;
pub mod engine;
mod error;
mod generic_parameters;
pub mod metrics;
pub mod model;
pub mod replication;

pub use error::{ConfigError, Error, Result};
pub use generic_parameters::{SimState, SimTime};
