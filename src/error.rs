use thiserror::Error;

/// Errors that may be encountered while configuring or executing a simulation.
///
/// The [`BackInTime`] and [`EmptySchedule`] variants originate from the [`EventQueue`] and indicate a logical bug
/// rather than bad input: the tandem model never schedules into the past, and its run loop checks for an empty
/// schedule before popping. They are surfaced instead of panicking so that a misbehaving replication aborts cleanly.
///
/// The [`Config`] variant is raised before any event is scheduled. [`Distribution`] aborts the current run as soon as
/// a random-variate generator rejects its parameters or produces an unusable draw; such failures point at
/// misconfiguration and are never retried.
///
/// The [`BadExecution`] variant wraps errors produced by client implementations of [`Event`] in a way that can pass
/// through [`Simulation::run()`]. Invoking [`std::error::Error::source()`] on this variant will acquire a shared
/// reference to the wrapped error.
///
/// [`EventQueue`]: crate::engine::EventQueue
/// [`Event`]: crate::engine::Event
/// [`Simulation::run()`]: crate::engine::Simulation::run
/// [`BackInTime`]: Error::BackInTime
/// [`EmptySchedule`]: Error::EmptySchedule
/// [`Config`]: Error::Config
/// [`Distribution`]: Error::Distribution
/// [`BadExecution`]: Error::BadExecution
#[derive(Debug, Error)]
pub enum Error {
    /// The event queue rejected an event that would have been scheduled for a time that has already passed.
    #[error("event execution time is less than current simulation time")]
    BackInTime,
    /// An event was requested from a queue with nothing scheduled.
    #[error("no events remain in the schedule")]
    EmptySchedule,
    /// A computed event time was NaN and cannot be ordered.
    #[error("computed event time is not a number")]
    NotANumber,
    /// The network or replication parameters were rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// A random-variate generator failed.
    #[error("random variate generation failed: {0}")]
    Distribution(String),
    /// A client-generated error was encountered while executing an event. Call [`source()`] or unpack this value to
    /// handle it directly.
    ///
    /// [`source()`]: #method.source
    #[error("error while executing event: {0}")]
    BadExecution(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
    /// A configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    /// A configuration file could not be parsed.
    #[error("failed to parse configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Reasons a [`NetworkConfig`] or [`ReplicationConfig`] fails validation.
///
/// [`NetworkConfig`]: crate::config::NetworkConfig
/// [`ReplicationConfig`]: crate::config::ReplicationConfig
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("a network needs at least one station")]
    NoStations,
    #[error("{which} must be a positive, finite rate but was {value}")]
    NonPositiveRate { which: String, value: f64 },
    #[error("feedback probability for station {station} must lie in [0, 1] but was {value}")]
    FeedbackOutOfRange { station: usize, value: f64 },
    #[error("feedback probability 1 at station {station} traps clients in a run that only ends when empty")]
    CertainFeedback { station: usize },
    #[error("{field} has {found} entries but the network has {expected} stations")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("horizon must be a non-negative number but was {0}")]
    InvalidHorizon(f64),
    #[error("an unbounded horizon needs an admission limit, or the run never ends")]
    UnboundedRun,
    #[error("replication bounds are inconsistent: min {min}, max {max}")]
    ReplicationBounds { min: usize, max: usize },
    #[error("convergence threshold must be positive and finite but was {0}")]
    NonPositiveThreshold(f64),
}

/// [`std::result::Result`]`<T, `[`tandem::Error`]`>`, defaulting to `()` for the common case of fallible scheduling
/// and event execution.
///
/// [`tandem::Error`]: Error
pub type Result<T = ()> = std::result::Result<T, Error>;
