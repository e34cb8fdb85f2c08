use std::fmt::Debug;

/// Clock type accepted by the engine: anything totally ordered and printable.
///
/// Events run in ascending time. Events sharing a time run in ascending [`precedence()`], and events sharing both run
/// in the order they were scheduled, so a run is deterministic given its random draws.
///
/// Integer types implement this for tests and coarse models. Floating-point clocks go through the `NotNan` and
/// `OrderedFloat` wrappers of `ordered-float`, since bare `f64` is not [`Ord`]. The tandem model uses [`Clock`].
///
/// [`Clock`]: crate::model::Clock
/// [`precedence()`]: crate::engine::Event::precedence
pub trait SimTime: Ord + Debug {}

macro_rules! integral_clocks {
    ($($int:ty),*) => {
        $(impl SimTime for $int {})*
    };
}

integral_clocks!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl<F: ordered_float::FloatCore + Debug> SimTime for ordered_float::NotNan<F> {}
impl<F: ordered_float::FloatCore + Debug> SimTime for ordered_float::OrderedFloat<F> {}

/// State owned by a [`Simulation`] and handed mutably to each event in turn.
///
/// For the tandem model this is a [`Network`] holding everything one replication mutates.
///
/// [`Simulation`]: crate::engine::Simulation
/// [`Network`]: crate::model::Network
pub trait SimState<Time: SimTime> {
    /// Checked by [`Simulation::run()`] before every pop. Returning `true` stops the run with events possibly still
    /// pending. The default never stops early, so the run ends when the queue empties.
    ///
    /// [`Simulation::run()`]: crate::engine::Simulation::run
    fn is_complete(&self, _current_time: &Time) -> bool {
        false
    }
}
