use std::time::Instant;

use glam::{DVec3, IVec3};

/// The entity whose viewpoint the overlays are rendered from.
///
/// Positions are absolute world coordinates. The container interpolates
/// between the previous and current tick position for sub-tick rendering,
/// so both must refer to the same coordinate space.
pub trait ViewEntity {
    /// Position at the current tick.
    fn pos(&self) -> DVec3;

    /// Position at the previous tick.
    fn prev_pos(&self) -> DVec3;

    /// Block-aligned position at the current tick.
    fn block_pos(&self) -> IVec3 {
        self.pos().floor().as_ivec3()
    }
}

/// Frame profiler hooks.
///
/// Sections nest; every `push` is matched by a `pop`, also when the
/// section's work bails out with an error.
pub trait Profiler {
    fn push(&mut self, label: &'static str);
    fn pop(&mut self);
}

/// Profiler used when the host does not provide one.
pub struct NoopProfiler;

impl Profiler for NoopProfiler {
    fn push(&mut self, _label: &'static str) {}
    fn pop(&mut self) {}
}

/// Monotonic nanosecond time source.
pub trait Clock {
    fn now_nanos(&self) -> u64;
}

/// [`Clock`] backed by [`Instant`], anchored at construction time.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_nanos(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}
