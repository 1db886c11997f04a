//! Per-encoder configuration and compile-time capacity.
//!
//! Capacity is the const generic `N` on [`InstanceStore`](crate::InstanceStore) and
//! [`EncoderBridge`](crate::EncoderBridge). Handles are `0..N`. Pending signals are
//! tracked in a `u32` bit-set, so `N` must lie in `1..=MAX_INSTANCES`.

/// Capacity used when the integrator has no reason to pick another.
pub const DEFAULT_INSTANCES: usize = 4;

/// Largest supported capacity (one bit per handle in a `u32`).
pub const MAX_INSTANCES: usize = 32;

/// What happens when the knob moves past one of its limits.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgePolicy {
    /// Stick at the limit that was crossed.
    #[default]
    Clamp,
    /// Continue from the opposite limit.
    Wrap,
}

impl EdgePolicy {
    #[inline]
    pub const fn from_clamp(clamp_at_limit: bool) -> Self {
        if clamp_at_limit { Self::Clamp } else { Self::Wrap }
    }

    #[inline]
    pub const fn clamps(self) -> bool {
        matches!(self, Self::Clamp)
    }
}

/// Bounds and direction mapping for one encoder.
///
/// `min <= max` is expected but not enforced here; see
/// [`InstanceStore::try_init`](crate::InstanceStore::try_init).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderConfig {
    pub min: i16,
    pub max: i16,
    pub edge: EdgePolicy,
    /// Clockwise rotation increments when true, decrements when false.
    pub cw_is_positive: bool,
}

impl EncoderConfig {
    /// Clamping, clockwise-positive encoder over `min..=max`.
    pub const fn new(min: i16, max: i16) -> Self {
        Self {
            min,
            max,
            edge: EdgePolicy::Clamp,
            cw_is_positive: true,
        }
    }

    pub const fn with_edge(mut self, edge: EdgePolicy) -> Self {
        self.edge = edge;
        self
    }

    pub const fn with_cw_positive(mut self, cw_is_positive: bool) -> Self {
        self.cw_is_positive = cw_is_positive;
        self
    }

    #[inline]
    pub const fn has_ordered_bounds(&self) -> bool {
        self.min <= self.max
    }
}

impl Default for EncoderConfig {
    /// Full `i16` range, clamping, clockwise-positive.
    fn default() -> Self {
        Self::new(i16::MIN, i16::MAX)
    }
}
