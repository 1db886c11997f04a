//! Fixed-capacity table of encoder records addressed by handle.
//!
//! # Overview
//! - One encoder record per handle, `0..N`, no allocation.
//! - Every call is bounds-checked; an out-of-range or uninitialized handle is
//!   refused without touching any record.
//! - The plain calls collapse refusal to `false` (mutators) or `0`/`false`
//!   (accessors) so polling sites stay branch-free. The `try_*` calls report
//!   the reason as an [`EncoderError`].
//!
//! # Latches
//! `event_pending` is set by every successful mutation, including those applied
//! by the drain in [`Consumer::run_pending`], and only cleared by
//! [`InstanceStore::check_event`]. `alert_pending` is overwritten
//! on every bounds evaluation and cleared by [`InstanceStore::check_alert`].
//!
//! [`Consumer::run_pending`]: crate::Consumer::run_pending

use crate::bounds::{self, Bounded};
use crate::config::{EdgePolicy, EncoderConfig, MAX_INSTANCES};
use crate::error::EncoderError;

/// State record of one encoder.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Encoder {
    initialized: bool,
    knob_value: i16,
    config: EncoderConfig,
    switch_value: bool,
    event_pending: bool,
    alert_pending: bool,
}

impl Encoder {
    const EMPTY: Self = Self {
        initialized: false,
        knob_value: 0,
        config: EncoderConfig {
            min: 0,
            max: 0,
            edge: EdgePolicy::Clamp,
            cw_is_positive: true,
        },
        switch_value: false,
        event_pending: false,
        alert_pending: false,
    };

    fn fresh(config: EncoderConfig) -> Self {
        Self {
            initialized: true,
            config,
            ..Self::EMPTY
        }
    }

    fn apply_bounds(&mut self, value: i32) {
        let Bounded { value, alert } =
            bounds::enforce(value, self.config.min, self.config.max, self.config.edge);
        self.knob_value = value;
        self.alert_pending = alert;
        self.event_pending = true;
    }
}

/// Observable state of one encoder, read without clearing the latches.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderState {
    pub knob: i16,
    pub switch: bool,
    pub event_pending: bool,
    pub alert_pending: bool,
}

/// Table of `N` encoder records.
pub struct InstanceStore<const N: usize> {
    encoders: [Encoder; N],
}

impl<const N: usize> InstanceStore<N> {
    /// Empty table; every handle starts uninitialized.
    pub const fn new() -> Self {
        assert!(N > 0 && N <= MAX_INSTANCES);
        Self {
            encoders: [Encoder::EMPTY; N],
        }
    }

    /// Number of handles this table holds.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    fn slot(&self, handle: u8) -> Result<&Encoder, EncoderError> {
        let enc = self
            .encoders
            .get(usize::from(handle))
            .ok_or(EncoderError::OutOfRange)?;
        if enc.initialized {
            Ok(enc)
        } else {
            Err(EncoderError::Uninitialized)
        }
    }

    #[inline]
    fn slot_mut(&mut self, handle: u8) -> Result<&mut Encoder, EncoderError> {
        let enc = self
            .encoders
            .get_mut(usize::from(handle))
            .ok_or(EncoderError::OutOfRange)?;
        if enc.initialized {
            Ok(enc)
        } else {
            Err(EncoderError::Uninitialized)
        }
    }

    /// Whether `handle` is in range and initialized.
    #[inline]
    pub fn is_initialized(&self, handle: u8) -> bool {
        self.slot(handle).is_ok()
    }

    /// (Re)initialize `handle`. Knob, switch and both latches are reset.
    ///
    /// Fails only for an out-of-range handle. Bounds with `min > max` are
    /// accepted as given; use [`try_init`](Self::try_init) to reject them.
    pub fn init(
        &mut self,
        handle: u8,
        min: i16,
        max: i16,
        clamp_at_limit: bool,
        cw_is_positive: bool,
    ) -> bool {
        let config = EncoderConfig::new(min, max)
            .with_edge(EdgePolicy::from_clamp(clamp_at_limit))
            .with_cw_positive(cw_is_positive);
        self.init_with(handle, config)
    }

    /// Same as [`init`](Self::init) with a prepared config.
    pub fn init_with(&mut self, handle: u8, config: EncoderConfig) -> bool {
        match self.encoders.get_mut(usize::from(handle)) {
            Some(enc) => {
                *enc = Encoder::fresh(config);
                true
            }
            None => false,
        }
    }

    /// Initialize `handle`, refusing inverted bounds.
    pub fn try_init(&mut self, handle: u8, config: EncoderConfig) -> Result<(), EncoderError> {
        if usize::from(handle) >= N {
            return Err(EncoderError::OutOfRange);
        }
        if !config.has_ordered_bounds() {
            return Err(EncoderError::InvertedBounds);
        }
        self.init_with(handle, config);
        Ok(())
    }

    /// Configuration `handle` was initialized with.
    pub fn config(&self, handle: u8) -> Option<EncoderConfig> {
        self.slot(handle).ok().map(|enc| enc.config)
    }

    /// Snapshot of `handle` without clearing its latches.
    pub fn state(&self, handle: u8) -> Option<EncoderState> {
        self.slot(handle).ok().map(|enc| EncoderState {
            knob: enc.knob_value,
            switch: enc.switch_value,
            event_pending: enc.event_pending,
            alert_pending: enc.alert_pending,
        })
    }

    /// Knob value, `0` for an invalid handle.
    #[inline]
    pub fn knob(&self, handle: u8) -> i16 {
        self.try_knob(handle).unwrap_or(0)
    }

    pub fn try_knob(&self, handle: u8) -> Result<i16, EncoderError> {
        self.slot(handle).map(|enc| enc.knob_value)
    }

    /// Switch value, `false` for an invalid handle.
    #[inline]
    pub fn switch(&self, handle: u8) -> bool {
        self.try_switch(handle).unwrap_or(false)
    }

    pub fn try_switch(&self, handle: u8) -> Result<bool, EncoderError> {
        self.slot(handle).map(|enc| enc.switch_value)
    }

    /// Overwrite the knob value, then clamp or wrap it.
    #[inline]
    pub fn set_knob(&mut self, handle: u8, value: i16) -> bool {
        self.try_set_knob(handle, value).is_ok()
    }

    pub fn try_set_knob(&mut self, handle: u8, value: i16) -> Result<(), EncoderError> {
        let enc = self.slot_mut(handle)?;
        enc.apply_bounds(i32::from(value));
        Ok(())
    }

    /// Step the knob up by one, then clamp or wrap it.
    #[inline]
    pub fn increment_knob(&mut self, handle: u8) -> bool {
        self.try_increment_knob(handle).is_ok()
    }

    pub fn try_increment_knob(&mut self, handle: u8) -> Result<(), EncoderError> {
        let enc = self.slot_mut(handle)?;
        let next = i32::from(enc.knob_value) + 1;
        enc.apply_bounds(next);
        Ok(())
    }

    /// Step the knob down by one, then clamp or wrap it.
    #[inline]
    pub fn decrement_knob(&mut self, handle: u8) -> bool {
        self.try_decrement_knob(handle).is_ok()
    }

    pub fn try_decrement_knob(&mut self, handle: u8) -> Result<(), EncoderError> {
        let enc = self.slot_mut(handle)?;
        let next = i32::from(enc.knob_value) - 1;
        enc.apply_bounds(next);
        Ok(())
    }

    #[inline]
    pub fn toggle_switch(&mut self, handle: u8) -> bool {
        self.try_toggle_switch(handle).is_ok()
    }

    pub fn try_toggle_switch(&mut self, handle: u8) -> Result<(), EncoderError> {
        let enc = self.slot_mut(handle)?;
        enc.switch_value = !enc.switch_value;
        enc.event_pending = true;
        Ok(())
    }

    /// Read and clear the event latch.
    pub fn check_event(&mut self, handle: u8) -> bool {
        self.slot_mut(handle)
            .map(|enc| core::mem::take(&mut enc.event_pending))
            .unwrap_or(false)
    }

    /// Read and clear the alert latch.
    pub fn check_alert(&mut self, handle: u8) -> bool {
        self.slot_mut(handle)
            .map(|enc| core::mem::take(&mut enc.alert_pending))
            .unwrap_or(false)
    }

    /// Mark `handle` as having applied an event. No-op for invalid handles.
    pub(crate) fn raise_event(&mut self, handle: u8) {
        if let Ok(enc) = self.slot_mut(handle) {
            enc.event_pending = true;
        }
    }
}

impl<const N: usize> Default for InstanceStore<N> {
    fn default() -> Self {
        Self::new()
    }
}
