//! Interrupt-to-task event bridge for rotary encoders.
//!
//! # Overview
//! - Any number of producers (interrupt handlers), one consumer (the task loop).
//! - Producers never block and never clear; each [`Producer::signal`] is O(1).
//! - The consumer drains everything pending in one [`Consumer::run_pending`] call
//!   and applies it to its [`InstanceStore`].
//! - Pending signals are counted per handle and per kind, so repeated edges
//!   between two drains are all applied.
//!
//! # Memory ordering
//! The producer bumps the per-handle counter, then publishes the handle's bit in
//! the `ready` set with `Release`. The consumer takes the whole `ready` set with an
//! atomic swap (`Acquire`), then swaps each flagged counter to zero. A signal
//! racing with the drain is either taken by it or left counted for the next one.
//! A bit whose counters were already emptied by an earlier drain is skipped.
//!
//! # Notes
//! - Capacity `N` is at most [`MAX_INSTANCES`](crate::MAX_INSTANCES).
//! - Counters are `u16` and wrap after 65536 unconsumed signals of one kind.
//! - Targets without atomic read-modify-write need the `portable-atomic` feature.

#[cfg(not(feature = "portable-atomic"))]
use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};
#[cfg(feature = "portable-atomic")]
use portable_atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};

use crate::config::{EncoderConfig, MAX_INSTANCES};
use crate::error::EncoderError;
use crate::store::{EncoderState, InstanceStore};

/// One resolved, debounced edge from an encoder.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Signal {
    Clockwise,
    CounterClockwise,
    Press,
}

/// What one [`Consumer::run_pending`] call applied.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DrainStats {
    /// Handles that had at least one signal.
    pub handles: usize,
    /// Rotation steps applied, both directions.
    pub rotations: usize,
    /// Switch toggles applied.
    pub presses: usize,
}

/// Shared pending-signal storage. Place it in a `static`.
pub struct EncoderBridge<const N: usize> {
    /// Handles producers may signal; written by the consumer only.
    enabled: AtomicU32,
    /// Handles with counted signals.
    ready: AtomicU32,
    cw: [AtomicU16; N],
    ccw: [AtomicU16; N],
    press: [AtomicU16; N],
    consumer_active: AtomicBool,
}

impl<const N: usize> EncoderBridge<N> {
    pub const fn new() -> Self {
        assert!(N > 0 && N <= MAX_INSTANCES);
        Self {
            enabled: AtomicU32::new(0),
            ready: AtomicU32::new(0),
            cw: [const { AtomicU16::new(0) }; N],
            ccw: [const { AtomicU16::new(0) }; N],
            press: [const { AtomicU16::new(0) }; N],
            consumer_active: AtomicBool::new(false),
        }
    }

    #[inline(always)]
    const fn bit(idx: usize) -> u32 {
        1u32 << idx
    }

    #[inline]
    fn counters(&self, signal: Signal) -> &[AtomicU16; N] {
        match signal {
            Signal::Clockwise => &self.cw,
            Signal::CounterClockwise => &self.ccw,
            Signal::Press => &self.press,
        }
    }

    /// Producer handle. Cheap to copy into each interrupt handler.
    #[inline]
    pub fn producer(&self) -> Producer<'_, N> {
        Producer { bridge: self }
    }

    /// Claim the consumer role. `None` while another consumer is alive.
    pub fn consumer(&self) -> Option<Consumer<'_, N>> {
        if self.consumer_active.swap(true, Ordering::Acquire) {
            #[cfg(feature = "defmt")]
            defmt::warn!("encoder bridge: consumer already claimed");
            return None;
        }
        Some(Consumer {
            bridge: self,
            store: InstanceStore::new(),
        })
    }

    fn discard(&self, idx: usize) {
        self.cw[idx].store(0, Ordering::Relaxed);
        self.ccw[idx].store(0, Ordering::Relaxed);
        self.press[idx].store(0, Ordering::Relaxed);
    }

    fn take(&self, idx: usize) -> (u16, u16, u16) {
        (
            self.cw[idx].swap(0, Ordering::AcqRel),
            self.ccw[idx].swap(0, Ordering::AcqRel),
            self.press[idx].swap(0, Ordering::AcqRel),
        )
    }
}

impl<const N: usize> Default for EncoderBridge<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Interrupt-side handle.
#[derive(Copy, Clone)]
pub struct Producer<'a, const N: usize> {
    bridge: &'a EncoderBridge<N>,
}

impl<'a, const N: usize> Producer<'a, N> {
    /// Record one edge for `handle`.
    ///
    /// Returns `false` and records nothing if `handle` is out of range or not
    /// initialized by the consumer.
    #[inline]
    pub fn signal(&self, handle: u8, signal: Signal) -> bool {
        let idx = usize::from(handle);
        if idx >= N {
            return false;
        }
        let bit = EncoderBridge::<N>::bit(idx);
        if self.bridge.enabled.load(Ordering::Acquire) & bit == 0 {
            #[cfg(feature = "defmt")]
            defmt::trace!("encoder {}: {} dropped, not initialized", handle, signal);
            return false;
        }

        self.bridge.counters(signal)[idx].fetch_add(1, Ordering::Relaxed);
        self.bridge.ready.fetch_or(bit, Ordering::Release);
        true
    }
}

/// Task-side handle. Owns the encoder records.
///
/// Dropping it disables every handle, discards pending signals and releases
/// the consumer role.
pub struct Consumer<'a, const N: usize> {
    bridge: &'a EncoderBridge<N>,
    store: InstanceStore<N>,
}

impl<'a, const N: usize> Consumer<'a, N> {
    /// Read-only view of the encoder records.
    #[inline]
    pub fn store(&self) -> &InstanceStore<N> {
        &self.store
    }

    /// Apply every pending signal, in increasing handle order.
    ///
    /// Per handle: all clockwise steps, then all counter-clockwise steps, then
    /// one switch toggle per press. The handle's event latch is set whenever at
    /// least one signal was taken, even if clamping left the knob unchanged.
    pub fn run_pending(&mut self) -> DrainStats {
        let mut stats = DrainStats::default();
        let mut ready = self.bridge.ready.swap(0, Ordering::Acquire);

        while ready != 0 {
            let idx = ready.trailing_zeros() as usize;
            ready &= ready - 1;

            let (cw, ccw, press) = self.bridge.take(idx);
            if cw == 0 && ccw == 0 && press == 0 {
                continue;
            }

            let handle = idx as u8;
            let Some(config) = self.store.config(handle) else {
                continue;
            };

            for _ in 0..cw {
                self.step(handle, config.cw_is_positive);
            }
            for _ in 0..ccw {
                self.step(handle, !config.cw_is_positive);
            }
            for _ in 0..press {
                self.store.toggle_switch(handle);
            }
            self.store.raise_event(handle);

            stats.handles += 1;
            stats.rotations += usize::from(cw) + usize::from(ccw);
            stats.presses += usize::from(press);
        }

        #[cfg(feature = "defmt")]
        if stats.handles > 0 {
            defmt::debug!("encoder drain: {}", stats);
        }

        stats
    }

    #[inline]
    fn step(&mut self, handle: u8, up: bool) {
        if up {
            self.store.increment_knob(handle);
        } else {
            self.store.decrement_knob(handle);
        }
    }

    fn enable(&self, handle: u8) {
        let idx = usize::from(handle);
        self.bridge.discard(idx);
        self.bridge
            .enabled
            .fetch_or(EncoderBridge::<N>::bit(idx), Ordering::Release);
    }

    /// (Re)initialize `handle` and start accepting its signals.
    ///
    /// Signals counted for `handle` before this call are discarded.
    pub fn init(
        &mut self,
        handle: u8,
        min: i16,
        max: i16,
        clamp_at_limit: bool,
        cw_is_positive: bool,
    ) -> bool {
        let ok = self
            .store
            .init(handle, min, max, clamp_at_limit, cw_is_positive);
        if ok {
            self.enable(handle);
            #[cfg(feature = "defmt")]
            defmt::debug!("encoder {}: init {}..={}", handle, min, max);
        }
        ok
    }

    pub fn init_with(&mut self, handle: u8, config: EncoderConfig) -> bool {
        let ok = self.store.init_with(handle, config);
        if ok {
            self.enable(handle);
            #[cfg(feature = "defmt")]
            defmt::debug!("encoder {}: init {}", handle, config);
        }
        ok
    }

    pub fn try_init(&mut self, handle: u8, config: EncoderConfig) -> Result<(), EncoderError> {
        self.store.try_init(handle, config)?;
        self.enable(handle);
        Ok(())
    }

    #[inline]
    pub fn knob(&self, handle: u8) -> i16 {
        self.store.knob(handle)
    }

    #[inline]
    pub fn switch(&self, handle: u8) -> bool {
        self.store.switch(handle)
    }

    #[inline]
    pub fn try_knob(&self, handle: u8) -> Result<i16, EncoderError> {
        self.store.try_knob(handle)
    }

    #[inline]
    pub fn try_switch(&self, handle: u8) -> Result<bool, EncoderError> {
        self.store.try_switch(handle)
    }

    #[inline]
    pub fn config(&self, handle: u8) -> Option<EncoderConfig> {
        self.store.config(handle)
    }

    #[inline]
    pub fn state(&self, handle: u8) -> Option<EncoderState> {
        self.store.state(handle)
    }

    #[inline]
    pub fn check_event(&mut self, handle: u8) -> bool {
        self.store.check_event(handle)
    }

    #[inline]
    pub fn check_alert(&mut self, handle: u8) -> bool {
        self.store.check_alert(handle)
    }

    #[inline]
    pub fn set_knob(&mut self, handle: u8, value: i16) -> bool {
        self.store.set_knob(handle, value)
    }

    #[inline]
    pub fn increment_knob(&mut self, handle: u8) -> bool {
        self.store.increment_knob(handle)
    }

    #[inline]
    pub fn decrement_knob(&mut self, handle: u8) -> bool {
        self.store.decrement_knob(handle)
    }

    #[inline]
    pub fn toggle_switch(&mut self, handle: u8) -> bool {
        self.store.toggle_switch(handle)
    }

    #[inline]
    pub fn try_set_knob(&mut self, handle: u8, value: i16) -> Result<(), EncoderError> {
        self.store.try_set_knob(handle, value)
    }

    #[inline]
    pub fn try_increment_knob(&mut self, handle: u8) -> Result<(), EncoderError> {
        self.store.try_increment_knob(handle)
    }

    #[inline]
    pub fn try_decrement_knob(&mut self, handle: u8) -> Result<(), EncoderError> {
        self.store.try_decrement_knob(handle)
    }

    #[inline]
    pub fn try_toggle_switch(&mut self, handle: u8) -> Result<(), EncoderError> {
        self.store.try_toggle_switch(handle)
    }
}

impl<'a, const N: usize> Drop for Consumer<'a, N> {
    fn drop(&mut self) {
        self.bridge.enabled.store(0, Ordering::Release);
        self.bridge.ready.store(0, Ordering::Relaxed);
        for idx in 0..N {
            self.bridge.discard(idx);
        }
        self.bridge.consumer_active.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::{DrainStats, EncoderBridge, Signal};
    use crate::config::{EdgePolicy, EncoderConfig};

    #[test]
    fn clamp_scenario_stops_at_max() {
        let bridge = EncoderBridge::<4>::new();
        let producer = bridge.producer();
        let mut consumer = bridge.consumer().unwrap();
        consumer.init(0, 0, 10, true, true);

        for _ in 0..12 {
            assert!(producer.signal(0, Signal::Clockwise));
        }
        consumer.run_pending();

        assert_eq!(consumer.knob(0), 10);
        assert!(consumer.check_alert(0));
        assert!(consumer.check_event(0));
    }

    #[test]
    fn wrap_scenario_rolls_back_to_min() {
        let bridge = EncoderBridge::<4>::new();
        let producer = bridge.producer();
        let mut consumer = bridge.consumer().unwrap();
        consumer.init(0, 0, 10, false, true);

        for _ in 0..11 {
            producer.signal(0, Signal::Clockwise);
        }
        let stats = consumer.run_pending();

        assert_eq!(consumer.knob(0), 0);
        assert_eq!(
            stats,
            DrainStats {
                handles: 1,
                rotations: 11,
                presses: 0
            }
        );
    }

    #[test]
    fn ccw_increments_when_cw_is_negative() {
        let bridge = EncoderBridge::<4>::new();
        let producer = bridge.producer();
        let mut consumer = bridge.consumer().unwrap();
        consumer.init(1, -5, 5, true, false);

        producer.signal(1, Signal::CounterClockwise);
        consumer.run_pending();
        assert_eq!(consumer.knob(1), 1);

        producer.signal(1, Signal::Clockwise);
        producer.signal(1, Signal::Clockwise);
        consumer.run_pending();
        assert_eq!(consumer.knob(1), -1);
    }

    #[test]
    fn cw_applies_before_ccw_in_one_drain() {
        let bridge = EncoderBridge::<4>::new();
        let producer = bridge.producer();
        let mut consumer = bridge.consumer().unwrap();
        consumer.init(0, 0, 10, true, true);

        // Sitting at max: cw clamps, then ccw steps down.
        consumer.set_knob(0, 10);
        producer.signal(0, Signal::CounterClockwise);
        producer.signal(0, Signal::Clockwise);
        consumer.run_pending();

        assert_eq!(consumer.knob(0), 9);
        assert!(!consumer.check_alert(0));
    }

    #[test]
    fn press_toggles_switch_per_signal() {
        let bridge = EncoderBridge::<4>::new();
        let producer = bridge.producer();
        let mut consumer = bridge.consumer().unwrap();
        consumer.init(2, 0, 10, true, true);

        producer.signal(2, Signal::Press);
        consumer.run_pending();
        assert!(consumer.switch(2));
        assert!(consumer.check_event(2));

        producer.signal(2, Signal::Press);
        producer.signal(2, Signal::Press);
        consumer.run_pending();
        assert!(consumer.switch(2));
        assert_eq!(consumer.knob(2), 0);
    }

    #[test]
    fn event_latch_set_even_without_net_change() {
        let bridge = EncoderBridge::<4>::new();
        let producer = bridge.producer();
        let mut consumer = bridge.consumer().unwrap();
        consumer.init(0, 0, 0, true, true);

        producer.signal(0, Signal::Clockwise);
        consumer.run_pending();

        assert_eq!(consumer.knob(0), 0);
        assert!(consumer.check_event(0));
        assert!(!consumer.check_event(0));
    }

    #[test]
    fn signal_to_other_handle_is_isolated() {
        let bridge = EncoderBridge::<4>::new();
        let producer = bridge.producer();
        let mut consumer = bridge.consumer().unwrap();
        consumer.init(0, -10, 10, true, true);
        consumer.init(1, -10, 10, true, true);

        producer.signal(0, Signal::Clockwise);
        producer.signal(0, Signal::Press);
        consumer.run_pending();

        assert_eq!(consumer.knob(0), 1);
        assert_eq!(consumer.knob(1), 0);
        assert!(!consumer.switch(1));
        assert!(!consumer.check_event(1));
        assert!(!consumer.check_alert(1));
    }

    #[test]
    fn signal_refused_for_invalid_handles() {
        let bridge = EncoderBridge::<4>::new();
        let producer = bridge.producer();
        let mut consumer = bridge.consumer().unwrap();

        assert!(!producer.signal(0, Signal::Clockwise));
        assert!(!producer.signal(4, Signal::Clockwise));
        assert!(!producer.signal(u8::MAX, Signal::Press));
        assert_eq!(consumer.run_pending(), DrainStats::default());

        consumer.init(0, 0, 10, true, true);
        assert!(!consumer.check_event(0));
        assert!(producer.signal(0, Signal::Clockwise));
    }

    #[test]
    fn empty_drain_touches_nothing() {
        let bridge = EncoderBridge::<4>::new();
        let mut consumer = bridge.consumer().unwrap();
        consumer.init(0, 0, 10, true, true);

        assert_eq!(consumer.run_pending(), DrainStats::default());
        assert!(!consumer.check_event(0));
    }

    #[test]
    fn reinit_discards_pending_signals() {
        let bridge = EncoderBridge::<4>::new();
        let producer = bridge.producer();
        let mut consumer = bridge.consumer().unwrap();
        consumer.init(0, 0, 10, true, true);

        producer.signal(0, Signal::Clockwise);
        consumer.init_with(0, EncoderConfig::new(0, 10).with_edge(EdgePolicy::Wrap));
        assert_eq!(consumer.run_pending(), DrainStats::default());
        assert_eq!(consumer.knob(0), 0);
    }

    #[test]
    fn only_one_consumer_at_a_time() {
        let bridge = EncoderBridge::<4>::new();
        let first = bridge.consumer();
        assert!(first.is_some());
        assert!(bridge.consumer().is_none());

        drop(first);
        assert!(bridge.consumer().is_some());
    }

    #[test]
    fn dropping_consumer_disables_handles() {
        let bridge = EncoderBridge::<4>::new();
        let producer = bridge.producer();
        {
            let mut consumer = bridge.consumer().unwrap();
            consumer.init(0, 0, 10, true, true);
            assert!(producer.signal(0, Signal::Clockwise));
        }
        assert!(!producer.signal(0, Signal::Clockwise));

        let mut consumer = bridge.consumer().unwrap();
        consumer.init(0, 0, 10, true, true);
        assert_eq!(consumer.run_pending(), DrainStats::default());
    }

    #[test]
    fn bridge_can_be_static() {
        static BRIDGE: EncoderBridge<2> = EncoderBridge::new();
        let mut consumer = BRIDGE.consumer().unwrap();
        consumer.init(1, 0, 3, true, true);
        BRIDGE.producer().signal(1, Signal::Clockwise);
        consumer.run_pending();
        assert_eq!(consumer.knob(1), 1);
    }
}
