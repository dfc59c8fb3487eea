//! Scan debounce state machine
//!
//! Behaves as three states driven by two flags:
//!
//! | `decode_in_flight` | pending cooldown | state        |
//! |--------------------|------------------|--------------|
//! | false              | -                | `Idle`       |
//! | true               | no               | `Processing` |
//! | true               | yes              | `Cooldown`   |
//!
//! `scanning_enabled` is an independent gate: while it is false no frame is
//! admitted, and flipping it back on does not cut a running cooldown short.

use crate::schedule::{Scheduler, TaskHandle};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[cfg(feature = "logging")]
use tracing::debug;

/// Result of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The frame may be decoded; the machine is now `Processing`
    Admitted,
    /// Scanning is switched off
    Disabled,
    /// Another frame is being decoded or the cooldown is running
    Busy,
}

#[derive(Debug, Clone, Copy)]
struct Flags {
    scanning_enabled: bool,
    decode_in_flight: bool,
}

/// The two flags shared by frame delivery, decode completion and the timer
///
/// Every read-modify-write happens under one lock.
#[derive(Debug)]
pub struct ProcessingState {
    flags: Mutex<Flags>,
}

impl ProcessingState {
    /// Idle state with the given gate
    pub fn new(scanning_enabled: bool) -> Self {
        Self {
            flags: Mutex::new(Flags {
                scanning_enabled,
                decode_in_flight: false,
            }),
        }
    }

    /// Atomic test-and-set of `decode_in_flight`
    pub fn try_admit(&self) -> Admission {
        let mut flags = self.lock();
        if !flags.scanning_enabled {
            Admission::Disabled
        } else if flags.decode_in_flight {
            Admission::Busy
        } else {
            flags.decode_in_flight = true;
            Admission::Admitted
        }
    }

    /// Return to `Idle`
    pub fn clear_in_flight(&self) {
        self.lock().decode_in_flight = false;
    }

    /// Open or close the caller-controlled gate
    pub fn set_scanning_enabled(&self, enabled: bool) {
        self.lock().scanning_enabled = enabled;
    }

    /// Current gate value
    pub fn is_scanning_enabled(&self) -> bool {
        self.lock().scanning_enabled
    }

    /// Whether a decode or cooldown is running
    pub fn is_decode_in_flight(&self) -> bool {
        self.lock().decode_in_flight
    }

    fn lock(&self) -> MutexGuard<'_, Flags> {
        // Two plain booleans cannot be left half-updated by a panic.
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Admission, completion and cooldown scheduling around a [`ProcessingState`]
///
/// Dropping the debouncer cancels a pending cooldown. The cooldown task only
/// holds a weak reference to the state, so a task that fires late is a no-op.
pub struct Debouncer {
    state: Arc<ProcessingState>,
    scheduler: Arc<dyn Scheduler>,
    cooldown: Duration,
    pending: Mutex<Option<TaskHandle>>,
}

impl Debouncer {
    /// Create a debouncer in `Idle`
    pub fn new(
        scanning_enabled: bool,
        cooldown: Duration,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            state: Arc::new(ProcessingState::new(scanning_enabled)),
            scheduler,
            cooldown,
            pending: Mutex::new(None),
        }
    }

    /// Shared state, for inspection
    pub fn state(&self) -> &Arc<ProcessingState> {
        &self.state
    }

    /// Cooldown applied after an accepted detection
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Admission check for an arriving frame
    pub fn admit(&self) -> Admission {
        self.state.try_admit()
    }

    /// The admitted frame produced nothing: back to `Idle` immediately
    pub fn finish_empty(&self) {
        self.state.clear_in_flight();
    }

    /// The admitted frame produced an accepted value: enter `Cooldown`
    pub fn finish_accepted(&self) {
        let state = Arc::downgrade(&self.state);
        let handle = self.scheduler.schedule(
            self.cooldown,
            Box::new(move || {
                if let Some(state) = state.upgrade() {
                    state.clear_in_flight();
                    #[cfg(feature = "logging")]
                    debug!("Cooldown elapsed, scanning resumes");
                }
            }),
        );
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.replace(handle) {
            previous.cancel();
        }
    }

    /// Open or close the scanning gate
    pub fn set_scanning_enabled(&self, enabled: bool) {
        self.state.set_scanning_enabled(enabled);
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = pending.take() {
            handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ManualScheduler;

    fn debouncer(scheduler: &Arc<ManualScheduler>) -> Debouncer {
        Debouncer::new(true, Duration::from_millis(3000), scheduler.clone())
    }

    #[test]
    fn test_single_admission_until_finished() {
        let scheduler = Arc::new(ManualScheduler::new());
        let d = debouncer(&scheduler);
        assert_eq!(d.admit(), Admission::Admitted);
        for _ in 0..10 {
            assert_eq!(d.admit(), Admission::Busy);
        }
    }

    #[test]
    fn test_empty_result_returns_to_idle_without_cooldown() {
        let scheduler = Arc::new(ManualScheduler::new());
        let d = debouncer(&scheduler);
        assert_eq!(d.admit(), Admission::Admitted);
        d.finish_empty();
        assert_eq!(d.admit(), Admission::Admitted);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_cooldown_blocks_until_elapsed() {
        let scheduler = Arc::new(ManualScheduler::new());
        let d = debouncer(&scheduler);
        assert_eq!(d.admit(), Admission::Admitted);
        d.finish_accepted();

        scheduler.advance(Duration::from_millis(500));
        assert_eq!(d.admit(), Admission::Busy);
        scheduler.advance(Duration::from_millis(2499));
        assert_eq!(d.admit(), Admission::Busy);
        scheduler.advance(Duration::from_millis(1));
        assert_eq!(d.admit(), Admission::Admitted);
    }

    #[test]
    fn test_disabled_gate_overrides_idle() {
        let scheduler = Arc::new(ManualScheduler::new());
        let d = debouncer(&scheduler);
        d.set_scanning_enabled(false);
        assert_eq!(d.admit(), Admission::Disabled);
        assert!(!d.state().is_decode_in_flight());
        d.set_scanning_enabled(true);
        assert_eq!(d.admit(), Admission::Admitted);
    }

    #[test]
    fn test_reenabling_does_not_end_cooldown() {
        let scheduler = Arc::new(ManualScheduler::new());
        let d = debouncer(&scheduler);
        assert_eq!(d.admit(), Admission::Admitted);
        d.finish_accepted();
        d.set_scanning_enabled(false);
        d.set_scanning_enabled(true);
        assert_eq!(d.admit(), Admission::Busy);
        scheduler.advance(Duration::from_millis(3000));
        assert_eq!(d.admit(), Admission::Admitted);
    }

    #[test]
    fn test_drop_cancels_pending_cooldown() {
        let scheduler = Arc::new(ManualScheduler::new());
        let d = debouncer(&scheduler);
        assert_eq!(d.admit(), Admission::Admitted);
        d.finish_accepted();
        assert_eq!(scheduler.pending(), 1);
        drop(d);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.advance(Duration::from_secs(10)), 0);
    }

    #[test]
    fn test_late_timer_after_state_dropped_is_noop() {
        let scheduler = Arc::new(ManualScheduler::new());
        let state = {
            let d = debouncer(&scheduler);
            d.admit();
            // Bypass the handle so the task survives the debouncer.
            let weak = Arc::downgrade(d.state());
            scheduler.schedule(
                Duration::from_millis(1),
                Box::new(move || {
                    if let Some(s) = weak.upgrade() {
                        s.clear_in_flight();
                    }
                }),
            );
            Arc::downgrade(d.state())
        };
        assert!(state.upgrade().is_none());
        assert_eq!(scheduler.advance(Duration::from_millis(5)), 1);
    }
}
