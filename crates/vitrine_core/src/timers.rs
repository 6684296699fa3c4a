//! Timer registry
//!
//! Each overlay owns one slot per [`TimerKind`]. Arming a slot always cancels
//! whatever the slot held before, so an overlay can never have two pending
//! show timers or two pending auto-hide timers, no matter how many triggers
//! (start-up stagger, scroll, resize) ask for one.

use rustc_hash::FxHashMap;

use crate::overlay::OverlayKey;
use crate::scheduler::{Scheduler, TimerId};
use crate::task::Task;

/// The kinds of timer an overlay can have pending
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Delayed show
    Show,
    /// Dwell expiry while shown on desktop
    AutoHide,
    /// End of the show/hide CSS transition
    Settle,
}

#[derive(Clone, Copy, Debug, Default)]
struct TimerSlots {
    show: Option<TimerId>,
    auto_hide: Option<TimerId>,
    settle: Option<TimerId>,
}

impl TimerSlots {
    fn slot_mut(&mut self, kind: TimerKind) -> &mut Option<TimerId> {
        match kind {
            TimerKind::Show => &mut self.show,
            TimerKind::AutoHide => &mut self.auto_hide,
            TimerKind::Settle => &mut self.settle,
        }
    }

    fn slot(&self, kind: TimerKind) -> Option<TimerId> {
        match kind {
            TimerKind::Show => self.show,
            TimerKind::AutoHide => self.auto_hide,
            TimerKind::Settle => self.settle,
        }
    }
}

/// Per-overlay pending timer handles
#[derive(Debug, Default)]
pub struct TimerRegistry {
    slots: FxHashMap<OverlayKey, TimerSlots>,
}

impl TimerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Make an overlay known to the registry
    pub fn register(&mut self, key: OverlayKey) {
        self.slots.entry(key).or_default();
    }

    /// Check whether an overlay is known
    pub fn is_registered(&self, key: OverlayKey) -> bool {
        self.slots.contains_key(&key)
    }

    /// Arm a timer, canceling any pending timer of the same kind first
    ///
    /// Returns `None` for an unknown overlay.
    pub fn schedule(
        &mut self,
        scheduler: &mut Scheduler<Task>,
        key: OverlayKey,
        kind: TimerKind,
        delay_ms: u64,
    ) -> Option<TimerId> {
        let slots = self.slots.get_mut(&key)?;
        let slot = slots.slot_mut(kind);
        if let Some(previous) = slot.take() {
            scheduler.cancel(previous);
        }

        let id = scheduler.schedule(delay_ms, Task::Overlay { key, kind });
        *slot = Some(id);

        tracing::trace!(
            "TimerRegistry::schedule - {:?} for {:?} in {}ms",
            kind,
            key,
            delay_ms
        );
        Some(id)
    }

    /// Cancel one pending timer
    pub fn cancel(&mut self, scheduler: &mut Scheduler<Task>, key: OverlayKey, kind: TimerKind) {
        if let Some(id) = self.slots.get_mut(&key).and_then(|s| s.slot_mut(kind).take()) {
            scheduler.cancel(id);
        }
    }

    /// Cancel every pending timer of an overlay
    pub fn cancel_all(&mut self, scheduler: &mut Scheduler<Task>, key: OverlayKey) {
        for kind in [TimerKind::Show, TimerKind::AutoHide, TimerKind::Settle] {
            self.cancel(scheduler, key, kind);
        }
    }

    /// Release a slot whose timer just fired
    ///
    /// Returns false when the slot has since been re-armed with a different
    /// timer, meaning the fired task is stale and must be ignored.
    pub fn complete(&mut self, key: OverlayKey, kind: TimerKind, id: TimerId) -> bool {
        let Some(slots) = self.slots.get_mut(&key) else {
            return false;
        };
        let slot = slots.slot_mut(kind);
        if *slot == Some(id) {
            *slot = None;
            true
        } else {
            false
        }
    }

    /// Pending timer of one kind
    pub fn pending(&self, key: OverlayKey, kind: TimerKind) -> Option<TimerId> {
        self.slots.get(&key).and_then(|s| s.slot(kind))
    }

    /// Check for a pending timer of one kind
    pub fn has_pending(&self, key: OverlayKey, kind: TimerKind) -> bool {
        self.pending(key, kind).is_some()
    }
}
