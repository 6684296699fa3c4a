//! Responsive mode switch
//!
//! Resize events arrive in bursts at the same width class. [`ModeSwitch`]
//! remembers the last mode it acted on and only reports real changes, so a
//! burst of resizes inside desktop mode never re-arms the entry stagger.

use crate::context::PageContext;
use crate::document::Document;
use crate::scheduler::TimerId;
use crate::task::{StaggerSource, Task};
use crate::viewport::ViewportMode;

/// A mode transition reported by [`ModeSwitch::update`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeChange {
    /// Mode before the change; `None` for the first observation
    pub from: Option<ViewportMode>,
    /// Mode now in effect
    pub to: ViewportMode,
}

/// Tracks the viewport mode and the desktop-entry stagger slot
#[derive(Debug)]
pub struct ModeSwitch {
    breakpoint_px: f32,
    entry_lead_ms: u64,
    current: Option<ViewportMode>,
    entry_timer: Option<TimerId>,
}

impl ModeSwitch {
    /// Create a switch that has not observed a width yet
    pub fn new(breakpoint_px: f32, entry_lead_ms: u64) -> Self {
        Self {
            breakpoint_px,
            entry_lead_ms,
            current: None,
            entry_timer: None,
        }
    }

    /// Last mode acted on
    pub fn current(&self) -> Option<ViewportMode> {
        self.current
    }

    /// Pending desktop-entry stagger, if any
    pub fn entry_timer(&self) -> Option<TimerId> {
        self.entry_timer
    }

    /// Observe a width; returns the change if the mode differs from the last one
    pub fn update(&mut self, width: f32) -> Option<ModeChange> {
        let to = ViewportMode::from_width(width, self.breakpoint_px);
        if self.current == Some(to) {
            return None;
        }
        let change = ModeChange {
            from: self.current,
            to,
        };
        self.current = Some(to);
        tracing::debug!("ModeSwitch::update - {:?} -> {:?} at {}px", change.from, to, width);
        Some(change)
    }

    /// Arm or drop the desktop-entry stagger for a change
    pub fn schedule_entry<D: Document>(&mut self, ctx: &mut PageContext<'_, D>, change: ModeChange) {
        if let Some(previous) = self.entry_timer.take() {
            ctx.scheduler.cancel(previous);
        }
        if change.to.is_desktop() {
            self.entry_timer = Some(
                ctx.scheduler
                    .schedule(self.entry_lead_ms, Task::Stagger(StaggerSource::DesktopEntry)),
            );
        }
    }

    /// Release the slot once its stagger fires; false for a stale timer
    pub fn complete_entry(&mut self, id: TimerId) -> bool {
        if self.entry_timer == Some(id) {
            self.entry_timer = None;
            true
        } else {
            false
        }
    }
}
