//! Deferred work the page schedules on its [`Scheduler`](crate::scheduler::Scheduler)

use crate::modal::ModalId;
use crate::overlay::OverlayKey;
use crate::timers::TimerKind;

/// Which stagger plan a [`Task::Stagger`] runs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StaggerSource {
    /// One of the start-up plans, by index
    Welcome(usize),
    /// The plan run whenever the page enters desktop mode
    DesktopEntry,
}

/// A unit of deferred page work
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    /// A per-overlay timer owned by the timer registry
    Overlay {
        /// Overlay the timer belongs to
        key: OverlayKey,
        /// Which of the overlay's slots armed it
        kind: TimerKind,
    },
    /// Run a stagger plan (schedules one show per step)
    Stagger(StaggerSource),
    /// Mark a freshly mounted modal open (drives its CSS transition)
    RevealModal(ModalId),
    /// Remove a closed modal from the document
    RemoveModal(ModalId),
    /// Finish a video placeholder's loading state and open its modal
    FinishVideoLoad(usize),
    /// Show the announcement banner
    ShowAnnouncement,
    /// Take the dismissed announcement out of layout
    CollapseAnnouncement,
    /// Begin rotating popup indicators
    StartIndicators,
    /// Advance one indicator group
    RotateIndicators(usize),
}
