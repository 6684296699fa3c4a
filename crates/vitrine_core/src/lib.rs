//! Vitrine Core
//!
//! Client-side behavior for a marketing site: floating promotional popups,
//! the video preview modal, the announcement banner and the small scroll
//! effects around them.
//!
//! # Features
//!
//! - **Overlay State Machine**: Explicit hidden/showing/shown/hiding states with the `show` class as a projection
//! - **Timer Registry**: Cancel-before-schedule slots so no overlay ever has duplicate timers
//! - **Scroll Policy**: Frame-coalesced region intersection driving popup groups (desktop only)
//! - **Responsive Switch**: Inline rendering on mobile, floating and timed on desktop
//! - **Video Modal**: Reveal/close transitions, focus trap, Escape and overlay-click close
//! - **Announcement Gate**: Durable dismissal with force-show and always-show overrides
//! - **Host Traits**: `Document`, `Clock`, `FlagStore` and `TrackingSink` keep the core platform-agnostic
//!
//! The core never owns a timer: everything deferred is a [`Task`] on the
//! page's [`Scheduler`], pumped by the host through [`Page::advance`].

pub mod announcement;
pub mod config;
pub mod context;
pub mod document;
pub mod effects;
pub mod error;
pub mod event;
pub mod indicators;
pub mod modal;
pub mod nav;
pub mod overlay;
pub mod page;
pub mod responsive;
pub mod scheduler;
pub mod scroll;
pub mod task;
pub mod timers;
pub mod tracking;
pub mod viewport;

#[cfg(test)]
pub(crate) mod testing;


pub use announcement::{AnnouncementGate, AnnouncementState, FlagStore, ShowReason, DISMISSED};
pub use config::{
    AnnouncementConfig, DelayedOverlay, EffectsConfig, GroupConfig, IndicatorConfig, ModalConfig,
    PageConfig, StaggerPlan,
};
pub use context::PageContext;
pub use document::{classes, selectors, Clock, Document, ModalMount};
pub use effects::ScrollEffects;
pub use error::{Result, VitrineError};
pub use event::{EventResponse, Key, KeyPress};
pub use indicators::IndicatorRotation;
pub use modal::{FocusTrap, Modal, ModalController, ModalId, ModalState};
pub use nav::NavMenu;
pub use overlay::{
    Overlay, OverlayEvent, OverlayKey, OverlayRegistry, OverlayState, OverlayView, Placement,
    VisibilityController,
};
pub use page::{LaunchOptions, Page, PageBuilder};
pub use responsive::{ModeChange, ModeSwitch};
pub use scheduler::{Scheduler, TimerId};
pub use scroll::{OverlayGroup, ScrollPolicy};
pub use task::{StaggerSource, Task};
pub use timers::{TimerKind, TimerRegistry};
pub use tracking::{track_click, Interaction, LogSink, TrackingSink};
pub use viewport::{Bounds, Viewport, ViewportMode};
