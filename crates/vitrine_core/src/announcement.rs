//! Announcement banner gate
//!
//! The banner is shown once per visitor: dismissing it writes a durable flag
//! that suppresses it on later loads. Two overrides bypass the flag, checked
//! in order: the force-show query parameter, then the always-show switch.
//!
//! Storage is optional. A failed read counts as "not dismissed" and a failed
//! write only costs the visitor seeing the banner again next time.

use crate::config::AnnouncementConfig;
use crate::context::PageContext;
use crate::document::{classes, selectors, Document};
use crate::error::Result;
use crate::event::EventResponse;
use crate::scheduler::TimerId;
use crate::task::Task;
use crate::tracking::{Interaction, TrackingSink};

/// Durable key-value store scoped to the site
pub trait FlagStore {
    /// Read a flag
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a flag
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Value written when the banner is dismissed
pub const DISMISSED: &str = "1";

/// Where the banner is in its life
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum AnnouncementState {
    /// No banner element on the page
    #[default]
    Absent,
    /// Show scheduled
    Pending,
    /// Visible
    Shown,
    /// Dismissed during this visit
    Dismissed,
    /// Dismissed on an earlier visit; never shown
    Suppressed,
}

/// Why the gate decided to show the banner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowReason {
    /// Force-show query parameter present
    Forced,
    /// Always-show switch enabled
    AlwaysShow,
    /// No stored dismissal
    NotDismissed,
}

/// Announcement banner controller
#[derive(Debug)]
pub struct AnnouncementGate<E> {
    config: AnnouncementConfig,
    element: Option<E>,
    close_button: Option<E>,
    cta: Option<E>,
    state: AnnouncementState,
    show_timer: Option<TimerId>,
    collapse_timer: Option<TimerId>,
}

impl<E: Clone + PartialEq> AnnouncementGate<E> {
    /// Resolve the banner and its controls
    pub fn resolve<D: Document<Element = E>>(document: &D, config: AnnouncementConfig) -> Self {
        let element = document.element_by_id(&config.element_id);
        let (close_button, cta) = match &element {
            Some(banner) => (
                document
                    .query_within(banner, selectors::ANNOUNCEMENT_CLOSE)
                    .into_iter()
                    .next(),
                document
                    .query_within(banner, selectors::ANNOUNCEMENT_LINK)
                    .into_iter()
                    .next(),
            ),
            None => {
                tracing::info!("AnnouncementGate::resolve - #{} not found", config.element_id);
                (None, None)
            }
        };

        Self {
            config,
            element,
            close_button,
            cta,
            state: AnnouncementState::Absent,
            show_timer: None,
            collapse_timer: None,
        }
    }

    /// Current state
    pub fn state(&self) -> AnnouncementState {
        self.state
    }

    /// Decide whether this load shows the banner
    ///
    /// Returns `None` when a stored dismissal suppresses it.
    pub fn decide(&self, forced: bool, store: &dyn FlagStore) -> Option<ShowReason> {
        if forced {
            return Some(ShowReason::Forced);
        }
        if self.config.always_show {
            return Some(ShowReason::AlwaysShow);
        }
        match store.get(&self.config.storage_key) {
            Ok(Some(value)) if !value.is_empty() => None,
            Ok(_) => Some(ShowReason::NotDismissed),
            Err(err) => {
                tracing::warn!("AnnouncementGate::decide - flag read failed: {}", err);
                Some(ShowReason::NotDismissed)
            }
        }
    }

    /// Run the gate for this load
    pub fn start<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        forced: bool,
        store: &dyn FlagStore,
    ) {
        let Some(element) = &self.element else {
            return;
        };

        match self.decide(forced, store) {
            Some(reason) => {
                tracing::info!(
                    "AnnouncementGate::start - showing in {}ms ({:?})",
                    self.config.show_delay_ms,
                    reason
                );
                self.state = AnnouncementState::Pending;
                self.show_timer = Some(
                    ctx.scheduler
                        .schedule(self.config.show_delay_ms, Task::ShowAnnouncement),
                );
            }
            None => {
                tracing::info!("AnnouncementGate::start - previously dismissed, not showing");
                ctx.document.set_style(element, "display", "none");
                self.state = AnnouncementState::Suppressed;
            }
        }
    }

    /// Show task
    pub fn show<D: Document<Element = E>>(&mut self, ctx: &mut PageContext<'_, D>, timer: TimerId) {
        if self.show_timer != Some(timer) {
            return;
        }
        self.show_timer = None;
        if let (Some(element), AnnouncementState::Pending) = (&self.element, self.state) {
            ctx.document.set_class(element, classes::SHOW, true);
            self.state = AnnouncementState::Shown;
        }
    }

    /// Hide the banner, persist the dismissal and schedule its collapse
    ///
    /// Returns false unless the banner was pending or shown.
    pub fn dismiss<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        store: &dyn FlagStore,
    ) -> bool {
        if !matches!(
            self.state,
            AnnouncementState::Pending | AnnouncementState::Shown
        ) {
            return false;
        }
        let Some(element) = &self.element else {
            return false;
        };

        if let Some(pending) = self.show_timer.take() {
            ctx.scheduler.cancel(pending);
        }
        ctx.document.set_class(element, classes::SHOW, false);
        if let Err(err) = store.set(&self.config.storage_key, DISMISSED) {
            tracing::warn!("AnnouncementGate::dismiss - flag write failed: {}", err);
        }
        self.state = AnnouncementState::Dismissed;
        self.collapse_timer = Some(
            ctx.scheduler
                .schedule(self.config.collapse_delay_ms, Task::CollapseAnnouncement),
        );
        tracing::debug!("AnnouncementGate::dismiss - dismissed");
        true
    }

    /// Collapse task: take the dismissed banner out of layout
    pub fn collapse<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        timer: TimerId,
    ) {
        if self.collapse_timer != Some(timer) {
            return;
        }
        self.collapse_timer = None;
        if let Some(element) = &self.element {
            ctx.document.set_style(element, "display", "none");
        }
    }

    /// Escape dismisses the banner only while it is on screen
    pub fn escape<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        store: &dyn FlagStore,
    ) -> bool {
        self.state == AnnouncementState::Shown && self.dismiss(ctx, store)
    }

    /// Route a click on the banner's close button or call-to-action
    pub fn click<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        target: &E,
        store: &dyn FlagStore,
        tracking: &dyn TrackingSink,
    ) -> EventResponse {
        if let Some(close) = &self.close_button {
            if ctx.document.contains(close, target) {
                self.dismiss(ctx, store);
                return EventResponse::PREVENT;
            }
        }
        if let Some(cta) = &self.cta {
            if ctx.document.contains(cta, target) {
                Interaction::AnnouncementCta.record(tracking, &self.config.cta_label);
            }
        }
        EventResponse::IGNORED
    }
}
