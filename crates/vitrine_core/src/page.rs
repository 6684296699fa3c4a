//! Page behavior root
//!
//! [`Page`] owns the scheduler and every controller and is the only thing a
//! host talks to. Each entry point first syncs the scheduler to the host
//! clock, so tasks scheduled inside it are measured from "now".
//!
//! # Host loop
//!
//! ```ignore
//! let mut page = PageBuilder::new(document, clock, flags)
//!     .config(config)
//!     .build()?;
//! page.start(LaunchOptions::default());
//!
//! // scroll event
//! if page.scroll() {
//!     request_animation_frame(|| page.frame());
//! }
//!
//! // after every entry point, and whenever the host timer fires
//! page.advance();
//! if let Some(deadline) = page.next_deadline() {
//!     arm_timer(deadline);
//! }
//! ```

use crate::announcement::{AnnouncementGate, AnnouncementState, FlagStore};
use crate::config::{PageConfig, StaggerPlan};
use crate::context::PageContext;
use crate::document::{selectors, Clock, Document};
use crate::effects::ScrollEffects;
use crate::error::Result;
use crate::event::{EventResponse, Key, KeyPress};
use crate::indicators::IndicatorRotation;
use crate::modal::ModalController;
use crate::nav::NavMenu;
use crate::overlay::{OverlayRegistry, OverlayState, VisibilityController};
use crate::responsive::{ModeChange, ModeSwitch};
use crate::scheduler::{Scheduler, TimerId};
use crate::scroll::ScrollPolicy;
use crate::task::{StaggerSource, Task};
use crate::tracking::{track_click, LogSink, TrackingSink};
use crate::viewport::ViewportMode;

/// Per-load inputs that do not come from configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// The force-show query parameter is present
    pub force_announcement: bool,
}

impl LaunchOptions {
    /// Options with the announcement forced on
    pub fn forced() -> Self {
        Self {
            force_announcement: true,
        }
    }
}

/// Builder for [`Page`]
pub struct PageBuilder<D: Document> {
    document: D,
    clock: Box<dyn Clock>,
    flags: Box<dyn FlagStore>,
    tracking: Box<dyn TrackingSink>,
    config: PageConfig,
}

impl<D: Document> PageBuilder<D> {
    /// Start a builder with the required collaborators
    pub fn new(
        document: D,
        clock: impl Clock + 'static,
        flags: impl FlagStore + 'static,
    ) -> Self {
        Self {
            document,
            clock: Box::new(clock),
            flags: Box::new(flags),
            tracking: Box::new(LogSink),
            config: PageConfig::default(),
        }
    }

    /// Set the configuration
    pub fn config(mut self, config: PageConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the tracking sink
    pub fn tracking(mut self, sink: impl TrackingSink + 'static) -> Self {
        self.tracking = Box::new(sink);
        self
    }

    /// Validate the configuration and resolve every controller against the document
    pub fn build(self) -> Result<Page<D>> {
        let Self {
            document,
            clock,
            flags,
            tracking,
            config,
        } = self;
        config.validate()?;

        let registry = OverlayRegistry::resolve(&document, &config.overlays);
        let scroll = ScrollPolicy::resolve(&document, &config.groups, &registry);
        let indicators =
            IndicatorRotation::resolve(&document, &registry, config.indicators.clone());
        let mut modals = ModalController::new(config.modal.clone());
        modals.resolve_placeholders(&document);
        let announcement = AnnouncementGate::resolve(&document, config.announcement.clone());
        let nav = NavMenu::resolve(&document);
        let effects = ScrollEffects::resolve(&document, config.effects.clone());

        // Rendered for real on the first mode observation in `start`
        let initial_mode = ViewportMode::from_width(document.viewport().width, config.breakpoint_px);
        let overlays = VisibilityController::new(
            registry,
            initial_mode,
            config.auto_hide_ms,
            config.popup_transition_ms,
        );
        let modes = ModeSwitch::new(config.breakpoint_px, config.desktop_entry.lead_ms);
        let scheduler = Scheduler::new(clock.now_ms());
        let welcome_timers = vec![None; config.welcome.len()];

        Ok(Page {
            document,
            clock,
            flags,
            tracking,
            config,
            scheduler,
            overlays,
            scroll,
            modes,
            modals,
            announcement,
            nav,
            effects,
            indicators,
            welcome_timers,
            started: false,
        })
    }
}

/// Every page behavior, wired together
pub struct Page<D: Document> {
    document: D,
    clock: Box<dyn Clock>,
    flags: Box<dyn FlagStore>,
    tracking: Box<dyn TrackingSink>,
    config: PageConfig,
    scheduler: Scheduler<Task>,
    overlays: VisibilityController<D::Element>,
    scroll: ScrollPolicy<D::Element>,
    modes: ModeSwitch,
    modals: ModalController<D::Element>,
    announcement: AnnouncementGate<D::Element>,
    nav: Option<NavMenu<D::Element>>,
    effects: ScrollEffects<D::Element>,
    indicators: IndicatorRotation<D::Element>,
    welcome_timers: Vec<Option<TimerId>>,
    started: bool,
}

impl<D: Document> Page<D> {
    /// Run start-up: first mode observation, welcome stagger, indicator start
    /// and the announcement gate
    pub fn start(&mut self, options: LaunchOptions) {
        if self.started {
            tracing::warn!("Page::start - already started");
            return;
        }
        self.started = true;
        self.sync_clock();

        self.effects.prepare(&self.document);
        self.sync_mode();

        let mut ctx = PageContext::new(&self.document, &mut self.scheduler);
        for (index, plan) in self.config.welcome.iter().enumerate() {
            self.welcome_timers[index] = Some(
                ctx.scheduler
                    .schedule(plan.lead_ms, Task::Stagger(StaggerSource::Welcome(index))),
            );
        }
        self.indicators.schedule_start(&mut ctx);
        self.announcement
            .start(&mut ctx, options.force_announcement, self.flags.as_ref());
        self.effects.update(&self.document);

        tracing::info!(
            "Page::start - {} overlays, {} groups, mode {:?}",
            self.overlays.registry().len(),
            self.scroll.groups().len(),
            self.overlays.mode()
        );
    }

    /// Scroll event; returns true when the host should request an animation frame
    pub fn scroll(&mut self) -> bool {
        self.scroll.request_frame()
    }

    /// Animation frame requested by [`Page::scroll`]
    pub fn frame(&mut self) {
        self.sync_clock();
        self.scroll.begin_frame();
        self.effects.update(&self.document);

        let mut ctx = PageContext::new(&self.document, &mut self.scheduler);
        self.scroll.evaluate(&mut ctx, &mut self.overlays);
    }

    /// Resize event
    pub fn resize(&mut self) {
        self.sync_clock();
        self.sync_mode();
    }

    /// Click anywhere in the document
    pub fn click(&mut self, target: &D::Element) -> EventResponse {
        self.sync_clock();
        let mut ctx = PageContext::new(&self.document, &mut self.scheduler);

        let mut response = self.modals.click(&mut ctx, target);

        if let Some(popup) = ctx
            .document
            .closest(target, selectors::POPUP_CLOSE)
            .and_then(|close| ctx.document.closest(&close, selectors::FLOATING_POPUP))
        {
            if let Some(key) = self.overlays.registry().key_for_element(&popup) {
                self.overlays.hide_key(&mut ctx, key);
            }
            response = response.merge(EventResponse::CONSUMED);
        }

        response = response.merge(self.announcement.click(
            &mut ctx,
            target,
            self.flags.as_ref(),
            self.tracking.as_ref(),
        ));
        self.modals.click_placeholder(&mut ctx, target);

        if let Some(nav) = &mut self.nav {
            // Toggle clicks always reach the menu; others only if nothing stopped them
            if !response.stop_propagation {
                response = response.merge(nav.click(&mut ctx, target));
            }
        }

        track_click(ctx.document, target, self.tracking.as_ref());
        response
    }

    /// Key press; `target` is the focused element the event was dispatched to
    pub fn key_down(&mut self, key: KeyPress, target: &D::Element) -> EventResponse {
        self.sync_clock();
        let mut ctx = PageContext::new(&self.document, &mut self.scheduler);

        match key.key {
            Key::Escape => {
                self.modals.close_all(&mut ctx);
                self.overlays.hide_all_visible(&mut ctx);
                self.announcement.escape(&mut ctx, self.flags.as_ref());
                EventResponse::IGNORED
            }
            Key::Tab => self.modals.key_down(&mut ctx, key, target),
            Key::Other => EventResponse::IGNORED,
        }
    }

    /// Run every task that is due
    pub fn advance(&mut self) {
        let now = self.clock.now_ms();
        while let Some((timer, task)) = self.scheduler.pop_due(now) {
            self.dispatch(timer, task);
        }
        self.scheduler.sync(now);
    }

    /// Earliest pending deadline on the host clock
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    /// Show an overlay after `delay_ms`
    pub fn show(&mut self, id: &str, delay_ms: u64) {
        self.sync_clock();
        let mut ctx = PageContext::new(&self.document, &mut self.scheduler);
        self.overlays.show(&mut ctx, id, delay_ms);
    }

    /// Hide an overlay now
    pub fn hide(&mut self, id: &str) {
        self.sync_clock();
        let mut ctx = PageContext::new(&self.document, &mut self.scheduler);
        self.overlays.hide(&mut ctx, id);
    }

    /// The host document
    pub fn document(&self) -> &D {
        &self.document
    }

    /// Active configuration
    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    /// Task queue
    pub fn scheduler(&self) -> &Scheduler<Task> {
        &self.scheduler
    }

    /// Overlay controller
    pub fn overlays(&self) -> &VisibilityController<D::Element> {
        &self.overlays
    }

    /// State of an overlay by id
    pub fn overlay_state(&self, id: &str) -> Option<OverlayState> {
        self.overlays.state(id)
    }

    /// Mode overlays are rendered for
    pub fn mode(&self) -> ViewportMode {
        self.overlays.mode()
    }

    /// Modal controller
    pub fn modals(&self) -> &ModalController<D::Element> {
        &self.modals
    }

    /// Announcement state
    pub fn announcement_state(&self) -> AnnouncementState {
        self.announcement.state()
    }

    /// Check whether the mobile menu is open
    pub fn nav_open(&self) -> bool {
        self.nav.as_ref().is_some_and(|nav| nav.is_open())
    }

    /// Check whether a scroll frame is outstanding
    pub fn frame_pending(&self) -> bool {
        self.scroll.frame_pending()
    }

    fn sync_clock(&mut self) {
        self.scheduler.sync(self.clock.now_ms());
    }

    fn sync_mode(&mut self) {
        let width = self.document.viewport().width;
        if let Some(change) = self.modes.update(width) {
            self.apply_mode_change(change);
        }
    }

    fn apply_mode_change(&mut self, change: ModeChange) {
        let mut ctx = PageContext::new(&self.document, &mut self.scheduler);
        self.overlays.apply_mode(&mut ctx, change.to);
        // Regions already in view arm their shows without waiting for a scroll
        if change.to.is_desktop() && change.from.is_some() {
            self.scroll.evaluate(&mut ctx, &mut self.overlays);
        }
        self.modes.schedule_entry(&mut ctx, change);
    }

    fn dispatch(&mut self, timer: TimerId, task: Task) {
        let mut ctx = PageContext::new(&self.document, &mut self.scheduler);
        match task {
            Task::Overlay { key, kind } => self.overlays.fire(&mut ctx, key, kind, timer),
            Task::Stagger(source) => {
                let plan = match source {
                    StaggerSource::Welcome(index) => {
                        match self.welcome_timers.get_mut(index) {
                            Some(slot) if *slot == Some(timer) => *slot = None,
                            _ => return,
                        }
                        self.config.welcome.get(index)
                    }
                    StaggerSource::DesktopEntry => {
                        if !self.modes.complete_entry(timer) {
                            return;
                        }
                        Some(&self.config.desktop_entry)
                    }
                };
                if let Some(plan) = plan {
                    run_stagger(&mut ctx, &mut self.overlays, plan);
                }
            }
            Task::RevealModal(id) => self.modals.reveal(&mut ctx, id, timer),
            Task::RemoveModal(id) => self.modals.remove(&mut ctx, id, timer),
            Task::FinishVideoLoad(index) => {
                self.modals.finish_load(&mut ctx, index, timer);
            }
            Task::ShowAnnouncement => self.announcement.show(&mut ctx, timer),
            Task::CollapseAnnouncement => self.announcement.collapse(&mut ctx, timer),
            Task::StartIndicators => self.indicators.start(&mut ctx, timer),
            Task::RotateIndicators(index) => {
                self.indicators
                    .rotate(&mut ctx, index, timer, &self.overlays)
            }
        }
    }
}

fn run_stagger<D: Document>(
    ctx: &mut PageContext<'_, D>,
    overlays: &mut VisibilityController<D::Element>,
    plan: &StaggerPlan,
) {
    if plan.desktop_only && overlays.mode().is_mobile() {
        tracing::debug!("Page::run_stagger - skipped in mobile mode");
        return;
    }
    for step in &plan.steps {
        overlays.show(ctx, &step.overlay, step.delay_ms);
    }
}

impl<D: Document> std::fmt::Debug for Page<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("mode", &self.overlays.mode())
            .field("overlays", &self.overlays.registry().len())
            .field("modals", &self.modals.len())
            .field("announcement", &self.announcement.state())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
