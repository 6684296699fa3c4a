//! Overlay visibility
//!
//! Floating popups are tracked in an [`OverlayRegistry`] resolved once at
//! start-up: identifier -> element + [`OverlayState`]. The explicit state is the
//! single source of truth for "is this overlay shown"; the `show` class and the
//! inline placement styles are a projection of it ([`OverlayView`]) written
//! whenever the state or the viewport mode changes.
//!
//! # Lifecycle
//!
//! ```text
//!            show                 transition end
//!  Hidden ----------> Showing -------------------> Shown
//!    ^                 |   ^                         |
//!    |            hide |   | show                    | hide
//!    |                 v   |                         |
//!    +-------------- Hiding <------------------------+
//!      transition end
//! ```
//!
//! [`VisibilityController`] owns the registry and the per-overlay
//! [`TimerRegistry`]; every show, hide and auto-hide goes through it.

use indexmap::IndexMap;
use slotmap::{new_key_type, SlotMap};

use crate::context::PageContext;
use crate::document::{classes, selectors, Document};
use crate::scheduler::TimerId;
use crate::timers::{TimerKind, TimerRegistry};
use crate::viewport::ViewportMode;

new_key_type! {
    /// Handle to a registered overlay
    pub struct OverlayKey;
}

// =============================================================================
// OverlayState - FSM for overlay visibility
// =============================================================================

/// Events driving [`OverlayState`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverlayEvent {
    /// A show was requested and is due
    Show,
    /// A hide was requested
    Hide,
    /// The show/hide transition finished
    TransitionEnd,
    /// Drop to hidden with no transition (entering mobile mode)
    Reset,
}

/// Visibility state of one overlay
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum OverlayState {
    /// Not shown
    #[default]
    Hidden,
    /// `show` class applied, enter transition running
    Showing,
    /// Fully shown
    Shown,
    /// `show` class removed, exit transition running
    Hiding,
}

impl OverlayState {
    /// Logical visibility: the overlay counts as shown
    pub fn is_visible(&self) -> bool {
        matches!(self, OverlayState::Showing | OverlayState::Shown)
    }

    /// Check if a transition is running
    pub fn is_animating(&self) -> bool {
        matches!(self, OverlayState::Showing | OverlayState::Hiding)
    }

    /// Handle an event and return the new state, or None if no transition
    pub fn on_event(&self, event: OverlayEvent) -> Option<Self> {
        use OverlayEvent::*;
        use OverlayState::*;

        match (self, event) {
            (Hidden, Show) | (Hiding, Show) => Some(Showing),
            (Showing, TransitionEnd) => Some(Shown),
            (Showing, Hide) | (Shown, Hide) => Some(Hiding),
            (Hiding, TransitionEnd) => Some(Hidden),
            (Showing, Reset) | (Shown, Reset) | (Hiding, Reset) => Some(Hidden),
            _ => None,
        }
    }
}

// =============================================================================
// OverlayView - rendering projection
// =============================================================================

/// How an overlay is laid out
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Mobile: static block in the flow, always visible
    Inline,
    /// Desktop: absolutely positioned, animated in and out
    Floating {
        /// Whether the overlay is logically shown
        visible: bool,
    },
}

/// What the document should show for an overlay
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayView {
    /// Presence of the `show` class
    pub show_class: bool,
    /// Layout strategy
    pub placement: Placement,
}

impl OverlayView {
    /// Project a state under a viewport mode
    pub fn project(state: OverlayState, mode: ViewportMode) -> Self {
        let visible = state.is_visible();
        let placement = match mode {
            ViewportMode::Mobile => Placement::Inline,
            ViewportMode::Desktop => Placement::Floating { visible },
        };
        Self {
            show_class: visible,
            placement,
        }
    }

    /// Inline style properties for the placement; empty values clear the property
    pub fn styles(&self) -> [(&'static str, &'static str); 4] {
        match self.placement {
            Placement::Inline => [
                ("position", "relative"),
                ("opacity", "1"),
                ("transform", "none"),
                ("pointer-events", "all"),
            ],
            Placement::Floating { visible: false } => [
                ("position", "absolute"),
                ("opacity", "0"),
                ("transform", "translateY(20px)"),
                ("pointer-events", "none"),
            ],
            // Let the stylesheet's `.show` rule drive opacity and transform
            Placement::Floating { visible: true } => [
                ("position", "absolute"),
                ("opacity", ""),
                ("transform", ""),
                ("pointer-events", "all"),
            ],
        }
    }

    fn apply<D: Document>(&self, document: &D, element: &D::Element) {
        document.set_class(element, classes::SHOW, self.show_class);
        for (property, value) in self.styles() {
            document.set_style(element, property, value);
        }
    }
}

// =============================================================================
// OverlayRegistry
// =============================================================================

/// A registered overlay
#[derive(Clone, Debug)]
pub struct Overlay<E> {
    /// Element id
    pub id: String,
    /// Resolved element
    pub element: E,
    /// Current state
    pub state: OverlayState,
}

impl<E> Overlay<E> {
    /// Apply an event; returns true if the state changed
    pub fn transition(&mut self, event: OverlayEvent) -> bool {
        if let Some(next) = self.state.on_event(event) {
            tracing::debug!(
                "Overlay '{}' {:?} -> {:?} on {:?}",
                self.id,
                self.state,
                next,
                event
            );
            self.state = next;
            true
        } else {
            false
        }
    }
}

/// Identifier -> overlay lookup, resolved once
#[derive(Debug)]
pub struct OverlayRegistry<E> {
    overlays: SlotMap<OverlayKey, Overlay<E>>,
    by_id: IndexMap<String, OverlayKey>,
}

impl<E: Clone + PartialEq> OverlayRegistry<E> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            overlays: SlotMap::with_key(),
            by_id: IndexMap::new(),
        }
    }

    /// Resolve the configured ids, then any other identified floating popup
    ///
    /// Ids with no element in the document are skipped; every later operation
    /// on them no-ops.
    pub fn resolve<D: Document<Element = E>>(document: &D, ids: &[String]) -> Self {
        let mut registry = Self::new();

        for id in ids {
            match document.element_by_id(id) {
                Some(element) => {
                    registry.insert(id.clone(), element);
                }
                None => tracing::debug!("OverlayRegistry::resolve - '{}' not in document", id),
            }
        }

        for element in document.query_all(selectors::FLOATING_POPUP) {
            if let Some(id) = document.element_id(&element).filter(|id| !id.is_empty()) {
                if !registry.by_id.contains_key(&id) {
                    registry.insert(id, element);
                }
            }
        }

        tracing::debug!(
            "OverlayRegistry::resolve - {} overlays registered",
            registry.len()
        );
        registry
    }

    /// Register an element under an id (replaces nothing if the id exists)
    pub fn insert(&mut self, id: String, element: E) -> OverlayKey {
        if let Some(key) = self.by_id.get(&id) {
            return *key;
        }
        let key = self.overlays.insert(Overlay {
            id: id.clone(),
            element,
            state: OverlayState::Hidden,
        });
        self.by_id.insert(id, key);
        key
    }

    /// Key for an identifier
    pub fn key(&self, id: &str) -> Option<OverlayKey> {
        self.by_id.get(id).copied()
    }

    /// Key of the overlay whose element is `element`
    pub fn key_for_element(&self, element: &E) -> Option<OverlayKey> {
        self.by_id
            .values()
            .copied()
            .find(|key| self.overlays.get(*key).is_some_and(|o| &o.element == element))
    }

    /// Look up an overlay
    pub fn get(&self, key: OverlayKey) -> Option<&Overlay<E>> {
        self.overlays.get(key)
    }

    /// Look up an overlay mutably
    pub fn get_mut(&mut self, key: OverlayKey) -> Option<&mut Overlay<E>> {
        self.overlays.get_mut(key)
    }

    /// Keys in registration order
    pub fn keys(&self) -> Vec<OverlayKey> {
        self.by_id.values().copied().collect()
    }

    /// Number of registered overlays
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    /// Check for an empty registry
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}

impl<E: Clone + PartialEq> Default for OverlayRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// VisibilityController
// =============================================================================

/// Show/hide primitives over the registry, with timer discipline
#[derive(Debug)]
pub struct VisibilityController<E> {
    registry: OverlayRegistry<E>,
    timers: TimerRegistry,
    mode: ViewportMode,
    auto_hide_ms: u64,
    transition_ms: u64,
}

impl<E: Clone + PartialEq> VisibilityController<E> {
    /// Take ownership of a resolved registry
    pub fn new(
        registry: OverlayRegistry<E>,
        mode: ViewportMode,
        auto_hide_ms: u64,
        transition_ms: u64,
    ) -> Self {
        let mut timers = TimerRegistry::new();
        for key in registry.keys() {
            timers.register(key);
        }
        Self {
            registry,
            timers,
            mode,
            auto_hide_ms,
            transition_ms,
        }
    }

    /// The overlay registry
    pub fn registry(&self) -> &OverlayRegistry<E> {
        &self.registry
    }

    /// The timer registry
    pub fn timers(&self) -> &TimerRegistry {
        &self.timers
    }

    /// Mode overlays are currently rendered for
    pub fn mode(&self) -> ViewportMode {
        self.mode
    }

    /// State of an overlay by id
    pub fn state(&self, id: &str) -> Option<OverlayState> {
        self.registry
            .key(id)
            .and_then(|key| self.registry.get(key))
            .map(|o| o.state)
    }

    /// Logical visibility of an overlay by key; unknown overlays are hidden
    pub fn is_visible(&self, key: OverlayKey) -> bool {
        self.registry.get(key).is_some_and(|o| o.state.is_visible())
    }

    /// Show an overlay after `delay_ms` (immediately for 0)
    pub fn show<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        id: &str,
        delay_ms: u64,
    ) {
        if let Some(key) = self.registry.key(id) {
            self.show_key(ctx, key, delay_ms);
        }
    }

    /// Show by key
    pub fn show_key<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        key: OverlayKey,
        delay_ms: u64,
    ) {
        if delay_ms == 0 {
            self.timers.cancel(ctx.scheduler, key, TimerKind::Show);
            self.reveal(ctx, key);
        } else {
            self.timers
                .schedule(ctx.scheduler, key, TimerKind::Show, delay_ms);
        }
    }

    /// Hide an overlay immediately and drop its pending auto-hide
    ///
    /// A pending delayed show is kept and still fires.
    pub fn hide<D: Document<Element = E>>(&mut self, ctx: &mut PageContext<'_, D>, id: &str) {
        if let Some(key) = self.registry.key(id) {
            self.hide_key(ctx, key);
        }
    }

    /// Hide by key
    pub fn hide_key<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        key: OverlayKey,
    ) {
        if !self.timers.is_registered(key) {
            return;
        }
        // A running exit transition keeps its settle timer
        self.timers.cancel(ctx.scheduler, key, TimerKind::AutoHide);

        let Some(overlay) = self.registry.get_mut(key) else {
            return;
        };
        if overlay.transition(OverlayEvent::Hide) {
            OverlayView::project(overlay.state, self.mode).apply(ctx.document, &overlay.element);
            self.timers
                .schedule(ctx.scheduler, key, TimerKind::Settle, self.transition_ms);
        }
    }

    /// Hide every overlay that is currently shown
    pub fn hide_all_visible<D: Document<Element = E>>(&mut self, ctx: &mut PageContext<'_, D>) {
        for key in self.registry.keys() {
            if self.is_visible(key) {
                self.hide_key(ctx, key);
            }
        }
    }

    /// Handle one of this controller's timers firing
    pub fn fire<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        key: OverlayKey,
        kind: TimerKind,
        id: TimerId,
    ) {
        if !self.timers.complete(key, kind, id) {
            tracing::trace!("VisibilityController::fire - stale {:?} for {:?}", kind, key);
            return;
        }

        match kind {
            TimerKind::Show => self.reveal(ctx, key),
            TimerKind::AutoHide => {
                tracing::debug!("VisibilityController::fire - auto-hide {:?}", key);
                self.hide_key(ctx, key);
            }
            TimerKind::Settle => {
                if let Some(overlay) = self.registry.get_mut(key) {
                    overlay.transition(OverlayEvent::TransitionEnd);
                }
            }
        }
    }

    /// Re-render every overlay for a new mode
    ///
    /// Mobile clears every overlay's shown state and pending timers and renders
    /// them inline. Desktop restores floating placement, keeping overlays that
    /// are shown and parking the rest hidden but positioned.
    pub fn apply_mode<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        mode: ViewportMode,
    ) {
        self.mode = mode;

        for key in self.registry.keys() {
            if mode.is_mobile() {
                self.timers.cancel_all(ctx.scheduler, key);
            }
            let Some(overlay) = self.registry.get_mut(key) else {
                continue;
            };
            if mode.is_mobile() {
                overlay.transition(OverlayEvent::Reset);
            }
            OverlayView::project(overlay.state, mode).apply(ctx.document, &overlay.element);
        }
    }

    fn reveal<D: Document<Element = E>>(&mut self, ctx: &mut PageContext<'_, D>, key: OverlayKey) {
        let mode = self.mode;
        let Some(overlay) = self.registry.get_mut(key) else {
            return;
        };
        if !overlay.transition(OverlayEvent::Show) {
            // Already shown: no new timers
            return;
        }
        OverlayView::project(overlay.state, mode).apply(ctx.document, &overlay.element);

        self.timers
            .schedule(ctx.scheduler, key, TimerKind::Settle, self.transition_ms);
        if mode.is_desktop() {
            self.timers
                .schedule(ctx.scheduler, key, TimerKind::AutoHide, self.auto_hide_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Scheduler;
    use crate::task::Task;
    use crate::testing::FakeDocument;

    fn setup() -> (FakeDocument, Scheduler<Task>, VisibilityController<usize>) {
        let doc = FakeDocument::new();
        let body = doc.body();
        doc.add(body, "heroPopup", &["floating-popup"]);
        doc.add(body, "servicePopup1", &["floating-popup"]);

        let registry = OverlayRegistry::resolve(
            &doc,
            &["heroPopup".to_string(), "missingPopup".to_string()],
        );
        let controller = VisibilityController::new(registry, ViewportMode::Desktop, 10_000, 300);
        (doc, Scheduler::new(0), controller)
    }

    fn drain(
        doc: &FakeDocument,
        scheduler: &mut Scheduler<Task>,
        controller: &mut VisibilityController<usize>,
        until: u64,
    ) {
        while let Some((id, task)) = scheduler.pop_due(until) {
            if let Task::Overlay { key, kind } = task {
                let mut ctx = PageContext::new(doc, scheduler);
                controller.fire(&mut ctx, key, kind, id);
            }
        }
        scheduler.sync(until);
    }

    #[test]
    fn test_state_transitions() {
        use OverlayEvent::*;

        let mut state = OverlayState::Hidden;
        state = state.on_event(Show).unwrap();
        assert_eq!(state, OverlayState::Showing);
        state = state.on_event(TransitionEnd).unwrap();
        assert_eq!(state, OverlayState::Shown);
        assert!(state.on_event(Show).is_none(), "show while shown is a no-op");
        state = state.on_event(Hide).unwrap();
        assert_eq!(state, OverlayState::Hiding);
        state = state.on_event(Show).unwrap();
        assert_eq!(state, OverlayState::Showing, "show interrupts hiding");
        state = state.on_event(Reset).unwrap();
        assert_eq!(state, OverlayState::Hidden);
        assert!(state.on_event(Hide).is_none());
    }

    #[test]
    fn test_registry_includes_unconfigured_popups() {
        let (_doc, _scheduler, controller) = setup();
        let registry = controller.registry();

        assert_eq!(registry.len(), 2);
        assert!(registry.key("heroPopup").is_some());
        assert!(registry.key("servicePopup1").is_some());
        assert!(registry.key("missingPopup").is_none());
    }

    #[test]
    fn test_show_twice_arms_one_auto_hide() {
        let (doc, mut scheduler, mut controller) = setup();
        let key = controller.registry().key("heroPopup").unwrap();

        {
            let mut ctx = PageContext::new(&doc, &mut scheduler);
            controller.show(&mut ctx, "heroPopup", 0);
            controller.show(&mut ctx, "heroPopup", 0);
        }

        let auto_hides = scheduler
            .pending()
            .filter(|(_, _, t)| {
                **t == Task::Overlay {
                    key,
                    kind: TimerKind::AutoHide,
                }
            })
            .count();
        assert_eq!(auto_hides, 1);
        assert!(doc.has_class_by_id("heroPopup", "show"));
    }

    #[test]
    fn test_delayed_show_then_auto_hide() {
        let (doc, mut scheduler, mut controller) = setup();

        {
            let mut ctx = PageContext::new(&doc, &mut scheduler);
            controller.show(&mut ctx, "heroPopup", 500);
        }
        drain(&doc, &mut scheduler, &mut controller, 499);
        assert_eq!(controller.state("heroPopup"), Some(OverlayState::Hidden));

        drain(&doc, &mut scheduler, &mut controller, 500);
        assert_eq!(controller.state("heroPopup"), Some(OverlayState::Showing));

        drain(&doc, &mut scheduler, &mut controller, 800);
        assert_eq!(controller.state("heroPopup"), Some(OverlayState::Shown));

        drain(&doc, &mut scheduler, &mut controller, 10_499);
        assert!(controller.state("heroPopup").unwrap().is_visible());

        drain(&doc, &mut scheduler, &mut controller, 10_500);
        assert_eq!(controller.state("heroPopup"), Some(OverlayState::Hiding));
        assert!(!doc.has_class_by_id("heroPopup", "show"));

        drain(&doc, &mut scheduler, &mut controller, 20_000);
        assert_eq!(controller.state("heroPopup"), Some(OverlayState::Hidden));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_hide_cancels_auto_hide_only() {
        let (doc, mut scheduler, mut controller) = setup();
        let hero = controller.registry().key("heroPopup").unwrap();
        let service = controller.registry().key("servicePopup1").unwrap();

        {
            let mut ctx = PageContext::new(&doc, &mut scheduler);
            controller.show(&mut ctx, "heroPopup", 0);
            controller.show(&mut ctx, "servicePopup1", 2_000);
            controller.hide(&mut ctx, "heroPopup");
            controller.hide(&mut ctx, "servicePopup1");
        }
        assert!(!controller.timers().has_pending(hero, TimerKind::AutoHide));
        assert!(controller.timers().has_pending(service, TimerKind::Show));
        assert!(controller.state("heroPopup").unwrap().is_animating());
        assert!(!controller.state("servicePopup1").unwrap().is_animating());

        drain(&doc, &mut scheduler, &mut controller, 1_999);
        assert_eq!(controller.state("heroPopup"), Some(OverlayState::Hidden));
        assert_eq!(controller.state("servicePopup1"), Some(OverlayState::Hidden));

        drain(&doc, &mut scheduler, &mut controller, 2_000);
        assert_eq!(controller.state("servicePopup1"), Some(OverlayState::Showing));
        assert!(doc.has_class_by_id("servicePopup1", "show"));
        assert_eq!(controller.state("heroPopup"), Some(OverlayState::Hidden));
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let (doc, mut scheduler, mut controller) = setup();
        let mut ctx = PageContext::new(&doc, &mut scheduler);

        controller.show(&mut ctx, "missingPopup", 0);
        controller.show(&mut ctx, "missingPopup", 100);
        controller.hide(&mut ctx, "missingPopup");
        assert!(ctx.scheduler.is_empty());
    }

    #[test]
    fn test_mobile_renders_inline_without_auto_hide() {
        let (doc, mut scheduler, mut controller) = setup();
        let mut ctx = PageContext::new(&doc, &mut scheduler);

        controller.show(&mut ctx, "heroPopup", 0);
        controller.apply_mode(&mut ctx, ViewportMode::Mobile);

        assert_eq!(controller.state("heroPopup"), Some(OverlayState::Hidden));
        assert!(ctx.scheduler.is_empty(), "mobile drops pending timers");
        assert_eq!(doc.style_by_id("heroPopup", "position").as_deref(), Some("relative"));
        assert_eq!(doc.style_by_id("heroPopup", "opacity").as_deref(), Some("1"));

        // Shows still record state on mobile but never arm the dwell
        controller.show(&mut ctx, "heroPopup", 0);
        let kinds: Vec<_> = ctx.scheduler.pending().map(|(_, _, t)| *t).collect();
        assert!(kinds
            .iter()
            .all(|t| !matches!(t, Task::Overlay { kind: TimerKind::AutoHide, .. })));
        assert_eq!(doc.style_by_id("heroPopup", "position").as_deref(), Some("relative"));
    }

    #[test]
    fn test_desktop_parks_hidden_overlays() {
        let (doc, mut scheduler, mut controller) = setup();
        let mut ctx = PageContext::new(&doc, &mut scheduler);

        controller.apply_mode(&mut ctx, ViewportMode::Mobile);
        controller.show(&mut ctx, "heroPopup", 0);
        controller.apply_mode(&mut ctx, ViewportMode::Desktop);

        assert_eq!(doc.style_by_id("heroPopup", "position").as_deref(), Some("absolute"));
        assert_eq!(doc.style_by_id("heroPopup", "pointer-events").as_deref(), Some("all"));
        assert_eq!(doc.style_by_id("servicePopup1", "opacity").as_deref(), Some("0"));
        assert_eq!(
            doc.style_by_id("servicePopup1", "transform").as_deref(),
            Some("translateY(20px)")
        );
        assert_eq!(
            doc.style_by_id("servicePopup1", "pointer-events").as_deref(),
            Some("none")
        );
    }
}
