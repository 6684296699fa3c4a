//! Scroll-triggered overlay visibility
//!
//! Scroll events only raise a flag; the host runs at most one evaluation per
//! rendered frame. Each [`OverlayGroup`] shows its members while its trigger
//! region intersects the viewport and hides them all once it leaves.

use smallvec::SmallVec;

use crate::config::GroupConfig;
use crate::context::PageContext;
use crate::document::Document;
use crate::overlay::{OverlayKey, OverlayRegistry, VisibilityController};
use crate::timers::TimerKind;

/// A trigger region and the overlays it owns
#[derive(Clone, Debug)]
pub struct OverlayGroup<E> {
    /// Group name (for logs)
    pub name: String,
    /// Trigger region element
    pub region: E,
    /// Member overlays and their scroll-in delays
    pub members: SmallVec<[(OverlayKey, u64); 4]>,
}

/// Frame-coalesced group evaluation
#[derive(Debug)]
pub struct ScrollPolicy<E> {
    groups: Vec<OverlayGroup<E>>,
    frame_pending: bool,
}

impl<E: Clone + PartialEq> ScrollPolicy<E> {
    /// Resolve configured groups against the document and the registry
    ///
    /// Groups whose region is missing are dropped, as are members that never
    /// made it into the registry.
    pub fn resolve<D: Document<Element = E>>(
        document: &D,
        groups: &[GroupConfig],
        registry: &OverlayRegistry<E>,
    ) -> Self {
        let groups = groups
            .iter()
            .filter_map(|group| {
                let Some(region) = document.element_by_id(&group.region) else {
                    tracing::debug!(
                        "ScrollPolicy::resolve - region '{}' missing, group '{}' disabled",
                        group.region,
                        group.name
                    );
                    return None;
                };
                let members = group
                    .members
                    .iter()
                    .filter_map(|m| registry.key(&m.overlay).map(|key| (key, m.delay_ms)))
                    .collect();
                Some(OverlayGroup {
                    name: group.name.clone(),
                    region,
                    members,
                })
            })
            .collect();

        Self {
            groups,
            frame_pending: false,
        }
    }

    /// Resolved groups
    pub fn groups(&self) -> &[OverlayGroup<E>] {
        &self.groups
    }

    /// Note a scroll event; returns true when the host should request a frame
    pub fn request_frame(&mut self) -> bool {
        if self.frame_pending {
            false
        } else {
            self.frame_pending = true;
            true
        }
    }

    /// Check whether a frame callback is outstanding
    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Clear the coalescing flag at the start of a frame
    pub fn begin_frame(&mut self) {
        self.frame_pending = false;
    }

    /// Run the group policy; a no-op in mobile mode
    pub fn evaluate<D: Document<Element = E>>(
        &self,
        ctx: &mut PageContext<'_, D>,
        controller: &mut VisibilityController<E>,
    ) {
        if controller.mode().is_mobile() {
            return;
        }

        let viewport_height = ctx.document.viewport().height;
        for group in &self.groups {
            let in_view = ctx
                .document
                .bounds(&group.region)
                .intersects_viewport(viewport_height);
            tracing::trace!("ScrollPolicy::evaluate - '{}' in view: {}", group.name, in_view);

            for &(key, delay_ms) in &group.members {
                if in_view {
                    // A pending show is left alone so continued scrolling cannot postpone it
                    if !controller.is_visible(key)
                        && !controller.timers().has_pending(key, TimerKind::Show)
                    {
                        controller.show_key(ctx, key, delay_ms);
                    }
                } else {
                    controller.hide_key(ctx, key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageConfig;
    use crate::overlay::OverlayState;
    use crate::scheduler::Scheduler;
    use crate::task::Task;
    use crate::testing::FakeDocument;
    use crate::viewport::{Bounds, Viewport, ViewportMode};

    struct Fixture {
        doc: FakeDocument,
        scheduler: Scheduler<Task>,
        controller: VisibilityController<usize>,
        policy: ScrollPolicy<usize>,
        home: usize,
    }

    fn fixture(mode: ViewportMode) -> Fixture {
        let config = PageConfig::standard();
        let doc = FakeDocument::new();
        let body = doc.body();
        let home = doc.add(body, "home", &["hero"]);
        let services = doc.add(body, "services", &[]);
        for id in &config.overlays {
            doc.add(body, id, &["floating-popup"]);
        }
        doc.set_viewport(Viewport::new(1280.0, 800.0, 0.0));
        doc.set_bounds(home, Bounds::new(0.0, 0.0, 1280.0, 700.0));
        doc.set_bounds(services, Bounds::new(1500.0, 0.0, 1280.0, 600.0));

        let registry = OverlayRegistry::resolve(&doc, &config.overlays);
        let policy = ScrollPolicy::resolve(&doc, &config.groups, &registry);
        let controller = VisibilityController::new(registry, mode, 10_000, 300);
        Fixture {
            doc,
            scheduler: Scheduler::new(0),
            controller,
            policy,
            home,
        }
    }

    impl Fixture {
        fn evaluate(&mut self) {
            let mut ctx = PageContext::new(&self.doc, &mut self.scheduler);
            self.policy.evaluate(&mut ctx, &mut self.controller);
        }

        fn show_delays(&self) -> Vec<u64> {
            self.scheduler
                .pending()
                .filter(|(_, _, t)| matches!(t, Task::Overlay { kind: TimerKind::Show, .. }))
                .map(|(_, due, _)| due)
                .collect()
        }
    }

    #[test]
    fn test_request_frame_coalesces() {
        let mut f = fixture(ViewportMode::Desktop);

        assert!(f.policy.request_frame());
        assert!(!f.policy.request_frame());
        assert!(!f.policy.request_frame());
        assert!(f.policy.frame_pending());

        f.policy.begin_frame();
        assert!(f.policy.request_frame());
    }

    #[test]
    fn test_region_in_view_schedules_member_delays() {
        let mut f = fixture(ViewportMode::Desktop);
        f.evaluate();
        assert_eq!(f.show_delays(), vec![500]);

        // Re-evaluating while the show is pending does not push it back
        f.scheduler.sync(200);
        f.evaluate();
        assert_eq!(f.show_delays(), vec![500]);
    }

    #[test]
    fn test_region_out_of_view_hides_members() {
        let mut f = fixture(ViewportMode::Desktop);
        {
            let mut ctx = PageContext::new(&f.doc, &mut f.scheduler);
            f.controller.show(&mut ctx, "heroPopup", 0);
            f.controller.show(&mut ctx, "servicePopup1", 0);
        }

        f.doc.set_bounds(f.home, Bounds::new(-800.0, 0.0, 1280.0, 700.0));
        f.evaluate();

        assert_eq!(f.controller.state("heroPopup"), Some(OverlayState::Hiding));
        assert_eq!(f.controller.state("servicePopup1"), Some(OverlayState::Hiding));
        assert!(f.show_delays().is_empty());
    }

    #[test]
    fn test_mobile_is_exempt() {
        let mut f = fixture(ViewportMode::Mobile);
        f.evaluate();
        assert!(f.scheduler.is_empty());
    }

    #[test]
    fn test_missing_region_drops_group() {
        let config = PageConfig::standard();
        let doc = FakeDocument::new();
        let body = doc.body();
        doc.add(body, "heroPopup", &["floating-popup"]);

        let registry = OverlayRegistry::resolve(&doc, &config.overlays);
        let policy = ScrollPolicy::resolve(&doc, &config.groups, &registry);
        assert!(policy.groups().is_empty());
    }
}
