//! Popup indicator rotation
//!
//! Each `.popup-indicators` strip cycles its `active` dot on a fixed interval
//! while the popup around it is shown. The first tick that finds the popup
//! hidden ends that strip's rotation for the rest of the visit.

use crate::config::IndicatorConfig;
use crate::context::PageContext;
use crate::document::{classes, selectors, Document};
use crate::overlay::{OverlayKey, OverlayRegistry, VisibilityController};
use crate::scheduler::TimerId;
use crate::task::Task;

#[derive(Debug)]
struct IndicatorGroup<E> {
    popup: Option<OverlayKey>,
    indicators: Vec<E>,
    next: usize,
    timer: Option<TimerId>,
}

/// All indicator strips on the page
#[derive(Debug)]
pub struct IndicatorRotation<E> {
    config: IndicatorConfig,
    groups: Vec<IndicatorGroup<E>>,
    start_timer: Option<TimerId>,
}

impl<E: Clone + PartialEq> IndicatorRotation<E> {
    /// Resolve strips and the registered popup enclosing each one
    pub fn resolve<D: Document<Element = E>>(
        document: &D,
        registry: &OverlayRegistry<E>,
        config: IndicatorConfig,
    ) -> Self {
        let groups = document
            .query_all(selectors::POPUP_INDICATORS)
            .into_iter()
            .map(|strip| IndicatorGroup {
                popup: document
                    .closest(&strip, selectors::FLOATING_POPUP)
                    .and_then(|popup| registry.key_for_element(&popup)),
                indicators: document.query_within(&strip, selectors::INDICATOR),
                next: 0,
                timer: None,
            })
            .collect();

        Self {
            config,
            groups,
            start_timer: None,
        }
    }

    /// Number of strips still rotating or waiting to start
    pub fn active_groups(&self) -> usize {
        match self.start_timer {
            Some(_) => self.groups.len(),
            None => self.groups.iter().filter(|g| g.timer.is_some()).count(),
        }
    }

    /// Arm the start delay
    pub fn schedule_start<D: Document>(&mut self, ctx: &mut PageContext<'_, D>) {
        if self.groups.is_empty() {
            return;
        }
        if let Some(previous) = self.start_timer.take() {
            ctx.scheduler.cancel(previous);
        }
        self.start_timer = Some(
            ctx.scheduler
                .schedule(self.config.start_delay_ms, Task::StartIndicators),
        );
    }

    /// Start task: arm every strip's first tick
    pub fn start<D: Document>(&mut self, ctx: &mut PageContext<'_, D>, timer: TimerId) {
        if self.start_timer != Some(timer) {
            return;
        }
        self.start_timer = None;
        for (index, group) in self.groups.iter_mut().enumerate() {
            group.timer = Some(
                ctx.scheduler
                    .schedule(self.config.interval_ms, Task::RotateIndicators(index)),
            );
        }
        tracing::debug!("IndicatorRotation::start - {} strips", self.groups.len());
    }

    /// Tick task: advance one strip, or stop it if its popup is not shown
    pub fn rotate<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        index: usize,
        timer: TimerId,
        overlays: &VisibilityController<E>,
    ) {
        let interval_ms = self.config.interval_ms;
        let Some(group) = self.groups.get_mut(index) else {
            return;
        };
        if group.timer != Some(timer) {
            return;
        }
        group.timer = None;

        let shown = group.popup.is_some_and(|key| overlays.is_visible(key));
        if !shown || group.indicators.is_empty() {
            tracing::debug!("IndicatorRotation::rotate - strip {} stopped", index);
            return;
        }

        for (i, indicator) in group.indicators.iter().enumerate() {
            ctx.document
                .set_class(indicator, classes::ACTIVE, i == group.next);
        }
        group.next = (group.next + 1) % group.indicators.len();
        group.timer = Some(
            ctx.scheduler
                .schedule(interval_ms, Task::RotateIndicators(index)),
        );
    }
}
