//! Video modal lifecycle
//!
//! ```text
//!  (absent) --open--> Opening --reveal--> Open --close--> Closing --remove--> (absent)
//!                        |                                   ^
//!                        +--------------close----------------+
//! ```
//!
//! A modal is mounted by the [`Document`], marked open after a short reveal
//! delay so its CSS transition runs, and removed after the close transition.
//! Removal is guarded by an attachment check, so a modal that something else
//! already detached is just forgotten.
//!
//! Video placeholders feed the controller: a click puts the placeholder in its
//! loading state and, once the simulated load finishes, opens a modal titled
//! with the placeholder's descriptive text.

use slotmap::{new_key_type, SlotMap};

use crate::config::ModalConfig;
use crate::context::PageContext;
use crate::document::{classes, selectors, Document, ModalMount};
use crate::event::{EventResponse, Key, KeyPress};
use crate::scheduler::TimerId;
use crate::task::Task;

new_key_type! {
    /// Handle to a live modal
    pub struct ModalId;
}

/// Lifecycle of a mounted modal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModalState {
    /// Mounted, waiting for its reveal
    Opening,
    /// Shown
    Open,
    /// Close transition running; removed when it ends
    Closing,
}

/// Keeps Tab and Shift+Tab cycling inside a fixed list of elements
#[derive(Clone, Debug)]
pub struct FocusTrap<E> {
    focusables: Vec<E>,
}

impl<E: Clone + PartialEq> FocusTrap<E> {
    /// Create a trap over focusable elements in document order
    pub fn new(focusables: Vec<E>) -> Self {
        Self { focusables }
    }

    /// First focusable element
    pub fn first(&self) -> Option<&E> {
        self.focusables.first()
    }

    /// Last focusable element
    pub fn last(&self) -> Option<&E> {
        self.focusables.last()
    }

    /// Element to move focus to for a Tab press, or `None` to let the browser handle it
    ///
    /// Forward Tab on the last element wraps to the first; Shift+Tab on the
    /// first wraps to the last.
    pub fn wrap_target(&self, active: Option<&E>, backwards: bool) -> Option<E> {
        let (first, last) = (self.first()?, self.last()?);
        let active = active?;
        if backwards && active == first {
            Some(last.clone())
        } else if !backwards && active == last {
            Some(first.clone())
        } else {
            None
        }
    }
}

/// A mounted modal
#[derive(Debug)]
pub struct Modal<E> {
    /// Parts returned by the document
    pub mount: ModalMount<E>,
    /// Lifecycle state
    pub state: ModalState,
    /// Title shown in the player
    pub title: String,
    trap: FocusTrap<E>,
    timer: Option<TimerId>,
}

#[derive(Debug)]
struct Placeholder<E> {
    element: E,
    load_timer: Option<TimerId>,
}

/// Owns every live modal and the video placeholders that open them
#[derive(Debug)]
pub struct ModalController<E> {
    modals: SlotMap<ModalId, Modal<E>>,
    placeholders: Vec<Placeholder<E>>,
    config: ModalConfig,
}

impl<E: Clone + PartialEq> ModalController<E> {
    /// Create a controller with no placeholders
    pub fn new(config: ModalConfig) -> Self {
        Self {
            modals: SlotMap::with_key(),
            placeholders: Vec::new(),
            config,
        }
    }

    /// Pick up the document's video placeholders
    pub fn resolve_placeholders<D: Document<Element = E>>(&mut self, document: &D) {
        self.placeholders = document
            .query_all(selectors::VIDEO_PLACEHOLDER)
            .into_iter()
            .map(|element| Placeholder {
                element,
                load_timer: None,
            })
            .collect();
        tracing::debug!(
            "ModalController::resolve_placeholders - {} placeholders",
            self.placeholders.len()
        );
    }

    /// Number of live modals, closing ones included
    pub fn len(&self) -> usize {
        self.modals.len()
    }

    /// Check for no live modals
    pub fn is_empty(&self) -> bool {
        self.modals.is_empty()
    }

    /// Look up a modal
    pub fn get(&self, id: ModalId) -> Option<&Modal<E>> {
        self.modals.get(id)
    }

    /// State of a modal; `None` once it is gone
    pub fn state(&self, id: ModalId) -> Option<ModalState> {
        self.modals.get(id).map(|m| m.state)
    }

    /// Ids of live modals
    pub fn ids(&self) -> Vec<ModalId> {
        self.modals.keys().collect()
    }

    /// Mount a modal for `title`, focus its first control and schedule its reveal
    pub fn open<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        title: &str,
    ) -> Option<ModalId> {
        let Some(mount) = ctx.document.mount_video_modal(title) else {
            tracing::warn!("ModalController::open - document could not mount a modal");
            return None;
        };

        let trap = FocusTrap::new(mount.focusables.clone());
        if let Some(first) = trap.first() {
            ctx.document.focus(first);
        }

        let id = self.modals.insert(Modal {
            mount,
            state: ModalState::Opening,
            title: title.to_string(),
            trap,
            timer: None,
        });
        let timer = ctx
            .scheduler
            .schedule(self.config.reveal_delay_ms, Task::RevealModal(id));
        if let Some(modal) = self.modals.get_mut(id) {
            modal.timer = Some(timer);
        }

        tracing::debug!("ModalController::open - '{}' as {:?}", title, id);
        Some(id)
    }

    /// Reveal task: mark an opening modal open
    pub fn reveal<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        id: ModalId,
        timer: TimerId,
    ) {
        let Some(modal) = self.modals.get_mut(id) else {
            return;
        };
        if modal.timer != Some(timer) || modal.state != ModalState::Opening {
            return;
        }
        modal.timer = None;
        modal.state = ModalState::Open;
        ctx.document.set_class(&modal.mount.root, classes::SHOW, true);
    }

    /// Start closing a modal; returns false if it is already closing or gone
    pub fn close<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        id: ModalId,
    ) -> bool {
        let Some(modal) = self.modals.get_mut(id) else {
            return false;
        };
        if modal.state == ModalState::Closing {
            return false;
        }

        // Replaces a pending reveal
        if let Some(pending) = modal.timer.take() {
            ctx.scheduler.cancel(pending);
        }
        modal.state = ModalState::Closing;
        ctx.document.set_class(&modal.mount.root, classes::SHOW, false);
        modal.timer = Some(
            ctx.scheduler
                .schedule(self.config.close_delay_ms, Task::RemoveModal(id)),
        );

        tracing::debug!("ModalController::close - {:?}", id);
        true
    }

    /// Close every modal that is not already closing; returns how many started closing
    pub fn close_all<D: Document<Element = E>>(&mut self, ctx: &mut PageContext<'_, D>) -> usize {
        self.ids()
            .into_iter()
            .filter(|id| self.close(ctx, *id))
            .count()
    }

    /// Removal task: detach the modal if it is still attached and forget it
    pub fn remove<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        id: ModalId,
        timer: TimerId,
    ) {
        if self.modals.get(id).map(|m| m.timer) != Some(Some(timer)) {
            return;
        }
        let Some(modal) = self.modals.remove(id) else {
            return;
        };
        if ctx.document.is_attached(&modal.mount.root) {
            ctx.document.remove(&modal.mount.root);
        }
        tracing::debug!("ModalController::remove - {:?}", id);
    }

    /// Route a click: close buttons and bare overlay clicks close their modal
    pub fn click<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        target: &E,
    ) -> EventResponse {
        let mut hit = None;
        for (id, modal) in &self.modals {
            if modal.state == ModalState::Closing {
                continue;
            }
            if let Some(close) = &modal.mount.close_button {
                if ctx.document.contains(close, target) {
                    hit = Some((id, EventResponse::CONSUMED));
                    break;
                }
            }
            if &modal.mount.overlay == target {
                hit = Some((id, EventResponse::IGNORED));
                break;
            }
        }

        match hit {
            Some((id, response)) => {
                self.close(ctx, id);
                response
            }
            None => EventResponse::IGNORED,
        }
    }

    /// Route a key press inside a modal through its focus trap
    pub fn key_down<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        key: KeyPress,
        target: &E,
    ) -> EventResponse {
        if key.key != Key::Tab {
            return EventResponse::IGNORED;
        }
        let Some(modal) = self
            .modals
            .values()
            .find(|m| ctx.document.contains(&m.mount.root, target))
        else {
            return EventResponse::IGNORED;
        };

        let active = ctx.document.active_element();
        match modal.trap.wrap_target(active.as_ref(), key.shift) {
            Some(next) => {
                ctx.document.focus(&next);
                EventResponse::PREVENT
            }
            None => EventResponse::IGNORED,
        }
    }

    /// Start loading the placeholder containing `target`; returns false if there is none
    pub fn click_placeholder<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        target: &E,
    ) -> bool {
        let Some(index) = self
            .placeholders
            .iter()
            .position(|p| ctx.document.contains(&p.element, target))
        else {
            return false;
        };

        let placeholder = &mut self.placeholders[index];
        ctx.document
            .set_class(&placeholder.element, classes::LOADING, true);
        if let Some(previous) = placeholder.load_timer.take() {
            ctx.scheduler.cancel(previous);
        }
        placeholder.load_timer = Some(
            ctx.scheduler
                .schedule(self.config.video_load_ms, Task::FinishVideoLoad(index)),
        );
        true
    }

    /// Load task: clear the loading state and open the placeholder's modal
    pub fn finish_load<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        index: usize,
        timer: TimerId,
    ) -> Option<ModalId> {
        let placeholder = self.placeholders.get_mut(index)?;
        if placeholder.load_timer != Some(timer) {
            return None;
        }
        placeholder.load_timer = None;
        ctx.document
            .set_class(&placeholder.element, classes::LOADING, false);

        let title = ctx
            .document
            .query_within(&placeholder.element, selectors::PLACEHOLDER_TEXT)
            .first()
            .map(|text| ctx.document.text_content(text).trim().to_string())
            .unwrap_or_default();
        self.open(ctx, &title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Scheduler;
    use crate::testing::FakeDocument;

    fn controller() -> ModalController<usize> {
        ModalController::new(ModalConfig::default())
    }

    fn run(
        doc: &FakeDocument,
        scheduler: &mut Scheduler<Task>,
        modals: &mut ModalController<usize>,
        until: u64,
    ) {
        while let Some((timer, task)) = scheduler.pop_due(until) {
            let mut ctx = PageContext::new(doc, scheduler);
            match task {
                Task::RevealModal(id) => modals.reveal(&mut ctx, id, timer),
                Task::RemoveModal(id) => modals.remove(&mut ctx, id, timer),
                Task::FinishVideoLoad(index) => {
                    modals.finish_load(&mut ctx, index, timer);
                }
                other => panic!("unexpected task {:?}", other),
            }
        }
        scheduler.sync(until);
    }

    #[test]
    fn test_focus_trap_wraps() {
        let trap = FocusTrap::new(vec![1, 2, 3]);
        assert_eq!(trap.wrap_target(Some(&3), false), Some(1));
        assert_eq!(trap.wrap_target(Some(&1), true), Some(3));
        assert_eq!(trap.wrap_target(Some(&2), false), None);
        assert_eq!(trap.wrap_target(Some(&2), true), None);
        assert_eq!(trap.wrap_target(None, false), None);
        assert_eq!(FocusTrap::<usize>::new(Vec::new()).wrap_target(Some(&1), false), None);
    }

    #[test]
    fn test_open_reveal_close_remove() {
        let doc = FakeDocument::new();
        let mut scheduler = Scheduler::new(0);
        let mut modals = controller();

        let id = {
            let mut ctx = PageContext::new(&doc, &mut scheduler);
            modals.open(&mut ctx, "Campus tour").unwrap()
        };
        let mount = modals.get(id).unwrap().mount.clone();
        assert_eq!(modals.state(id), Some(ModalState::Opening));
        assert_eq!(doc.focused(), mount.focusables.first().copied());
        assert!(!doc.has_class(mount.root, "show"));

        run(&doc, &mut scheduler, &mut modals, 10);
        assert_eq!(modals.state(id), Some(ModalState::Open));
        assert!(doc.has_class(mount.root, "show"));

        {
            let mut ctx = PageContext::new(&doc, &mut scheduler);
            assert!(modals.close(&mut ctx, id));
            assert!(!modals.close(&mut ctx, id), "double close is a no-op");
        }
        assert!(!doc.has_class(mount.root, "show"));

        run(&doc, &mut scheduler, &mut modals, 309);
        assert!(doc.is_attached_node(mount.root));
        run(&doc, &mut scheduler, &mut modals, 310);
        assert!(!doc.is_attached_node(mount.root));
        assert!(modals.is_empty());
        assert_eq!(doc.removals(), 1);
    }

    #[test]
    fn test_close_before_reveal() {
        let doc = FakeDocument::new();
        let mut scheduler = Scheduler::new(0);
        let mut modals = controller();

        let id = {
            let mut ctx = PageContext::new(&doc, &mut scheduler);
            let id = modals.open(&mut ctx, "Quick").unwrap();
            modals.close(&mut ctx, id);
            id
        };
        let root = modals.get(id).unwrap().mount.root;

        run(&doc, &mut scheduler, &mut modals, 1_000);
        assert!(!doc.has_class(root, "show"), "a canceled reveal never fires");
        assert!(modals.is_empty());
    }

    #[test]
    fn test_removal_skips_detached_modal() {
        let doc = FakeDocument::new();
        let mut scheduler = Scheduler::new(0);
        let mut modals = controller();

        let id = {
            let mut ctx = PageContext::new(&doc, &mut scheduler);
            let id = modals.open(&mut ctx, "Gone").unwrap();
            modals.close(&mut ctx, id);
            id
        };
        doc.detach(modals.get(id).unwrap().mount.root);

        run(&doc, &mut scheduler, &mut modals, 1_000);
        assert!(modals.is_empty());
        assert_eq!(doc.removals(), 0);
    }

    #[test]
    fn test_click_targets() {
        let doc = FakeDocument::new();
        let mut scheduler = Scheduler::new(0);
        let mut modals = controller();
        let mut ctx = PageContext::new(&doc, &mut scheduler);

        let id = modals.open(&mut ctx, "Clicks").unwrap();
        let mount = modals.get(id).unwrap().mount.clone();

        // Content clicks bubble to the overlay but do not land on it
        let content = doc.parent(mount.close_button.unwrap()).unwrap();
        assert_eq!(modals.click(&mut ctx, &content), EventResponse::IGNORED);
        assert_eq!(modals.state(id), Some(ModalState::Opening));

        assert_eq!(modals.click(&mut ctx, &mount.overlay), EventResponse::IGNORED);
        assert_eq!(modals.state(id), Some(ModalState::Closing));

        let second = modals.open(&mut ctx, "Again").unwrap();
        let close = modals.get(second).unwrap().mount.close_button.unwrap();
        assert_eq!(modals.click(&mut ctx, &close), EventResponse::CONSUMED);
        assert_eq!(modals.state(second), Some(ModalState::Closing));
    }

    #[test]
    fn test_placeholder_reclick_rearms_single_timer() {
        let doc = FakeDocument::new();
        let body = doc.body();
        let placeholder = doc.add(body, "", &["video-placeholder"]);
        let text = doc.add(placeholder, "", &["placeholder-text"]);
        doc.set_text(text, "  Student projects  ");

        let mut scheduler = Scheduler::new(0);
        let mut modals = controller();
        modals.resolve_placeholders(&doc);

        {
            let mut ctx = PageContext::new(&doc, &mut scheduler);
            assert!(modals.click_placeholder(&mut ctx, &text));
        }
        assert!(doc.has_class(placeholder, "loading"));
        scheduler.sync(1_000);
        {
            let mut ctx = PageContext::new(&doc, &mut scheduler);
            assert!(modals.click_placeholder(&mut ctx, &placeholder));
            assert!(!modals.click_placeholder(&mut ctx, &body));
        }
        assert_eq!(scheduler.len(), 1);

        run(&doc, &mut scheduler, &mut modals, 2_499);
        assert!(modals.is_empty());
        run(&doc, &mut scheduler, &mut modals, 2_500);
        assert!(!doc.has_class(placeholder, "loading"));
        assert_eq!(modals.len(), 1);
        let id = modals.ids()[0];
        assert_eq!(modals.get(id).unwrap().title, "Student projects");
    }

    #[test]
    fn test_placeholder_without_text_opens_untitled() {
        let doc = FakeDocument::new();
        let placeholder = doc.add(doc.body(), "", &["video-placeholder"]);
        let mut scheduler = Scheduler::new(0);
        let mut modals = controller();
        modals.resolve_placeholders(&doc);

        {
            let mut ctx = PageContext::new(&doc, &mut scheduler);
            modals.click_placeholder(&mut ctx, &placeholder);
        }
        run(&doc, &mut scheduler, &mut modals, 1_500);
        let id = modals.ids()[0];
        assert_eq!(modals.get(id).unwrap().title, "");
    }
}
