//! Mobile navigation menu

use crate::context::PageContext;
use crate::document::{classes, selectors, Document};
use crate::event::EventResponse;

/// Toggle button and menu, open or closed together
#[derive(Debug)]
pub struct NavMenu<E> {
    toggle: E,
    menu: E,
    links: Vec<E>,
    open: bool,
}

impl<E: Clone + PartialEq> NavMenu<E> {
    /// Resolve the toggle and menu; `None` if either is missing
    pub fn resolve<D: Document<Element = E>>(document: &D) -> Option<Self> {
        let toggle = document.query(selectors::NAV_TOGGLE)?;
        let menu = document.query(selectors::NAV_MENU)?;
        let links = document.query_all(selectors::NAV_LINK);
        Some(Self {
            toggle,
            menu,
            links,
            open: false,
        })
    }

    /// Check whether the menu is open
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Route a click
    ///
    /// The toggle flips the menu and consumes the click. A link closes the
    /// menu and lets navigation proceed, as does any click outside both the
    /// toggle and the menu.
    pub fn click<D: Document<Element = E>>(
        &mut self,
        ctx: &mut PageContext<'_, D>,
        target: &E,
    ) -> EventResponse {
        let document = ctx.document;

        if document.contains(&self.toggle, target) {
            let open = !self.open;
            self.set_open(document, open);
            return EventResponse::CONSUMED;
        }

        let on_link = self.links.iter().any(|link| document.contains(link, target));
        if on_link || !document.contains(&self.menu, target) {
            self.set_open(document, false);
        }
        EventResponse::IGNORED
    }

    fn set_open<D: Document<Element = E>>(&mut self, document: &D, open: bool) {
        document.set_class(&self.toggle, classes::ACTIVE, open);
        document.set_class(&self.menu, classes::ACTIVE, open);
        document.set_scroll_locked(open);
        if self.open != open {
            tracing::debug!("NavMenu::set_open - {}", open);
        }
        self.open = open;
    }
}
