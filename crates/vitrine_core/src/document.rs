//! Host document contract
//!
//! The core never calls a browser API. Everything it needs from the page
//! (element lookup, layout reads, class and style writes, focus) goes through
//! [`Document`]. The web host implements it over `web_sys`; tests implement it
//! over an in-memory element tree.
//!
//! Lookups return `Option`/`Vec` and writes return nothing: a missing element
//! degrades the dependent feature, it is never an error.

use std::fmt;

use crate::viewport::{Bounds, Viewport};

/// Selectors and class names the page behaviors rely on
pub mod selectors {
    /// Every floating promotional popup
    pub const FLOATING_POPUP: &str = ".floating-popup";
    /// Close button inside a popup
    pub const POPUP_CLOSE: &str = ".popup-close";
    /// Indicator strip inside a popup
    pub const POPUP_INDICATORS: &str = ".popup-indicators";
    /// One indicator dot
    pub const INDICATOR: &str = ".indicator";
    /// Clickable video preview
    pub const VIDEO_PLACEHOLDER: &str = ".video-placeholder";
    /// Descriptive text child of a video preview
    pub const PLACEHOLDER_TEXT: &str = ".placeholder-text";
    /// Mobile navigation toggle
    pub const NAV_TOGGLE: &str = ".nav__toggle";
    /// Navigation menu
    pub const NAV_MENU: &str = ".nav__menu";
    /// Navigation link
    pub const NAV_LINK: &str = ".nav__link";
    /// Page header bar
    pub const HEADER: &str = ".header";
    /// Hero section
    pub const HERO: &str = ".hero";
    /// Hero content block (parallax target)
    pub const HERO_CONTENT: &str = ".hero__content";
    /// Any button-styled element
    pub const BUTTON: &str = ".btn";
    /// Announcement close button
    pub const ANNOUNCEMENT_CLOSE: &str = ".site-announcement__close";
    /// Announcement call-to-action link
    pub const ANNOUNCEMENT_LINK: &str = ".site-announcement__link";
    /// Elements that fade in the first time they scroll into view
    pub const REVEAL_TARGETS: &str = ".hero__text, .hero__media, .about__text, .stats-grid, .service-item, .collaboration__content, .footer__content";
    /// Focusable descendants considered by a modal's focus trap
    pub const FOCUSABLE: &str =
        "button, [href], input, select, textarea, [tabindex]:not([tabindex=\"-1\"])";
}

/// Class names the core toggles
pub mod classes {
    /// Overlay/banner/modal visible
    pub const SHOW: &str = "show";
    /// Nav toggle and menu open
    pub const ACTIVE: &str = "active";
    /// Video placeholder loading
    pub const LOADING: &str = "loading";
    /// Reveal target prepared for its entrance
    pub const FADE_IN: &str = "fade-in";
    /// Reveal target has entered the viewport
    pub const VISIBLE: &str = "visible";
}

/// The parts of a freshly mounted video modal
#[derive(Clone, Debug)]
pub struct ModalMount<E> {
    /// Outermost modal element (carries the `show` class)
    pub root: E,
    /// Background layer; clicks landing exactly on it close the modal
    pub overlay: E,
    /// Explicit close button, if the template has one
    pub close_button: Option<E>,
    /// Focusable descendants in document order
    pub focusables: Vec<E>,
}

/// The page as the behavior core sees it
pub trait Document {
    /// Element handle; equality must mean "same node"
    type Element: Clone + PartialEq + fmt::Debug;

    /// Look up an element by id
    fn element_by_id(&self, id: &str) -> Option<Self::Element>;

    /// First element matching a selector
    fn query(&self, selector: &str) -> Option<Self::Element> {
        self.query_all(selector).into_iter().next()
    }

    /// All elements matching a selector, in document order
    fn query_all(&self, selector: &str) -> Vec<Self::Element>;

    /// Descendants of `root` matching a selector, in document order
    fn query_within(&self, root: &Self::Element, selector: &str) -> Vec<Self::Element>;

    /// Closest inclusive ancestor matching a selector
    fn closest(&self, element: &Self::Element, selector: &str) -> Option<Self::Element>;

    /// Check whether an element itself matches a selector
    fn matches(&self, element: &Self::Element, selector: &str) -> bool {
        self.closest(element, selector).as_ref() == Some(element)
    }

    /// Check whether `node` is `ancestor` or one of its descendants
    fn contains(&self, ancestor: &Self::Element, node: &Self::Element) -> bool;

    /// Id attribute of an element, if any
    fn element_id(&self, element: &Self::Element) -> Option<String>;

    /// Text content of an element
    fn text_content(&self, element: &Self::Element) -> String;

    /// Viewport-relative box of an element
    fn bounds(&self, element: &Self::Element) -> Bounds;

    /// Window metrics
    fn viewport(&self) -> Viewport;

    /// Add or remove a class
    fn set_class(&self, element: &Self::Element, class: &str, enabled: bool);

    /// Set an inline style property; an empty value removes it
    fn set_style(&self, element: &Self::Element, property: &str, value: &str);

    /// Lock or unlock scrolling of the document body
    fn set_scroll_locked(&self, locked: bool);

    /// Move keyboard focus to an element
    fn focus(&self, element: &Self::Element);

    /// Element that currently has keyboard focus
    fn active_element(&self) -> Option<Self::Element>;

    /// Build the video modal for `title`, append it to the body and return its parts
    fn mount_video_modal(&self, title: &str) -> Option<ModalMount<Self::Element>>;

    /// Check whether an element is still attached to the document
    fn is_attached(&self, element: &Self::Element) -> bool;

    /// Detach an element from the document
    fn remove(&self, element: &Self::Element);
}

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> u64;
}
