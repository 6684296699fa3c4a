//! Interaction tracking
//!
//! A one-way sink: the page reports what the visitor clicked and never looks
//! at the result. [`LogSink`] is the default and only writes a log event.

use crate::document::{selectors, Document};

/// Receives tracked interactions
pub trait TrackingSink {
    /// Record one interaction
    fn record(&self, action: &str, label: &str);
}

/// The interactions the page reports
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interaction {
    /// Any `.btn` element
    ButtonClick,
    /// A navigation link
    NavClick,
    /// A video placeholder (or anything inside one)
    VideoClick,
    /// A floating popup's close button
    PopupClose,
    /// The announcement banner's call-to-action
    AnnouncementCta,
}

impl Interaction {
    /// Action name sent to the sink
    pub fn action(&self) -> &'static str {
        match self {
            Interaction::ButtonClick => "button_click",
            Interaction::NavClick => "nav_click",
            Interaction::VideoClick => "video_click",
            Interaction::PopupClose => "popup_close",
            Interaction::AnnouncementCta => "announcement_cta",
        }
    }

    /// Send this interaction with a label
    pub fn record(&self, sink: &dyn TrackingSink, label: &str) {
        sink.record(self.action(), label);
    }
}

/// Report every interaction a click on `target` stands for
///
/// Buttons and nav links must be the click target itself; anything inside a
/// video placeholder counts as a video click.
pub fn track_click<D: Document>(document: &D, target: &D::Element, sink: &dyn TrackingSink) {
    if document.matches(target, selectors::BUTTON) {
        Interaction::ButtonClick.record(sink, document.text_content(target).trim());
    }
    if document.matches(target, selectors::NAV_LINK) {
        Interaction::NavClick.record(sink, document.text_content(target).trim());
    }
    if document.closest(target, selectors::VIDEO_PLACEHOLDER).is_some() {
        Interaction::VideoClick.record(sink, "video_placeholder");
    }
    if document.matches(target, selectors::POPUP_CLOSE) {
        Interaction::PopupClose.record(sink, "floating_popup");
    }
}

/// Sink that writes each interaction as an `info` event
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl TrackingSink for LogSink {
    fn record(&self, action: &str, label: &str) {
        tracing::info!(action, label, "User interaction tracked");
    }
}
