//! Input events as the core sees them, and what the host should do afterwards

/// Keys the page reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Escape
    Escape,
    /// Tab
    Tab,
    /// Anything else
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Key::Escape,
            "Tab" => Key::Tab,
            _ => Key::Other,
        }
    }
}

/// A key press with the modifier state the page cares about
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPress {
    /// The key
    pub key: Key,
    /// Shift held
    pub shift: bool,
}

impl KeyPress {
    /// A press with no modifiers
    pub fn new(key: Key) -> Self {
        Self { key, shift: false }
    }

    /// A press with shift held
    pub fn shifted(key: Key) -> Self {
        Self { key, shift: true }
    }
}

/// Default-action and propagation requests returned from an entry point
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventResponse {
    /// Call `preventDefault` on the event
    pub prevent_default: bool,
    /// Stop further page handlers (and DOM propagation) for the event
    pub stop_propagation: bool,
}

impl EventResponse {
    /// Nothing to do
    pub const IGNORED: Self = Self {
        prevent_default: false,
        stop_propagation: false,
    };

    /// Suppress the default action only
    pub const PREVENT: Self = Self {
        prevent_default: true,
        stop_propagation: false,
    };

    /// Suppress the default action and stop propagation
    pub const CONSUMED: Self = Self {
        prevent_default: true,
        stop_propagation: true,
    };

    /// Combine two responses
    pub fn merge(self, other: Self) -> Self {
        Self {
            prevent_default: self.prevent_default || other.prevent_default,
            stop_propagation: self.stop_propagation || other.stop_propagation,
        }
    }
}
