//! Viewport geometry and the mobile/desktop mode split

use serde::{Deserialize, Serialize};

/// Current window metrics as reported by the host
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    /// Inner width in CSS pixels
    pub width: f32,
    /// Inner height in CSS pixels
    pub height: f32,
    /// Vertical scroll offset of the document
    pub scroll_y: f32,
}

impl Viewport {
    /// Create viewport metrics
    pub fn new(width: f32, height: f32, scroll_y: f32) -> Self {
        Self {
            width,
            height,
            scroll_y,
        }
    }

    /// Same metrics scrolled to a different offset
    pub fn scrolled_to(self, scroll_y: f32) -> Self {
        Self { scroll_y, ..self }
    }
}

/// An element's box relative to the viewport (like `getBoundingClientRect`)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    /// Distance from the viewport's top edge to the element's top edge
    pub top: f32,
    /// Distance from the viewport's left edge
    pub left: f32,
    /// Rendered width
    pub width: f32,
    /// Rendered height
    pub height: f32,
}

impl Bounds {
    /// Create new bounds
    pub fn new(top: f32, left: f32, width: f32, height: f32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Bottom edge, viewport-relative
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Check whether any part of the box lies inside a viewport of the given height
    ///
    /// Top edge above the viewport bottom and bottom edge below the viewport top.
    pub fn intersects_viewport(&self, viewport_height: f32) -> bool {
        self.top < viewport_height && self.bottom() > 0.0
    }

    /// Fraction (0.0..=1.0) of the box's height inside the band `[0, band_bottom]`
    pub fn visible_fraction(&self, band_bottom: f32) -> f32 {
        let visible = self.bottom().min(band_bottom) - self.top.max(0.0);
        if self.height <= 0.0 {
            // Zero-height boxes count as fully visible when their edge is inside the band
            return if self.top >= 0.0 && self.top < band_bottom {
                1.0
            } else {
                0.0
            };
        }
        (visible / self.height).clamp(0.0, 1.0)
    }
}

/// Rendering strategy derived from the viewport width
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportMode {
    /// Overlays render inline, always visible, non-dismissible
    Mobile,
    /// Overlays float, are timed and dismissible
    Desktop,
}

impl ViewportMode {
    /// Decide the mode for a width; widths at or below the breakpoint are mobile
    pub fn from_width(width: f32, breakpoint_px: f32) -> Self {
        if width <= breakpoint_px {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }

    /// Check for desktop mode
    pub fn is_desktop(&self) -> bool {
        matches!(self, Self::Desktop)
    }

    /// Check for mobile mode
    pub fn is_mobile(&self) -> bool {
        matches!(self, Self::Mobile)
    }
}
