//! Page behavior configuration
//!
//! Every timing constant and the overlay topology live here so a host can
//! tune them without touching behavior code. The defaults reproduce the
//! marketing site exactly:
//!
//! | trigger                    | hero  | service 1 | service 2 |
//! |----------------------------|-------|-----------|-----------|
//! | start-up (after 2000ms)    | 1000  | 2500      | 4000      |
//! | start-up nudge (3000ms)    | 0     | -         | -         |
//! | desktop entry (after 1000) | 500   | 1500      | 2500      |
//! | region scroll-in           | 500   | 1000      | 2000      |
//!
//! Configuration is usually left at its defaults; a host may load JSON:
//!
//! ```
//! use vitrine_core::PageConfig;
//!
//! let config = PageConfig::from_json(r#"{ "auto_hide_ms": 8000 }"#).unwrap();
//! assert_eq!(config.auto_hide_ms, 8000);
//! assert_eq!(config.breakpoint_px, 768.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, VitrineError};

/// One overlay in a stagger plan or group, with its delay
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayedOverlay {
    /// Overlay element id
    pub overlay: String,
    /// Delay before the show, in milliseconds
    pub delay_ms: u64,
}

impl DelayedOverlay {
    /// Create an entry
    pub fn new(overlay: impl Into<String>, delay_ms: u64) -> Self {
        Self {
            overlay: overlay.into(),
            delay_ms,
        }
    }
}

/// A batch of staggered shows that starts after a lead time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaggerPlan {
    /// Time from trigger to scheduling the batch
    pub lead_ms: u64,
    /// Shows scheduled when the lead time elapses
    pub steps: Vec<DelayedOverlay>,
    /// Skip the batch when the page is in mobile mode once the lead elapses
    #[serde(default)]
    pub desktop_only: bool,
}

impl StaggerPlan {
    /// Create a plan that runs in either mode
    pub fn new(lead_ms: u64, steps: Vec<DelayedOverlay>) -> Self {
        Self {
            lead_ms,
            steps,
            desktop_only: false,
        }
    }

    /// Restrict the plan to desktop mode
    pub fn desktop_only(mut self) -> Self {
        self.desktop_only = true;
        self
    }
}

/// Overlays sharing a scroll trigger region
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Group name (for logs)
    pub name: String,
    /// Element id of the trigger region
    pub region: String,
    /// Members and their scroll-in stagger delays
    pub members: Vec<DelayedOverlay>,
}

/// Video modal timings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalConfig {
    /// Delay between mounting and adding the `show` class
    pub reveal_delay_ms: u64,
    /// Close transition before the modal is removed
    pub close_delay_ms: u64,
    /// Simulated loading time after a placeholder click
    pub video_load_ms: u64,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            reveal_delay_ms: 10,
            close_delay_ms: 300,
            video_load_ms: 1_500,
        }
    }
}

/// Announcement banner settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnouncementConfig {
    /// Banner element id
    pub element_id: String,
    /// Durable dismissal flag key
    pub storage_key: String,
    /// Show on every load regardless of a stored dismissal
    pub always_show: bool,
    /// Query parameter that forces a show when equal to `1`
    pub force_param: String,
    /// Delay before the banner appears
    pub show_delay_ms: u64,
    /// Exit transition before the banner leaves layout
    pub collapse_delay_ms: u64,
    /// Tracking label for call-to-action clicks
    pub cta_label: String,
}

impl Default for AnnouncementConfig {
    fn default() -> Self {
        Self {
            element_id: "site-announcement".to_string(),
            storage_key: "site_announcement_dismissed_v1".to_string(),
            always_show: false,
            force_param: "show_announce".to_string(),
            show_delay_ms: 800,
            collapse_delay_ms: 300,
            cta_label: "hackathon_2nov".to_string(),
        }
    }
}

/// Popup indicator rotation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Delay after start-up before rotation begins
    pub start_delay_ms: u64,
    /// Time each indicator stays active
    pub interval_ms: u64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 4_000,
            interval_ms: 2_500,
        }
    }
}

/// Scroll-driven cosmetic effects
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Scroll offset past which the header switches to its scrolled surface
    pub header_threshold_px: f32,
    /// Hero content offset per scrolled pixel
    pub parallax_speed: f32,
    /// The reveal band stops this far above the viewport bottom
    pub reveal_bottom_margin_px: f32,
    /// Fraction of an element that must be inside the band to reveal it
    pub reveal_threshold: f32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            header_threshold_px: 50.0,
            parallax_speed: 0.3,
            reveal_bottom_margin_px: 50.0,
            reveal_threshold: 0.1,
        }
    }
}

/// Complete page behavior configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Widths at or below this are mobile
    pub breakpoint_px: f32,
    /// Dwell of an auto-shown popup on desktop
    pub auto_hide_ms: u64,
    /// Popup show/hide CSS transition length
    pub popup_transition_ms: u64,
    /// Floating popup ids, in registration order
    pub overlays: Vec<String>,
    /// Scroll trigger groups
    pub groups: Vec<GroupConfig>,
    /// Plans run once at start-up
    pub welcome: Vec<StaggerPlan>,
    /// Plan run on every switch into desktop mode
    pub desktop_entry: StaggerPlan,
    /// Video modal timings
    pub modal: ModalConfig,
    /// Announcement banner
    pub announcement: AnnouncementConfig,
    /// Indicator rotation
    pub indicators: IndicatorConfig,
    /// Scroll effects
    pub effects: EffectsConfig,
    /// `tracing` filter directive used by hosts that install a subscriber
    pub log_filter: String,
}

const HERO_POPUP: &str = "heroPopup";
const SERVICE_POPUP_1: &str = "servicePopup1";
const SERVICE_POPUP_2: &str = "servicePopup2";

impl Default for PageConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl PageConfig {
    /// The marketing site's behavior
    pub fn standard() -> Self {
        Self {
            breakpoint_px: 768.0,
            auto_hide_ms: 10_000,
            popup_transition_ms: 300,
            overlays: vec![
                HERO_POPUP.to_string(),
                SERVICE_POPUP_1.to_string(),
                SERVICE_POPUP_2.to_string(),
            ],
            groups: vec![
                GroupConfig {
                    name: "hero".to_string(),
                    region: "home".to_string(),
                    members: vec![DelayedOverlay::new(HERO_POPUP, 500)],
                },
                GroupConfig {
                    name: "services".to_string(),
                    region: "services".to_string(),
                    members: vec![
                        DelayedOverlay::new(SERVICE_POPUP_1, 1_000),
                        DelayedOverlay::new(SERVICE_POPUP_2, 2_000),
                    ],
                },
            ],
            welcome: vec![
                StaggerPlan::new(
                    2_000,
                    vec![
                        DelayedOverlay::new(HERO_POPUP, 1_000),
                        DelayedOverlay::new(SERVICE_POPUP_1, 2_500),
                        DelayedOverlay::new(SERVICE_POPUP_2, 4_000),
                    ],
                ),
                StaggerPlan::new(3_000, vec![DelayedOverlay::new(HERO_POPUP, 0)]).desktop_only(),
            ],
            desktop_entry: StaggerPlan::new(
                1_000,
                vec![
                    DelayedOverlay::new(HERO_POPUP, 500),
                    DelayedOverlay::new(SERVICE_POPUP_1, 1_500),
                    DelayedOverlay::new(SERVICE_POPUP_2, 2_500),
                ],
            )
            .desktop_only(),
            modal: ModalConfig::default(),
            announcement: AnnouncementConfig::default(),
            indicators: IndicatorConfig::default(),
            effects: EffectsConfig::default(),
            log_filter: "info".to_string(),
        }
    }

    /// Verbose logging and the announcement forced on, for working on the page
    pub fn debug() -> Self {
        Self::standard()
            .with_always_show_announcement(true)
            .with_log_filter("vitrine_core=trace,vitrine_web=debug,info")
    }

    /// Standard topology with no start-up stagger, for tests that drive
    /// overlays explicitly
    pub fn quiet() -> Self {
        Self {
            welcome: Vec::new(),
            desktop_entry: StaggerPlan::new(1_000, Vec::new()).desktop_only(),
            ..Self::standard()
        }
    }

    /// Parse a JSON document; missing fields keep their standard values
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every overlay named by a group or plan is declared
    pub fn validate(&self) -> Result<()> {
        if !(self.breakpoint_px.is_finite() && self.breakpoint_px > 0.0) {
            return Err(VitrineError::InvalidConfig(format!(
                "breakpoint_px must be positive, got {}",
                self.breakpoint_px
            )));
        }

        let declared = |id: &str| self.overlays.iter().any(|o| o == id);
        let referenced = self
            .groups
            .iter()
            .flat_map(|g| g.members.iter())
            .chain(self.welcome.iter().flat_map(|p| p.steps.iter()))
            .chain(self.desktop_entry.steps.iter());

        for entry in referenced {
            if !declared(&entry.overlay) {
                return Err(VitrineError::InvalidConfig(format!(
                    "overlay '{}' is used but not declared in `overlays`",
                    entry.overlay
                )));
            }
        }
        Ok(())
    }

    /// Set the auto-hide dwell
    pub fn with_auto_hide_ms(mut self, ms: u64) -> Self {
        self.auto_hide_ms = ms;
        self
    }

    /// Set the mobile/desktop breakpoint
    pub fn with_breakpoint(mut self, px: f32) -> Self {
        self.breakpoint_px = px;
        self
    }

    /// Force the announcement on every load
    pub fn with_always_show_announcement(mut self, always: bool) -> Self {
        self.announcement.always_show = always;
        self
    }

    /// Set the log filter directive
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }
}
