//! Scroll-driven cosmetic effects
//!
//! These run inside the coalesced scroll frame in both viewport modes and
//! write styles straight to the document; none of them has state another
//! behavior depends on.

use crate::config::EffectsConfig;
use crate::document::{classes, selectors, Document};

const HEADER_SCROLLED: [(&str, &str); 2] = [
    ("background", "rgba(255, 255, 253, 0.95)"),
    ("backdrop-filter", "blur(10px)"),
];
const HEADER_TOP: [(&str, &str); 2] = [
    ("background", "var(--color-surface)"),
    ("backdrop-filter", "none"),
];

#[derive(Debug)]
struct RevealTarget<E> {
    element: E,
    revealed: bool,
}

/// Header surface, hero parallax and one-way reveal
#[derive(Debug)]
pub struct ScrollEffects<E> {
    config: EffectsConfig,
    header: Option<E>,
    header_scrolled: Option<bool>,
    hero: Option<(E, E)>,
    reveal: Vec<RevealTarget<E>>,
}

impl<E: Clone + PartialEq> ScrollEffects<E> {
    /// Resolve effect targets
    pub fn resolve<D: Document<Element = E>>(document: &D, config: EffectsConfig) -> Self {
        let header = document.query(selectors::HEADER);
        let hero = document
            .query(selectors::HERO)
            .zip(document.query(selectors::HERO_CONTENT));

        let reveal: Vec<_> = document
            .query_all(selectors::REVEAL_TARGETS)
            .into_iter()
            .map(|element| RevealTarget {
                element,
                revealed: false,
            })
            .collect();

        tracing::debug!(
            "ScrollEffects::resolve - header: {}, parallax: {}, {} reveal targets",
            header.is_some(),
            hero.is_some(),
            reveal.len()
        );

        Self {
            config,
            header,
            header_scrolled: None,
            hero,
            reveal,
        }
    }

    /// Put every reveal target in its pre-entrance state
    pub fn prepare<D: Document<Element = E>>(&self, document: &D) {
        for target in &self.reveal {
            document.set_class(&target.element, classes::FADE_IN, true);
        }
    }

    /// Number of reveal targets still waiting to enter the viewport
    pub fn pending_reveals(&self) -> usize {
        self.reveal.iter().filter(|t| !t.revealed).count()
    }

    /// Apply every effect for the current scroll position
    pub fn update<D: Document<Element = E>>(&mut self, document: &D) {
        let viewport = document.viewport();
        self.update_header(document, viewport.scroll_y);
        self.update_parallax(document, viewport.scroll_y);
        self.update_reveal(document, viewport.height);
    }

    fn update_header<D: Document<Element = E>>(&mut self, document: &D, scroll_y: f32) {
        let Some(header) = &self.header else {
            return;
        };
        let scrolled = scroll_y > self.config.header_threshold_px;
        if self.header_scrolled == Some(scrolled) {
            return;
        }
        self.header_scrolled = Some(scrolled);

        let styles = if scrolled { HEADER_SCROLLED } else { HEADER_TOP };
        for (property, value) in styles {
            document.set_style(header, property, value);
        }
    }

    fn update_parallax<D: Document<Element = E>>(&self, document: &D, scroll_y: f32) {
        let Some((hero, content)) = &self.hero else {
            return;
        };
        if scroll_y < document.bounds(hero).height {
            // Round to hundredths of a pixel
            let offset = (scroll_y * self.config.parallax_speed * 100.0).round() / 100.0;
            document.set_style(content, "transform", &format!("translateY({}px)", offset));
        }
    }

    fn update_reveal<D: Document<Element = E>>(&mut self, document: &D, viewport_height: f32) {
        let band_bottom = viewport_height - self.config.reveal_bottom_margin_px;
        let threshold = self.config.reveal_threshold;

        for target in self.reveal.iter_mut().filter(|t| !t.revealed) {
            let fraction = document.bounds(&target.element).visible_fraction(band_bottom);
            if fraction > 0.0 && fraction >= threshold {
                document.set_class(&target.element, classes::VISIBLE, true);
                target.revealed = true;
            }
        }
    }
}
