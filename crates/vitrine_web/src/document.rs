//! `Document` over the live DOM
//!
//! Every `web_sys` call that can throw is treated like a missing element:
//! the exception is logged at `trace` and the lookup comes back empty.

use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, NodeList, Window};

use vitrine_core::{selectors, Bounds, Document, ModalMount, Viewport};

/// Markup of the video modal; the title slot is filled with `textContent`
const VIDEO_MODAL_TEMPLATE: &str = r#"
<div class="video-modal__overlay">
    <div class="video-modal__content">
        <button class="video-modal__close" aria-label="Close video modal">&times;</button>
        <div class="video-modal__player">
            <div class="mock-video-player">
                <h3>Demo Video Player</h3>
                <p>This would contain the actual video content for:</p>
                <p><strong class="video-modal__title"></strong></p>
                <div class="mock-controls">
                    <button class="mock-play-btn">&#9654; Play</button>
                    <button class="mock-pause-btn">&#9208; Pause</button>
                    <div class="mock-progress">
                        <div class="mock-progress-bar"></div>
                    </div>
                </div>
            </div>
        </div>
    </div>
</div>
"#;

const MODAL_OVERLAY: &str = ".video-modal__overlay";
const MODAL_CLOSE: &str = ".video-modal__close";
const MODAL_TITLE: &str = ".video-modal__title";

/// The browser document and its window
#[derive(Clone, Debug)]
pub struct WebDocument {
    window: Window,
    document: web_sys::Document,
}

impl WebDocument {
    /// Wrap a window's document
    pub fn new(window: Window, document: web_sys::Document) -> Self {
        Self { window, document }
    }

    /// The wrapped document
    pub fn inner(&self) -> &web_sys::Document {
        &self.document
    }

    fn style_target(element: &Element) -> Option<&HtmlElement> {
        element.dyn_ref::<HtmlElement>()
    }
}

/// Collect the elements of a `NodeList` in order
fn elements(list: NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|index| list.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn px(value: wasm_bindgen::JsValue) -> f32 {
    value.as_f64().unwrap_or(0.0) as f32
}

impl Document for WebDocument {
    type Element = Element;

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        match self.document.query_selector_all(selector) {
            Ok(list) => elements(list),
            Err(err) => {
                tracing::trace!("WebDocument::query_all - {} threw {:?}", selector, err);
                Vec::new()
            }
        }
    }

    fn query_within(&self, root: &Element, selector: &str) -> Vec<Element> {
        root.query_selector_all(selector)
            .map(elements)
            .unwrap_or_default()
    }

    fn closest(&self, element: &Element, selector: &str) -> Option<Element> {
        element.closest(selector).ok().flatten()
    }

    fn matches(&self, element: &Element, selector: &str) -> bool {
        element.matches(selector).unwrap_or(false)
    }

    fn contains(&self, ancestor: &Element, node: &Element) -> bool {
        let node: &web_sys::Node = node;
        ancestor.contains(Some(node))
    }

    fn element_id(&self, element: &Element) -> Option<String> {
        let id = element.id();
        (!id.is_empty()).then_some(id)
    }

    fn text_content(&self, element: &Element) -> String {
        element.text_content().unwrap_or_default()
    }

    fn bounds(&self, element: &Element) -> Bounds {
        let rect = element.get_bounding_client_rect();
        Bounds::new(
            rect.top() as f32,
            rect.left() as f32,
            rect.width() as f32,
            rect.height() as f32,
        )
    }

    fn viewport(&self) -> Viewport {
        let width = self.window.inner_width().map(px).unwrap_or(0.0);
        let height = self.window.inner_height().map(px).unwrap_or(0.0);
        let scroll_y = self.window.scroll_y().unwrap_or(0.0) as f32;
        Viewport::new(width, height, scroll_y)
    }

    fn set_class(&self, element: &Element, class: &str, enabled: bool) {
        let list = element.class_list();
        let result = if enabled {
            list.add_1(class)
        } else {
            list.remove_1(class)
        };
        if let Err(err) = result {
            tracing::trace!("WebDocument::set_class - '{}' threw {:?}", class, err);
        }
    }

    fn set_style(&self, element: &Element, property: &str, value: &str) {
        let Some(html) = Self::style_target(element) else {
            return;
        };
        let style = html.style();
        let result = if value.is_empty() {
            style.remove_property(property).map(drop)
        } else {
            style.set_property(property, value)
        };
        if let Err(err) = result {
            tracing::trace!("WebDocument::set_style - '{}' threw {:?}", property, err);
        }
    }

    fn set_scroll_locked(&self, locked: bool) {
        if let Some(body) = self.document.body() {
            let value = if locked { "hidden" } else { "" };
            self.set_style(&body, "overflow", value);
        }
    }

    fn focus(&self, element: &Element) {
        if let Some(html) = Self::style_target(element) {
            if let Err(err) = html.focus() {
                tracing::trace!("WebDocument::focus - threw {:?}", err);
            }
        }
    }

    fn active_element(&self) -> Option<Element> {
        self.document.active_element()
    }

    fn mount_video_modal(&self, title: &str) -> Option<ModalMount<Element>> {
        let body = self.document.body()?;
        let root = self.document.create_element("div").ok()?;
        root.set_class_name("video-modal");
        root.set_inner_html(VIDEO_MODAL_TEMPLATE);

        if let Ok(Some(slot)) = root.query_selector(MODAL_TITLE) {
            slot.set_text_content(Some(title));
        }
        let overlay = root.query_selector(MODAL_OVERLAY).ok().flatten()?;
        let close_button = root.query_selector(MODAL_CLOSE).ok().flatten();
        let focusables = self.query_within(&root, selectors::FOCUSABLE);

        body.append_child(&root).ok()?;
        tracing::debug!(
            "WebDocument::mount_video_modal - mounted with {} focusables",
            focusables.len()
        );

        Some(ModalMount {
            root,
            overlay,
            close_button,
            focusables,
        })
    }

    fn is_attached(&self, element: &Element) -> bool {
        element.is_connected()
    }

    fn remove(&self, element: &Element) {
        element.remove();
    }
}
