//! Event routing between the browser and the page core
//!
//! [`WebHost`] owns the [`Page`] and the two pumps. Every entry point ends
//! with [`WebHost::pump`], which runs due tasks and re-arms the timeout for
//! the earliest remaining deadline.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{AddEventListenerOptions, Element, Event, KeyboardEvent, MouseEvent, Window};

use vitrine_core::{Clock, EventResponse, Key, KeyPress, LaunchOptions, Page};

use crate::clock::PerformanceClock;
use crate::document::WebDocument;
use crate::timers::{FramePump, TimeoutPump};

/// The page plus the browser timers that drive it
pub struct WebHost {
    page: RefCell<Page<WebDocument>>,
    clock: PerformanceClock,
    timeout: TimeoutPump,
    frame: FramePump,
}

impl WebHost {
    /// Wrap a built page
    pub fn new(page: Page<WebDocument>) -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Self>| {
            let on_timeout = weak.clone();
            let on_frame = weak.clone();
            Self {
                page: RefCell::new(page),
                clock: PerformanceClock,
                timeout: TimeoutPump::new(move || {
                    if let Some(host) = on_timeout.upgrade() {
                        host.pump();
                    }
                }),
                frame: FramePump::new(move || {
                    if let Some(host) = on_frame.upgrade() {
                        host.frame();
                    }
                }),
            }
        })
    }

    /// Start the page and arm the first timer
    pub fn start(&self, options: LaunchOptions) {
        self.page.borrow_mut().start(options);
        self.pump();
    }

    /// Run due tasks and re-arm the timeout for the next deadline
    pub fn pump(&self) {
        let mut page = self.page.borrow_mut();
        page.advance();
        match page.next_deadline() {
            Some(deadline) => self.timeout.arm(deadline, self.clock.now_ms()),
            None => self.timeout.cancel(),
        }
    }

    /// `scroll` listener
    pub fn scroll(&self) {
        if self.page.borrow_mut().scroll() {
            self.frame.request();
        }
    }

    /// Animation frame requested by [`WebHost::scroll`]
    pub fn frame(&self) {
        self.page.borrow_mut().frame();
        self.pump();
    }

    /// `resize` listener
    pub fn resize(&self) {
        self.page.borrow_mut().resize();
        self.pump();
    }

    /// Document `click` listener
    pub fn click(&self, event: &MouseEvent) {
        let Some(target) = event_target(event) else {
            return;
        };
        let response = self.page.borrow_mut().click(&target);
        apply(event, response);
        self.pump();
    }

    /// Document `keydown` listener
    pub fn key_down(&self, event: &KeyboardEvent) {
        let key = Key::from_name(&event.key());
        if key == Key::Other {
            return;
        }
        let Some(target) = event_target(event) else {
            return;
        };
        let press = if event.shift_key() {
            KeyPress::shifted(key)
        } else {
            KeyPress::new(key)
        };
        let response = self.page.borrow_mut().key_down(press, &target);
        apply(event, response);
        self.pump();
    }

    /// Attach the scroll, resize, click and keydown listeners
    ///
    /// The listeners hold the host for the lifetime of the page.
    pub fn attach(self: &Rc<Self>, window: &Window) -> Result<(), JsValue> {
        let document = self.page.borrow().document().inner().clone();

        let host = Rc::clone(self);
        let scroll = Closure::wrap(Box::new(move || host.scroll()) as Box<dyn FnMut()>);
        let passive = AddEventListenerOptions::new();
        passive.set_passive(true);
        window.add_event_listener_with_callback_and_add_event_listener_options(
            "scroll",
            scroll.as_ref().unchecked_ref(),
            &passive,
        )?;
        scroll.forget();

        let host = Rc::clone(self);
        let resize = Closure::wrap(Box::new(move || host.resize()) as Box<dyn FnMut()>);
        window.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref())?;
        resize.forget();

        let host = Rc::clone(self);
        let click = Closure::wrap(
            Box::new(move |event: MouseEvent| host.click(&event)) as Box<dyn FnMut(MouseEvent)>
        );
        document.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
        click.forget();

        let host = Rc::clone(self);
        let key_down = Closure::wrap(Box::new(move |event: KeyboardEvent| host.key_down(&event))
            as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keydown", key_down.as_ref().unchecked_ref())?;
        key_down.forget();

        tracing::debug!("WebHost::attach - listeners attached");
        Ok(())
    }
}

impl std::fmt::Debug for WebHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebHost")
            .field("timeout", &self.timeout)
            .field("frame", &self.frame)
            .finish()
    }
}

fn event_target(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

fn apply(event: &Event, response: EventResponse) {
    if response.prevent_default {
        event.prevent_default();
    }
    if response.stop_propagation {
        event.stop_propagation();
    }
}
