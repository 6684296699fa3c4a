//! `setTimeout` and `requestAnimationFrame` pumps
//!
//! The core keeps its own deadline queue, so the host only ever needs one
//! browser timer: [`TimeoutPump`] is re-armed for the earliest deadline after
//! every entry point. [`FramePump`] coalesces scroll events into at most one
//! pending animation frame.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, delay_ms: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(handle: i32);

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(handle: i32);
}

type PumpClosure = Closure<dyn FnMut()>;
type FrameClosure = Closure<dyn FnMut(f64)>;

/// Browser delay for a deadline, clamped to what `setTimeout` accepts
pub fn timeout_delay(deadline_ms: u64, now_ms: u64) -> i32 {
    let delay = deadline_ms.saturating_sub(now_ms);
    i32::try_from(delay).unwrap_or(i32::MAX)
}

// ============================================================================
// TimeoutPump
// ============================================================================

/// A single re-armable `setTimeout`
pub struct TimeoutPump {
    inner: Rc<TimeoutInner>,
}

struct TimeoutInner {
    closure: RefCell<Option<PumpClosure>>,
    callback: RefCell<Box<dyn FnMut()>>,
    /// Handle of the armed timeout
    handle: Cell<Option<i32>>,
    /// Deadline the armed timeout was set for
    deadline: Cell<Option<u64>>,
}

impl TimeoutPump {
    /// Create a pump that calls `callback` each time the timeout fires
    pub fn new(callback: impl FnMut() + 'static) -> Self {
        let inner = Rc::new(TimeoutInner {
            closure: RefCell::new(None),
            callback: RefCell::new(Box::new(callback)),
            handle: Cell::new(None),
            deadline: Cell::new(None),
        });

        let fired = Rc::clone(&inner);
        let closure = Closure::wrap(Box::new(move || {
            fired.handle.set(None);
            fired.deadline.set(None);
            fired.callback.borrow_mut()();
        }) as Box<dyn FnMut()>);
        *inner.closure.borrow_mut() = Some(closure);

        Self { inner }
    }

    /// Arm for `deadline_ms`; a pump already armed for the same deadline is left alone
    pub fn arm(&self, deadline_ms: u64, now_ms: u64) {
        if self.armed_for() == Some(deadline_ms) {
            return;
        }
        self.cancel();

        if let Some(ref closure) = *self.inner.closure.borrow() {
            let delay = timeout_delay(deadline_ms, now_ms);
            let handle = set_timeout(closure.as_ref().unchecked_ref(), delay);
            self.inner.handle.set(Some(handle));
            self.inner.deadline.set(Some(deadline_ms));
            tracing::trace!("TimeoutPump::arm - {}ms (deadline {})", delay, deadline_ms);
        }
    }

    /// Clear the armed timeout, if any
    pub fn cancel(&self) {
        if let Some(handle) = self.inner.handle.take() {
            clear_timeout(handle);
        }
        self.inner.deadline.set(None);
    }

    /// Deadline the pump is armed for
    pub fn armed_for(&self) -> Option<u64> {
        self.inner.deadline.get()
    }
}

impl Drop for TimeoutPump {
    fn drop(&mut self) {
        self.cancel();
        self.inner.closure.borrow_mut().take();
    }
}

impl std::fmt::Debug for TimeoutPump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeoutPump")
            .field("deadline", &self.inner.deadline.get())
            .finish()
    }
}

// ============================================================================
// FramePump
// ============================================================================

/// At most one pending `requestAnimationFrame`
pub struct FramePump {
    inner: Rc<FrameInner>,
}

struct FrameInner {
    closure: RefCell<Option<FrameClosure>>,
    callback: RefCell<Box<dyn FnMut()>>,
    handle: Cell<Option<i32>>,
}

impl FramePump {
    /// Create a pump that calls `callback` on the requested frame
    pub fn new(callback: impl FnMut() + 'static) -> Self {
        let inner = Rc::new(FrameInner {
            closure: RefCell::new(None),
            callback: RefCell::new(Box::new(callback)),
            handle: Cell::new(None),
        });

        let fired = Rc::clone(&inner);
        let closure = Closure::wrap(Box::new(move |_timestamp_ms: f64| {
            fired.handle.set(None);
            fired.callback.borrow_mut()();
        }) as Box<dyn FnMut(f64)>);
        *inner.closure.borrow_mut() = Some(closure);

        Self { inner }
    }

    /// Request the next animation frame unless one is already pending
    pub fn request(&self) {
        if self.inner.handle.get().is_some() {
            return;
        }
        if let Some(ref closure) = *self.inner.closure.borrow() {
            let handle = request_animation_frame(closure.as_ref().unchecked_ref());
            self.inner.handle.set(Some(handle));
        }
    }

    /// Whether a frame is pending
    pub fn is_pending(&self) -> bool {
        self.inner.handle.get().is_some()
    }
}

impl Drop for FramePump {
    fn drop(&mut self) {
        if let Some(handle) = self.inner.handle.take() {
            cancel_animation_frame(handle);
        }
        self.inner.closure.borrow_mut().take();
    }
}

impl std::fmt::Debug for FramePump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramePump")
            .field("pending", &self.is_pending())
            .finish()
    }
}
