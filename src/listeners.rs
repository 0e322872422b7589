use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{EventTarget, PointerEvent};

type Handler = Closure<dyn FnMut(PointerEvent)>;

/// Window-level pointer listeners that live exactly as long as one gesture.
/// Dropping the guard detaches every listener it attached.
///
/// Never drop the guard from inside one of its own handlers; defer the drop
/// to a later task instead.
pub struct GestureListeners {
    target: EventTarget,
    handlers: Vec<(&'static str, Handler)>,
}

impl GestureListeners {
    pub fn on_window() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        Ok(Self {
            target: window.into(),
            handlers: Vec::new(),
        })
    }

    pub fn listen(
        mut self,
        event: &'static str,
        handler: impl FnMut(PointerEvent) + 'static,
    ) -> Result<Self, JsValue> {
        let closure = Handler::new(handler);
        self.target
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        self.handlers.push((event, closure));
        Ok(self)
    }
}

impl Drop for GestureListeners {
    fn drop(&mut self) {
        for (event, closure) in &self.handlers {
            let _ = self
                .target
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
    }
}
