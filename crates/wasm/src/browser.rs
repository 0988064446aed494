use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{EventTarget, MediaQueryList, Window};
use zoomreta_core::{HostSignals, HostTriggers, Trigger, TriggerHandler, TriggerId};

enum Registration {
    Interval {
        handle: i32,
        _closure: Closure<dyn FnMut()>,
    },
    Listener {
        target: EventTarget,
        event: &'static str,
        closure: Closure<dyn FnMut()>,
    },
    Resolution(Rc<ResolutionWatch<MediaResolution>>),
}

/// Media-query plumbing behind [`ResolutionWatch`].
trait ResolutionSource: 'static {
    type Listener: 'static;

    fn device_pixel_ratio(&self) -> f64;

    /// Listen for the display starting or ceasing to match `dppx`.
    fn listen(&self, dppx: f64, on_change: Rc<dyn Fn()>) -> Option<Self::Listener>;

    fn unlisten(&self, listener: &Self::Listener);
}

/// A `(resolution: Ndppx)` query only reports leaving N, so the watch
/// re-registers for the new ratio every time it fires.
struct ResolutionWatch<S: ResolutionSource> {
    source: S,
    handler: TriggerHandler,
    current: RefCell<Option<S::Listener>>,
    /// Replaced listeners; the newest may still be on the JS stack.
    retired: RefCell<Vec<S::Listener>>,
}

impl<S: ResolutionSource> ResolutionWatch<S> {
    fn start(source: S, handler: TriggerHandler) -> Option<Rc<Self>> {
        let watch = Rc::new(Self {
            source,
            handler,
            current: RefCell::new(None),
            retired: RefCell::new(Vec::new()),
        });
        watch.arm().then_some(watch)
    }

    fn arm(self: &Rc<Self>) -> bool {
        let watch = Rc::downgrade(self);
        let on_change: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(watch) = watch.upgrade() {
                watch.fired();
            }
        });
        let dppx = self.source.device_pixel_ratio();
        let Some(listener) = self.source.listen(dppx, on_change) else {
            return false;
        };

        let previous = self.current.replace(Some(listener));
        let mut retired = self.retired.borrow_mut();
        retired.clear();
        if let Some(previous) = previous {
            self.source.unlisten(&previous);
            retired.push(previous);
        }
        true
    }

    fn fired(self: &Rc<Self>) {
        if !self.arm() {
            log::warn!("could not re-arm the resolution query; only the interval timer will notice");
        }
        (self.handler)();
    }

    fn stop(&self) {
        if let Some(listener) = self.current.take() {
            self.source.unlisten(&listener);
            self.retired.borrow_mut().push(listener);
        }
    }
}

struct MediaResolution {
    window: Window,
}

impl ResolutionSource for MediaResolution {
    type Listener = (MediaQueryList, Closure<dyn FnMut()>);

    fn device_pixel_ratio(&self) -> f64 {
        self.window.device_pixel_ratio()
    }

    fn listen(&self, dppx: f64, on_change: Rc<dyn Fn()>) -> Option<Self::Listener> {
        let query = self
            .window
            .match_media(&format!("(resolution: {dppx}dppx)"))
            .ok()
            .flatten()?;
        let closure = Closure::<dyn FnMut()>::new(move || on_change());
        query
            .add_event_listener_with_callback("change", closure.as_ref().unchecked_ref())
            .ok()?;
        Some((query, closure))
    }

    fn unlisten(&self, (query, closure): &Self::Listener) {
        if let Err(e) =
            query.remove_event_listener_with_callback("change", closure.as_ref().unchecked_ref())
        {
            log::warn!("failed to remove resolution listener: {e:?}");
        }
    }
}

/// The browser window as a zoom host.
///
/// Signals are read live from `window` on every call.
pub struct BrowserHost {
    window: Window,
    registrations: RefCell<HashMap<u64, Registration>>,
    /// Unregistered closures; one of them may still be on the JS stack.
    retired: RefCell<Vec<Registration>>,
    next_id: Cell<u64>,
}

impl BrowserHost {
    /// `None` outside a window context (workers, server-side rendering).
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        Some(Self {
            window,
            registrations: RefCell::new(HashMap::new()),
            retired: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        })
    }

    fn media_query(&self, query: &str) -> Option<MediaQueryList> {
        self.window.match_media(query).ok().flatten()
    }

    fn listen(
        target: EventTarget,
        event: &'static str,
        closure: Closure<dyn FnMut()>,
    ) -> Option<Registration> {
        target
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .ok()?;
        Some(Registration::Listener {
            target,
            event,
            closure,
        })
    }
}

impl HostSignals for BrowserHost {
    fn device_pixel_ratio(&self) -> Option<f64> {
        Some(self.window.device_pixel_ratio())
    }

    fn root_bounding_width(&self) -> f64 {
        self.window
            .document()
            .and_then(|d| d.document_element())
            .map_or(0.0, |root| root.get_bounding_client_rect().width())
    }

    fn inner_width(&self) -> f64 {
        self.window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }

    fn outer_width(&self) -> f64 {
        self.window
            .outer_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }

    fn screen_width(&self) -> f64 {
        self.window
            .screen()
            .and_then(|s| s.width())
            .map_or(0.0, f64::from)
    }

    fn screen_height(&self) -> f64 {
        self.window
            .screen()
            .and_then(|s| s.height())
            .map_or(0.0, f64::from)
    }

    fn visual_viewport_scale(&self) -> Option<f64> {
        self.window.visual_viewport().map(|v| v.scale())
    }

    fn matches_min_resolution(&self, dppx: f64) -> bool {
        self.media_query(&format!("(min-resolution: {dppx}dppx)"))
            .is_some_and(|q| q.matches())
    }
}

impl HostTriggers for BrowserHost {
    fn register(&self, trigger: Trigger, handler: TriggerHandler) -> Option<TriggerId> {
        self.retired.borrow_mut().clear();

        let wrap = |handler: TriggerHandler| Closure::<dyn FnMut()>::new(move || handler());
        let registration = match trigger {
            Trigger::Interval(every) => {
                let closure = wrap(handler);
                let millis = i32::try_from(every.as_millis()).unwrap_or(i32::MAX);
                let handle = self
                    .window
                    .set_interval_with_callback_and_timeout_and_arguments_0(
                        closure.as_ref().unchecked_ref(),
                        millis,
                    )
                    .ok()?;
                Registration::Interval {
                    handle,
                    _closure: closure,
                }
            }
            Trigger::Resize => Self::listen(self.window.clone().into(), "resize", wrap(handler))?,
            Trigger::ViewportResize => {
                let viewport = self.window.visual_viewport()?;
                Self::listen(viewport.into(), "resize", wrap(handler))?
            }
            Trigger::ResolutionChange => {
                let source = MediaResolution {
                    window: self.window.clone(),
                };
                Registration::Resolution(ResolutionWatch::start(source, handler)?)
            }
            Trigger::Teardown => {
                Self::listen(self.window.clone().into(), "unload", wrap(handler))?
            }
        };

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.registrations.borrow_mut().insert(id, registration);
        Some(TriggerId(id))
    }

    fn unregister(&self, id: TriggerId) {
        let Some(registration) = self.registrations.borrow_mut().remove(&id.0) else {
            return;
        };
        match &registration {
            Registration::Interval { handle, .. } => self.window.clear_interval_with_handle(*handle),
            Registration::Listener {
                target,
                event,
                closure,
            } => {
                if let Err(e) =
                    target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
                {
                    log::warn!("failed to remove {event} listener: {e:?}");
                }
            }
            Registration::Resolution(watch) => watch.stop(),
        }
        self.retired.borrow_mut().push(registration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A display whose ratio the test sets; listeners fire when their
    /// query's match state flips, as `MediaQueryList` does.
    struct Display {
        dppx: Cell<f64>,
        listeners: RefCell<Vec<(u32, f64, Rc<dyn Fn()>)>>,
        next: Cell<u32>,
    }

    impl Display {
        fn new(dppx: f64) -> Rc<Self> {
            Rc::new(Self {
                dppx: Cell::new(dppx),
                listeners: RefCell::new(Vec::new()),
                next: Cell::new(0),
            })
        }

        fn change_to(&self, dppx: f64) {
            let old = self.dppx.replace(dppx);
            let flipped: Vec<Rc<dyn Fn()>> = self
                .listeners
                .borrow()
                .iter()
                .filter(|(_, q, _)| (*q == old) != (*q == dppx))
                .map(|(_, _, f)| f.clone())
                .collect();
            for f in flipped {
                f();
            }
        }

        fn queries(&self) -> Vec<f64> {
            self.listeners.borrow().iter().map(|(_, q, _)| *q).collect()
        }
    }

    impl ResolutionSource for Rc<Display> {
        type Listener = u32;

        fn device_pixel_ratio(&self) -> f64 {
            self.dppx.get()
        }

        fn listen(&self, dppx: f64, on_change: Rc<dyn Fn()>) -> Option<u32> {
            let id = self.next.get();
            self.next.set(id + 1);
            self.listeners.borrow_mut().push((id, dppx, on_change));
            Some(id)
        }

        fn unlisten(&self, listener: &u32) {
            self.listeners.borrow_mut().retain(|(id, _, _)| id != listener);
        }
    }

    #[test]
    fn resolution_watch_reports_every_change() {
        let display = Display::new(1.0);
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let watch =
            ResolutionWatch::start(display.clone(), Rc::new(move || h.set(h.get() + 1))).unwrap();

        display.change_to(2.0);
        assert_eq!(hits.get(), 1);
        // Neither 1 nor 2: only a re-armed query notices.
        display.change_to(1.5);
        assert_eq!(hits.get(), 2);
        display.change_to(1.5);
        assert_eq!(hits.get(), 2);
        assert_eq!(display.queries(), vec![1.5]);

        watch.stop();
        assert!(display.queries().is_empty());
        display.change_to(1.0);
        assert_eq!(hits.get(), 2);
    }
}
