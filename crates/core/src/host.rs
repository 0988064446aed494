use std::rc::Rc;
use std::time::Duration;

/// Read-only access to the display signals a host exposes.
///
/// No method fails: a host that cannot report a signal returns the
/// documented neutral value (`None`, `false`, or whatever it measured).
pub trait HostSignals {
    /// Physical pixels per CSS pixel, if the host reports one.
    fn device_pixel_ratio(&self) -> Option<f64>;
    /// Bounding width of the root document element.
    fn root_bounding_width(&self) -> f64;
    fn inner_width(&self) -> f64;
    fn outer_width(&self) -> f64;
    fn screen_width(&self) -> f64;
    fn screen_height(&self) -> f64;
    /// Pinch-zoom scale of the visual viewport. `None` when unsupported.
    fn visual_viewport_scale(&self) -> Option<f64>;
    /// Whether a `(min-resolution: <dppx>dppx)` media query matches.
    /// Hosts without media-query support answer `false`.
    fn matches_min_resolution(&self, dppx: f64) -> bool;
}

/// A host event that can drive a detection step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Repeating timer.
    Interval(Duration),
    /// Window-level resize.
    Resize,
    /// Visual-viewport resize (pinch zoom).
    ViewportResize,
    /// The display resolution media query stopped or started matching.
    ResolutionChange,
    /// The host is tearing the page/process down.
    Teardown,
}

/// Opaque handle to a registered trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerId(pub u64);

pub type TriggerHandler = Rc<dyn Fn()>;

/// Registration of trigger handlers on a host.
///
/// Handlers run on the host's single event loop thread, one at a time.
pub trait HostTriggers {
    /// Install `handler` for `trigger`. Returns `None` when the host lacks
    /// the capability, in which case the trigger is simply never fired.
    fn register(&self, trigger: Trigger, handler: TriggerHandler) -> Option<TriggerId>;

    /// Remove a handler. Unknown ids are ignored. Safe to call from within
    /// the handler being removed.
    fn unregister(&self, id: TriggerId);
}

/// A full visual host: signals plus triggers.
pub trait ZoomHost: HostSignals + HostTriggers {}

impl<T: HostSignals + HostTriggers + ?Sized> ZoomHost for T {}
