//! Deterministic in-memory host.
//!
//! Signals come from a [`HostSample`] the caller controls, and triggers
//! fire only when asked. Used by the tests and by the trace replayer.

use std::cell::{Cell, RefCell};
use std::mem;

use zoomreta_protocol::HostSample;

use crate::host::{HostSignals, HostTriggers, Trigger, TriggerHandler, TriggerId};

pub struct FakeHost {
    sample: Cell<HostSample>,
    media_queries: bool,
    handlers: RefCell<Vec<(TriggerId, Trigger, TriggerHandler)>>,
    next_id: Cell<u64>,
}

impl FakeHost {
    /// A host supporting every capability.
    pub fn new(sample: HostSample) -> Self {
        Self {
            sample: Cell::new(sample),
            media_queries: true,
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Emulate a host without `matchMedia`: resolution-change triggers
    /// cannot be registered and the density query never matches.
    pub fn without_media_queries(mut self) -> Self {
        self.media_queries = false;
        self
    }

    pub fn set_sample(&self, sample: HostSample) {
        self.sample.set(sample);
    }

    pub fn update(&self, f: impl FnOnce(&mut HostSample)) {
        let mut sample = self.sample.get();
        f(&mut sample);
        self.sample.set(sample);
    }

    /// Run every handler registered for `trigger`'s kind, in registration
    /// order. Interval handlers match any duration.
    pub fn fire(&self, trigger: Trigger) {
        let matching: Vec<TriggerHandler> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(_, t, _)| mem::discriminant(t) == mem::discriminant(&trigger))
            .map(|(_, _, h)| h.clone())
            .collect();
        for handler in matching {
            handler();
        }
    }

    /// One timer tick.
    pub fn tick(&self) {
        self.fire(Trigger::Interval(Default::default()));
    }

    /// Number of live registrations of `trigger`'s kind.
    pub fn registered(&self, trigger: Trigger) -> usize {
        self.handlers
            .borrow()
            .iter()
            .filter(|(_, t, _)| mem::discriminant(t) == mem::discriminant(&trigger))
            .count()
    }

    fn supports(&self, trigger: Trigger) -> bool {
        match trigger {
            Trigger::ViewportResize => self.sample.get().visual_viewport_scale.is_some(),
            Trigger::ResolutionChange => self.media_queries,
            _ => true,
        }
    }
}

impl HostSignals for FakeHost {
    fn device_pixel_ratio(&self) -> Option<f64> {
        self.sample.get().device_pixel_ratio
    }

    fn root_bounding_width(&self) -> f64 {
        self.sample.get().root_width
    }

    fn inner_width(&self) -> f64 {
        self.sample.get().inner_width
    }

    fn outer_width(&self) -> f64 {
        self.sample.get().outer_width
    }

    fn screen_width(&self) -> f64 {
        self.sample.get().screen_width
    }

    fn screen_height(&self) -> f64 {
        self.sample.get().screen_height
    }

    fn visual_viewport_scale(&self) -> Option<f64> {
        self.sample.get().visual_viewport_scale
    }

    fn matches_min_resolution(&self, dppx: f64) -> bool {
        // The sample only records the 2dppx query.
        self.media_queries && dppx <= 2.0 && self.sample.get().high_density_media
    }
}

impl HostTriggers for FakeHost {
    fn register(&self, trigger: Trigger, handler: TriggerHandler) -> Option<TriggerId> {
        if !self.supports(trigger) {
            return None;
        }
        let id = TriggerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().push((id, trigger, handler));
        Some(id)
    }

    fn unregister(&self, id: TriggerId) {
        self.handlers.borrow_mut().retain(|(i, _, _)| *i != id);
    }
}
