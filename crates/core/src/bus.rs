use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use zoomreta_protocol::{ZoomEventKind, ZoomMetrics};

/// A notification callback. Identity is the `Rc` allocation.
pub type Subscriber = Rc<dyn Fn(&ZoomMetrics)>;

/// Publish/subscribe registry keyed by [`ZoomEventKind`].
///
/// Cloning the bus yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Rc<RefCell<HashMap<ZoomEventKind, Vec<Subscriber>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `callback` to `kind`'s list. Subscribing the same callback
    /// twice makes it run twice per publish.
    pub fn subscribe(&self, kind: ZoomEventKind, callback: Subscriber) {
        self.subscribers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(callback);
    }

    /// Remove every registration of `callback` under `kind`.
    pub fn unsubscribe(&self, kind: ZoomEventKind, callback: &Subscriber) {
        if let Some(list) = self.subscribers.borrow_mut().get_mut(&kind) {
            list.retain(|s| !same_subscriber(s, callback));
        }
    }

    /// Invoke every subscriber of `kind` in subscription order.
    ///
    /// Iterates over a snapshot of the list, so callbacks may subscribe or
    /// unsubscribe while being notified; changes apply from the next
    /// publish. A panicking subscriber is logged and skipped.
    pub fn publish(&self, kind: ZoomEventKind, metrics: &ZoomMetrics) {
        let snapshot: Vec<Subscriber> = self
            .subscribers
            .borrow()
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        log::debug!(
            "publishing {kind} ({}%) to {} subscriber(s)",
            metrics.zoom_level_percentage,
            snapshot.len()
        );
        for subscriber in snapshot {
            if catch_unwind(AssertUnwindSafe(|| subscriber(metrics))).is_err() {
                log::warn!("{kind} subscriber panicked; continuing with the rest");
            }
        }
    }

    pub fn subscriber_count(&self, kind: ZoomEventKind) -> usize {
        self.subscribers.borrow().get(&kind).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for kind in ZoomEventKind::ALL {
            map.entry(&kind, &self.subscriber_count(kind));
        }
        map.finish()
    }
}

fn same_subscriber(a: &Subscriber, b: &Subscriber) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn metrics(pct: i64) -> ZoomMetrics {
        ZoomMetrics {
            zoom_level_percentage: pct,
            zoom_via_device_pixel_ratio: None,
            viewport_zoom_level: 1.0,
            system_zoom_level: 1.0,
            effective_zoom_level: 1.0,
            is_retina: None,
            initial_device_pixel_ratio: None,
        }
    }

    fn recorder(log: &Rc<RefCell<Vec<String>>>, tag: &'static str) -> Subscriber {
        let log = log.clone();
        Rc::new(move |m: &ZoomMetrics| {
            log.borrow_mut()
                .push(format!("{tag}:{}", m.zoom_level_percentage));
        })
    }

    #[test]
    fn publishes_in_subscription_order_per_kind() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let bus = EventBus::new();
        bus.subscribe(ZoomEventKind::ZoomChange, recorder(&log, "a"));
        bus.subscribe(ZoomEventKind::ZoomChange, recorder(&log, "b"));
        bus.subscribe(ZoomEventKind::ZoomStart, recorder(&log, "start"));

        bus.publish(ZoomEventKind::ZoomChange, &metrics(110));
        assert_eq!(*log.borrow(), vec!["a:110", "b:110"]);
    }

    #[test]
    fn duplicates_run_twice_and_unsubscribe_removes_all() {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let cb: Subscriber = Rc::new(move |_| h.set(h.get() + 1));
        let bus = EventBus::new();
        bus.subscribe(ZoomEventKind::ZoomEnd, cb.clone());
        bus.subscribe(ZoomEventKind::ZoomEnd, cb.clone());

        bus.publish(ZoomEventKind::ZoomEnd, &metrics(100));
        assert_eq!(hits.get(), 2);

        bus.unsubscribe(ZoomEventKind::ZoomEnd, &cb);
        assert_eq!(bus.subscriber_count(ZoomEventKind::ZoomEnd), 0);
        bus.publish(ZoomEventKind::ZoomEnd, &metrics(100));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn unsubscribe_matches_identity_not_behavior() {
        let bus = EventBus::new();
        let a: Subscriber = Rc::new(|_| ());
        let b: Subscriber = Rc::new(|_| ());
        bus.subscribe(ZoomEventKind::ZoomStart, a.clone());
        bus.subscribe(ZoomEventKind::ZoomStart, b);
        bus.unsubscribe(ZoomEventKind::ZoomStart, &a);
        assert_eq!(bus.subscriber_count(ZoomEventKind::ZoomStart), 1);
    }

    #[test]
    fn panicking_subscriber_does_not_stop_the_rest() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let bus = EventBus::new();
        bus.subscribe(
            ZoomEventKind::ZoomChange,
            Rc::new(|_| panic!("subscriber failure")),
        );
        bus.subscribe(ZoomEventKind::ZoomChange, recorder(&log, "after"));

        bus.publish(ZoomEventKind::ZoomChange, &metrics(90));
        assert_eq!(*log.borrow(), vec!["after:90"]);
    }

    #[test]
    fn subscribing_during_publish_applies_next_time() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let (inner_bus, h) = (bus.clone(), hits.clone());
        bus.subscribe(
            ZoomEventKind::ZoomStart,
            Rc::new(move |_| {
                let h = h.clone();
                inner_bus.subscribe(ZoomEventKind::ZoomStart, Rc::new(move |_| h.set(h.get() + 1)));
            }),
        );

        bus.publish(ZoomEventKind::ZoomStart, &metrics(100));
        assert_eq!(hits.get(), 0);
        assert_eq!(bus.subscriber_count(ZoomEventKind::ZoomStart), 2);
    }
}
