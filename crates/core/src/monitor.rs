use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::time::Duration;

use zoomreta_protocol::{MonitorOptions, ZoomEventKind, ZoomMetrics};

use crate::bus::{EventBus, Subscriber};
use crate::host::{HostTriggers, Trigger, TriggerHandler, TriggerId, ZoomHost};
use crate::metrics::{MetricsCalculator, alternative_zoom_percentage};
use crate::signals::{Signals, ZoomError};

/// Something a detection step wants delivered, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Publish(ZoomEventKind, ZoomMetrics),
    Callback(ZoomMetrics),
}

/// Cross-sample bookkeeping of one running monitor.
#[derive(Debug, Clone)]
pub struct MonitorState {
    last_snapshot: ZoomMetrics,
    last_screen_width: f64,
    last_screen_height: f64,
    last_device_pixel_ratio: f64,
    /// `None` until the first detection step.
    last_zoomed: Option<bool>,
    history: VecDeque<ZoomMetrics>,
}

impl MonitorState {
    /// Seed the state with the snapshot and display readings taken at start.
    pub fn new(initial: ZoomMetrics, signals: &Signals) -> Self {
        Self {
            last_snapshot: initial,
            last_screen_width: signals.screen_width,
            last_screen_height: signals.screen_height,
            last_device_pixel_ratio: signals.device_pixel_ratio,
            last_zoomed: None,
            history: VecDeque::new(),
        }
    }

    /// Run one detection step against a fresh reading.
    ///
    /// Mutates the state and returns what must be published or passed to
    /// the monitor callback, without delivering anything itself.
    pub fn detect(
        &mut self,
        signals: &Signals,
        calculator: &MetricsCalculator,
        options: &MonitorOptions,
    ) -> Vec<Notification> {
        let current = take_snapshot(signals, calculator, options);
        let mut out = Vec::new();

        let has_screen_changed = signals.screen_width != self.last_screen_width
            || signals.screen_height != self.last_screen_height
            || signals.device_pixel_ratio != self.last_device_pixel_ratio;

        let zoomed = current.is_zoomed();
        let zoom_state_changed = self.last_zoomed != Some(zoomed);

        let delta = current
            .zoom_level_percentage
            .abs_diff(self.last_snapshot.zoom_level_percentage);
        if delta > u64::from(options.threshold) {
            out.push(Notification::Publish(
                ZoomEventKind::ZoomChange,
                current.clone(),
            ));
        }

        if zoom_state_changed {
            match (self.last_zoomed, zoomed) {
                (_, true) => out.push(Notification::Publish(
                    ZoomEventKind::ZoomStart,
                    current.clone(),
                )),
                (Some(_), false) => out.push(Notification::Publish(
                    ZoomEventKind::ZoomEnd,
                    current.clone(),
                )),
                // Starting out unzoomed is not the end of a zoom.
                (None, false) => {}
            }
            self.last_zoomed = Some(zoomed);
        }

        if (current.tracked_fields_differ(&self.last_snapshot) || has_screen_changed)
            && (!options.once_per_state_change || zoom_state_changed)
        {
            self.last_snapshot = current.clone();
            self.last_screen_width = signals.screen_width;
            self.last_screen_height = signals.screen_height;
            self.last_device_pixel_ratio = signals.device_pixel_ratio;
            out.push(Notification::Callback(current.clone()));
        }

        // Screen changes always reach the callback, even when gated above.
        if has_screen_changed && options.once_per_state_change {
            out.push(Notification::Callback(current.clone()));
        }

        self.history.push_back(current);
        while self.history.len() > options.max_zoom_level_history_length {
            self.history.pop_front();
        }

        out
    }

    pub fn last_snapshot(&self) -> &ZoomMetrics {
        &self.last_snapshot
    }

    /// Snapshots of past detection steps, oldest first.
    pub fn history(&self) -> &VecDeque<ZoomMetrics> {
        &self.history
    }
}

fn take_snapshot(
    signals: &Signals,
    calculator: &MetricsCalculator,
    options: &MonitorOptions,
) -> ZoomMetrics {
    let mut metrics = calculator.compute_from(signals, options.metrics());
    if options.use_alternative_zoom_calculation {
        metrics.zoom_level_percentage = alternative_zoom_percentage(signals);
    }
    metrics
}

struct Shared {
    host: Rc<dyn ZoomHost>,
    bus: EventBus,
    calculator: MetricsCalculator,
    callback: Subscriber,
    options: MonitorOptions,
    state: RefCell<MonitorState>,
    registrations: RefCell<Vec<TriggerId>>,
    running: Cell<bool>,
    in_step: Cell<bool>,
    /// A trigger arrived during the running step.
    pending: Cell<bool>,
}

impl Shared {
    fn tick(&self) {
        if !self.running.get() {
            return;
        }
        if self.in_step.replace(true) {
            log::debug!("detection step in progress; deferring trigger");
            self.pending.set(true);
            return;
        }

        loop {
            self.step();
            if !self.pending.replace(false) || !self.running.get() {
                break;
            }
        }
        self.in_step.set(false);
    }

    fn step(&self) {
        match Signals::read(Some(&*self.host)) {
            Ok(signals) => {
                let notifications =
                    self.state
                        .borrow_mut()
                        .detect(&signals, &self.calculator, &self.options);
                log::trace!("detection step produced {} notification(s)", notifications.len());
                for notification in notifications {
                    self.deliver(notification);
                }
            }
            Err(e) => log::warn!("skipping detection step: {e}"),
        }
    }

    fn deliver(&self, notification: Notification) {
        match notification {
            Notification::Publish(kind, metrics) => self.bus.publish(kind, &metrics),
            Notification::Callback(metrics) => {
                log::debug!(
                    "zoom changed: {}% (effective {})",
                    metrics.zoom_level_percentage,
                    metrics.effective_zoom_level
                );
                let callback = &self.callback;
                if catch_unwind(AssertUnwindSafe(|| callback(&metrics))).is_err() {
                    log::warn!("monitor callback panicked");
                }
            }
        }
    }

    fn stop(&self) {
        if !self.running.replace(false) {
            return;
        }
        for id in self.registrations.take() {
            self.host.unregister(id);
        }
        log::info!("zoom monitor stopped");
    }
}

/// Handle to a running (or torn down) change monitor.
///
/// The monitor keeps running after the handle is dropped; it stops when
/// the host fires its teardown trigger.
#[derive(Clone)]
pub struct ZoomMonitor {
    shared: Rc<Shared>,
}

impl ZoomMonitor {
    /// Take the initial snapshot and hook one detection routine to every
    /// trigger the host supports.
    pub fn start(
        host: Option<Rc<dyn ZoomHost>>,
        bus: EventBus,
        calculator: MetricsCalculator,
        callback: Subscriber,
        interval: Duration,
        options: MonitorOptions,
    ) -> Result<Self, ZoomError> {
        let host = host.ok_or(ZoomError::EnvironmentUnavailable)?;
        let signals = Signals::read(Some(&*host))?;
        let initial = take_snapshot(&signals, &calculator, &options);

        let shared = Rc::new(Shared {
            host: host.clone(),
            bus,
            calculator,
            callback,
            options,
            state: RefCell::new(MonitorState::new(initial, &signals)),
            registrations: RefCell::new(Vec::new()),
            running: Cell::new(true),
            in_step: Cell::new(false),
            pending: Cell::new(false),
        });

        let tick: TriggerHandler = {
            let shared = shared.clone();
            Rc::new(move || shared.tick())
        };
        let teardown: TriggerHandler = {
            let shared = shared.clone();
            Rc::new(move || shared.stop())
        };

        let triggers = [
            (Trigger::Interval(interval), tick.clone()),
            (Trigger::Resize, tick.clone()),
            (Trigger::ViewportResize, tick.clone()),
            (Trigger::ResolutionChange, tick),
            (Trigger::Teardown, teardown),
        ];
        for (trigger, handler) in triggers {
            match host.register(trigger, handler) {
                Some(id) => shared.registrations.borrow_mut().push(id),
                None => log::debug!("host does not support {trigger:?}; not listening"),
            }
        }

        log::info!(
            "zoom monitor started ({}ms interval, {} trigger(s))",
            interval.as_millis(),
            shared.registrations.borrow().len()
        );
        Ok(Self { shared })
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.get()
    }

    pub fn last_snapshot(&self) -> ZoomMetrics {
        self.shared.state.borrow().last_snapshot().clone()
    }

    /// Past snapshots, oldest first.
    pub fn history(&self) -> Vec<ZoomMetrics> {
        self.shared.state.borrow().history().iter().cloned().collect()
    }
}

impl std::fmt::Debug for ZoomMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoomMonitor")
            .field("running", &self.is_running())
            .field("options", &self.shared.options)
            .finish_non_exhaustive()
    }
}
