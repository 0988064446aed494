use std::rc::Rc;
use std::time::Duration;

use zoomreta_protocol::{MetricsOptions, MonitorOptions, ZoomEventKind, ZoomMetrics};

use crate::bus::{EventBus, Subscriber};
use crate::host::ZoomHost;
use crate::legacy;
use crate::metrics::MetricsCalculator;
use crate::monitor::ZoomMonitor;
use crate::signals::ZoomError;

/// Entry point tying one host to one event bus and one baseline latch.
///
/// Construct it once per visual surface. Every monitor it starts shares
/// its bus and its calculator, so `zoomStart`/`zoomEnd`/`zoomChange`
/// subscribers see events from all of them.
#[derive(Clone)]
pub struct ZoomDetector {
    host: Option<Rc<dyn ZoomHost>>,
    bus: EventBus,
    calculator: MetricsCalculator,
}

impl ZoomDetector {
    /// `None` stands for an environment without a visual surface; every
    /// operation that needs one then fails with
    /// [`ZoomError::EnvironmentUnavailable`].
    pub fn new(host: Option<Rc<dyn ZoomHost>>) -> Self {
        Self {
            host,
            bus: EventBus::new(),
            calculator: MetricsCalculator::new(),
        }
    }

    pub fn compute_metrics(&self, options: MetricsOptions) -> Result<ZoomMetrics, ZoomError> {
        self.calculator.compute(self.host.as_deref(), options)
    }

    pub fn start_monitor(
        &self,
        callback: Subscriber,
        interval: Duration,
        options: MonitorOptions,
    ) -> Result<ZoomMonitor, ZoomError> {
        ZoomMonitor::start(
            self.host.clone(),
            self.bus.clone(),
            self.calculator.clone(),
            callback,
            interval,
            options,
        )
    }

    pub fn subscribe(&self, kind: ZoomEventKind, callback: Subscriber) {
        self.bus.subscribe(kind, callback);
    }

    pub fn unsubscribe(&self, kind: ZoomEventKind, callback: &Subscriber) {
        self.bus.unsubscribe(kind, callback);
    }

    /// See [`legacy::zoom_level`].
    pub fn zoom_level(&self) -> Result<f64, ZoomError> {
        legacy::zoom_level(self.host.as_deref())
    }

    /// See [`legacy::zoom_ratio`].
    pub fn zoom_ratio(&self) -> f64 {
        legacy::zoom_ratio(self.host.as_deref())
    }
}
