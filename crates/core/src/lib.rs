//! Zoom estimation from indirect display signals, plus change monitoring.
//!
//! No host reports its zoom level directly. [`MetricsCalculator`] combines
//! device pixel ratio, viewport geometry, visual-viewport scale and screen
//! size into a best-effort [`ZoomMetrics`] snapshot, and [`ZoomMonitor`]
//! samples it on a timer and on host events, publishing `zoomStart`,
//! `zoomEnd` and `zoomChange` on an [`EventBus`].
//!
//! Hosts plug in through [`HostSignals`] and [`HostTriggers`]; [`FakeHost`]
//! is a deterministic implementation for tests and trace replay.

pub mod bus;
pub mod detector;
pub mod fake;
pub mod host;
pub mod legacy;
pub mod metrics;
pub mod monitor;
pub mod retina;
pub mod signals;

pub use bus::{EventBus, Subscriber};
pub use detector::ZoomDetector;
pub use fake::FakeHost;
pub use host::{HostSignals, HostTriggers, Trigger, TriggerHandler, TriggerId, ZoomHost};
pub use metrics::MetricsCalculator;
pub use monitor::{MonitorState, Notification, ZoomMonitor};
pub use signals::{Signals, ZoomError};

pub use zoomreta_protocol::{
    DEFAULT_INTERVAL_MS, HostSample, MetricsOptions, MonitorOptions, ZoomEventKind, ZoomMetrics,
};
