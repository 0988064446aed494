pub mod events;
pub mod metrics;
pub mod options;
pub mod sample;

pub use events::ZoomEventKind;
pub use metrics::ZoomMetrics;
pub use options::{DEFAULT_INTERVAL_MS, MetricsOptions, MonitorOptions};
pub use sample::HostSample;
