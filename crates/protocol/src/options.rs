use serde::{Deserialize, Serialize};

/// Default polling interval of the change monitor, in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 500;

/// Default capacity of the monitor's snapshot history.
const DEFAULT_MAX_HISTORY: usize = 10;

/// Which optional fields a metrics snapshot carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsOptions {
    pub include_retina: bool,
    pub include_zoom_via_window: bool,
}

/// Configuration of a change monitor.
///
/// All fields are optional on the wire; missing ones take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorOptions {
    /// Only refresh the snapshot and notify the callback when the zoomed /
    /// unzoomed state flips.
    pub once_per_state_change: bool,
    /// Replace the zoom percentage with `round(root_width / inner_width * 100)`.
    pub use_alternative_zoom_calculation: bool,
    pub include_retina: bool,
    pub include_zoom_via_window: bool,
    /// `zoomChange` fires only when the percentage moves by more than this.
    pub threshold: u32,
    pub max_zoom_level_history_length: usize,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            once_per_state_change: false,
            use_alternative_zoom_calculation: false,
            include_retina: false,
            include_zoom_via_window: false,
            threshold: 0,
            max_zoom_level_history_length: DEFAULT_MAX_HISTORY,
        }
    }
}

impl MonitorOptions {
    /// The subset of options forwarded to the metrics calculator.
    pub fn metrics(&self) -> MetricsOptions {
        MetricsOptions {
            include_retina: self.include_retina,
            include_zoom_via_window: self.include_zoom_via_window,
        }
    }
}
