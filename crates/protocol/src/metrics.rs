use serde::{Deserialize, Serialize};

/// One immutable snapshot of the derived zoom metrics.
///
/// Every numeric field comes from a single reading of the host signals.
/// The optional fields are only present when the caller asked for them
/// (see [`MetricsOptions`](crate::MetricsOptions)), except
/// `initial_device_pixel_ratio`, which is absent until an unzoomed
/// baseline has been observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomMetrics {
    /// Rounded zoom estimate, nominally 100 at no zoom.
    pub zoom_level_percentage: i64,
    /// Reciprocal of the device pixel ratio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_via_device_pixel_ratio: Option<f64>,
    /// Visual-viewport (pinch) scale, or 1 when the host has no visual viewport.
    pub viewport_zoom_level: f64,
    /// Raw device pixel ratio, read as an OS-level scale signal.
    pub system_zoom_level: f64,
    /// `viewport_zoom_level * system_zoom_level`.
    pub effective_zoom_level: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_retina: Option<bool>,
    /// Device pixel ratio at the first sample taken with an effective zoom of 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_device_pixel_ratio: Option<f64>,
}

impl ZoomMetrics {
    /// Whether the effective zoom level differs from the neutral 1.
    pub fn is_zoomed(&self) -> bool {
        self.effective_zoom_level != 1.0
    }

    /// Whether any of the fields the change monitor tracks differ.
    ///
    /// `is_retina` and the baseline latch are not compared.
    pub fn tracked_fields_differ(&self, other: &ZoomMetrics) -> bool {
        self.zoom_level_percentage != other.zoom_level_percentage
            || self.zoom_via_device_pixel_ratio != other.zoom_via_device_pixel_ratio
            || self.viewport_zoom_level != other.viewport_zoom_level
            || self.effective_zoom_level != other.effective_zoom_level
    }
}
