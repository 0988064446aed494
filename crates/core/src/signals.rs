use thiserror::Error;

use crate::host::HostSignals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ZoomError {
    #[error("no visual host context is available")]
    EnvironmentUnavailable,
}

/// One normalized reading of the host's display signals.
///
/// Captured once per detection step so every metric in a snapshot derives
/// from the same instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signals {
    /// Always finite and positive; defaults to 1.
    pub device_pixel_ratio: f64,
    pub root_width: f64,
    pub inner_width: f64,
    pub outer_width: f64,
    pub screen_width: f64,
    pub screen_height: f64,
    pub visual_viewport_scale: Option<f64>,
    /// `(min-resolution: 2dppx)` matched.
    pub high_density_media: bool,
}

impl Signals {
    /// Read every signal from `host`.
    ///
    /// A missing host means there is no visual surface to measure.
    pub fn read<H: HostSignals + ?Sized>(host: Option<&H>) -> Result<Self, ZoomError> {
        let host = host.ok_or(ZoomError::EnvironmentUnavailable)?;
        Ok(Self {
            device_pixel_ratio: normalize_ratio(host.device_pixel_ratio()),
            root_width: host.root_bounding_width(),
            inner_width: host.inner_width(),
            outer_width: host.outer_width(),
            screen_width: host.screen_width(),
            screen_height: host.screen_height(),
            visual_viewport_scale: host.visual_viewport_scale().filter(|s| s.is_finite()),
            high_density_media: host.matches_min_resolution(2.0),
        })
    }

    /// Whether the physical display changed between two readings.
    pub fn screen_differs(&self, other: &Signals) -> bool {
        self.screen_width != other.screen_width
            || self.screen_height != other.screen_height
            || self.device_pixel_ratio != other.device_pixel_ratio
    }
}

/// Device pixel ratio, or 1 when absent, zero or not a number.
fn normalize_ratio(dpr: Option<f64>) -> f64 {
    match dpr {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 1.0,
    }
}

/// `numerator / denominator`, or a neutral 1 when the denominator is not
/// a positive finite number (e.g. a zero-width window during page setup).
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator.is_finite() && denominator > 0.0 {
        numerator / denominator
    } else {
        1.0
    }
}
