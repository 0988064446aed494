//! Minimal single-number getters kept for consumers of the old API.

use crate::host::HostSignals;
use crate::signals::{Signals, ZoomError, ratio};

/// Zoom as a percentage.
///
/// Prefers the visual-viewport scale; otherwise compares the root element
/// width in device pixels against the inner window width.
pub fn zoom_level<H: HostSignals + ?Sized>(host: Option<&H>) -> Result<f64, ZoomError> {
    let signals = Signals::read(host)?;
    if let Some(scale) = signals.visual_viewport_scale {
        return Ok(scale * 100.0);
    }
    let dpr = signals.device_pixel_ratio;
    Ok(ratio(signals.root_width * dpr, signals.inner_width) * 100.0)
}

/// Zoom as a plain ratio, rounded to two decimals when derived from the
/// window size. Never fails: without a host the answer is 1.
pub fn zoom_ratio<H: HostSignals + ?Sized>(host: Option<&H>) -> f64 {
    let Ok(signals) = Signals::read(host) else {
        return 1.0;
    };
    if let Some(scale) = signals.visual_viewport_scale {
        return scale;
    }
    let dpr = signals.device_pixel_ratio;
    (ratio(signals.outer_width, signals.inner_width * dpr) * 100.0).round() / 100.0
}
