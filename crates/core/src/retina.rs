use crate::signals::Signals;

/// Screen width in physical pixels above which a display counts as
/// high resolution.
pub const HIGH_RES_THRESHOLD_PX: f64 = 2048.0;

/// Best-effort "high pixel density and not currently zoomed" check.
///
/// Advisory only. A browser zoomed to 200% on a 1x display looks exactly
/// like an unzoomed 2x display through these signals.
pub fn is_retina(signals: &Signals) -> bool {
    let dpr = signals.device_pixel_ratio;
    if dpr <= 1.0 {
        return false;
    }

    let high_resolution =
        signals.screen_width * dpr > HIGH_RES_THRESHOLD_PX || signals.high_density_media;

    // Zooming in shrinks the inner width relative to the outer window.
    let zoomed = signals.inner_width * dpr < signals.outer_width * dpr;

    high_resolution && !zoomed
}
