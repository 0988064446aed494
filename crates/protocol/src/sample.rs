use serde::{Deserialize, Serialize};

/// One raw reading of everything the host reports about its display.
///
/// Optional fields model capabilities a host may lack: no reported device
/// pixel ratio, or no visual-viewport API. Used by the deterministic fake
/// host and as the step format of recorded traces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostSample {
    pub device_pixel_ratio: Option<f64>,
    /// Bounding width of the root document element, in CSS pixels.
    pub root_width: f64,
    pub inner_width: f64,
    pub outer_width: f64,
    pub screen_width: f64,
    pub screen_height: f64,
    pub visual_viewport_scale: Option<f64>,
    /// Result of the `(min-resolution: 2dppx)` media query.
    pub high_density_media: bool,
}

impl Default for HostSample {
    /// A 1920x1080 display at 100%, window filling the screen.
    fn default() -> Self {
        Self {
            device_pixel_ratio: Some(1.0),
            root_width: 1920.0,
            inner_width: 1920.0,
            outer_width: 1920.0,
            screen_width: 1920.0,
            screen_height: 1080.0,
            visual_viewport_scale: None,
            high_density_media: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_sample_keeps_default_display() {
        let sample: HostSample =
            serde_json::from_str(r#"{"devicePixelRatio": 2.0, "visualViewportScale": 1.0}"#)
                .unwrap();
        assert_eq!(sample.device_pixel_ratio, Some(2.0));
        assert_eq!(sample.visual_viewport_scale, Some(1.0));
        assert_eq!(sample.screen_width, 1920.0);
        assert!(!sample.high_density_media);
    }

    #[test]
    fn explicit_null_ratio_is_absent() {
        let sample: HostSample = serde_json::from_str(r#"{"devicePixelRatio": null}"#).unwrap();
        assert_eq!(sample.device_pixel_ratio, None);
    }
}
