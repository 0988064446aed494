use std::cell::Cell;
use std::rc::Rc;

use zoomreta_protocol::{MetricsOptions, ZoomMetrics};

use crate::host::HostSignals;
use crate::retina::is_retina;
use crate::signals::{Signals, ZoomError, ratio};

/// Turns raw signal readings into [`ZoomMetrics`] snapshots.
///
/// The only state is the unzoomed-baseline latch: the device pixel ratio
/// seen at the first sample with an effective zoom of exactly 1. It is
/// written at most once. Clones share the latch, so a monitor started from
/// a calculator sees the same baseline as direct `compute` calls.
#[derive(Debug, Clone, Default)]
pub struct MetricsCalculator {
    baseline: Rc<Cell<Option<f64>>>,
}

impl MetricsCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the host and compute a snapshot.
    pub fn compute<H: HostSignals + ?Sized>(
        &self,
        host: Option<&H>,
        options: MetricsOptions,
    ) -> Result<ZoomMetrics, ZoomError> {
        let signals = Signals::read(host)?;
        Ok(self.compute_from(&signals, options))
    }

    /// Compute a snapshot from an already captured reading.
    pub fn compute_from(&self, signals: &Signals, options: MetricsOptions) -> ZoomMetrics {
        let dpr = signals.device_pixel_ratio;
        let screen_width_scaled = signals.screen_width * dpr;

        let raw_zoom = ratio(signals.root_width * dpr, signals.inner_width);
        let system_scale = ratio(signals.inner_width, screen_width_scaled) * dpr;
        let zoom_level_percentage = round_percentage(raw_zoom * 100.0 * system_scale);

        let viewport_zoom_level = signals.visual_viewport_scale.unwrap_or(1.0);
        let system_zoom_level = dpr;
        let effective_zoom_level = viewport_zoom_level * system_zoom_level;

        if self.baseline.get().is_none() && effective_zoom_level == 1.0 {
            log::debug!("captured unzoomed baseline device pixel ratio {dpr}");
            self.baseline.set(Some(dpr));
        }

        ZoomMetrics {
            zoom_level_percentage,
            zoom_via_device_pixel_ratio: options.include_zoom_via_window.then(|| 1.0 / dpr),
            viewport_zoom_level,
            system_zoom_level,
            effective_zoom_level,
            is_retina: options.include_retina.then(|| is_retina(signals)),
            initial_device_pixel_ratio: self.baseline.get(),
        }
    }

    /// The latched baseline, if one has been observed.
    pub fn initial_device_pixel_ratio(&self) -> Option<f64> {
        self.baseline.get()
    }
}

/// Simplified percentage that ignores pixel ratio and system scale.
pub fn alternative_zoom_percentage(signals: &Signals) -> i64 {
    round_percentage(ratio(signals.root_width, signals.inner_width) * 100.0)
}

fn round_percentage(value: f64) -> i64 {
    // `as` saturates on overflow and maps NaN to 0.
    value.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeHost;
    use zoomreta_protocol::HostSample;

    fn all_fields() -> MetricsOptions {
        MetricsOptions {
            include_retina: true,
            include_zoom_via_window: true,
        }
    }

    #[test]
    fn unzoomed_desktop_reads_one_hundred_percent() {
        let host = FakeHost::new(HostSample::default());
        let calc = MetricsCalculator::new();
        let m = calc.compute(Some(&host), all_fields()).unwrap();
        assert_eq!(m.zoom_level_percentage, 100);
        assert!((m.effective_zoom_level - 1.0).abs() < f64::EPSILON);
        assert!((m.viewport_zoom_level - 1.0).abs() < f64::EPSILON);
        assert_eq!(m.is_retina, Some(false));
        assert_eq!(m.zoom_via_device_pixel_ratio, Some(1.0));
        assert_eq!(m.initial_device_pixel_ratio, Some(1.0));
    }

    #[test]
    fn optional_fields_are_omitted_by_default() {
        let host = FakeHost::new(HostSample::default());
        let m = MetricsCalculator::new()
            .compute(Some(&host), MetricsOptions::default())
            .unwrap();
        assert_eq!(m.is_retina, None);
        assert_eq!(m.zoom_via_device_pixel_ratio, None);
    }

    #[test]
    fn effective_zoom_multiplies_viewport_and_system() {
        let host = FakeHost::new(HostSample {
            device_pixel_ratio: Some(1.5),
            visual_viewport_scale: Some(2.0),
            ..HostSample::default()
        });
        let m = MetricsCalculator::new()
            .compute(Some(&host), MetricsOptions::default())
            .unwrap();
        assert!((m.system_zoom_level - 1.5).abs() < f64::EPSILON);
        assert!((m.viewport_zoom_level - 2.0).abs() < f64::EPSILON);
        assert!((m.effective_zoom_level - 3.0).abs() < f64::EPSILON);
        assert_eq!(m.initial_device_pixel_ratio, None);
    }

    #[test]
    fn percentage_follows_formula() {
        // raw = 960 * 2 / 1280 = 1.5; system = 1280 / (1920 * 2) * 2 = 2/3
        let host = FakeHost::new(HostSample {
            device_pixel_ratio: Some(2.0),
            root_width: 960.0,
            inner_width: 1280.0,
            ..HostSample::default()
        });
        let m = MetricsCalculator::new()
            .compute(Some(&host), MetricsOptions::default())
            .unwrap();
        assert_eq!(m.zoom_level_percentage, 100);
    }

    #[test]
    fn baseline_latches_once() {
        let host = FakeHost::new(HostSample {
            device_pixel_ratio: Some(2.0),
            ..HostSample::default()
        });
        let calc = MetricsCalculator::new();
        let opts = MetricsOptions::default();

        assert_eq!(calc.compute(Some(&host), opts).unwrap().initial_device_pixel_ratio, None);

        host.update(|s| s.device_pixel_ratio = Some(1.0));
        assert_eq!(calc.compute(Some(&host), opts).unwrap().initial_device_pixel_ratio, Some(1.0));

        // A later unzoomed reading with a different ratio does not overwrite it.
        host.update(|s| {
            s.device_pixel_ratio = Some(2.0);
            s.visual_viewport_scale = Some(0.5);
        });
        let m = calc.compute(Some(&host), opts).unwrap();
        assert!((m.effective_zoom_level - 1.0).abs() < f64::EPSILON);
        assert_eq!(m.initial_device_pixel_ratio, Some(1.0));
    }

    #[test]
    fn clones_share_the_baseline() {
        let host = FakeHost::new(HostSample::default());
        let calc = MetricsCalculator::new();
        let shared = calc.clone();
        calc.compute(Some(&host), MetricsOptions::default()).unwrap();
        assert_eq!(shared.initial_device_pixel_ratio(), Some(1.0));
    }

    #[test]
    fn repeated_reads_are_idempotent() {
        let host = FakeHost::new(HostSample {
            device_pixel_ratio: Some(1.25),
            root_width: 1500.0,
            inner_width: 1536.0,
            ..HostSample::default()
        });
        let calc = MetricsCalculator::new();
        let first = calc.compute(Some(&host), all_fields()).unwrap();
        let second = calc.compute(Some(&host), all_fields()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn zero_inner_width_stays_finite() {
        let host = FakeHost::new(HostSample {
            inner_width: 0.0,
            ..HostSample::default()
        });
        let m = MetricsCalculator::new()
            .compute(Some(&host), MetricsOptions::default())
            .unwrap();
        assert_eq!(m.zoom_level_percentage, 0);
    }

    #[test]
    fn no_host_propagates_error() {
        let err = MetricsCalculator::new()
            .compute::<FakeHost>(None, MetricsOptions::default())
            .unwrap_err();
        assert_eq!(err, ZoomError::EnvironmentUnavailable);
    }

    #[test]
    fn alternative_percentage_ignores_pixel_ratio() {
        let host = FakeHost::new(HostSample {
            device_pixel_ratio: Some(3.0),
            root_width: 1200.0,
            inner_width: 1000.0,
            ..HostSample::default()
        });
        let signals = Signals::read(Some(&host)).unwrap();
        assert_eq!(alternative_zoom_percentage(&signals), 120);
    }
}
