use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use zoomreta_core::{
    DEFAULT_INTERVAL_MS, FakeHost, HostSample, MonitorOptions, Trigger, ZoomDetector,
    ZoomEventKind, ZoomHost, ZoomMetrics,
};

/// A recorded sequence of host readings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
    #[serde(default)]
    pub options: MonitorOptions,
    /// Reading at monitor start. Also decides which capabilities the
    /// replayed host has (a visual viewport only if `visualViewportScale`
    /// is set here).
    #[serde(default)]
    pub initial: HostSample,
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_MS
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub trigger: StepTrigger,
    /// Replaces the whole reading; unchanged when absent.
    pub sample: Option<HostSample>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepTrigger {
    #[default]
    Interval,
    Resize,
    ViewportResize,
    ResolutionChange,
}

impl StepTrigger {
    fn to_trigger(self, interval: Duration) -> Trigger {
        match self {
            StepTrigger::Interval => Trigger::Interval(interval),
            StepTrigger::Resize => Trigger::Resize,
            StepTrigger::ViewportResize => Trigger::ViewportResize,
            StepTrigger::ResolutionChange => Trigger::ResolutionChange,
        }
    }
}

/// One delivered notification.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    /// 1-based index of the step that produced it.
    pub step: usize,
    /// An event kind, or "callback" for the monitor callback.
    pub event: &'static str,
    pub metrics: ZoomMetrics,
}

#[derive(Debug)]
pub struct Replay {
    pub records: Vec<Record>,
    /// Monitor history right before teardown.
    pub history: Vec<ZoomMetrics>,
}

/// Run the trace through a real monitor on a fake host.
pub fn replay(trace: &Trace) -> Result<Replay> {
    let host = Rc::new(FakeHost::new(trace.initial));
    let detector = ZoomDetector::new(Some(host.clone() as Rc<dyn ZoomHost>));
    let records: Rc<RefCell<Vec<Record>>> = Rc::new(RefCell::new(Vec::new()));
    let step = Rc::new(Cell::new(0usize));

    for kind in ZoomEventKind::ALL {
        let (records, step) = (records.clone(), step.clone());
        detector.subscribe(
            kind,
            Rc::new(move |m| {
                records.borrow_mut().push(Record {
                    step: step.get(),
                    event: kind.as_str(),
                    metrics: m.clone(),
                });
            }),
        );
    }

    let interval = Duration::from_millis(trace.interval_ms);
    let callback_records = (records.clone(), step.clone());
    let monitor = detector.start_monitor(
        Rc::new(move |m| {
            callback_records.0.borrow_mut().push(Record {
                step: callback_records.1.get(),
                event: "callback",
                metrics: m.clone(),
            });
        }),
        interval,
        trace.options,
    )?;

    for (i, s) in trace.steps.iter().enumerate() {
        step.set(i + 1);
        if let Some(sample) = s.sample {
            host.set_sample(sample);
        }
        let trigger = s.trigger.to_trigger(interval);
        if host.registered(trigger) == 0 {
            log::warn!("step {}: host has no {trigger:?} listener; step ignored", i + 1);
        }
        host.fire(trigger);
    }

    let history = monitor.history();
    host.fire(Trigger::Teardown);

    let records = records.take();
    Ok(Replay { records, history })
}
