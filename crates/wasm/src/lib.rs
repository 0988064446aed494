mod browser;
mod logger;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use js_sys::{Function, Object};
use wasm_bindgen::prelude::*;
use zoomreta_core::{
    DEFAULT_INTERVAL_MS, MetricsOptions, MonitorOptions, Subscriber, ZoomDetector, ZoomEventKind,
    ZoomHost, ZoomMetrics,
};

pub use browser::BrowserHost;

thread_local! {
    static DETECTOR: ZoomDetector = ZoomDetector::new(
        BrowserHost::new().map(|host| Rc::new(host) as Rc<dyn ZoomHost>),
    );
    /// JS functions handed to `subscribe`, with the subscriber wrapping each.
    static JS_SUBSCRIBERS: RefCell<Vec<(ZoomEventKind, Function, Subscriber)>> =
        const { RefCell::new(Vec::new()) };
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    logger::init(log::LevelFilter::Warn);
}

/// Change console verbosity: "off", "error", "warn", "info", "debug", "trace".
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) -> Result<(), JsError> {
    let level = level
        .parse::<log::LevelFilter>()
        .map_err(|e| JsError::new(&e.to_string()))?;
    logger::init(level);
    Ok(())
}

/// Compute one metrics snapshot. `options` is an optional JSON object
/// (`{"includeRetina": true, "includeZoomViaWindow": true}`).
#[wasm_bindgen(js_name = computeMetrics)]
pub fn compute_metrics(options: Option<String>) -> Result<JsValue, JsError> {
    let options: MetricsOptions = parse_options(options.as_deref())?;
    let metrics = DETECTOR
        .with(|d| d.compute_metrics(options))
        .map_err(|e| JsError::new(&e.to_string()))?;
    metrics_to_js(&metrics)
}

/// Start monitoring. `callback` receives every notified snapshot; the
/// monitor runs until the page unloads.
#[wasm_bindgen(js_name = startMonitor)]
pub fn start_monitor(
    callback: Function,
    interval_ms: Option<u32>,
    options: Option<String>,
) -> Result<(), JsError> {
    let options: MonitorOptions = parse_options(options.as_deref())?;
    let interval = Duration::from_millis(interval_ms.map_or(DEFAULT_INTERVAL_MS, u64::from));
    let subscriber = js_subscriber("monitor callback".to_string(), callback);
    DETECTOR
        .with(|d| d.start_monitor(subscriber, interval, options))
        .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(())
}

/// Register `callback` for "zoomStart", "zoomEnd" or "zoomChange".
#[wasm_bindgen]
pub fn subscribe(kind: &str, callback: Function) -> Result<(), JsError> {
    let kind: ZoomEventKind = kind.parse().map_err(|e| JsError::new(&format!("{e}")))?;
    let subscriber = js_subscriber(format!("{kind} subscriber"), callback.clone());
    JS_SUBSCRIBERS.with(|subs| {
        subs.borrow_mut()
            .push((kind, callback, subscriber.clone()))
    });
    DETECTOR.with(|d| d.subscribe(kind, subscriber));
    Ok(())
}

/// Remove every registration of `callback` for `kind`.
#[wasm_bindgen]
pub fn unsubscribe(kind: &str, callback: Function) -> Result<(), JsError> {
    let kind: ZoomEventKind = kind.parse().map_err(|e| JsError::new(&format!("{e}")))?;
    let removed: Vec<Subscriber> = JS_SUBSCRIBERS.with(|subs| {
        let mut subs = subs.borrow_mut();
        let mut removed = Vec::new();
        subs.retain(|(k, f, s)| {
            let matches = *k == kind && Object::is(f, &callback);
            if matches {
                removed.push(s.clone());
            }
            !matches
        });
        removed
    });
    DETECTOR.with(|d| {
        for subscriber in &removed {
            d.unsubscribe(kind, subscriber);
        }
    });
    Ok(())
}

/// Legacy getter: zoom as a percentage.
#[wasm_bindgen(js_name = getZoomLevel)]
pub fn get_zoom_level() -> Result<f64, JsError> {
    DETECTOR
        .with(ZoomDetector::zoom_level)
        .map_err(|e| JsError::new(&e.to_string()))
}

/// Legacy getter: zoom as a ratio, 1 outside a window.
#[wasm_bindgen(js_name = getZoomRatio)]
pub fn get_zoom_ratio() -> f64 {
    DETECTOR.with(ZoomDetector::zoom_ratio)
}

fn parse_options<T>(json: Option<&str>) -> Result<T, JsError>
where
    T: Default + serde::de::DeserializeOwned,
{
    match json {
        None => Ok(T::default()),
        Some(s) if s.trim().is_empty() => Ok(T::default()),
        Some(s) => serde_json::from_str(s).map_err(|e| JsError::new(&format!("invalid options: {e}"))),
    }
}

fn metrics_to_js(metrics: &ZoomMetrics) -> Result<JsValue, JsError> {
    let json = serde_json::to_string(metrics).map_err(|e| JsError::new(&e.to_string()))?;
    js_sys::JSON::parse(&json).map_err(|e| JsError::new(&format!("{e:?}")))
}

/// Wrap a JS function as a subscriber. Exceptions are logged, not rethrown,
/// so one failing listener cannot break the others.
fn js_subscriber(label: String, callback: Function) -> Subscriber {
    Rc::new(move |metrics: &ZoomMetrics| {
        let value = match metrics_to_js(metrics) {
            Ok(value) => value,
            Err(_) => {
                log::warn!("{label}: could not convert metrics");
                return;
            }
        };
        if let Err(e) = callback.call1(&JsValue::NULL, &value) {
            log::warn!("{label} threw: {e:?}");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed<T: Default + serde::de::DeserializeOwned>(json: Option<&str>) -> T {
        match parse_options(json) {
            Ok(options) => options,
            Err(_) => panic!("options should parse: {json:?}"),
        }
    }

    #[test]
    fn missing_or_blank_options_use_defaults() {
        assert_eq!(parsed::<MonitorOptions>(None), MonitorOptions::default());
        assert_eq!(parsed::<MetricsOptions>(Some("  ")), MetricsOptions::default());
    }

    #[test]
    fn options_json_uses_camel_case() {
        let opts: MonitorOptions =
            parsed(Some(r#"{"maxZoomLevelHistoryLength": 3, "includeRetina": true}"#));
        assert_eq!(opts.max_zoom_level_history_length, 3);
        assert!(opts.include_retina);
    }
}
