//! Browser bindings for the Generic Sensor API `ProximitySensor`.
//! `web-sys` has no binding for this interface, so it is declared here.

use std::rc::Rc;

use log::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget};

use crate::sensor::{AcquireError, Reading, SensorEvent, SensorFault, SensorOptions, SensorSource};

/// Receives everything a started sensor reports.
pub type EventSink = Rc<dyn Fn(SensorEvent)>;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(extends = EventTarget)]
    #[derive(Debug, Clone)]
    type ProximitySensor;

    #[wasm_bindgen(constructor, catch)]
    fn new(options: &JsValue) -> Result<ProximitySensor, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn start(this: &ProximitySensor) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn stop(this: &ProximitySensor) -> Result<(), JsValue>;

    /// `null` until the first reading arrives.
    #[wasm_bindgen(method, getter)]
    fn distance(this: &ProximitySensor) -> Option<f64>;

    #[wasm_bindgen(method, getter)]
    fn timestamp(this: &ProximitySensor) -> Option<f64>;
}

/// Extract the `name` of a thrown value (a `DOMException` or `Error`).
fn error_name(value: &JsValue) -> String {
    js_sys::Reflect::get(value, &JsValue::from_str("name"))
        .ok()
        .and_then(|name| name.as_string())
        .unwrap_or_else(|| "UnknownError".to_string())
}

fn now_ms() -> f64 {
    gloo_utils::window()
        .performance()
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// A constructed sensor together with its event listeners.
///
/// Dropping the handle detaches the listeners; stopping is the owner's job.
pub struct ProximityHandle {
    sensor: ProximitySensor,
    on_reading: Closure<dyn FnMut(Event)>,
    on_error: Closure<dyn FnMut(Event)>,
}

impl Drop for ProximityHandle {
    fn drop(&mut self) {
        let target: &EventTarget = self.sensor.as_ref();
        let listeners = [("reading", &self.on_reading), ("error", &self.on_error)];
        for (event, listener) in listeners {
            if let Err(e) =
                target.remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
            {
                warn!(
                    "Removing the {} listener threw {}",
                    event,
                    error_name(&e)
                );
            }
        }
        debug!("Proximity sensor listeners detached");
    }
}

/// [`SensorSource`] backed by `window.ProximitySensor`.
pub struct ProximitySource {
    sink: EventSink,
}

impl ProximitySource {
    pub fn new(sink: EventSink) -> Self {
        Self { sink }
    }

    fn build_options(options: &SensorOptions) -> Result<JsValue, JsValue> {
        let object = js_sys::Object::new();
        js_sys::Reflect::set(
            &object,
            &JsValue::from_str("frequency"),
            &JsValue::from_f64(options.frequency_hz),
        )?;
        Ok(object.into())
    }
}

impl SensorSource for ProximitySource {
    type Handle = ProximityHandle;

    fn is_available(&self) -> bool {
        js_sys::Reflect::has(&gloo_utils::window(), &JsValue::from_str("ProximitySensor"))
            .unwrap_or(false)
    }

    fn acquire(&mut self, options: &SensorOptions) -> Result<ProximityHandle, AcquireError> {
        let classify = |e: JsValue| AcquireError::from_error_name(&error_name(&e));
        let js_options = Self::build_options(options).map_err(classify)?;
        let sensor = ProximitySensor::new(&js_options).map_err(classify)?;

        let on_reading = {
            let sensor = sensor.clone();
            let sink = self.sink.clone();
            Closure::wrap(Box::new(move |_event: Event| {
                let reading = Reading::new(
                    sensor.distance().unwrap_or(f64::NAN),
                    sensor.timestamp().unwrap_or_else(now_ms),
                );
                sink(SensorEvent::Reading(reading));
            }) as Box<dyn FnMut(Event)>)
        };

        let on_error = {
            let sink = self.sink.clone();
            Closure::wrap(Box::new(move |event: Event| {
                let name = js_sys::Reflect::get(&event, &JsValue::from_str("error"))
                    .map(|error| error_name(&error))
                    .unwrap_or_else(|_| "UnknownError".to_string());
                sink(SensorEvent::Fault(SensorFault::from_error_name(&name)));
            }) as Box<dyn FnMut(Event)>)
        };

        let target: &EventTarget = sensor.as_ref();
        target
            .add_event_listener_with_callback("reading", on_reading.as_ref().unchecked_ref())
            .map_err(classify)?;
        target
            .add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref())
            .map_err(classify)?;

        debug!(
            "Proximity sensor constructed at {} Hz",
            options.frequency_hz
        );
        Ok(ProximityHandle {
            sensor,
            on_reading,
            on_error,
        })
    }

    fn start(&mut self, handle: &ProximityHandle) -> Result<(), SensorFault> {
        handle.sensor.start().map_err(|e| {
            let name = error_name(&e);
            warn!("ProximitySensor.start() threw {}", name);
            SensorFault::from_error_name(&name)
        })
    }

    fn stop(&mut self, handle: &ProximityHandle) {
        if let Err(e) = handle.sensor.stop() {
            warn!("ProximitySensor.stop() threw {}", error_name(&e));
        }
    }
}
