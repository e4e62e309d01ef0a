//! Sensor abstraction consumed by the repetition counter.
//!
//! The counter never talks to hardware directly. It asks a [`SensorSource`]
//! whether the capability exists, acquires a handle lazily on the first start
//! command, and starts/stops it. Readings and faults arrive out of band as
//! [`SensorEvent`]s and are fed to [`crate::RepCounter::handle_event`].

use std::fmt;

use crate::defaults;

/// One distance sample from the proximity sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Distance to the nearest object in centimeters. `NaN` when the sensor
    /// has not produced a value yet.
    pub distance_cm: f64,
    /// High resolution timestamp in milliseconds.
    pub timestamp_ms: f64,
}

impl Reading {
    pub fn new(distance_cm: f64, timestamp_ms: f64) -> Self {
        Self {
            distance_cm,
            timestamp_ms,
        }
    }
}

/// Options passed to [`SensorSource::acquire`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorOptions {
    pub frequency_hz: f64,
}

impl Default for SensorOptions {
    fn default() -> Self {
        Self {
            frequency_hz: defaults::SAMPLE_RATE_HZ,
        }
    }
}

/// Something the sensor pushes at the counter.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    Reading(Reading),
    Fault(SensorFault),
}

/// Hardware sensor capability.
///
/// Implementations own event delivery: once a handle is started, readings and
/// runtime faults are reported as [`SensorEvent`]s through whatever channel
/// the implementation was built with.
pub trait SensorSource {
    type Handle;

    /// Whether the capability exists in the current environment.
    fn is_available(&self) -> bool;

    fn acquire(&mut self, options: &SensorOptions) -> Result<Self::Handle, AcquireError>;

    /// Begin delivering readings. A synchronous failure is reported here
    /// rather than through the event channel.
    fn start(&mut self, handle: &Self::Handle) -> Result<(), SensorFault>;

    fn stop(&mut self, handle: &Self::Handle);
}

/// Failure while constructing the sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireError {
    /// The page is not served from a secure context.
    InsecureContext,
    /// Any other constructor failure, carrying the exception name.
    Other(String),
}

impl AcquireError {
    /// Classify a DOM exception name thrown by the sensor constructor.
    pub fn from_error_name(name: &str) -> Self {
        match name {
            "SecurityError" => AcquireError::InsecureContext,
            other => AcquireError::Other(other.to_string()),
        }
    }
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquireError::InsecureContext => write!(
                f,
                "A secure connection (HTTPS) is required to use the proximity sensor"
            ),
            AcquireError::Other(name) => write!(f, "Could not initialize the sensor: {}", name),
        }
    }
}

impl std::error::Error for AcquireError {}

/// Error reported by a running sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorFault {
    PermissionDenied,
    /// The device cannot be read at this time.
    DeviceUnavailable,
    Other(String),
}

impl SensorFault {
    /// Classify the DOM exception name carried by a sensor `error` event.
    pub fn from_error_name(name: &str) -> Self {
        match name {
            "NotAllowedError" => SensorFault::PermissionDenied,
            "NotReadableError" => SensorFault::DeviceUnavailable,
            other => SensorFault::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorFault::PermissionDenied => {
                write!(f, "Permission to use the proximity sensor was refused")
            }
            SensorFault::DeviceUnavailable => {
                write!(f, "The proximity sensor is temporarily unavailable")
            }
            SensorFault::Other(name) => write!(f, "Sensor error: {}", name),
        }
    }
}

impl std::error::Error for SensorFault {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_error_names_are_classified() {
        assert_eq!(
            SensorFault::from_error_name("NotAllowedError"),
            SensorFault::PermissionDenied
        );
        assert_eq!(
            SensorFault::from_error_name("NotReadableError"),
            SensorFault::DeviceUnavailable
        );
        assert_eq!(
            SensorFault::from_error_name("AbortError"),
            SensorFault::Other("AbortError".into())
        );
    }

    #[test]
    fn acquisition_error_names_are_classified() {
        assert_eq!(
            AcquireError::from_error_name("SecurityError"),
            AcquireError::InsecureContext
        );
        let other = AcquireError::from_error_name("ReferenceError");
        assert_eq!(other.to_string(), "Could not initialize the sensor: ReferenceError");
    }

    #[test]
    fn generic_fault_message_carries_the_name() {
        let fault = SensorFault::from_error_name("TimeoutError");
        assert_eq!(fault.to_string(), "Sensor error: TimeoutError");
    }

    #[test]
    fn default_options_use_the_default_sample_rate() {
        assert_eq!(SensorOptions::default().frequency_hz, defaults::SAMPLE_RATE_HZ);
    }
}
