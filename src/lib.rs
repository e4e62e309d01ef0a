//! Push-up repetition counting from a phone's proximity sensor.
//!
//! [`RepCounter`] turns a noisy stream of distance readings into discrete
//! repetitions using a fixed threshold and a cooldown window, and tracks the
//! session mode (ready, counting, paused, or disabled by a sensor problem).
//! It is UI agnostic: the presenter issues commands and renders
//! [`RepCounter::snapshot`].

use log::{debug, info, warn};
use std::fmt;

pub mod proximity;
pub mod sensor;

pub use sensor::{AcquireError, Reading, SensorEvent, SensorFault, SensorOptions, SensorSource};

/// Default counting parameters
pub mod defaults {
    /// Readings closer than this count as the chest reaching the phone.
    pub const THRESHOLD_CM: f64 = 5.0;
    pub const COOLDOWN_MS: f64 = 750.0;
    pub const FLASH_MS: u32 = 200;
    pub const SAMPLE_RATE_HZ: f64 = 10.0;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterConfig {
    pub threshold_cm: f64,
    /// Minimum spacing between two accepted repetitions (exclusive).
    pub cooldown_ms: f64,
    pub sensor: SensorOptions,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            threshold_cm: defaults::THRESHOLD_CM,
            cooldown_ms: defaults::COOLDOWN_MS,
            sensor: SensorOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Uninitialized,
    Ready,
    Counting,
    Paused,
    Unsupported,
    Errored,
}

impl Mode {
    /// `Unsupported` and `Errored` accept no further commands for the session.
    pub fn is_terminal(self) -> bool {
        matches!(self, Mode::Unsupported | Mode::Errored)
    }
}

/// Why a session was disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterError {
    CapabilityAbsent,
    Acquisition(AcquireError),
    Sensor(SensorFault),
}

impl std::error::Error for CounterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CounterError::CapabilityAbsent => None,
            CounterError::Acquisition(e) => Some(e),
            CounterError::Sensor(e) => Some(e),
        }
    }
}

impl fmt::Display for CounterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterError::CapabilityAbsent => write!(
                f,
                "Proximity sensor is not supported on this device or browser"
            ),
            CounterError::Acquisition(e) => fmt::Display::fmt(e, f),
            CounterError::Sensor(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl From<AcquireError> for CounterError {
    fn from(e: AcquireError) -> Self {
        CounterError::Acquisition(e)
    }
}

impl From<SensorFault> for CounterError {
    fn from(e: SensorFault) -> Self {
        CounterError::Sensor(e)
    }
}

/// Identifies one armed flash. Only the most recent token can clear it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlashToken(u64);

/// What a single event did to the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not counting, or the reading was not close enough.
    Ignored,
    /// Close enough, but within the cooldown of the previous repetition.
    Cooldown,
    Counted { count: u32, flash: FlashToken },
    /// The event disabled the session.
    Failed,
}

impl Outcome {
    pub fn flash(&self) -> Option<FlashToken> {
        match self {
            Outcome::Counted { flash, .. } => Some(*flash),
            _ => None,
        }
    }
}

/// Observable state for the presenter.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterSnapshot {
    pub count: u32,
    pub mode: Mode,
    pub status: String,
    pub flash_active: bool,
}

/// Lifecycle of the sensor handle. Acquisition is only attempted from
/// `NotAcquired`, so it happens at most once per session.
enum SensorSlot<H> {
    NotAcquired,
    Failed,
    Acquired { handle: H, running: bool },
    Released,
}

/// Debounce state machine owning the session's sensor handle.
pub struct RepCounter<S: SensorSource> {
    source: S,
    sensor: SensorSlot<S::Handle>,
    config: CounterConfig,
    mode: Mode,
    count: u32,
    last_detection_ms: Option<f64>,
    fault: Option<CounterError>,
    flash: Option<FlashToken>,
    next_flash: u64,
}

impl<S: SensorSource> RepCounter<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, CounterConfig::default())
    }

    pub fn with_config(source: S, config: CounterConfig) -> Self {
        Self {
            source,
            sensor: SensorSlot::NotAcquired,
            config,
            mode: Mode::Uninitialized,
            count: 0,
            last_detection_ms: None,
            fault: None,
            flash: None,
            next_flash: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn last_detection_ms(&self) -> Option<f64> {
        self.last_detection_ms
    }

    pub fn fault(&self) -> Option<&CounterError> {
        self.fault.as_ref()
    }

    pub fn flash_active(&self) -> bool {
        self.flash.is_some()
    }

    /// Human readable status line for the current mode.
    pub fn status(&self) -> String {
        match (self.mode, &self.fault) {
            (Mode::Unsupported | Mode::Errored, Some(fault)) => fault.to_string(),
            (Mode::Unsupported, None) => CounterError::CapabilityAbsent.to_string(),
            (Mode::Errored, None) => "The proximity sensor stopped working".to_string(),
            (Mode::Uninitialized, _) => "Checking for a proximity sensor…".to_string(),
            (Mode::Ready, _) => {
                "Press Start, place the phone under your chest and begin".to_string()
            }
            (Mode::Counting, _) => "Counting…".to_string(),
            (Mode::Paused, _) => "Paused".to_string(),
        }
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            count: self.count,
            mode: self.mode,
            status: self.status(),
            flash_active: self.flash_active(),
        }
    }

    /// Run the capability probe. Only meaningful once, from `Uninitialized`.
    pub fn initialize(&mut self) -> Mode {
        if self.mode != Mode::Uninitialized {
            debug!("Initialize ignored in {:?}", self.mode);
            return self.mode;
        }
        if self.source.is_available() {
            info!("Proximity sensor capability detected");
            self.mode = Mode::Ready;
        } else {
            self.fail(CounterError::CapabilityAbsent);
        }
        self.mode
    }

    /// Begin (or resume) counting. The sensor is acquired on the first call.
    pub fn start(&mut self) -> Mode {
        if !matches!(self.mode, Mode::Ready | Mode::Paused) {
            debug!("Start ignored in {:?}", self.mode);
            return self.mode;
        }

        if let SensorSlot::NotAcquired = self.sensor {
            match self.source.acquire(&self.config.sensor) {
                Ok(handle) => {
                    info!("Proximity sensor acquired");
                    self.sensor = SensorSlot::Acquired {
                        handle,
                        running: false,
                    };
                }
                Err(e) => {
                    self.sensor = SensorSlot::Failed;
                    self.fail(e.into());
                    return self.mode;
                }
            }
        }

        let started = match &mut self.sensor {
            SensorSlot::Acquired { handle, running } => {
                let result = if *running {
                    Ok(())
                } else {
                    self.source.start(handle)
                };
                if result.is_ok() {
                    *running = true;
                }
                result
            }
            SensorSlot::NotAcquired | SensorSlot::Failed | SensorSlot::Released => {
                warn!("Start requested without a usable sensor");
                return self.mode;
            }
        };

        match started {
            Ok(()) => {
                info!("Counting started at {} repetitions", self.count);
                self.mode = Mode::Counting;
            }
            Err(fault) => self.fail(fault.into()),
        }
        self.mode
    }

    pub fn pause(&mut self) -> Mode {
        if self.mode != Mode::Counting {
            debug!("Pause ignored in {:?}", self.mode);
            return self.mode;
        }
        self.stop_sensor();
        self.mode = Mode::Paused;
        info!("Counting paused at {} repetitions", self.count);
        self.mode
    }

    /// Start when idle, pause when counting.
    pub fn toggle(&mut self) -> Mode {
        match self.mode {
            Mode::Counting => self.pause(),
            _ => self.start(),
        }
    }

    /// Zero the count and forget the cooldown. Returns whether it was accepted.
    pub fn reset(&mut self) -> bool {
        if !matches!(self.mode, Mode::Ready | Mode::Counting | Mode::Paused) {
            debug!("Reset ignored in {:?}", self.mode);
            return false;
        }
        self.count = 0;
        self.last_detection_ms = None;
        self.flash = None;
        info!("Counter reset");
        true
    }

    pub fn handle_event(&mut self, event: SensorEvent) -> Outcome {
        match event {
            SensorEvent::Reading(reading) => self.on_reading(reading),
            SensorEvent::Fault(fault) => self.on_fault(fault),
        }
    }

    /// Apply the threshold and cooldown rule to one reading.
    ///
    /// The rule is level triggered: staying close to the sensor for longer
    /// than the cooldown counts again.
    pub fn on_reading(&mut self, reading: Reading) -> Outcome {
        if self.mode != Mode::Counting {
            return Outcome::Ignored;
        }
        if !reading.timestamp_ms.is_finite() {
            warn!("Dropping reading with timestamp {}", reading.timestamp_ms);
            return Outcome::Ignored;
        }
        // NaN distances compare false
        let near = reading.distance_cm < self.config.threshold_cm;
        if !near {
            return Outcome::Ignored;
        }

        let elapsed = self
            .last_detection_ms
            .map_or(f64::INFINITY, |last| reading.timestamp_ms - last);
        let cooled_down = elapsed > self.config.cooldown_ms;
        if !cooled_down {
            debug!(
                "Reading at {} cm suppressed, {} ms since last repetition",
                reading.distance_cm, elapsed
            );
            return Outcome::Cooldown;
        }

        self.count = self.count.saturating_add(1);
        self.last_detection_ms = Some(reading.timestamp_ms);
        let flash = FlashToken(self.next_flash);
        self.next_flash += 1;
        self.flash = Some(flash);
        debug!(
            "Repetition {} at {} cm (t = {} ms)",
            self.count, reading.distance_cm, reading.timestamp_ms
        );
        Outcome::Counted {
            count: self.count,
            flash,
        }
    }

    pub fn on_fault(&mut self, fault: SensorFault) -> Outcome {
        if !matches!(self.mode, Mode::Ready | Mode::Counting | Mode::Paused) {
            debug!("Sensor fault {:?} ignored in {:?}", fault, self.mode);
            return Outcome::Ignored;
        }
        self.fail(fault.into());
        Outcome::Failed
    }

    /// End the flash armed with `token`. A stale token leaves a newer flash on.
    pub fn clear_flash(&mut self, token: FlashToken) -> bool {
        if self.flash == Some(token) {
            self.flash = None;
            true
        } else {
            false
        }
    }

    /// Stop and release the sensor for good. Called on UI teardown; the mode
    /// is left as is but no later start can reach the sensor again.
    pub fn shutdown(&mut self) {
        self.stop_sensor();
        self.flash = None;
        if let SensorSlot::Acquired { .. } = self.sensor {
            info!("Proximity sensor released");
        }
        self.sensor = SensorSlot::Released;
    }

    fn stop_sensor(&mut self) {
        if let SensorSlot::Acquired { handle, running } = &mut self.sensor {
            if *running {
                self.source.stop(handle);
                *running = false;
                debug!("Proximity sensor stopped");
            }
        }
    }

    /// Enter the terminal mode for `error`, stopping the sensor if it runs.
    /// The handle is kept so a listener that is currently firing stays alive.
    fn fail(&mut self, error: CounterError) {
        warn!("Counter disabled: {}", error);
        self.stop_sensor();
        self.flash = None;
        self.mode = match error {
            CounterError::CapabilityAbsent => Mode::Unsupported,
            _ => Mode::Errored,
        };
        self.fault = Some(error);
    }
}

impl<S: SensorSource> Drop for RepCounter<S> {
    fn drop(&mut self) {
        self.stop_sensor();
    }
}
