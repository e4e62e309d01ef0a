use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use log::warn;
use pushup_counter::proximity::{EventSink, ProximitySource};
use pushup_counter::{defaults, CounterSnapshot, FlashToken, Outcome, RepCounter, SensorEvent};
use yew::prelude::*;

type SharedCounter = Rc<RefCell<RepCounter<ProximitySource>>>;
type FlashTimer = Rc<RefCell<Option<Timeout>>>;

/// Observable counter state and the commands the view may issue.
#[derive(Clone)]
pub struct UseRepCounterHandle {
    pub snapshot: CounterSnapshot,
    /// Start when idle, pause when counting.
    pub on_toggle: Callback<()>,
    pub on_reset: Callback<()>,
}

/// Arm the flash timer for `token`. Replacing the stored timeout cancels the
/// previous one, so only the latest repetition decides when the flash ends.
fn arm_flash(
    counter: Weak<RefCell<RepCounter<ProximitySource>>>,
    timer: &FlashTimer,
    token: FlashToken,
    refresh: UseForceUpdateHandle,
) {
    let timeout = Timeout::new(defaults::FLASH_MS, move || {
        if let Some(counter) = counter.upgrade() {
            if counter.borrow_mut().clear_flash(token) {
                refresh.force_update();
            }
        }
    });
    *timer.borrow_mut() = Some(timeout);
}

/// Build the sink the browser sensor reports into.
///
/// Holds the counter weakly: the counter owns the sensor handle, which owns
/// the listeners calling this sink.
fn event_sink(
    counter: Weak<RefCell<RepCounter<ProximitySource>>>,
    flash_timer: FlashTimer,
    refresh: UseForceUpdateHandle,
) -> EventSink {
    Rc::new(move |event: SensorEvent| {
        let shared = match counter.upgrade() {
            Some(shared) => shared,
            None => return,
        };
        let outcome = match shared.try_borrow_mut() {
            Ok(mut counter) => counter.handle_event(event),
            Err(_) => {
                warn!("Sensor event dropped while the counter was busy");
                return;
            }
        };

        if let Some(token) = outcome.flash() {
            arm_flash(counter.clone(), &flash_timer, token, refresh.clone());
        }
        if matches!(outcome, Outcome::Counted { .. } | Outcome::Failed) {
            refresh.force_update();
        }
    })
}

/// Owns one [`RepCounter`] for the lifetime of the calling component.
///
/// The capability probe runs on mount; the sensor is stopped and the flash
/// timer cancelled on unmount.
#[hook]
pub fn use_rep_counter() -> UseRepCounterHandle {
    let refresh = use_force_update();
    let flash_timer: FlashTimer = use_mut_ref(|| None::<Timeout>);

    let counter: SharedCounter = {
        let refresh = refresh.clone();
        let flash_timer = flash_timer.clone();
        let memo = use_memo((), move |_| {
            Rc::new_cyclic(|weak: &Weak<RefCell<RepCounter<ProximitySource>>>| {
                let sink = event_sink(weak.clone(), flash_timer, refresh);
                RefCell::new(RepCounter::new(ProximitySource::new(sink)))
            })
        });
        (*memo).clone()
    };

    {
        let counter = counter.clone();
        let flash_timer = flash_timer.clone();
        let refresh = refresh.clone();
        use_effect_with((), move |_| {
            counter.borrow_mut().initialize();
            refresh.force_update();
            move || {
                // Dropping the timeout cancels it
                flash_timer.borrow_mut().take();
                counter.borrow_mut().shutdown();
            }
        });
    }

    let on_toggle = {
        let counter = counter.clone();
        let refresh = refresh.clone();
        Callback::from(move |_: ()| {
            counter.borrow_mut().toggle();
            refresh.force_update();
        })
    };

    let on_reset = {
        let counter = counter.clone();
        let flash_timer = flash_timer.clone();
        Callback::from(move |_: ()| {
            if counter.borrow_mut().reset() {
                flash_timer.borrow_mut().take();
                refresh.force_update();
            }
        })
    };

    let snapshot = counter.borrow().snapshot();
    UseRepCounterHandle {
        snapshot,
        on_toggle,
        on_reset,
    }
}
