//! Main module for the push-up counter app using Yew.
//! Wires the counter hook to the view components.

use yew::prelude::*;

mod components;
mod config;
mod hooks;

use components::{Controls, CounterDisplay, StatusLine};
use config::{APP_TITLE, FLASH_CLASS};
use hooks::use_rep_counter;

/// Single screen: counter, status line and controls. The root element
/// carries the flash class while a repetition flash is active.
#[function_component]
pub fn App() -> Html {
    let counter = use_rep_counter();
    let snapshot = &counter.snapshot;

    html! {
        <div class={classes!("app", snapshot.flash_active.then_some(FLASH_CLASS))}>
            <h1>{ APP_TITLE }</h1>
            <CounterDisplay count={snapshot.count} />
            <StatusLine status={snapshot.status.clone()} mode={snapshot.mode} />
            <Controls
                mode={snapshot.mode}
                on_toggle={counter.on_toggle.clone()}
                on_reset={counter.on_reset.clone()}
            />
        </div>
    }
}

/// Entry point: initializes Yew renderer for the App component.
fn main() {
    console_error_panic_hook::set_once();
    yew::Renderer::<App>::new().render();
}
