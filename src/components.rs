//! Pure Yew view components for the push-up counter.
//!
//! Stateless components rendering from props; all state lives in the
//! counter hook.

use pushup_counter::Mode;
use yew::prelude::*;

use crate::config::*;

/// Label for the start/pause button in the given mode.
fn toggle_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Counting => PAUSE_LABEL,
        Mode::Paused => RESUME_LABEL,
        _ => START_LABEL,
    }
}

#[derive(Properties, PartialEq)]
pub struct CounterDisplayProps {
    pub count: u32,
}

#[function_component(CounterDisplay)]
pub fn counter_display(props: &CounterDisplayProps) -> Html {
    html! {
        <div class="counter">
            <span class="counter-value">{ props.count }</span>
            <span class="counter-caption">{ COUNT_CAPTION }</span>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct StatusLineProps {
    pub status: String,
    pub mode: Mode,
}

#[function_component(StatusLine)]
pub fn status_line(props: &StatusLineProps) -> Html {
    let class = classes!("status", props.mode.is_terminal().then_some(ERROR_CLASS));
    html! {
        <p {class} role="status">{ &props.status }</p>
    }
}

/// Start/pause toggle and reset buttons.
///
/// Both are disabled until the probe has run and once the session is
/// disabled by a sensor problem.
#[derive(Properties, PartialEq)]
pub struct ControlsProps {
    pub mode: Mode,
    pub on_toggle: Callback<()>,
    pub on_reset: Callback<()>,
}

#[function_component(Controls)]
pub fn controls(props: &ControlsProps) -> Html {
    let inactive = props.mode.is_terminal() || props.mode == Mode::Uninitialized;

    html! {
        <div class="controls">
            <button class="btn-primary"
                disabled={inactive}
                onclick={props.on_toggle.reform(|_| ())}
            >
                { toggle_label(props.mode) }
            </button>
            <button class="btn-secondary"
                disabled={inactive}
                onclick={props.on_reset.reform(|_| ())}
            >
                { RESET_LABEL }
            </button>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_label_follows_mode() {
        assert_eq!(toggle_label(Mode::Ready), START_LABEL);
        assert_eq!(toggle_label(Mode::Counting), PAUSE_LABEL);
        assert_eq!(toggle_label(Mode::Paused), RESUME_LABEL);
        assert_eq!(toggle_label(Mode::Errored), START_LABEL);
    }
}
