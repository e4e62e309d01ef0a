//! Application-level configuration constants.

// UI text
pub const APP_TITLE: &str = "Push-up Counter";
pub const COUNT_CAPTION: &str = "push-ups";
pub const START_LABEL: &str = "Start";
pub const PAUSE_LABEL: &str = "Pause";
pub const RESUME_LABEL: &str = "Resume";
pub const RESET_LABEL: &str = "Reset";

// CSS classes
pub const FLASH_CLASS: &str = "flash";
pub const ERROR_CLASS: &str = "status-error";
