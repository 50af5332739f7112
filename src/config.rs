//! Runtime configuration.
//!
//! Held per thread, like every other piece of render state. Hosts set it once
//! before mounting; tests flip it freely.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

/// Knobs for the reconciler and hook runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Fail with [`Error::HookOrderChanged`](crate::Error::HookOrderChanged) when a
    /// hook slot is reused by a different hook.
    pub strict_hooks: bool,
    /// Log development warnings (duplicate keys, exhausted pools), once per message.
    pub dev_warnings: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict_hooks: true,
            dev_warnings: cfg!(debug_assertions),
        }
    }
}

thread_local! {
    static CONFIG: Cell<Config> = Cell::new(Config::default());

    /// Message keys already warned about.
    static WARNED: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
}

/// Get the current configuration.
pub fn config() -> Config {
    CONFIG.with(|c| c.get())
}

/// Replace the configuration.
pub fn set_config(config: Config) {
    CONFIG.with(|c| c.set(config));
}

/// Restore defaults and forget which warnings were already emitted.
pub fn reset_config() {
    CONFIG.with(|c| c.set(Config::default()));
    WARNED.with(|w| w.borrow_mut().clear());
}

/// Log a development warning the first time `key` is seen.
///
/// Returns whether the warning was emitted.
pub(crate) fn warn_once(key: &str, message: impl FnOnce() -> String) -> bool {
    if !config().dev_warnings {
        return false;
    }
    let fresh = WARNED.with(|w| w.borrow_mut().insert(key.to_string()));
    if fresh {
        log::warn!("{}", message());
    }
    fresh
}
