//! Logging setup. On wasm the `log` facade goes to the browser console
//! through `console_log`; host builds install nothing.

use log::{Level, LevelFilter};

/// Console level for a configured filter. `Off` installs no logger.
fn console_level(filter: LevelFilter) -> Option<Level> {
    filter.to_level()
}

/// Install the console logger and the panic hook. Safe to call more than once.
pub fn init(filter: LevelFilter) {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        if let Some(level) = console_level(filter) {
            if console_log::init_with_level(level).is_err() {
                log::debug!("console logger already installed");
            }
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = console_level(filter);
    }
}
