//! Diagnostic output.
//!
//! In the browser errors go to the developer console; native builds (tests)
//! route them through `tracing`.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install the panic hook and the `tracing` subscriber.
///
/// In the browser both write to the developer console. Safe to call more
/// than once; only the first call does anything.
pub fn init() -> bool {
    let mut installed = false;

    INIT.call_once(|| {
        #[cfg(target_arch = "wasm32")]
        {
            console_error_panic_hook::set_once();
            tracing_wasm::set_as_global_default();
        }
        installed = true;
    });

    installed
}

/// Report an error that is otherwise swallowed.
pub fn error(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::error_1(&message.into());

    #[cfg(not(target_arch = "wasm32"))]
    tracing::error!("{}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_runs_once() {
        init();

        assert!(INIT.is_completed());
        assert!(!init());
    }
}
