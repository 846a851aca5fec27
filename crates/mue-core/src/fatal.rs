//! # Fatal Error Handler
//!
//! The process-wide exit path. Library code returns `FatalError`; only the
//! binary's top level calls `terminate`.

use crate::errors::FatalError;
use crate::scripting::ScriptEnvironment;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::error;

/// Exit code for every fatal path.
pub const EXIT_FAILURE: i32 = 1;

/// Shown when an error carries no message.
pub const UNKNOWN_ERROR: &str = "(unknown error)";

/// The line written to stderr for `err`.
pub fn diagnostic(err: &FatalError) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        format!("fatal: {UNKNOWN_ERROR}")
    } else {
        format!("fatal: {message}")
    }
}

/// Reports `err`, releases `env` and exits. Never returns.
pub fn terminate(err: &FatalError, env: Option<&mut ScriptEnvironment>) -> ! {
    error!(error = %err, "fatal error");
    eprintln!("{}", diagnostic(err));
    if let Some(env) = env {
        env.release();
    }
    std::process::exit(err.exit_code())
}

/// Runs `f`, turning a panic into `FatalError::EnginePanic`.
pub fn guard<T>(f: impl FnOnce() -> Result<T, FatalError>) -> Result<T, FatalError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(FatalError::EnginePanic {
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        UNKNOWN_ERROR.to_string()
    }
}
