use crate::scripting::codec::Category;
use crate::scripting::hooks::Hook;
use rhai::{EvalAltResult, Position};
use std::fmt;
use thiserror::Error;

/// Errors raised inside a native callable.
///
/// These never terminate the process: they are handed back to the calling script
/// as a runtime error that `try`/`catch` can intercept.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("{function}: argument {position} is not {expected} (got {found})")]
    TypeMismatch {
        function: &'static str,
        position: usize,
        expected: Category,
        found: String,
    },
    #[error("{path} is not an object")]
    NotAnObject { path: String },
    #[error("cannot {action} file '{path}': {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<BridgeError> for Box<EvalAltResult> {
    fn from(err: BridgeError) -> Self {
        Box::new(EvalAltResult::ErrorRuntime(
            err.to_string().into(),
            Position::NONE,
        ))
    }
}

/// Errors reported by a rendering backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("invalid window size {width}x{height}")]
    InvalidWindowSize { width: i32, height: i32 },
    #[error("Failed to create surface")]
    SurfaceFailure,
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Where in the lifecycle a script error happened.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Bootstrap,
    EntryScript,
    Hook(Hook),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Bootstrap => write!(f, "bootstrap"),
            Stage::EntryScript => write!(f, "entry script"),
            Stage::Hook(hook) => write!(f, "{} hook", hook.name()),
        }
    }
}

/// Unrecoverable conditions. Every variant ends the process with exit code 1.
#[derive(Error, Debug)]
pub enum FatalError {
    #[error("bootstrap fragment `{fragment}` failed: {message}")]
    Bootstrap {
        fragment: &'static str,
        message: String,
    },
    #[error("{stage} failed: {message}")]
    ScriptFault { stage: Stage, message: String },
    #[error("{hook} hook broke its contract: {message}")]
    ContractViolation { hook: &'static str, message: String },
    #[error("script engine panic: {message}")]
    EnginePanic { message: String },
    #[error("backend failure: {0}")]
    Backend(#[from] BackendError),
    #[error("cannot {step} while {state}")]
    InvalidTransition { step: &'static str, state: String },
}

impl FatalError {
    /// Classifies an error returned by the script engine at `stage`.
    ///
    /// Resource-limit failures are engine conditions rather than script faults.
    pub fn from_script(stage: Stage, err: Box<EvalAltResult>) -> Self {
        if is_engine_condition(&err) {
            return FatalError::EnginePanic {
                message: err.to_string(),
            };
        }
        FatalError::ScriptFault {
            stage,
            message: err.to_string(),
        }
    }

    /// The process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

fn is_engine_condition(err: &EvalAltResult) -> bool {
    match err {
        EvalAltResult::ErrorStackOverflow(..)
        | EvalAltResult::ErrorTooManyOperations(..)
        | EvalAltResult::ErrorTooManyModules(..)
        | EvalAltResult::ErrorDataTooLarge(..) => true,
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _)
        | EvalAltResult::ErrorInModule(_, inner, _) => is_engine_condition(inner),
        _ => false,
    }
}
