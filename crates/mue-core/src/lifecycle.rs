//! # Lifecycle Driver
//!
//! `Uninitialized -> Registered -> Configured -> Running -> Terminated`
//!
//! - **load**: evaluates the entry script.
//! - **configure**: resolves the window config through `setup`, then creates the window.
//! - **run**: the frame loop (`update`, clear, `draw`, present) until the backend closes.
//! - **shutdown**: `cleanup`, then the window and the environment are released.
//!
//! Absent hooks are skipped. A hook that raises, or that declares the wrong
//! number of parameters, is fatal. Any failure moves the driver to
//! `Terminated` and is returned to the caller; nothing here exits the process.

use crate::backend::SharedBackend;
use crate::errors::FatalError;
use crate::scripting::{BoundHook, Hook, ScriptCodec, ScriptEnvironment};
use crate::types::{Color, WindowConfig};
use crate::ENTRY_SCRIPT;
use rhai::{Map, FLOAT};
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Cleared into every frame before `draw`.
pub const BACKGROUND: Color = Color::BLACK;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    Registered,
    Configured,
    Running,
    Terminated,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Uninitialized => "uninitialized",
            State::Registered => "registered",
            State::Configured => "configured",
            State::Running => "running",
            State::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

pub struct Lifecycle {
    env: ScriptEnvironment,
    backend: SharedBackend,
    state: State,
    config: WindowConfig,
    frames: u64,
}

impl Lifecycle {
    /// `env` must already hold the registered bindings.
    pub fn new(env: ScriptEnvironment, backend: SharedBackend) -> Self {
        Self {
            env,
            backend,
            state: State::Uninitialized,
            config: WindowConfig::default(),
            frames: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The effective window config. Defaults until `configure` succeeds.
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Frames presented by `run`.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn environment(&self) -> &ScriptEnvironment {
        &self.env
    }

    pub fn environment_mut(&mut self) -> &mut ScriptEnvironment {
        &mut self.env
    }

    /// Runs every step in order.
    pub fn execute(&mut self, source: &str) -> Result<(), FatalError> {
        self.load(source)?;
        self.configure()?;
        self.run()?;
        self.shutdown()
    }

    #[instrument(level = "debug", skip_all)]
    pub fn load(&mut self, source: &str) -> Result<(), FatalError> {
        self.expect("load", State::Uninitialized)?;
        let result = self.env.evaluate(source, ENTRY_SCRIPT);
        self.advance(result, State::Registered)
    }

    #[instrument(level = "debug", skip_all)]
    pub fn configure(&mut self) -> Result<(), FatalError> {
        self.expect("configure", State::Registered)?;
        let result = self.resolve_config().and_then(|config| {
            self.open_window(&config)?;
            self.config = config;
            Ok(())
        });
        self.advance(result, State::Configured)
    }

    #[instrument(level = "debug", skip_all)]
    pub fn run(&mut self) -> Result<(), FatalError> {
        self.expect("run", State::Configured)?;
        self.state = State::Running;
        let result = self.frame_loop();
        self.advance(result, State::Running)
    }

    #[instrument(level = "debug", skip_all)]
    pub fn shutdown(&mut self) -> Result<(), FatalError> {
        self.expect("shutdown", State::Running)?;
        let result = match self.bound(Hook::Cleanup) {
            Ok(Some(cleanup)) => self.env.call(&cleanup, ()).map(drop),
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };
        let result =
            result.and_then(|()| self.backend.borrow_mut().close_window().map_err(FatalError::from));
        if result.is_ok() {
            self.env.release();
            info!(frames = self.frames, "shutdown complete");
        }
        self.advance(result, State::Terminated)
    }

    fn expect(&self, step: &'static str, expected: State) -> Result<(), FatalError> {
        if self.state == expected {
            return Ok(());
        }
        Err(FatalError::InvalidTransition {
            step,
            state: self.state.to_string(),
        })
    }

    fn advance(&mut self, result: Result<(), FatalError>, next: State) -> Result<(), FatalError> {
        match result {
            Ok(()) => {
                debug!(from = %self.state, to = %next, "lifecycle transition");
                self.state = next;
                Ok(())
            }
            Err(e) => {
                self.state = State::Terminated;
                Err(e)
            }
        }
    }

    /// The script's definition of `hook`, if any, with its parameter count checked.
    fn bound(&self, hook: Hook) -> Result<Option<BoundHook>, FatalError> {
        match self.env.lookup(hook) {
            Some(bound) if !bound.has_expected_arity() => Err(FatalError::ContractViolation {
                hook: hook.name(),
                message: format!(
                    "expected {} parameter(s), found {}",
                    hook.arity(),
                    bound.declared_arity
                ),
            }),
            found => Ok(found),
        }
    }

    fn resolve_config(&mut self) -> Result<WindowConfig, FatalError> {
        let defaults = WindowConfig::default();
        let Some(setup) = self.bound(Hook::Setup)? else {
            debug!("no setup hook; using the default window config");
            return Ok(defaults);
        };

        let returned = self.env.call(&setup, (defaults.encode(),))?;
        let violation = |message: String| FatalError::ContractViolation {
            hook: Hook::Setup.name(),
            message,
        };

        match returned.read_lock::<Map>() {
            Some(map) => {
                let missing = WindowConfig::missing_fields(&map);
                if !missing.is_empty() {
                    warn!(
                        fields = ?missing,
                        "setup returned a partial config; missing fields are zero, not defaults"
                    );
                }
            }
            None => {
                return Err(violation(format!(
                    "expected an object, got {}",
                    returned.type_name()
                )))
            }
        }

        WindowConfig::decode(&returned, "setup()").map_err(|e| violation(e.to_string()))
    }

    fn open_window(&mut self, config: &WindowConfig) -> Result<(), FatalError> {
        let mut backend = self.backend.borrow_mut();
        backend.init_window(config.width(), config.height(), config.title.as_str())?;
        backend.set_target_fps(config.target_fps);
        info!(
            config = %serde_json::to_string(config).unwrap_or_default(),
            "window acquired"
        );
        Ok(())
    }

    fn frame_loop(&mut self) -> Result<(), FatalError> {
        let update = self.bound(Hook::Update)?;
        let draw = self.bound(Hook::Draw)?;

        loop {
            let should_close = self.backend.borrow_mut().window_should_close();
            if should_close {
                break;
            }

            if let Some(update) = &update {
                let dt = self.backend.borrow().frame_time() as FLOAT;
                self.env.call(update, (dt,))?;
            }

            {
                let mut backend = self.backend.borrow_mut();
                backend.begin_drawing();
                backend.clear_background(BACKGROUND);
            }

            if let Some(draw) = &draw {
                self.env.call(draw, ())?;
            }

            self.backend.borrow_mut().end_drawing();
            self.frames += 1;
        }

        debug!(frames = self.frames, "frame loop finished");
        Ok(())
    }
}
