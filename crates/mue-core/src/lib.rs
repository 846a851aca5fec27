//! # Mue Core
//!
//! `mue-core` lets a [Rhai](https://rhai.rs/) script drive a native, frame-based 2D
//! application. The script defines lifecycle hooks and calls a small native API
//! (drawing, input, collision, time); this crate provides the bridge between the two.
//!
//! ## Core Features
//!
//! *   **Value Codecs**: type-checked conversion between script object maps and
//!     `Vector2D`, `Color`, `Rectangle` and `WindowConfig`.
//! *   **Native Registry**: raw bindings plus a namespaced API (`graphics::`, `input::`,
//!     `time::`, `collision::`, `console::`, `stacktrace::`, `KeyboardKey::`).
//! *   **Lifecycle Driver**: `setup`, `update`, `draw` and `cleanup` hooks around a frame loop.
//! *   **Backends**: an off-screen Skia raster backend and a deterministic headless recorder.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mue_core::backend::{HeadlessBackend, SharedBackend};
//! use mue_core::scripting::{EnvironmentOptions, ScriptEnvironment};
//! use mue_core::Lifecycle;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let backend: SharedBackend = Rc::new(RefCell::new(HeadlessBackend::new().with_frame_limit(60)));
//! let env = ScriptEnvironment::create(backend.clone(), &EnvironmentOptions::default())?;
//! let mut lifecycle = Lifecycle::new(env, backend);
//! lifecycle.execute("fn draw() { graphics::draw_text(\"hi\", #{x: 4, y: 4}, 20, #{r: 255, g: 255, b: 255, a: 255}); }")?;
//! # Ok::<(), mue_core::FatalError>(())
//! ```

/// Rendering and windowing backends.
pub mod backend;

/// Error types for native callables, backends and fatal paths.
pub mod errors;

/// The process exit path.
pub mod fatal;

/// The lifecycle state machine.
pub mod lifecycle;

/// Rhai bindings, codecs and the script environment.
pub mod scripting;

/// Native value types.
pub mod types;

pub use errors::{BackendError, BridgeError, FatalError};
pub use lifecycle::{Lifecycle, State};
pub use types::{Color, Rectangle, Vector2D, WindowConfig, WindowTitle};

/// Entry script file name, resolved in the working directory.
pub const ENTRY_SCRIPT: &str = "main.rhai";
