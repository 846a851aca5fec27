//! # Backend Module
//!
//! The rendering and windowing collaborator behind the native callables.
//!
//! ## Responsibilities
//! - **Window**: one-shot window creation and frame-rate setup, close predicate.
//! - **Frame scope**: `begin_drawing` / `end_drawing`, where `end_drawing` presents.
//! - **Drawing**: clear, rectangles, text and text measurement.
//! - **Input and time**: key state queries, frame time and process time.
//!
//! ## Implementations
//! - `HeadlessBackend`: deterministic, records draw commands (tests, CI, `--backend headless`).
//! - `SkiaBackend`: off-screen Skia raster surface (feature `skia`).

pub mod headless;
#[cfg(feature = "skia")]
pub mod skia;

pub use headless::{DrawCommand, FrameRecord, HeadlessBackend};
#[cfg(feature = "skia")]
pub use skia::SkiaBackend;

use crate::errors::BackendError;
use crate::types::Color;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle used by the lifecycle driver and every native callable.
///
/// Single-threaded by construction; borrows never outlive one backend call.
pub type SharedBackend = Rc<RefCell<dyn Backend>>;

/// A frame-based rendering and input library.
pub trait Backend {
    /// Creates the window. Called at most once per process.
    fn init_window(&mut self, width: i32, height: i32, title: &str) -> Result<(), BackendError>;

    fn set_target_fps(&mut self, fps: i32);

    /// True once the application should leave its frame loop.
    fn window_should_close(&mut self) -> bool;

    /// Releases the window. Safe to call when no window exists.
    /// Work deferred to close (such as a snapshot) reports its failure here.
    fn close_window(&mut self) -> Result<(), BackendError>;

    /// Duration of the previous frame in seconds.
    fn frame_time(&self) -> f32;

    /// Seconds elapsed since the backend was created.
    fn time(&self) -> f64;

    fn begin_drawing(&mut self);

    /// Ends the frame scope and presents the frame.
    fn end_drawing(&mut self);

    fn clear_background(&mut self, color: Color);

    fn draw_rectangle(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color);

    /// Draws `text` with its top-left corner at (`x`, `y`).
    fn draw_text(&mut self, text: &str, x: i32, y: i32, size: i32, color: Color);

    /// Width in pixels of `text` at font `size`.
    fn measure_text(&self, text: &str, size: i32) -> i32;

    /// True only on the frame the key went down.
    fn is_key_pressed(&self, key: i32) -> bool;

    fn is_key_down(&self, key: i32) -> bool;

    fn is_key_up(&self, key: i32) -> bool {
        !self.is_key_down(key)
    }
}
