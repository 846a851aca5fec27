//! # Headless Backend
//!
//! A deterministic backend without a display.
//!
//! - Frame time is `0` on the first frame and `1 / target_fps` afterwards; time
//!   advances by the same amount on every presented frame. No sleeping.
//! - Keys are scripted with `hold_key`: held keys are down on every frame and
//!   pressed only on the frame they went down.
//! - Every draw call is recorded; presented frames are kept as `FrameRecord`s.

use super::Backend;
use crate::errors::BackendError;
use crate::types::Color;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Average glyph advance as a fraction of the font size.
const GLYPH_ADVANCE: f32 = 0.5;

/// A recorded draw call.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear {
        color: Color,
    },
    Rectangle {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: Color,
    },
    Text {
        text: String,
        x: i32,
        y: i32,
        size: i32,
        color: Color,
    },
}

/// The draw calls of one presented frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FrameRecord {
    pub index: u64,
    pub commands: Vec<DrawCommand>,
}

/// The window as requested by the application.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WindowInfo {
    pub width: i32,
    pub height: i32,
    pub title: String,
}

#[derive(Default)]
pub struct HeadlessBackend {
    frame_limit: Option<u64>,
    close_requested: bool,
    window: Option<WindowInfo>,
    target_fps: i32,
    init_calls: u32,
    frames_started: u64,
    frames_presented: u64,
    in_frame: bool,
    last_frame_time: f32,
    elapsed: f64,
    /// Held keys and the frame they went down on.
    held_keys: HashMap<i32, u64>,
    recording: bool,
    current: Vec<DrawCommand>,
    presented: Vec<FrameRecord>,
    /// Draw calls issued outside a frame scope (e.g. from `cleanup`).
    stray: Vec<DrawCommand>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            recording: true,
            ..Default::default()
        }
    }

    /// Closes the window after `frames` iterations of the frame loop.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Stops keeping presented frames in memory. Counters still advance.
    pub fn without_recording(mut self) -> Self {
        self.recording = false;
        self
    }

    /// Holds `key` down from the current frame on.
    pub fn hold_key(&mut self, key: i32) {
        let frame = self.frames_presented;
        self.held_keys.entry(key).or_insert(frame);
    }

    pub fn release_key(&mut self, key: i32) {
        self.held_keys.remove(&key);
    }

    /// Makes the close predicate true on its next check.
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    pub fn window(&self) -> Option<&WindowInfo> {
        self.window.as_ref()
    }

    pub fn init_calls(&self) -> u32 {
        self.init_calls
    }

    pub fn target_fps(&self) -> i32 {
        self.target_fps
    }

    /// Frames whose drawing scope was opened.
    pub fn frames_started(&self) -> u64 {
        self.frames_started
    }

    /// Frames that reached `end_drawing`.
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn frames(&self) -> &[FrameRecord] {
        &self.presented
    }

    pub fn stray_commands(&self) -> &[DrawCommand] {
        &self.stray
    }

    fn record(&mut self, command: DrawCommand) {
        if !self.recording {
            return;
        }
        if self.in_frame {
            self.current.push(command);
        } else {
            self.stray.push(command);
        }
    }
}

impl Backend for HeadlessBackend {
    fn init_window(&mut self, width: i32, height: i32, title: &str) -> Result<(), BackendError> {
        self.init_calls += 1;
        if width <= 0 || height <= 0 {
            return Err(BackendError::InvalidWindowSize { width, height });
        }
        debug!(width, height, title, "headless window created");
        self.window = Some(WindowInfo {
            width,
            height,
            title: title.to_string(),
        });
        Ok(())
    }

    fn set_target_fps(&mut self, fps: i32) {
        self.target_fps = fps;
    }

    fn window_should_close(&mut self) -> bool {
        if self.window.is_none() || self.close_requested {
            return true;
        }
        match self.frame_limit {
            Some(limit) => self.frames_started >= limit,
            None => false,
        }
    }

    fn close_window(&mut self) -> Result<(), BackendError> {
        if self.window.take().is_some() {
            debug!(frames = self.frames_presented, "headless window closed");
        }
        Ok(())
    }

    fn frame_time(&self) -> f32 {
        self.last_frame_time
    }

    fn time(&self) -> f64 {
        self.elapsed
    }

    fn begin_drawing(&mut self) {
        self.in_frame = true;
        self.frames_started += 1;
        self.current.clear();
    }

    fn end_drawing(&mut self) {
        self.in_frame = false;
        self.last_frame_time = if self.target_fps > 0 {
            1.0 / self.target_fps as f32
        } else {
            0.0
        };
        self.elapsed += self.last_frame_time as f64;

        if self.recording {
            let commands = std::mem::take(&mut self.current);
            self.presented.push(FrameRecord {
                index: self.frames_presented,
                commands,
            });
        }
        self.frames_presented += 1;
    }

    fn clear_background(&mut self, color: Color) {
        self.record(DrawCommand::Clear { color });
    }

    fn draw_rectangle(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color) {
        self.record(DrawCommand::Rectangle {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, size: i32, color: Color) {
        self.record(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            size,
            color,
        });
    }

    fn measure_text(&self, text: &str, size: i32) -> i32 {
        (text.chars().count() as f32 * size as f32 * GLYPH_ADVANCE) as i32
    }

    fn is_key_pressed(&self, key: i32) -> bool {
        self.held_keys.get(&key) == Some(&self.frames_presented)
    }

    fn is_key_down(&self, key: i32) -> bool {
        self.held_keys.contains_key(&key)
    }
}
