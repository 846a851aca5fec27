//! # Skia Backend
//!
//! Off-screen rendering via Skia.
//!
//! ## Responsibilities
//! - **Surface**: one raster surface sized from the window config.
//! - **Pacing**: `end_drawing` sleeps to hold the target frame rate.
//! - **Text**: system "Sans Serif" typeface, falling back to Skia's default font.
//! - **Snapshot**: optionally encodes the last presented frame to PNG on close.
//!
//! There is no keyboard device: every key reads as up.

use super::Backend;
use crate::errors::BackendError;
use crate::types::Color;
use anyhow::Context;
use skia_safe::{EncodedImageFormat, Font, FontMgr, FontStyle, Paint, Rect, Surface, Typeface};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

pub struct SkiaBackend {
    surface: Option<Surface>,
    typeface: Option<Typeface>,
    frame_budget: Option<Duration>,
    frame_limit: Option<u64>,
    frames: u64,
    started: Instant,
    frame_started: Instant,
    last_frame_time: f32,
    snapshot: Option<PathBuf>,
}

impl SkiaBackend {
    pub fn new() -> Self {
        let typeface = FontMgr::new().match_family_style("Sans Serif", FontStyle::normal());
        if typeface.is_none() {
            warn!("no system Sans Serif typeface; using Skia's default font");
        }
        let now = Instant::now();
        Self {
            surface: None,
            typeface,
            frame_budget: None,
            frame_limit: None,
            frames: 0,
            started: now,
            frame_started: now,
            last_frame_time: 0.0,
            snapshot: None,
        }
    }

    /// Closes the window after `frames` presented frames.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Writes the last frame to `path` as PNG when the window closes.
    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot = Some(path.into());
        self
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    fn font(&self, size: i32) -> Font {
        let size = size.max(1) as f32;
        match &self.typeface {
            Some(typeface) => Font::new(typeface.clone(), Some(size)),
            None => {
                let mut font = Font::default();
                font.set_size(size);
                font
            }
        }
    }

    fn paint(color: Color) -> Paint {
        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint.set_anti_alias(true);
        paint
    }

    #[instrument(level = "debug", skip(self, surface))]
    fn write_snapshot(&self, surface: &mut Surface, path: &PathBuf) -> anyhow::Result<()> {
        let image = surface.image_snapshot();
        let data = image
            .encode(None, EncodedImageFormat::PNG, 100)
            .context("Failed to encode frame to PNG")?;
        std::fs::write(path, data.as_bytes())
            .with_context(|| format!("Writing snapshot {}", path.display()))?;
        Ok(())
    }
}

impl Default for SkiaBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for SkiaBackend {
    fn init_window(&mut self, width: i32, height: i32, title: &str) -> Result<(), BackendError> {
        if width <= 0 || height <= 0 {
            return Err(BackendError::InvalidWindowSize { width, height });
        }
        let surface = skia_safe::surfaces::raster_n32_premul((width, height))
            .ok_or(BackendError::SurfaceFailure)?;
        info!(width, height, title, "raster surface created");
        self.surface = Some(surface);
        Ok(())
    }

    fn set_target_fps(&mut self, fps: i32) {
        self.frame_budget = (fps > 0).then(|| Duration::from_secs_f64(1.0 / fps as f64));
    }

    fn window_should_close(&mut self) -> bool {
        if self.surface.is_none() {
            return true;
        }
        match self.frame_limit {
            Some(limit) => self.frames >= limit,
            None => false,
        }
    }

    fn close_window(&mut self) -> Result<(), BackendError> {
        let Some(mut surface) = self.surface.take() else {
            return Ok(());
        };
        debug!(frames = self.frames, "raster surface released");
        if let Some(path) = self.snapshot.clone() {
            self.write_snapshot(&mut surface, &path)?;
            info!(path = %path.display(), "snapshot written");
        }
        Ok(())
    }

    fn frame_time(&self) -> f32 {
        self.last_frame_time
    }

    fn time(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn begin_drawing(&mut self) {
        self.frame_started = Instant::now();
    }

    fn end_drawing(&mut self) {
        if let Some(budget) = self.frame_budget {
            let spent = self.frame_started.elapsed();
            if spent < budget {
                std::thread::sleep(budget - spent);
            }
        }
        self.last_frame_time = self.frame_started.elapsed().as_secs_f32();
        self.frames += 1;
    }

    fn clear_background(&mut self, color: Color) {
        if let Some(surface) = self.surface.as_mut() {
            surface.canvas().clear(color.to_skia());
        }
    }

    fn draw_rectangle(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color) {
        let paint = Self::paint(color);
        if let Some(surface) = self.surface.as_mut() {
            let rect = Rect::from_xywh(x as f32, y as f32, width as f32, height as f32);
            surface.canvas().draw_rect(rect, &paint);
        }
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, size: i32, color: Color) {
        let font = self.font(size);
        let paint = Self::paint(color);
        if let Some(surface) = self.surface.as_mut() {
            // Skia positions text by its baseline; callers give the top-left corner.
            let baseline = y as f32 + size as f32;
            surface
                .canvas()
                .draw_str(text, (x as f32, baseline), &font, &paint);
        }
    }

    fn measure_text(&self, text: &str, size: i32) -> i32 {
        let (width, _) = self.font(size).measure_str(text, None);
        width as i32
    }

    fn is_key_pressed(&self, _key: i32) -> bool {
        false
    }

    fn is_key_down(&self, _key: i32) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw_one_frame(backend: &mut SkiaBackend) {
        backend.init_window(16, 16, "t").unwrap();
        backend.begin_drawing();
        backend.clear_background(Color::BLACK);
        backend.draw_rectangle(2, 2, 4, 4, Color::WHITE);
        backend.end_drawing();
    }

    #[test]
    fn test_snapshot_is_written_on_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last.png");
        let mut backend = SkiaBackend::new().with_snapshot(&path);
        draw_one_frame(&mut backend);

        backend.close_window().unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert!(backend.window_should_close());
    }

    #[test]
    fn test_snapshot_failure_reaches_the_caller() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("last.png");
        let mut backend = SkiaBackend::new().with_snapshot(&path);
        draw_one_frame(&mut backend);

        match backend.close_window() {
            Err(BackendError::Anyhow(e)) => {
                assert!(format!("{:#}", e).contains("Writing snapshot"), "{:#}", e);
            }
            other => panic!("expected a snapshot failure, got {:?}", other),
        }
    }

    #[test]
    fn test_close_without_window_is_a_no_op() {
        let mut backend = SkiaBackend::new().with_snapshot("never.png");
        assert!(backend.close_window().is_ok());
    }
}
