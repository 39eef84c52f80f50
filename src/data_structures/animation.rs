//! Sprite-sheet animation clock and pointer proximity.
//!
//! Both are plain values without GPU state so they can be driven and tested
//! without a device.

use cgmath::{MetricSpace, Vector2};
use instant::Duration;

use crate::error::RenderError;

/// Cycles through `frame_count` frames, each shown for `frame_duration` of
/// accumulated time.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameClock {
    frame_count: u32,
    frame_duration: Duration,
    frame: u32,
    elapsed: Duration,
}

impl FrameClock {
    pub fn new(frame_count: u32, frame_duration: Duration) -> Result<Self, RenderError> {
        if frame_count == 0 || frame_duration.is_zero() {
            return Err(RenderError::InvalidAnimation);
        }
        Ok(Self {
            frame_count,
            frame_duration,
            frame: 0,
            elapsed: Duration::ZERO,
        })
    }

    /// Let `dt` pass.
    ///
    /// Whole frame durations are drained one by one, so a large `dt` skips
    /// frames exactly like many small ones would.
    pub fn advance(&mut self, dt: Duration) {
        self.elapsed += dt;
        while self.elapsed > self.frame_duration {
            self.elapsed -= self.frame_duration;
            self.frame = (self.frame + 1) % self.frame_count;
        }
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Time accumulated towards the next frame.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Horizontal width of one frame in a horizontally tiled sheet.
    pub fn frame_width(&self) -> f32 {
        1.0 / self.frame_count as f32
    }

    /// `[offset, width]` of the current frame in texture space.
    pub fn frame_info(&self) -> [f32; 2] {
        let width = self.frame_width();
        [self.frame as f32 * width, width]
    }
}

/// Speeds up animations close to the pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Proximity {
    pub radius: f32,
    pub gain: f32,
}

impl Default for Proximity {
    fn default() -> Self {
        Self {
            radius: 0.7,
            gain: 3.0,
        }
    }
}

impl Proximity {
    /// Playback speed multiplier for something at `position`.
    ///
    /// `(radius - distance) * gain`, square-rooted. Zero at or beyond the radius.
    pub fn speed(&self, pointer: Vector2<f32>, position: Vector2<f32>) -> f32 {
        let factor = (self.radius - pointer.distance(position)) * self.gain;
        if factor > 0.0 { factor.sqrt() } else { 0.0 }
    }
}
