//! Smooths a large progress jump into evenly spaced intermediate frames.
//!
//! The animator only produces values; the controller applies each one to the
//! display when the animation timer slot fires. Dropping an `Animation` cancels
//! it with no side effects beyond the frames already applied.

use std::time::Duration;

/// Interpolate from `start` to `target` in `steps` frames.
///
/// Intermediate frames are whole percentages; the last frame is `target`
/// exactly. Frames never move backwards relative to the direction of travel.
pub fn interpolate(start: f64, target: f64, steps: u32) -> Vec<f64> {
    let steps = steps.max(1);
    let increment = (target - start) / f64::from(steps);
    let rising = target >= start;
    let mut frames = Vec::with_capacity(steps as usize);
    let mut previous = start;
    for step in 1..steps {
        let raw = (start + increment * f64::from(step)).round();
        let value = if rising {
            raw.max(previous).min(target)
        } else {
            raw.min(previous).max(target)
        };
        frames.push(value);
        previous = value;
    }
    frames.push(target);
    frames
}

/// An in-flight progress animation.
#[derive(Debug, Clone)]
pub struct Animation {
    frames: Vec<f64>,
    next: usize,
    interval: Duration,
}

impl Animation {
    /// Plan an animation over `duration` split into `steps` equal ticks.
    pub fn plan(start: f64, target: f64, duration: Duration, steps: u32) -> Self {
        let steps = steps.max(1);
        Self {
            frames: interpolate(start, target, steps),
            next: 0,
            interval: duration / steps,
        }
    }

    /// Delay between two applied frames.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Value of the final frame.
    pub fn target(&self) -> f64 {
        self.frames.last().copied().unwrap_or_default()
    }

    /// Next value to apply, or `None` once the target has been reached.
    pub fn next_frame(&mut self) -> Option<f64> {
        let value = self.frames.get(self.next).copied()?;
        self.next += 1;
        Some(value)
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.frames.len()
    }
}
