//! Frame timing and game speed

use std::time::Instant;

use crate::error::{RuntimeError, RuntimeResult};

/// Elapsed time handed to one runtime tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Logic time in seconds, scaled by game speed
    pub elapse_seconds: f32,
    /// Wall-clock time in seconds, never scaled
    pub real_elapse_seconds: f32,
}

/// Game clock for the runtime loop
///
/// Measures wall-clock frame time and derives the logic delta from it using
/// the current game speed. Pausing sets the logic delta to zero while real
/// time keeps flowing.
pub struct GameClock {
    last_sample: Option<Instant>,
    game_speed: f32,
    game_speed_before_pause: f32,
    max_frame_delta: Option<f32>,
    total_real_time: f64,
    frame_count: u64,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl GameClock {
    /// Create a clock running at normal speed
    pub fn new() -> Self {
        Self {
            last_sample: None,
            game_speed: 1.0,
            game_speed_before_pause: 1.0,
            max_frame_delta: None,
            total_real_time: 0.0,
            frame_count: 0,
        }
    }

    /// Clamp long frames (debugger breaks, window drags) to `max` seconds
    pub fn with_max_frame_delta(mut self, max: Option<f32>) -> Self {
        self.max_frame_delta = max;
        self
    }

    /// Current game speed multiplier
    pub fn game_speed(&self) -> f32 {
        self.game_speed
    }

    /// Set the game speed multiplier
    pub fn set_game_speed(&mut self, speed: f32) -> RuntimeResult<()> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(RuntimeError::InvalidArgument(format!(
                "Game speed must be a finite non-negative number, got {}",
                speed
            )));
        }
        self.game_speed = speed;
        Ok(())
    }

    /// Whether the game is paused
    pub fn is_paused(&self) -> bool {
        self.game_speed <= 0.0
    }

    /// Whether the game runs at normal speed
    pub fn is_normal_game_speed(&self) -> bool {
        (self.game_speed - 1.0).abs() < f32::EPSILON
    }

    /// Pause the game, remembering the current speed
    pub fn pause(&mut self) {
        if self.is_paused() {
            return;
        }
        self.game_speed_before_pause = self.game_speed;
        self.game_speed = 0.0;
    }

    /// Resume at the speed active before `pause`
    pub fn resume(&mut self) {
        if !self.is_paused() {
            return;
        }
        self.game_speed = self.game_speed_before_pause;
    }

    /// Back to 1x speed
    pub fn reset_normal_game_speed(&mut self) {
        self.game_speed = 1.0;
    }

    /// Advance the clock by an externally measured real delta
    pub fn advance(&mut self, real_elapse_seconds: f32) -> FrameTime {
        let mut real = real_elapse_seconds.max(0.0);
        if let Some(max) = self.max_frame_delta {
            real = real.min(max);
        }

        self.total_real_time += f64::from(real);
        self.frame_count += 1;

        FrameTime {
            elapse_seconds: real * self.game_speed,
            real_elapse_seconds: real,
        }
    }

    /// Measure wall-clock time since the previous sample and advance
    ///
    /// The first sample reports a zero delta.
    pub fn sample(&mut self) -> FrameTime {
        let now = Instant::now();
        let real = self
            .last_sample
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last_sample = Some(now);
        self.advance(real)
    }

    /// Total unscaled time advanced so far, in seconds
    pub fn total_real_time(&self) -> f64 {
        self.total_real_time
    }

    /// Number of frames advanced so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Forget timing history; speed settings are kept
    pub fn reset(&mut self) {
        self.last_sample = None;
        self.total_real_time = 0.0;
        self.frame_count = 0;
    }
}
