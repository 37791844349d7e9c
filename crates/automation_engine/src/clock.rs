// SPDX-License-Identifier: MIT OR Apache-2.0
//! Virtual clock for the active scene.

/// Converts wall-clock deltas to virtual deltas with a speed multiplier.
///
/// The clock remembers the last scene time that was evaluated so the
/// scheduler can cover the whole span between two ticks. A seek forgets it.
#[derive(Debug, Clone)]
pub struct SceneClock {
    /// Last scene time handed to the scheduler
    last_evaluated: Option<f64>,
    /// Virtual milliseconds per wall-clock millisecond
    speed: f64,
    /// Whether wall time advances the clock
    running: bool,
}

impl SceneClock {
    /// Create a stopped clock at time 0
    pub fn new(speed: f64) -> Self {
        Self {
            last_evaluated: None,
            speed,
            running: false,
        }
    }

    /// Start or resume advancing
    pub fn resume(&mut self) {
        self.running = true;
    }

    /// Freeze the clock
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Whether the clock advances on ticks
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current speed multiplier
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Change the speed; applies to subsequent deltas only
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    /// Last scene time handed to the scheduler
    pub fn last_evaluated(&self) -> Option<f64> {
        self.last_evaluated
    }

    /// Virtual delta for a wall-clock delta.
    ///
    /// Zero while paused. Negative and non-finite wall deltas are treated
    /// as zero.
    pub fn scaled_delta(&self, wall_delta_ms: f64) -> f64 {
        if !self.running || !wall_delta_ms.is_finite() || wall_delta_ms <= 0.0 {
            return 0.0;
        }
        let scaled = wall_delta_ms * self.speed;
        if scaled.is_finite() {
            scaled
        } else {
            0.0
        }
    }

    /// Forget the last evaluation, as on entering a scene or seeking
    pub fn forget_evaluation(&mut self) {
        self.last_evaluated = None;
    }

    /// Record that the scheduler evaluated the scene at `scene_time`
    pub fn mark_evaluated(&mut self, scene_time: f64) {
        self.last_evaluated = Some(scene_time);
    }

    /// Forget evaluation and stop
    pub fn reset(&mut self) {
        self.last_evaluated = None;
        self.running = false;
    }
}

impl Default for SceneClock {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paused_clock_does_not_advance() {
        let clock = SceneClock::new(2.0);
        assert_eq!(clock.scaled_delta(100.0), 0.0);
    }

    #[test]
    fn test_speed_scales_wall_delta() {
        let mut clock = SceneClock::new(1.0);
        clock.resume();
        assert_eq!(clock.scaled_delta(16.0), 16.0);
        clock.set_speed(0.25);
        assert_eq!(clock.scaled_delta(16.0), 4.0);
        assert_eq!(clock.scaled_delta(-5.0), 0.0);
        assert_eq!(clock.scaled_delta(f64::NAN), 0.0);
        assert_eq!(clock.scaled_delta(f64::INFINITY), 0.0);
        clock.set_speed(4.0);
        assert_eq!(clock.scaled_delta(f64::MAX), 0.0);
    }

    #[test]
    fn test_forget_evaluation() {
        let mut clock = SceneClock::default();
        clock.mark_evaluated(120.0);
        assert_eq!(clock.last_evaluated(), Some(120.0));
        clock.forget_evaluation();
        assert_eq!(clock.last_evaluated(), None);

        clock.resume();
        clock.mark_evaluated(40.0);
        clock.reset();
        assert_eq!(clock.last_evaluated(), None);
        assert!(!clock.is_running());
    }
}
