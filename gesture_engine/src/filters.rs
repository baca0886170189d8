//! Small stateful filters shared by every gesture profile.
//!
//! All of them step once per classified frame.  Only [`JumpCooldown`] looks at
//! the clock, so a burst of fast frames cannot shorten it.

use std::time::{Duration, Instant};

use runner_core::Lane;

// ════════════════════════════════════════════════════════════════════════════
// LaneSmoother
// ════════════════════════════════════════════════════════════════════════════

/// Exponential filter over the continuous lane value.
///
/// `value = value * (1 - α) + target * α`, then round and clamp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneSmoother {
    value: f32,
}

impl Default for LaneSmoother {
    fn default() -> Self {
        LaneSmoother { value: 1.0 }
    }
}

impl LaneSmoother {
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn set(&mut self, value: f32) {
        self.value = value.clamp(0.0, 2.0);
    }

    pub fn update(&mut self, target: Lane, alpha: f32) -> Lane {
        let alpha = alpha.clamp(0.0, 1.0);
        self.value = self.value * (1.0 - alpha) + target.index() as f32 * alpha;
        self.lane()
    }

    /// Committed lane without stepping the filter.
    pub fn lane(&self) -> Lane {
        Lane::new(self.value.round() as i32)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HoldCounter
// ════════════════════════════════════════════════════════════════════════════

/// Counts consecutive frames a condition has held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HoldCounter {
    frames:   u32,
    required: u32,
}

impl HoldCounter {
    pub fn new(required: u32) -> Self {
        HoldCounter { frames: 0, required: required.max(1) }
    }

    /// Feed one frame; returns true once the condition has held long enough.
    pub fn update(&mut self, condition: bool) -> bool {
        if condition {
            self.frames = self.frames.saturating_add(1);
        } else {
            self.frames = 0;
        }
        self.reached()
    }

    pub fn reached(&self) -> bool {
        self.frames >= self.required
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn reset(&mut self) {
        self.frames = 0;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// JumpCooldown
// ════════════════════════════════════════════════════════════════════════════

/// Wall-clock gate between two jump triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JumpCooldown {
    cooldown: Duration,
    last:     Option<Instant>,
}

impl JumpCooldown {
    pub fn new(cooldown_secs: f32) -> Self {
        JumpCooldown {
            cooldown: Duration::from_millis((cooldown_secs.max(0.0) * 1000.0).round() as u64),
            last:     None,
        }
    }

    /// Fire if the cooldown has elapsed since the last trigger.
    pub fn try_fire(&mut self, now: Instant) -> bool {
        let ready = self
            .last
            .map_or(true, |last| now.saturating_duration_since(last) >= self.cooldown);
        if ready {
            self.last = Some(now);
        }
        ready
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DuckFilter
// ════════════════════════════════════════════════════════════════════════════

/// Low-passed boolean: `level = level * decay + gain * condition`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DuckFilter {
    level:     f32,
    decay:     f32,
    gain:      f32,
    threshold: f32,
}

impl DuckFilter {
    pub const fn new(decay: f32, gain: f32, threshold: f32) -> Self {
        DuckFilter { level: 0.0, decay, gain, threshold }
    }

    /// 0.8 / 0.2, asserted above 0.5.
    pub const fn standard() -> Self {
        Self::new(0.80, 0.20, 0.50)
    }

    pub fn update(&mut self, condition: bool) -> bool {
        self.level = self.level * self.decay + if condition { self.gain } else { 0.0 };
        self.active()
    }

    pub fn active(&self) -> bool {
        self.level > self.threshold
    }

    pub fn level(&self) -> f32 {
        self.level
    }
}

/// Re-centre a baseline toward the current reading.
pub fn drift(baseline: f32, current: f32, keep: f32) -> f32 {
    baseline * keep + current * (1.0 - keep)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothing_trajectory_toward_left() {
        let mut s = LaneSmoother::default();
        assert_eq!(s.update(Lane::LEFT, 0.30), Lane::CENTER); // 0.70
        assert_eq!(s.update(Lane::LEFT, 0.30), Lane::LEFT);   // 0.49
        assert!((s.value() - 0.49).abs() < 1e-5);
    }

    #[test]
    fn converged_lane_is_stable() {
        let mut s = LaneSmoother::default();
        for _ in 0..40 {
            s.update(Lane::RIGHT, 0.22);
        }
        for _ in 0..100 {
            assert_eq!(s.update(Lane::RIGHT, 0.22), Lane::RIGHT);
        }
    }

    #[test]
    fn hold_counter_needs_consecutive_frames() {
        let mut h = HoldCounter::new(3);
        assert!(!h.update(true));
        assert!(!h.update(true));
        assert!(!h.update(false));
        assert!(!h.update(true));
        assert!(!h.update(true));
        assert!(h.update(true));
    }

    #[test]
    fn cooldown_blocks_rapid_retrigger() {
        let t0 = Instant::now();
        let mut c = JumpCooldown::new(0.55);
        assert!(c.try_fire(t0));
        assert!(!c.try_fire(t0 + Duration::from_millis(300)));
        assert!(!c.try_fire(t0 + Duration::from_millis(549)));
        assert!(c.try_fire(t0 + Duration::from_millis(550)));
    }

    #[test]
    fn single_duck_impulse_does_not_assert() {
        for mut f in [DuckFilter::standard(), DuckFilter::new(0.82, 0.18, 0.48)] {
            assert!(!f.update(true));
            for _ in 0..10 {
                assert!(!f.update(false));
            }
        }
    }

    #[test]
    fn held_duck_asserts_after_a_few_frames() {
        let mut f = DuckFilter::standard();
        let frames = (1..=10).find(|_| f.update(true)).unwrap();
        // 0.2, 0.36, 0.488, 0.59
        assert_eq!(frames, 4);
    }

    #[test]
    fn drift_moves_a_fraction() {
        assert!((drift(1.0, 0.0, 0.96) - 0.96).abs() < 1e-6);
    }
}
