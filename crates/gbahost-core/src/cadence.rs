use std::time::Instant;

use log::debug;

/// Highest frame-skip level; level `k` renders one frame out of `k + 1`.
pub const MAX_FRAME_SKIP: u8 = 9;

/// Emulated frames between two cadence samples.
pub const SAMPLE_FRAMES: u64 = 10;

const ON_TARGET_PERCENT: u32 = 98;
const SEVERE_DEFICIT_PERCENT: u32 = 80;
const SEVERE_DEFICIT_PIVOT: u32 = 90;
const SEVERE_DEFICIT_STEP: u32 = 5;
const EASE_OFF_SAMPLES: i32 = 3;
const RAISE_THRESHOLD: i32 = -2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipChange {
    /// Level unchanged (the accumulator may still have moved).
    Held,
    /// Running fast enough: one fewer frame skipped.
    Lowered,
    /// Running behind: one more frame skipped.
    Raised,
    /// Sample discarded because playback was paused since the last one.
    Paused,
    /// Auto adjustment is disabled.
    Manual,
}

/// Playback speed in percent of the target, measured over one sample window.
///
/// `1_000_000 / rate` is truncated before dividing by the elapsed
/// milliseconds. A zero-length window cannot be measured and counts as on
/// target.
pub fn measure_speed(elapsed_ms: u32, rate: u32) -> u32 {
    if elapsed_ms == 0 {
        return 100;
    }
    (1_000_000 / rate.max(1)) / elapsed_ms
}

/// Adaptive frame-skip regulator.
///
/// Sampled once every [`SAMPLE_FRAMES`] emulated frames. Consistent samples
/// in one direction are needed before the level moves: three on-target
/// samples lower it, while a deficit drains the accumulator (faster the
/// further below target) until it crosses [`RAISE_THRESHOLD`].
#[derive(Clone, Debug)]
pub struct CadenceController {
    level: u8,
    accumulator: i32,
    last_sample: Option<Instant>,
    paused_since_sample: bool,
    auto: bool,
    last_speed: Option<u32>,
}

impl CadenceController {
    pub fn new(auto: bool, level: u8) -> Self {
        Self {
            level: level.min(MAX_FRAME_SKIP),
            accumulator: 0,
            last_sample: None,
            paused_since_sample: false,
            auto,
            last_speed: None,
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Manual frame-skip level; also the starting point for auto adjustment.
    pub fn set_level(&mut self, level: u8) {
        self.level = level.min(MAX_FRAME_SKIP);
    }

    pub fn accumulator(&self) -> i32 {
        self.accumulator
    }

    pub fn is_auto(&self) -> bool {
        self.auto
    }

    pub fn set_auto(&mut self, auto: bool) {
        self.auto = auto;
        self.accumulator = 0;
    }

    pub fn last_speed(&self) -> Option<u32> {
        self.last_speed
    }

    /// Mark that playback was paused; the next sample is discarded so the
    /// pause is not mistaken for slow playback.
    pub fn note_pause(&mut self) {
        self.paused_since_sample = true;
    }

    /// Start the measurement window without adjusting anything.
    pub fn start(&mut self, now: Instant) {
        self.last_sample = Some(now);
        self.paused_since_sample = false;
    }

    /// Whether frame number `frame` should be rendered at the current level.
    pub fn should_render(&self, frame: u64) -> bool {
        frame.is_multiple_of(u64::from(self.level) + 1)
    }

    /// Sample the wall clock at the end of a window of [`SAMPLE_FRAMES`]
    /// frames running at `rate` frames per second.
    pub fn tick(&mut self, now: Instant, rate: u32) -> SkipChange {
        let Some(last) = self.last_sample.replace(now) else {
            self.paused_since_sample = false;
            return if self.auto {
                SkipChange::Held
            } else {
                SkipChange::Manual
            };
        };
        let elapsed_ms = now
            .saturating_duration_since(last)
            .as_millis()
            .min(u128::from(u32::MAX)) as u32;
        let paused = std::mem::take(&mut self.paused_since_sample);
        self.observe(elapsed_ms, rate, paused)
    }

    /// Apply one sample. Clock handling lives in [`Self::tick`]; this is the
    /// pure adjustment step.
    pub fn observe(&mut self, elapsed_ms: u32, rate: u32, paused: bool) -> SkipChange {
        if paused {
            return SkipChange::Paused;
        }

        let speed = measure_speed(elapsed_ms, rate);
        self.last_speed = Some(speed);
        if !self.auto {
            return SkipChange::Manual;
        }

        let before = self.level;
        if speed >= ON_TARGET_PERCENT {
            self.accumulator += 1;
            if self.accumulator >= EASE_OFF_SAMPLES {
                self.accumulator = 0;
                if self.level > 0 {
                    self.level -= 1;
                }
            }
        } else {
            if speed < SEVERE_DEFICIT_PERCENT {
                let drain = (SEVERE_DEFICIT_PIVOT - speed).div_ceil(SEVERE_DEFICIT_STEP);
                self.accumulator = self.accumulator.saturating_sub(drain as i32);
            } else if self.level < MAX_FRAME_SKIP {
                self.accumulator -= 1;
            }

            if self.accumulator <= RAISE_THRESHOLD {
                self.accumulator += 2;
                if self.level < MAX_FRAME_SKIP {
                    self.level += 1;
                }
            }
        }

        match self.level.cmp(&before) {
            std::cmp::Ordering::Less => {
                debug!("speed {speed}%: frame skip lowered to {}", self.level);
                SkipChange::Lowered
            }
            std::cmp::Ordering::Greater => {
                debug!("speed {speed}%: frame skip raised to {}", self.level);
                SkipChange::Raised
            }
            std::cmp::Ordering::Equal => SkipChange::Held,
        }
    }
}

impl Default for CadenceController {
    fn default() -> Self {
        Self::new(true, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn speed_uses_truncating_integer_math() {
        // 1_000_000 / 60 = 16666, then / 166 = 100.
        assert_eq!(measure_speed(166, 60), 100);
        assert_eq!(measure_speed(167, 60), 99);
        assert_eq!(measure_speed(333, 60), 50);
        assert_eq!(measure_speed(0, 60), 100);
    }

    #[test]
    fn three_on_target_samples_lower_the_level() {
        let mut c = CadenceController::new(true, 4);
        assert_eq!(c.observe(166, 60, false), SkipChange::Held);
        assert_eq!(c.observe(166, 60, false), SkipChange::Held);
        assert_eq!(c.observe(166, 60, false), SkipChange::Lowered);
        assert_eq!(c.level(), 3);
        assert_eq!(c.accumulator(), 0);
    }

    #[test]
    fn mild_deficit_needs_two_samples() {
        let mut c = CadenceController::new(true, 0);
        // 1_000_000 / 60 / 190 = 87%
        assert_eq!(c.observe(190, 60, false), SkipChange::Held);
        assert_eq!(c.accumulator(), -1);
        assert_eq!(c.observe(190, 60, false), SkipChange::Raised);
        assert_eq!(c.level(), 1);
        assert_eq!(c.accumulator(), 0);
    }

    #[test]
    fn severe_deficit_drains_proportionally() {
        let mut c = CadenceController::new(true, 0);
        // 50%: ceil((90 - 50) / 5) = 8, one raise brings it back to -6.
        assert_eq!(c.observe(333, 60, false), SkipChange::Raised);
        assert_eq!(c.accumulator(), -6);
        // 79%: ceil(11 / 5) = 3.
        let mut c = CadenceController::new(true, 0);
        let elapsed = 16666 / 79;
        assert_eq!(measure_speed(elapsed, 60), 79);
        c.observe(elapsed, 60, false);
        assert_eq!(c.accumulator(), -1);
        assert_eq!(c.level(), 1);
    }

    #[test]
    fn level_saturates_at_nine() {
        let mut c = CadenceController::new(true, MAX_FRAME_SKIP);
        for _ in 0..20 {
            c.observe(1000, 60, false);
            assert!(c.level() <= MAX_FRAME_SKIP);
        }
        assert_eq!(c.level(), MAX_FRAME_SKIP);
    }

    #[test]
    fn paused_sample_is_discarded() {
        let mut c = CadenceController::new(true, 3);
        let t0 = Instant::now();
        c.start(t0);
        c.note_pause();
        let change = c.tick(t0 + Duration::from_secs(5), 60);
        assert_eq!(change, SkipChange::Paused);
        assert_eq!(c.level(), 3);
        assert_eq!(c.accumulator(), 0);
    }

    #[test]
    fn manual_mode_never_adjusts() {
        let mut c = CadenceController::new(false, 2);
        assert_eq!(c.observe(5000, 60, false), SkipChange::Manual);
        assert_eq!(c.level(), 2);
        assert_eq!(c.last_speed(), Some(3));
    }

    #[test]
    fn render_pattern_follows_level() {
        let mut c = CadenceController::new(false, 0);
        assert!((0..5).all(|f| c.should_render(f)));
        c.set_level(2);
        let rendered: Vec<u64> = (0..7).filter(|&f| c.should_render(f)).collect();
        assert_eq!(rendered, vec![0, 3, 6]);
    }
}
