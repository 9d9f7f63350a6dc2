//! Mapping between the persisted scroll speed class and the continuous
//! percent value driving the speed control.
//!
//! The internal rate unit is "ticks per unit": milliseconds spent per
//! pixel of scroll range, so a higher tick value scrolls slower. The
//! class is a lossy compression of the percent; class -> percent ->
//! class is the identity, the other direction is not.

use crate::db::models::ScrollSpeed;

/// Percent change per press of the speed control.
pub const SPEED_STEP: i32 = 5;

/// Slowest rate the control can reach, in ticks (ms per pixel).
const MIN_TICKS: i64 = 5;

/// Fixed rate table for the persisted classes.
pub fn ticks_for_class(class: ScrollSpeed) -> i64 {
    match class {
        ScrollSpeed::Slow => 50,
        ScrollSpeed::Medium => 30,
        ScrollSpeed::Fast => 15,
    }
}

pub fn percent_for_class(class: ScrollSpeed) -> u8 {
    let ticks = ticks_for_class(class);
    (((100 - ticks) as f64) / 5.0).round() as u8
}

/// Inverse of the percent display formula. Clamped so a maxed-out
/// control still yields a positive scroll duration.
pub fn ticks_for_percent(percent: u8) -> i64 {
    (100 - 5 * i64::from(percent)).max(MIN_TICKS)
}

/// Quantize a rate back to a persisted class. Thresholds are on the
/// tick value, not the percent.
pub fn class_for_ticks(ticks: i64) -> ScrollSpeed {
    if ticks <= 20 {
        ScrollSpeed::Fast
    } else if ticks <= 35 {
        ScrollSpeed::Medium
    } else {
        ScrollSpeed::Slow
    }
}

pub fn clamp_percent(value: i32) -> u8 {
    value.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_percent_round_trip() {
        for class in [ScrollSpeed::Slow, ScrollSpeed::Medium, ScrollSpeed::Fast] {
            let percent = percent_for_class(class);
            let ticks = ticks_for_percent(percent);
            assert_eq!(class_for_ticks(ticks), class, "round trip for {:?}", class);
        }
    }

    #[test]
    fn test_medium_opens_at_fourteen_percent() {
        assert_eq!(percent_for_class(ScrollSpeed::Medium), 14);
    }

    #[test]
    fn test_slow_and_fast_percents() {
        assert_eq!(percent_for_class(ScrollSpeed::Slow), 10);
        assert_eq!(percent_for_class(ScrollSpeed::Fast), 17);
    }

    #[test]
    fn test_quantize_thresholds() {
        assert_eq!(class_for_ticks(18), ScrollSpeed::Fast);
        assert_eq!(class_for_ticks(20), ScrollSpeed::Fast);
        assert_eq!(class_for_ticks(21), ScrollSpeed::Medium);
        assert_eq!(class_for_ticks(35), ScrollSpeed::Medium);
        assert_eq!(class_for_ticks(36), ScrollSpeed::Slow);
        assert_eq!(class_for_ticks(100), ScrollSpeed::Slow);
    }

    #[test]
    fn test_clamp_percent() {
        assert_eq!(clamp_percent(-40), 0);
        assert_eq!(clamp_percent(0), 0);
        assert_eq!(clamp_percent(63), 63);
        assert_eq!(clamp_percent(100), 100);
        assert_eq!(clamp_percent(1_000), 100);
    }

    #[test]
    fn test_ticks_never_drop_below_minimum() {
        for percent in 0..=100u8 {
            assert!(ticks_for_percent(percent) >= MIN_TICKS);
        }
    }
}
