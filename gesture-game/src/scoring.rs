//! Challenge scoring.
use crate::constants::{ACCURACY_BONUS_SCALE, POINTS_PER_DIFFICULTY, TIME_BONUS_PER_SECOND};
use crate::numbers::round_f64_to_u32;

/// Points for one completed challenge.
///
/// `difficulty * 100`, plus ten points per second left on the clock (never
/// negative), plus up to 100 points for accuracy.
#[must_use]
pub fn score_challenge(difficulty: u32, time_limit: f64, completion_time: f64, accuracy: f64) -> u32 {
    let base = difficulty.saturating_mul(POINTS_PER_DIFFICULTY);
    base.saturating_add(time_bonus(time_limit, completion_time))
        .saturating_add(accuracy_bonus(accuracy))
}

/// Bonus for finishing under the limit; zero once the limit is reached.
#[must_use]
pub fn time_bonus(time_limit: f64, completion_time: f64) -> u32 {
    let remaining = time_limit - completion_time;
    if remaining.is_nan() || remaining <= 0.0 {
        return 0;
    }
    round_f64_to_u32(remaining * TIME_BONUS_PER_SECOND)
}

#[must_use]
pub fn accuracy_bonus(accuracy: f64) -> u32 {
    let accuracy = if accuracy.is_nan() {
        0.0
    } else {
        accuracy.clamp(0.0, 1.0)
    };
    round_f64_to_u32(accuracy * ACCURACY_BONUS_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_one_perfect_challenge_scores_285() {
        assert_eq!(score_challenge(1, 9.5, 1.0, 1.0), 285);
    }

    #[test]
    fn overtime_earns_no_time_bonus() {
        assert_eq!(time_bonus(5.0, 5.0), 0);
        assert_eq!(time_bonus(5.0, 7.5), 0);
        assert_eq!(score_challenge(4, 5.0, 9.0, 0.0), 400);
    }

    #[test]
    fn accuracy_bonus_is_clamped() {
        assert_eq!(accuracy_bonus(1.7), 100);
        assert_eq!(accuracy_bonus(-0.2), 0);
        assert_eq!(accuracy_bonus(0.256), 26);
        assert_eq!(accuracy_bonus(f64::NAN), 0);
    }

    #[test]
    fn faster_and_more_accurate_never_scores_less() {
        let slow = score_challenge(2, 8.0, 6.0, 0.5);
        let fast = score_challenge(2, 8.0, 2.0, 0.5);
        let precise = score_challenge(2, 8.0, 2.0, 0.9);
        assert!(fast > slow);
        assert!(precise > fast);
    }
}
