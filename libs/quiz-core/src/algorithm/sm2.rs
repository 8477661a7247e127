//! SM-2 spaced repetition algorithm.
//!
//! Correct answers grow the interval 1 → 6 → ⌊interval × ease⌋ days and nudge
//! the ease factor by a bonus derived from the question's difficulty.
//! Incorrect answers reset the streak and lower the ease factor.

use super::{Outcome, SchedulingResult, SpacedRepetitionAlgorithm};
use crate::types::ReviewState;
use chrono::{DateTime, Duration, Utc};

/// SM-2 algorithm with configurable parameters.
#[derive(Debug, Clone)]
pub struct Sm2 {
    pub initial_ease: f64,
    pub minimum_ease: f64,
    pub lapse_penalty: f64,
    pub first_interval: u32,
    pub second_interval: u32,
    /// Upper bound for any interval, in days.
    pub maximum_interval: u32,
    /// Difficulty at which the ease bonus is neutral-to-positive.
    pub difficulty_pivot: f64,
}

impl Default for Sm2 {
    fn default() -> Self {
        Self {
            initial_ease: 2.5,
            minimum_ease: 1.3,
            lapse_penalty: 0.2,
            first_interval: 1,
            second_interval: 6,
            maximum_interval: 36500,
            difficulty_pivot: 3.0,
        }
    }
}

impl SpacedRepetitionAlgorithm for Sm2 {
    fn initial_state(&self, now: DateTime<Utc>) -> ReviewState {
        ReviewState {
            ease_factor: self.initial_ease,
            ..ReviewState::new(now)
        }
    }

    fn schedule(&self, state: &ReviewState, outcome: Outcome, now: DateTime<Utc>) -> SchedulingResult {
        let (interval_days, repetitions, ease_factor) = match outcome {
            Outcome::Correct => self.schedule_correct(state),
            Outcome::Incorrect => (
                self.first_interval,
                0,
                (state.ease_factor - self.lapse_penalty).max(self.minimum_ease),
            ),
        };

        let interval_days = interval_days.min(self.maximum_interval);
        let next_due = now
            .checked_add_signed(Duration::days(i64::from(interval_days)))
            .unwrap_or(now);

        SchedulingResult {
            new_state: ReviewState {
                ease_factor,
                interval_days,
                repetitions,
                difficulty: state.difficulty,
                next_due,
                last_reviewed: Some(now),
            },
            next_due,
        }
    }
}

impl Sm2 {
    fn schedule_correct(&self, state: &ReviewState) -> (u32, u32, f64) {
        let interval = match state.repetitions {
            0 => self.first_interval,
            1 => self.second_interval,
            // Interval grows with the ease factor from before this answer.
            _ => ((f64::from(state.interval_days) * state.ease_factor).floor() as u32)
                .max(1)
                .min(self.maximum_interval),
        };
        let ease = (state.ease_factor + self.ease_bonus(state.difficulty)).max(self.minimum_ease);
        (interval, state.repetitions + 1, ease)
    }

    /// `0.1 - (p - d) * (0.08 + (p - d) * 0.02)` for pivot `p` and difficulty `d`.
    pub fn ease_bonus(&self, difficulty: f64) -> f64 {
        let gap = self.difficulty_pivot - difficulty;
        0.1 - gap * (0.08 + gap * 0.02)
    }
}
