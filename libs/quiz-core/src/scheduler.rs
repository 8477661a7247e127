//! Review-state transitions and due-question selection.

use crate::algorithm::sm2::Sm2;
use crate::algorithm::{Outcome, SchedulingResult, SpacedRepetitionAlgorithm};
use crate::clock::{Clock, SystemClock};
use crate::error::StoreResult;
use crate::store::ReviewStore;
use crate::types::{ReviewState, StoredQuestion, StudyMode};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Upper bound on the candidates considered for one selection.
pub const CANDIDATE_WINDOW: usize = 100;

/// Applies the spaced-repetition algorithm with an injected clock.
pub struct Scheduler {
    algorithm: Box<dyn SpacedRepetitionAlgorithm>,
    clock: Box<dyn Clock>,
}

impl Scheduler {
    /// SM-2 scheduler reading time from `clock`.
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self::with_algorithm(Sm2::default(), clock)
    }

    pub fn with_algorithm(
        algorithm: impl SpacedRepetitionAlgorithm + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            algorithm: Box::new(algorithm),
            clock: Box::new(clock),
        }
    }

    /// SM-2 scheduler on the wall clock.
    pub fn system() -> Self {
        Self::new(SystemClock)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// State for a question registered now.
    pub fn initial_state(&self) -> ReviewState {
        self.algorithm.initial_state(self.now())
    }

    /// Transition `state` for an answer given now.
    pub fn apply(&self, state: &ReviewState, outcome: Outcome) -> SchedulingResult {
        self.algorithm.schedule(state, outcome, self.now())
    }

    /// Pick the next question to present.
    ///
    /// Review mode returns the earliest-due candidate, or `None` when
    /// everything is caught up. Random mode draws from the due window and
    /// widens to every registered question when nothing is due.
    /// Questions in `exclude` are never returned.
    pub fn next_question<S, R>(
        &self,
        store: &S,
        mode: StudyMode,
        source: Option<&str>,
        exclude: &HashSet<i64>,
        rng: &mut R,
    ) -> StoreResult<Option<StoredQuestion>>
    where
        S: ReviewStore + ?Sized,
        R: Rng + ?Sized,
    {
        // Over-fetch so excluded ids cannot crowd due questions out of the window.
        let due: Vec<StoredQuestion> = store
            .get_due(source, self.now(), CANDIDATE_WINDOW + exclude.len())?
            .into_iter()
            .filter(|q| !exclude.contains(&q.id))
            .take(CANDIDATE_WINDOW)
            .collect();

        match mode {
            StudyMode::Review => Ok(due.into_iter().next()),
            StudyMode::Random => {
                let pool = if due.is_empty() {
                    store
                        .list_questions(source)?
                        .into_iter()
                        .filter(|q| !exclude.contains(&q.id))
                        .collect()
                } else {
                    due
                };
                Ok(pool.choose(rng).cloned())
            }
        }
    }
}

/// Due ordering: earliest next-due first, then higher difficulty, then lower id.
pub fn due_order(a: &StoredQuestion, b: &StoredQuestion) -> Ordering {
    a.state
        .next_due
        .cmp(&b.state.next_due)
        .then_with(|| b.state.difficulty.total_cmp(&a.state.difficulty))
        .then_with(|| a.id.cmp(&b.id))
}

/// Keep the due questions, ordered by [`due_order`], at most `limit` of them.
pub fn select_due<I>(questions: I, now: DateTime<Utc>, limit: usize) -> Vec<StoredQuestion>
where
    I: IntoIterator<Item = StoredQuestion>,
{
    let mut due: Vec<StoredQuestion> = questions
        .into_iter()
        .filter(|q| q.state.is_due(now))
        .collect();
    due.sort_by(due_order);
    due.truncate(limit);
    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::{register_all, MemoryStore};
    use crate::types::Question;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap()
    }

    fn stored(id: i64, next_due: DateTime<Utc>, difficulty: f64) -> StoredQuestion {
        StoredQuestion {
            id,
            question: Question::free_text("s", id.to_string(), "prompt", "answer"),
            state: ReviewState {
                difficulty,
                last_reviewed: Some(next_due - Duration::days(1)),
                ..ReviewState::new(next_due)
            },
        }
    }

    #[test]
    fn due_order_breaks_ties_by_difficulty() {
        let t = at(10);
        let questions = vec![
            stored(1, t, 1.0),
            stored(2, t, 3.0),
            stored(3, t + Duration::days(1), 2.0),
        ];
        let ordered = select_due(questions, t + Duration::days(2), 10);
        let ids: Vec<i64> = ordered.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn select_due_skips_future_and_truncates() {
        let now = at(10);
        let questions = vec![
            stored(1, now + Duration::days(1), 2.5),
            stored(2, now - Duration::days(3), 2.5),
            stored(3, now, 2.5),
        ];
        let due = select_due(questions, now, 1);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, 2);
    }

    #[test]
    fn apply_uses_injected_clock() {
        let clock = ManualClock::new(at(1));
        let scheduler = Scheduler::new(clock.clone());
        let state = scheduler.initial_state();
        assert_eq!(state.next_due, at(1));

        clock.advance(Duration::days(4));
        let result = scheduler.apply(&state, Outcome::Correct);
        assert_eq!(result.new_state.last_reviewed, Some(at(5)));
        assert_eq!(result.next_due, at(6));
    }

    #[test]
    fn excluded_questions_do_not_fill_the_window() {
        let scheduler = Scheduler::new(ManualClock::new(at(1)));
        let mut store = MemoryStore::new();
        let questions: Vec<Question> = (0..CANDIDATE_WINDOW + 5)
            .map(|i| Question::free_text("bulk", i.to_string(), "prompt", "answer"))
            .collect();
        let ids = register_all(&mut store, &scheduler, &questions).unwrap();
        let exclude: HashSet<i64> = ids[..CANDIDATE_WINDOW + 1].iter().copied().collect();
        let mut rng = StdRng::seed_from_u64(3);

        let next = scheduler
            .next_question(&store, StudyMode::Review, None, &exclude, &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(next.id, ids[CANDIDATE_WINDOW + 1]);

        let random = scheduler
            .next_question(&store, StudyMode::Random, None, &exclude, &mut rng)
            .unwrap()
            .unwrap();
        assert!(!exclude.contains(&random.id));
    }
}
