use std::time::Duration;

use log::debug;

use super::{Difficulty, Outcome, RoundResult};
use crate::config::{Progression, ScoringConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreDelta
{
    pub correct: bool,
    pub base: u32,
    pub speed: u32,
    pub streak: u32,
    /// Taken off the round clock; only wrong answers carry one.
    pub penalty: Duration,
}

impl ScoreDelta
{
    pub fn total(&self) -> u32
    {
        if !self.correct {
            return 0;
        }
        self.base + self.speed + self.streak
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState
{
    pub score: u64,
    pub streak: u32,
    pub best_streak: u32,
    pub solved: u32,
    pub rounds_played: u32,
    pub difficulty: Difficulty,
    pub time_remaining: Option<Duration>,
}

impl SessionState
{
    fn new(difficulty: Difficulty, session_time: Option<Duration>) -> Self
    {
        Self {
            score: 0,
            streak: 0,
            best_streak: 0,
            solved: 0,
            rounds_played: 0,
            difficulty,
            time_remaining: session_time,
        }
    }

    pub fn out_of_time(&self) -> bool
    {
        self.time_remaining.is_some_and(|left| left.is_zero())
    }
}

/// Owns one player's `SessionState` for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct Scorer
{
    rules: ScoringConfig,
    progression: Progression,
    floor: Difficulty,
    state: SessionState,
}

impl Scorer
{
    pub fn new(
        rules: ScoringConfig,
        progression: Progression,
        floor: Difficulty,
        session_time: Option<Duration>,
    ) -> Self
    {
        Self {
            state: SessionState::new(floor, session_time),
            rules,
            progression,
            floor,
        }
    }

    pub fn state(&self) -> &SessionState
    {
        &self.state
    }

    pub fn base_points(&self, difficulty: Difficulty) -> u32
    {
        self.rules.base_points.get(difficulty)
    }

    pub fn speed_bonus(&self, time_limit: Duration, elapsed: Duration) -> u32
    {
        let left = time_limit.saturating_sub(elapsed).as_secs_f64();
        let bonus = (left * self.rules.speed_bonus_per_sec.max(0.0)).floor();
        bonus as u32
    }

    fn streak_bonus(&self, streak: u32) -> u32
    {
        if self.rules.streak_threshold == 0 || streak < self.rules.streak_threshold {
            return 0;
        }
        let steps = streak / self.rules.streak_threshold;
        self.rules
            .streak_step
            .saturating_mul(steps)
            .min(self.rules.streak_cap)
    }

    pub fn score_round(
        &self,
        result: &RoundResult,
        time_limit: Duration,
        elapsed: Duration,
    ) -> ScoreDelta
    {
        if !result.correct() {
            return ScoreDelta {
                penalty: self.penalty_for(result),
                ..ScoreDelta::default()
            };
        }
        ScoreDelta {
            correct: true,
            base: self.base_points(result.difficulty),
            speed: self.speed_bonus(time_limit, elapsed),
            streak: self.streak_bonus(self.state.streak + 1),
            penalty: Duration::ZERO,
        }
    }

    /// Time taken off the round clock for a wrong answer.
    pub fn penalty_for(&self, result: &RoundResult) -> Duration
    {
        match result.outcome {
            Outcome::Incorrect => self.rules.wrong_answer_penalty(),
            Outcome::Correct | Outcome::TimedOut => Duration::ZERO,
        }
    }

    pub fn apply(&mut self, delta: ScoreDelta) -> &SessionState
    {
        let state = &mut self.state;
        state.rounds_played += 1;
        if delta.correct {
            state.score += u64::from(delta.total());
            state.streak += 1;
            state.best_streak = state.best_streak.max(state.streak);
            state.solved += 1;
            state.difficulty = self.progression.difficulty_for(state.solved, self.floor);
        } else {
            state.streak = 0;
        }
        debug!(
            "applied delta {:?}: score {} streak {} difficulty {}",
            delta, state.score, state.streak, state.difficulty
        );
        &self.state
    }

    /// Runs the player's session clock down, if there is one.
    pub fn drain(&mut self, elapsed: Duration)
    {
        if let Some(left) = self.state.time_remaining.as_mut() {
            *left = left.saturating_sub(elapsed);
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::engine::Outcome;

    fn rules() -> ScoringConfig
    {
        ScoringConfig {
            speed_bonus_per_sec: 2.0,
            ..ScoringConfig::default()
        }
    }

    fn scorer() -> Scorer
    {
        Scorer::new(rules(), Progression::default(), Difficulty::Easy, None)
    }

    fn result(outcome: Outcome, difficulty: Difficulty) -> RoundResult
    {
        RoundResult {
            outcome,
            difficulty,
            elapsed: Duration::from_secs(10),
            hints_used: 0,
            attempts_used: 1,
            attempts_left: 2,
        }
    }

    #[test]
    fn base_plus_speed_bonus()
    {
        let scorer = scorer();
        let delta = scorer.score_round(
            &result(Outcome::Correct, Difficulty::Easy),
            Duration::from_secs(30),
            Duration::from_secs(10),
        );
        assert_eq!(delta.base, 100);
        assert_eq!(delta.speed, 40);
        assert_eq!(delta.streak, 0);
        assert_eq!(delta.total(), 140);
    }

    #[test]
    fn speed_bonus_never_negative()
    {
        let scorer = scorer();
        assert_eq!(
            scorer.speed_bonus(Duration::from_secs(30), Duration::from_secs(45)),
            0
        );
    }

    #[test]
    fn base_points_grow_with_difficulty()
    {
        let scorer = scorer();
        let limit = Duration::from_secs(30);
        let elapsed = Duration::from_secs(10);
        let totals: Vec<u32> = Difficulty::ALL
            .iter()
            .map(|d| {
                scorer
                    .score_round(&result(Outcome::Correct, *d), limit, elapsed)
                    .total()
            })
            .collect();
        assert!(totals[0] <= totals[1] && totals[1] <= totals[2]);
    }

    #[test]
    fn incorrect_result_awards_nothing_and_resets_streak()
    {
        let mut scorer = scorer();
        let limit = Duration::from_secs(30);
        for _ in 0..4 {
            let delta = scorer.score_round(
                &result(Outcome::Correct, Difficulty::Easy),
                limit,
                Duration::from_secs(5),
            );
            scorer.apply(delta);
        }
        assert_eq!(scorer.state().streak, 4);
        let before = scorer.state().score;

        let delta = scorer.score_round(
            &result(Outcome::Incorrect, Difficulty::Easy),
            limit,
            Duration::from_secs(5),
        );
        assert_eq!(delta.total(), 0);
        let state = scorer.apply(delta);
        assert_eq!(state.streak, 0);
        assert_eq!(state.best_streak, 4);
        assert_eq!(state.score, before);
        assert_eq!(state.rounds_played, 5);
    }

    #[test]
    fn streak_bonus_kicks_in_at_threshold()
    {
        let mut scorer = scorer();
        let limit = Duration::from_secs(30);
        let mut bonuses = Vec::new();
        for _ in 0..6 {
            let delta = scorer.score_round(
                &result(Outcome::Correct, Difficulty::Easy),
                limit,
                limit,
            );
            bonuses.push(delta.streak);
            scorer.apply(delta);
        }
        assert_eq!(bonuses, vec![0, 0, 50, 50, 50, 100]);
    }

    #[test]
    fn streak_bonus_is_capped()
    {
        let mut scorer = Scorer::new(
            ScoringConfig {
                streak_threshold: 1,
                streak_step: 200,
                streak_cap: 300,
                ..ScoringConfig::default()
            },
            Progression::default(),
            Difficulty::Easy,
            None,
        );
        let limit = Duration::from_secs(30);
        let mut last = 0;
        for _ in 0..3 {
            let delta = scorer.score_round(
                &result(Outcome::Correct, Difficulty::Easy),
                limit,
                limit,
            );
            last = delta.streak;
            scorer.apply(delta);
        }
        assert_eq!(last, 300);
    }

    #[test]
    fn difficulty_pointer_follows_progression()
    {
        let mut scorer = scorer();
        let limit = Duration::from_secs(30);
        for _ in 0..5 {
            let delta = scorer.score_round(
                &result(Outcome::Correct, Difficulty::Easy),
                limit,
                limit,
            );
            scorer.apply(delta);
        }
        assert_eq!(scorer.state().difficulty, Difficulty::Medium);
    }

    #[test]
    fn drain_counts_the_session_clock_down()
    {
        let mut scorer = Scorer::new(
            rules(),
            Progression::default(),
            Difficulty::Easy,
            Some(Duration::from_secs(10)),
        );
        scorer.drain(Duration::from_secs(4));
        assert_eq!(scorer.state().time_remaining, Some(Duration::from_secs(6)));
        scorer.drain(Duration::from_secs(20));
        assert!(scorer.state().out_of_time());
    }

    #[test]
    fn penalty_only_for_wrong_answers()
    {
        let scorer = Scorer::new(
            ScoringConfig {
                wrong_answer_penalty_secs: 5,
                ..ScoringConfig::default()
            },
            Progression::default(),
            Difficulty::Easy,
            None,
        );
        assert_eq!(
            scorer.penalty_for(&result(Outcome::Incorrect, Difficulty::Easy)),
            Duration::from_secs(5)
        );
        assert_eq!(
            scorer.penalty_for(&result(Outcome::Correct, Difficulty::Easy)),
            Duration::ZERO
        );
        assert_eq!(
            scorer.penalty_for(&result(Outcome::TimedOut, Difficulty::Easy)),
            Duration::ZERO
        );

        let limit = Duration::from_secs(30);
        let delta = scorer.score_round(
            &result(Outcome::Incorrect, Difficulty::Easy),
            limit,
            Duration::from_secs(5),
        );
        assert_eq!(delta.penalty, Duration::from_secs(5));
        assert_eq!(delta.total(), 0);
        let delta = scorer.score_round(
            &result(Outcome::Correct, Difficulty::Easy),
            limit,
            Duration::from_secs(5),
        );
        assert_eq!(delta.penalty, Duration::ZERO);
    }
}
