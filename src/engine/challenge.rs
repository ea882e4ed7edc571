use std::time::Duration;

use rand::Rng;

use super::{Difficulty, RoundResult};
use crate::config::GameConfig;
use crate::error::EngineError;

/// The capability set every question-and-answer game offers to the session.
pub trait ChallengeProvider
{
    type Round;

    fn title(&self) -> &'static str;

    fn config(&self) -> &GameConfig;

    fn generate<R: Rng + ?Sized>(
        &mut self,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Result<Self::Round, EngineError>;

    fn validate(
        &self,
        round: &mut Self::Round,
        guess: &str,
        elapsed: Duration,
    ) -> Result<RoundResult, EngineError>;

    fn hint(&self, round: &mut Self::Round) -> Result<String, EngineError>;

    /// Lines describing the round, `shown_for` after it was presented.
    fn prompt(&self, round: &Self::Round, shown_for: Duration) -> Vec<String>;

    fn answer(&self, round: &Self::Round) -> String;

    fn difficulty(&self, round: &Self::Round) -> Difficulty;

    fn hints_used(&self, round: &Self::Round) -> u32;

    fn attempts_used(&self, round: &Self::Round) -> u32;

    fn time_limit(&self, difficulty: Difficulty) -> Duration
    {
        self.config().time_limit(difficulty)
    }
}
