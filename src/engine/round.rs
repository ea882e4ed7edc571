use std::time::Duration;

use super::Difficulty;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome
{
    Correct,
    Incorrect,
    TimedOut,
}

/// The verdict on one submission. Produced by a validator, consumed once by the scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult
{
    pub outcome: Outcome,
    pub difficulty: Difficulty,
    pub elapsed: Duration,
    pub hints_used: u32,
    pub attempts_used: u32,
    pub attempts_left: u32,
}

impl RoundResult
{
    pub fn correct(&self) -> bool
    {
        self.outcome == Outcome::Correct
    }

    /// A final result closes the round: solved, timed out, or out of attempts.
    pub fn is_final(&self) -> bool
    {
        match self.outcome {
            Outcome::Correct | Outcome::TimedOut => true,
            Outcome::Incorrect => self.attempts_left == 0,
        }
    }

    /// A first-try solve with no hints, for games without guesses.
    pub fn solved(difficulty: Difficulty, elapsed: Duration) -> Self
    {
        Self {
            outcome: Outcome::Correct,
            difficulty,
            elapsed,
            hints_used: 0,
            attempts_used: 1,
            attempts_left: 0,
        }
    }

    pub fn timed_out(
        difficulty: Difficulty,
        elapsed: Duration,
        hints_used: u32,
        attempts_used: u32,
    ) -> Self
    {
        Self {
            outcome: Outcome::TimedOut,
            difficulty,
            elapsed,
            hints_used,
            attempts_used,
            attempts_left: 0,
        }
    }
}

/// Attempt bookkeeping shared by every validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempts
{
    used: u32,
    budget: u32,
}

impl Attempts
{
    pub fn new(budget: u32) -> Self
    {
        Self { used: 0, budget }
    }

    pub fn used(&self) -> u32
    {
        self.used
    }

    pub fn budget(&self) -> u32
    {
        self.budget
    }

    pub fn left(&self) -> u32
    {
        self.budget.saturating_sub(self.used)
    }

    /// Spends one attempt, or returns `None` once the budget is gone.
    pub fn spend(&mut self) -> Option<u32>
    {
        if self.used >= self.budget {
            return None;
        }
        self.used += 1;
        Some(self.used)
    }
}
