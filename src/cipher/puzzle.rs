use std::fmt;
use std::time::Duration;

use log::debug;

use super::{Cipher, CipherKind, normalize, normalize_word};
use crate::config::{GameConfig, HintMode};
use crate::engine::{Attempts, Difficulty, Outcome, RoundResult};
use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hint
{
    Letter { position: usize, letter: char },
    Key(String),
}

impl fmt::Display for Hint
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Hint::Letter { position, letter } => write!(
                f,
                "Letter {} is '{}'",
                position + 1,
                letter.to_ascii_uppercase()
            ),
            Hint::Key(text) => f.write_str(text),
        }
    }
}

/// One encoded challenge, its answer, and the per-round counters.
#[derive(Debug, Clone)]
pub struct Puzzle
{
    answer: String,
    encoded: String,
    cipher: Cipher,
    difficulty: Difficulty,
    attempts: Attempts,
    hint_budget: u32,
    hint_mode: HintMode,
    hints_used: u32,
    revealed: Vec<usize>,
    key_revealed: bool,
    solved: bool,
}

impl Puzzle
{
    /// Builds a puzzle from an explicit cipher key.
    pub fn with_cipher(
        word: &str,
        cipher: Cipher,
        difficulty: Difficulty,
        config: &GameConfig,
    ) -> Result<Self, EngineError>
    {
        let answer = normalize_word(word)?;
        let encoded = cipher.encode(&answer);
        Ok(Self {
            answer,
            encoded,
            cipher,
            difficulty,
            attempts: Attempts::new(config.attempt_budget),
            hint_budget: config.hint_budget,
            hint_mode: config.hint_mode,
            hints_used: 0,
            revealed: Vec::new(),
            key_revealed: false,
            solved: false,
        })
    }

    pub fn answer(&self) -> &str
    {
        &self.answer
    }

    pub fn encoded(&self) -> &str
    {
        &self.encoded
    }

    pub fn kind(&self) -> CipherKind
    {
        self.cipher.kind()
    }

    pub fn difficulty(&self) -> Difficulty
    {
        self.difficulty
    }

    pub fn hints_used(&self) -> u32
    {
        self.hints_used
    }

    pub fn hints_left(&self) -> u32
    {
        self.hint_budget.saturating_sub(self.hints_used)
    }

    pub fn attempts_used(&self) -> u32
    {
        self.attempts.used()
    }

    pub fn attempts_left(&self) -> u32
    {
        self.attempts.left()
    }

    /// Runs the inverse transform over the encoded text.
    pub fn decode(&self) -> Result<String, EngineError>
    {
        self.cipher.decode(&self.encoded)
    }

    /// The answer with unrevealed letters shown as `_`.
    pub fn masked_answer(&self) -> String
    {
        self.answer
            .char_indices()
            .map(|(i, ch)| {
                if ch == ' ' || self.revealed.contains(&i) {
                    ch
                } else {
                    '_'
                }
            })
            .collect()
    }

    pub fn validate(&mut self, guess: &str, elapsed: Duration) -> Result<RoundResult, EngineError>
    {
        if self.solved {
            return Err(EngineError::AlreadySolved);
        }
        let budget = self.attempts.budget();
        self.attempts
            .spend()
            .ok_or(EngineError::AttemptsExhausted { budget })?;

        let correct = normalize(guess) == self.answer;
        self.solved = correct;
        debug!(
            "{} guess {}/{}: {}",
            self.kind(),
            self.attempts.used(),
            budget,
            if correct { "correct" } else { "wrong" }
        );

        Ok(RoundResult {
            outcome: if correct {
                Outcome::Correct
            } else {
                Outcome::Incorrect
            },
            difficulty: self.difficulty,
            elapsed,
            hints_used: self.hints_used,
            attempts_used: self.attempts.used(),
            attempts_left: self.attempts.left(),
        })
    }

    pub fn reveal_hint(&mut self) -> Result<Hint, EngineError>
    {
        let exhausted = EngineError::HintBudgetExhausted {
            budget: self.hint_budget,
        };
        if self.hints_used >= self.hint_budget {
            return Err(exhausted);
        }

        let hint = if self.hint_mode == HintMode::KeyThenLetters && !self.key_revealed {
            self.key_revealed = true;
            Hint::Key(self.cipher.describe_key(&self.answer))
        } else {
            let (position, letter) = self
                .answer
                .char_indices()
                .find(|(i, ch)| *ch != ' ' && !self.revealed.contains(i))
                .ok_or(exhausted)?;
            self.revealed.push(position);
            Hint::Letter { position, letter }
        };

        self.hints_used += 1;
        Ok(hint)
    }
}
