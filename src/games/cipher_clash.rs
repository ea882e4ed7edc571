use std::time::Duration;

use log::warn;
use rand::Rng;

use crate::cipher::{CipherEngine, CipherKind, Puzzle, random_kind};
use crate::config::GameConfig;
use crate::engine::{ChallengeProvider, Difficulty, RoundResult};
use crate::error::EngineError;
use crate::words::WordBank;

/// Decode the hidden word: a word from the bank under a random cipher.
pub struct CipherClash
{
    engine: CipherEngine,
    words: WordBank,
    forced: Option<CipherKind>,
}

impl CipherClash
{
    pub fn new(config: GameConfig, words: WordBank, forced: Option<CipherKind>) -> Self
    {
        Self {
            engine: CipherEngine::new(config),
            words,
            forced,
        }
    }
}

impl ChallengeProvider for CipherClash
{
    type Round = Puzzle;

    fn title(&self) -> &'static str
    {
        "Cipher Clash"
    }

    fn config(&self) -> &GameConfig
    {
        self.engine.config()
    }

    fn generate<R: Rng + ?Sized>(
        &mut self,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Result<Puzzle, EngineError>
    {
        let word = self.words.pick(difficulty, rng).to_string();
        let kind = self.forced.unwrap_or_else(|| random_kind(difficulty, rng));
        match self.engine.generate(&word, kind, difficulty, rng) {
            Err(EngineError::Unjumblable(_)) => {
                warn!("'{word}' cannot be jumbled, using a caesar shift instead");
                self.engine
                    .generate(&word, CipherKind::Caesar, difficulty, rng)
            }
            other => other,
        }
    }

    fn validate(
        &self,
        round: &mut Puzzle,
        guess: &str,
        elapsed: Duration,
    ) -> Result<RoundResult, EngineError>
    {
        self.engine.validate(round, guess, elapsed)
    }

    fn hint(&self, round: &mut Puzzle) -> Result<String, EngineError>
    {
        self.engine.reveal_hint(round).map(|hint| hint.to_string())
    }

    fn prompt(&self, round: &Puzzle, _shown_for: Duration) -> Vec<String>
    {
        let encoded = match round.kind() {
            CipherKind::Morse | CipherKind::Binary => round.encoded().to_string(),
            _ => round.encoded().to_uppercase(),
        };
        vec![
            format!("Cipher: {}", round.kind().display_name()),
            format!("Encoded: {encoded}"),
            format!(
                "Answer:  {}",
                round.masked_answer().to_uppercase().replace('_', "_ ").trim_end()
            ),
            String::new(),
            format!(
                "Attempts left: {}   Hints left: {}",
                round.attempts_left(),
                round.hints_left()
            ),
        ]
    }

    fn answer(&self, round: &Puzzle) -> String
    {
        round.answer().to_string()
    }

    fn difficulty(&self, round: &Puzzle) -> Difficulty
    {
        round.difficulty()
    }

    fn hints_used(&self, round: &Puzzle) -> u32
    {
        round.hints_used()
    }

    fn attempts_used(&self, round: &Puzzle) -> u32
    {
        round.attempts_used()
    }
}
