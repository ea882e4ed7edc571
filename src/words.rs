use std::fs;
use std::path::Path;

use log::{info, warn};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::cipher::normalize_word;
use crate::engine::Difficulty;
use crate::error::AppError;

const BUILTIN: &[&str] = &[
    "code",
    "key",
    "spy",
    "map",
    "clue",
    "lock",
    "safe",
    "vault",
    "agent",
    "radio",
    "token",
    "python",
    "cipher",
    "puzzle",
    "secret",
    "signal",
    "shadow",
    "decoder",
    "message",
    "mystery",
    "password",
    "keyboard",
    "alphabet",
    "algorithm",
    "encrypted",
    "scrambled",
    "invisible",
    "cryptogram",
    "labyrinth",
    "steganography",
];

/// Answers for cipher rounds, bucketed by length at pick time.
#[derive(Debug, Clone)]
pub struct WordBank
{
    words: Vec<String>,
}

impl WordBank
{
    pub fn builtin() -> Self
    {
        Self {
            words: BUILTIN.iter().map(|word| word.to_string()).collect(),
        }
    }

    /// Reads one word or phrase per line. Blank lines are skipped quietly,
    /// lines that are not letters and spaces are skipped with a warning.
    pub fn load(path: &Path) -> Result<Self, AppError>
    {
        let text = fs::read_to_string(path).map_err(|source| AppError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut words = Vec::new();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match normalize_word(line) {
                Ok(word) => words.push(word),
                Err(err) => warn!("{}:{}: skipping line: {err}", path.display(), number + 1),
            }
        }

        if words.is_empty() {
            warn!("{} has no usable words, using the built-in list", path.display());
            return Ok(Self::builtin());
        }
        info!("loaded {} words from {}", words.len(), path.display());
        Ok(Self { words })
    }

    /// Built-in list, or the file at `path` when one is configured.
    pub fn from_settings(path: Option<&Path>) -> Result<Self, AppError>
    {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn len(&self) -> usize
    {
        self.words.len()
    }

    /// Easy words are 3-5 letters, medium 6-8 and hard 9 or more. Falls back
    /// to the whole bank when no word fits.
    pub fn pick<R: Rng + ?Sized>(&self, difficulty: Difficulty, rng: &mut R) -> &str
    {
        let fits: Vec<&String> = self
            .words
            .iter()
            .filter(|word| fits_difficulty(word, difficulty))
            .collect();
        let chosen = if fits.is_empty() {
            self.words.choose(rng)
        } else {
            fits.choose(rng).copied()
        };
        chosen.map(String::as_str).unwrap_or("cipher")
    }
}

fn fits_difficulty(word: &str, difficulty: Difficulty) -> bool
{
    let letters = word.chars().filter(|ch| *ch != ' ').count();
    match difficulty {
        Difficulty::Easy => (3..=5).contains(&letters),
        Difficulty::Medium => (6..=8).contains(&letters),
        Difficulty::Hard => letters >= 9,
    }
}
