//! Classical ciphers and the puzzles built from them.
//!
//! Every [`Cipher`] has an exact inverse: for any valid word `w`,
//! `cipher.decode(&cipher.encode(w)) == w`. [`CipherEngine::generate`] picks
//! a key for a kind and difficulty from an injected rng, so tests can seed
//! it and get the same puzzle back.

mod morse;
mod puzzle;
mod transform;

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

pub use puzzle::{Hint, Puzzle};
pub use transform::{BinaryFormat, Cipher};

use crate::config::GameConfig;
use crate::engine::{Difficulty, RoundResult};
use crate::error::EngineError;

const JUMBLE_TRIES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherKind
{
    Caesar,
    Substitution,
    Jumble,
    Morse,
    Binary,
    Vigenere,
}

impl CipherKind
{
    pub const ALL: [CipherKind; 6] = [
        CipherKind::Caesar,
        CipherKind::Substitution,
        CipherKind::Jumble,
        CipherKind::Morse,
        CipherKind::Binary,
        CipherKind::Vigenere,
    ];

    pub fn as_str(&self) -> &'static str
    {
        match self {
            CipherKind::Caesar => "caesar",
            CipherKind::Substitution => "substitution",
            CipherKind::Jumble => "jumble",
            CipherKind::Morse => "morse",
            CipherKind::Binary => "binary",
            CipherKind::Vigenere => "vigenere",
        }
    }

    pub fn display_name(&self) -> &'static str
    {
        match self {
            CipherKind::Caesar => "Caesar",
            CipherKind::Substitution => "Substitution",
            CipherKind::Jumble => "Jumble",
            CipherKind::Morse => "Morse",
            CipherKind::Binary => "Binary",
            CipherKind::Vigenere => "Vigenere",
        }
    }

    /// Kinds that show up at a difficulty when none is forced.
    pub fn pool(difficulty: Difficulty) -> &'static [CipherKind]
    {
        match difficulty {
            Difficulty::Easy => &[CipherKind::Caesar, CipherKind::Jumble, CipherKind::Morse],
            Difficulty::Medium => &[
                CipherKind::Caesar,
                CipherKind::Substitution,
                CipherKind::Jumble,
                CipherKind::Morse,
                CipherKind::Binary,
            ],
            Difficulty::Hard => &[
                CipherKind::Substitution,
                CipherKind::Jumble,
                CipherKind::Binary,
                CipherKind::Vigenere,
            ],
        }
    }
}

pub fn random_kind<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> CipherKind
{
    CipherKind::pool(difficulty)
        .choose(rng)
        .copied()
        .unwrap_or(CipherKind::Caesar)
}

impl fmt::Display for CipherKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.as_str())
    }
}

/// Trims, lower-cases and collapses inner whitespace.
pub fn normalize(text: &str) -> String
{
    text.split_whitespace()
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalizes `word` and checks it only holds letters and single spaces.
pub fn normalize_word(word: &str) -> Result<String, EngineError>
{
    let normalized = normalize(word);
    let valid = normalized.chars().any(|ch| ch.is_ascii_lowercase())
        && normalized
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch == ' ');
    if !valid {
        return Err(EngineError::InvalidWord(word.to_string()));
    }
    Ok(normalized)
}

/// Builds puzzles and answers guesses with the budgets from one `GameConfig`.
#[derive(Debug, Clone)]
pub struct CipherEngine
{
    config: GameConfig,
}

impl CipherEngine
{
    pub fn new(config: GameConfig) -> Self
    {
        Self { config }
    }

    pub fn config(&self) -> &GameConfig
    {
        &self.config
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        word: &str,
        kind: CipherKind,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Result<Puzzle, EngineError>
    {
        let answer = normalize_word(word)?;
        let cipher = random_cipher(kind, difficulty, &answer, rng)?;
        debug!("generated {kind} puzzle at {difficulty} for a {}-letter word", answer.len());
        let puzzle = Puzzle::with_cipher(&answer, cipher, difficulty, &self.config)?;
        if puzzle.decode()? != puzzle.answer() {
            return Err(EngineError::MalformedCiphertext {
                kind,
                reason: "ciphertext does not decode to the answer".to_string(),
            });
        }
        Ok(puzzle)
    }

    pub fn validate(
        &self,
        puzzle: &mut Puzzle,
        guess: &str,
        elapsed: Duration,
    ) -> Result<RoundResult, EngineError>
    {
        puzzle.validate(guess, elapsed)
    }

    pub fn reveal_hint(&self, puzzle: &mut Puzzle) -> Result<Hint, EngineError>
    {
        puzzle.reveal_hint()
    }
}

/// Picks a key for `kind` at `difficulty`. `answer` must already be normalized.
pub fn random_cipher<R: Rng + ?Sized>(
    kind: CipherKind,
    difficulty: Difficulty,
    answer: &str,
    rng: &mut R,
) -> Result<Cipher, EngineError>
{
    let cipher = match kind {
        CipherKind::Caesar => {
            let shift = match difficulty {
                Difficulty::Easy => rng.gen_range(1..=3),
                Difficulty::Medium => rng.gen_range(3..=7),
                Difficulty::Hard => rng.gen_range(5..=15),
            };
            Cipher::Caesar { shift }
        }
        CipherKind::Substitution => Cipher::Substitution {
            table: derangement(rng),
        },
        CipherKind::Jumble => Cipher::Jumble {
            order: jumble_order(answer, rng)?,
        },
        CipherKind::Morse => Cipher::Morse,
        CipherKind::Binary => Cipher::Binary {
            format: match difficulty {
                Difficulty::Easy => BinaryFormat::Spaced,
                Difficulty::Medium => BinaryFormat::Packed,
                Difficulty::Hard => BinaryFormat::Hex,
            },
        },
        CipherKind::Vigenere => {
            let len = match difficulty {
                Difficulty::Easy => 3,
                Difficulty::Medium => rng.gen_range(4..=5),
                Difficulty::Hard => rng.gen_range(6..=7),
            };
            let mut key: Vec<u8> = (0..len).map(|_| rng.gen_range(b'a'..=b'z')).collect();
            if key.iter().all(|&b| b == b'a') {
                key[0] = b'b';
            }
            Cipher::Vigenere {
                key: String::from_utf8_lossy(&key).into_owned(),
            }
        }
    };
    Ok(cipher)
}

/// A single 26-cycle (Sattolo), so no letter maps to itself.
fn derangement<R: Rng + ?Sized>(rng: &mut R) -> [u8; 26]
{
    let mut table: [u8; 26] = std::array::from_fn(|i| i as u8);
    for i in (1..table.len()).rev() {
        let j = rng.gen_range(0..i);
        table.swap(i, j);
    }
    table
}

fn jumble_order<R: Rng + ?Sized>(answer: &str, rng: &mut R) -> Result<Vec<usize>, EngineError>
{
    let chars: Vec<char> = answer.chars().collect();
    let identity: Vec<usize> = (0..chars.len()).collect();
    let letters: Vec<usize> = identity
        .iter()
        .copied()
        .filter(|&i| chars[i] != ' ')
        .collect();
    if letters.len() <= 1 {
        return Ok(identity);
    }
    if letters.iter().all(|&i| chars[i] == chars[letters[0]]) {
        return Err(EngineError::Unjumblable(answer.to_string()));
    }

    let place = |sources: &[usize]| {
        let mut order = identity.clone();
        for (slot, &from) in letters.iter().zip(sources) {
            order[*slot] = from;
        }
        order
    };
    let differs = |order: &[usize]| order.iter().enumerate().any(|(i, &from)| chars[from] != chars[i]);

    let mut shuffled = letters.clone();
    for _ in 0..JUMBLE_TRIES {
        shuffled.shuffle(rng);
        let order = place(&shuffled);
        if differs(&order) {
            return Ok(order);
        }
    }

    // Rotating by one only reproduces the word when every letter is equal.
    let mut rotated = letters.clone();
    rotated.rotate_left(1);
    Ok(place(&rotated))
}
