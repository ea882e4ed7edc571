use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::cipher::CipherKind;

/// Recoverable conditions raised while generating, answering or hinting a round.
///
/// None of these are fatal: the round loop turns them into feedback lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError
{
    #[error("'{0}' is not a valid word: expected letters and spaces only")]
    InvalidWord(String),
    #[error("'{0}' has no distinct letters to jumble")]
    Unjumblable(String),
    #[error("no attempts left (budget of {budget})")]
    AttemptsExhausted { budget: u32 },
    #[error("no hints left (budget of {budget})")]
    HintBudgetExhausted { budget: u32 },
    #[error("this round is already solved")]
    AlreadySolved,
    #[error("there is no round in play")]
    NoActiveRound,
    #[error("cannot decode {kind} text: {reason}")]
    MalformedCiphertext { kind: CipherKind, reason: String },
    #[error("no questions available for {0}")]
    NoQuestions(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MazeError
{
    #[error("level has no start tile 'P'")]
    MissingStart,
    #[error("level has no exit tile 'E'")]
    MissingExit,
    #[error("level has more than one start tile")]
    DuplicateStart,
    #[error("unknown tile '{ch}' at row {row}, column {col}")]
    UnknownTile { ch: char, row: usize, col: usize },
    #[error("not enough energy: {needed} needed, {available} available")]
    NotEnoughEnergy { needed: u32, available: u32 },
    #[error("no open anchor to teleport to")]
    NoAnchor,
}

#[derive(Debug, Error)]
pub enum AppError
{
    #[error("failed to read {}: {source}", path.display())]
    Read
    {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write
    {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse
    {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {}: {source}", path.display())]
    Encode
    {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
    #[error("unknown game '{0}'. Run `mind-games list` to see the available games")]
    UnknownGame(String),
    #[error("could not determine a configuration directory")]
    NoConfigDir,
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("invalid level {name}: {source}")]
    Level
    {
        name: String,
        #[source]
        source: MazeError,
    },
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn engine_errors_render_their_budget()
    {
        let err = EngineError::AttemptsExhausted { budget: 3 };
        assert_eq!(err.to_string(), "no attempts left (budget of 3)");

        let err = EngineError::HintBudgetExhausted { budget: 2 };
        assert_eq!(err.to_string(), "no hints left (budget of 2)");
    }

    #[test]
    fn malformed_ciphertext_names_the_kind()
    {
        let err = EngineError::MalformedCiphertext {
            kind: CipherKind::Morse,
            reason: "unknown code '......'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot decode morse text: unknown code '......'"
        );
    }

    #[test]
    fn engine_error_converts_into_app_error()
    {
        let err: AppError = EngineError::InvalidWord("x1".to_string()).into();
        assert!(matches!(err, AppError::Engine(EngineError::InvalidWord(_))));
        assert_eq!(
            err.to_string(),
            "'x1' is not a valid word: expected letters and spaces only"
        );
    }
}
