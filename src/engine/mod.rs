//! Game-agnostic round machinery: difficulty, results, scoring, sessions.
//!
//! A game plugs in by implementing [`ChallengeProvider`]; a [`Session`] then
//! drives it through present, answer and score until the configured
//! round count or session clock runs out.

pub mod challenge;
pub mod difficulty;
pub mod round;
pub mod score;
pub mod session;

pub use challenge::ChallengeProvider;
pub use difficulty::{Difficulty, PerDifficulty};
pub use round::{Attempts, Outcome, RoundResult};
pub use score::{ScoreDelta, Scorer, SessionState};
pub use session::{RoundReport, Session};
