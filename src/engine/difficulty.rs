use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty
{
    Easy,
    Medium,
    Hard,
}

impl Difficulty
{
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str
    {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn display_name(&self) -> &'static str
    {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.display_name())
    }
}

/// Picks one of three values by difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerDifficulty<T>
{
    pub easy: T,
    pub medium: T,
    pub hard: T,
}

impl<T: Copy> PerDifficulty<T>
{
    pub const fn new(easy: T, medium: T, hard: T) -> Self
    {
        Self { easy, medium, hard }
    }

    pub fn get(&self, difficulty: Difficulty) -> T
    {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn difficulties_are_ordered()
    {
        assert!(Difficulty::Easy < Difficulty::Medium);
        assert!(Difficulty::Medium < Difficulty::Hard);
    }

    #[test]
    fn serializes_lowercase()
    {
        let json = serde_json::to_string(&Difficulty::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
        let back: Difficulty = serde_json::from_str("\"hard\"").unwrap();
        assert_eq!(back, Difficulty::Hard);
    }

    #[test]
    fn per_difficulty_lookup()
    {
        let limits = PerDifficulty::new(60, 45, 30);
        assert_eq!(limits.get(Difficulty::Easy), 60);
        assert_eq!(limits.get(Difficulty::Hard), 30);
    }
}
