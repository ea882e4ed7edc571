use std::fmt;
use std::time::Duration;

use log::debug;
use rand::Rng;
use rand::seq::{IteratorRandom, SliceRandom};

use super::term::{self, Rgb};
use crate::config::GameConfig;
use crate::engine::{Attempts, ChallengeProvider, Difficulty, Outcome, RoundResult};
use crate::error::EngineError;

const GRID_SIZE: usize = 4;
const REVEAL_BASE_MS: u64 = 2000;
const REVEAL_STEP_MS: u64 = 100;
const REVEAL_MIN_MS: u64 = 500;
const SHORTEST_PATTERN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind
{
    Position,
    Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color
{
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Cyan,
    Orange,
}

impl Color
{
    pub const ALL: [Color; 7] = [
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::Purple,
        Color::Cyan,
        Color::Orange,
    ];

    pub fn name(&self) -> &'static str
    {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Purple => "purple",
            Color::Cyan => "cyan",
            Color::Orange => "orange",
        }
    }

    pub fn initial(&self) -> char
    {
        self.name().chars().next().unwrap_or('?')
    }

    fn rgb(&self) -> Rgb
    {
        match self {
            Color::Red => Rgb { r: 220, g: 40, b: 40 },
            Color::Green => Rgb { r: 0, g: 170, b: 60 },
            Color::Blue => Rgb { r: 40, g: 80, b: 230 },
            Color::Yellow => Rgb { r: 200, g: 180, b: 0 },
            Color::Purple => Rgb { r: 128, g: 0, b: 128 },
            Color::Cyan => Rgb { r: 0, g: 170, b: 190 },
            Color::Orange => Rgb { r: 230, g: 130, b: 0 },
        }
    }

    fn parse(token: &str) -> Option<Color>
    {
        Color::ALL.into_iter().find(|color| {
            color.name() == token || (token.len() == 1 && token.starts_with(color.initial()))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element
{
    /// Grid cell, row-major from the top left.
    Cell(usize),
    Color(Color),
}

impl Element
{
    fn parse_cell(token: &str) -> Option<Element>
    {
        let mut chars = token.chars();
        let col = chars.next()?;
        let row = chars.next()?.to_digit(10)? as usize;
        if chars.next().is_some() || !('a'..='d').contains(&col) || !(1..=GRID_SIZE).contains(&row) {
            return None;
        }
        Some(Element::Cell((row - 1) * GRID_SIZE + (col as u8 - b'a') as usize))
    }
}

impl fmt::Display for Element
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Element::Cell(cell) => write!(
                f,
                "{}{}",
                (b'a' + (cell % GRID_SIZE) as u8) as char,
                cell / GRID_SIZE + 1
            ),
            Element::Color(color) => f.write_str(color.name()),
        }
    }
}

pub fn pattern_length<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> usize
{
    match difficulty {
        Difficulty::Easy => rng.gen_range(3..=4),
        Difficulty::Medium => rng.gen_range(5..=6),
        Difficulty::Hard => rng.gen_range(7..=8),
    }
}

/// How long a pattern of `len` elements stays on screen.
pub fn reveal_window(len: usize) -> Duration
{
    let extra = len.saturating_sub(SHORTEST_PATTERN) as u64;
    let ms = REVEAL_BASE_MS
        .saturating_sub(extra * REVEAL_STEP_MS)
        .max(REVEAL_MIN_MS);
    Duration::from_millis(ms)
}

/// Positions never repeat; colors may.
pub fn generate_pattern<R: Rng + ?Sized>(kind: PatternKind, len: usize, rng: &mut R) -> Vec<Element>
{
    match kind {
        PatternKind::Position => {
            let mut cells = (0..GRID_SIZE * GRID_SIZE).choose_multiple(rng, len);
            cells.shuffle(rng);
            cells.into_iter().map(Element::Cell).collect()
        }
        PatternKind::Color => (0..len)
            .filter_map(|_| Color::ALL.choose(rng).copied())
            .map(Element::Color)
            .collect(),
    }
}

/// Splits on whitespace and commas. A run of color initials such as `rgb`
/// reads as three colors.
pub fn parse_guess(kind: PatternKind, guess: &str) -> Option<Vec<Element>>
{
    let guess = guess.to_ascii_lowercase();
    let tokens: Vec<&str> = guess
        .split(|ch: char| ch.is_whitespace() || ch == ',')
        .filter(|token| !token.is_empty())
        .collect();
    match kind {
        PatternKind::Position => tokens.iter().map(|token| Element::parse_cell(token)).collect(),
        PatternKind::Color => {
            let mut elements = Vec::new();
            for token in tokens {
                match Color::parse(token) {
                    Some(color) => elements.push(Element::Color(color)),
                    None => {
                        for ch in token.chars() {
                            elements.push(Element::Color(Color::parse(ch.encode_utf8(&mut [0; 4]))?));
                        }
                    }
                }
            }
            Some(elements)
        }
    }
}

#[derive(Debug, Clone)]
pub struct MeldRound
{
    kind: PatternKind,
    pattern: Vec<Element>,
    difficulty: Difficulty,
    reveal: Duration,
    attempts: Attempts,
    hint_budget: u32,
    hints_used: u32,
    solved: bool,
}

impl MeldRound
{
    pub fn new(kind: PatternKind, pattern: Vec<Element>, difficulty: Difficulty, config: &GameConfig) -> Self
    {
        Self {
            kind,
            reveal: reveal_window(pattern.len()),
            pattern,
            difficulty,
            attempts: Attempts::new(config.attempt_budget),
            hint_budget: config.hint_budget,
            hints_used: 0,
            solved: false,
        }
    }

    pub fn is_visible(&self, shown_for: Duration) -> bool
    {
        shown_for < self.reveal
    }

    pub fn answer(&mut self, guess: &str, elapsed: Duration) -> Result<RoundResult, EngineError>
    {
        if self.solved {
            return Err(EngineError::AlreadySolved);
        }
        let budget = self.attempts.budget();
        self.attempts
            .spend()
            .ok_or(EngineError::AttemptsExhausted { budget })?;

        let correct = parse_guess(self.kind, guess).is_some_and(|elements| elements == self.pattern);
        self.solved = correct;
        debug!(
            "pattern of {} guessed {}",
            self.pattern.len(),
            if correct { "right" } else { "wrong" }
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

    /// Reveals the next element of the pattern.
    pub fn next_element(&mut self) -> Result<(usize, Element), EngineError>
    {
        let exhausted = EngineError::HintBudgetExhausted {
            budget: self.hint_budget,
        };
        if self.hints_used >= self.hint_budget {
            return Err(exhausted);
        }
        let index = self.hints_used as usize;
        let element = *self.pattern.get(index).ok_or(exhausted)?;
        self.hints_used += 1;
        Ok((index, element))
    }

    /// Elements handed out as hints stay on screen after the reveal window.
    fn is_revealed(&self, index: usize) -> bool
    {
        index < self.hints_used as usize
    }

    fn render(&self, visible: bool) -> Vec<String>
    {
        match self.kind {
            PatternKind::Position => {
                let mut lines = vec!["     a   b   c   d".to_string()];
                for row in 0..GRID_SIZE {
                    let mut line = format!(" {}  ", row + 1);
                    for col in 0..GRID_SIZE {
                        let cell = row * GRID_SIZE + col;
                        let order = self.pattern.iter().position(|e| *e == Element::Cell(cell));
                        match order {
                            Some(order) if visible => {
                                line.push_str(&term::tile(&(order + 1).to_string(), term::BLUE))
                            }
                            Some(order) if self.is_revealed(order) => {
                                line.push_str(&term::tile(&(order + 1).to_string(), term::YELLOW))
                            }
                            _ => line.push_str(&term::tile(" ", term::GRAY)),
                        }
                        line.push(' ');
                    }
                    lines.push(line.trim_end().to_string());
                }
                lines
            }
            PatternKind::Color => {
                let tiles: Vec<String> = self
                    .pattern
                    .iter()
                    .enumerate()
                    .map(|(index, element)| match element {
                        Element::Color(color) if visible || self.is_revealed(index) => {
                            let initial = color.initial().to_ascii_uppercase().to_string();
                            term::tile(&initial, color.rgb())
                        }
                        _ => term::tile("?", term::GRAY),
                    })
                    .collect();
                vec![format!("  {}", tiles.join(" "))]
            }
        }
    }
}

/// Watch the pattern, then repeat it from memory.
pub struct MindMeld
{
    config: GameConfig,
}

impl MindMeld
{
    pub fn new(config: GameConfig) -> Self
    {
        Self { config }
    }
}

impl ChallengeProvider for MindMeld
{
    type Round = MeldRound;

    fn title(&self) -> &'static str
    {
        "Mind Meld"
    }

    fn config(&self) -> &GameConfig
    {
        &self.config
    }

    fn generate<R: Rng + ?Sized>(
        &mut self,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Result<MeldRound, EngineError>
    {
        let kind = if rng.gen_bool(0.5) {
            PatternKind::Position
        } else {
            PatternKind::Color
        };
        let len = pattern_length(difficulty, rng);
        let pattern = generate_pattern(kind, len, rng);
        Ok(MeldRound::new(kind, pattern, difficulty, &self.config))
    }

    fn validate(
        &self,
        round: &mut MeldRound,
        guess: &str,
        elapsed: Duration,
    ) -> Result<RoundResult, EngineError>
    {
        round.answer(guess, elapsed)
    }

    fn hint(&self, round: &mut MeldRound) -> Result<String, EngineError>
    {
        let (index, element) = round.next_element()?;
        Ok(format!("element {} is {element}", index + 1))
    }

    fn prompt(&self, round: &MeldRound, shown_for: Duration) -> Vec<String>
    {
        let visible = round.is_visible(shown_for);
        let mut lines = if visible {
            let left = round.reveal.saturating_sub(shown_for);
            vec![format!(
                "Memorize the pattern! ({:.1}s)",
                left.as_secs_f32()
            )]
        } else {
            vec![format!("Repeat the {} elements in order.", round.pattern.len())]
        };
        lines.push(String::new());
        lines.extend(round.render(visible));
        lines.push(String::new());
        lines.push(match round.kind {
            PatternKind::Position => "Cells like: a1 b3 d4".to_string(),
            PatternKind::Color => {
                let initials: Vec<String> = Color::ALL
                    .iter()
                    .map(|color| format!("{}={}", color.initial(), color.name()))
                    .collect();
                format!("Colors: {}", initials.join(" "))
            }
        });
        lines.push(format!(
            "Attempts left: {}   Hints left: {}",
            round.attempts.left(),
            round.hint_budget.saturating_sub(round.hints_used)
        ));
        lines
    }

    fn answer(&self, round: &MeldRound) -> String
    {
        let elements: Vec<String> = round.pattern.iter().map(Element::to_string).collect();
        elements.join(" ")
    }

    fn difficulty(&self, round: &MeldRound) -> Difficulty
    {
        round.difficulty
    }

    fn hints_used(&self, round: &MeldRound) -> u32
    {
        round.hints_used
    }

    fn attempts_used(&self, round: &MeldRound) -> u32
    {
        round.attempts.used()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn reveal_window_shrinks_to_a_floor()
    {
        assert_eq!(reveal_window(3), Duration::from_millis(2000));
        assert_eq!(reveal_window(4), Duration::from_millis(1900));
        assert_eq!(reveal_window(8), Duration::from_millis(1500));
        assert_eq!(reveal_window(30), Duration::from_millis(500));
        assert_eq!(reveal_window(1), Duration::from_millis(2000));
    }

    #[test]
    fn lengths_follow_difficulty()
    {
        let mut rng = StdRng::seed_from_u64(41);
        for _ in 0..50 {
            assert!((3..=4).contains(&pattern_length(Difficulty::Easy, &mut rng)));
            assert!((5..=6).contains(&pattern_length(Difficulty::Medium, &mut rng)));
            assert!((7..=8).contains(&pattern_length(Difficulty::Hard, &mut rng)));
        }
    }

    #[test]
    fn position_patterns_use_distinct_cells()
    {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let pattern = generate_pattern(PatternKind::Position, 8, &mut rng);
            assert_eq!(pattern.len(), 8);
            for (i, element) in pattern.iter().enumerate() {
                assert!(!pattern[i + 1..].contains(element));
            }
        }
    }

    #[test]
    fn cell_labels_round_trip()
    {
        assert_eq!(Element::Cell(0).to_string(), "a1");
        assert_eq!(Element::Cell(15).to_string(), "d4");
        assert_eq!(Element::Cell(6).to_string(), "c2");
        assert_eq!(
            parse_guess(PatternKind::Position, "A1, c2  d4"),
            Some(vec![Element::Cell(0), Element::Cell(6), Element::Cell(15)])
        );
        assert_eq!(parse_guess(PatternKind::Position, "e1"), None);
        assert_eq!(parse_guess(PatternKind::Position, "a5"), None);
        assert_eq!(parse_guess(PatternKind::Position, "a12"), None);
    }

    #[test]
    fn colors_parse_by_initial_or_name()
    {
        let expected = Some(vec![
            Element::Color(Color::Red),
            Element::Color(Color::Green),
            Element::Color(Color::Orange),
        ]);
        assert_eq!(parse_guess(PatternKind::Color, "r g o"), expected);
        assert_eq!(parse_guess(PatternKind::Color, "red,green,orange"), expected);
        assert_eq!(parse_guess(PatternKind::Color, "RGO"), expected);
        assert_eq!(parse_guess(PatternKind::Color, "r x"), None);
    }

    #[test]
    fn exact_sequence_is_required()
    {
        let config = GameConfig::mind_meld();
        let pattern = vec![Element::Cell(0), Element::Cell(5), Element::Cell(10)];
        let mut round = MeldRound::new(PatternKind::Position, pattern, Difficulty::Easy, &config);
        assert!(!round.answer("a1 c3 b2", Duration::ZERO).unwrap().correct());
        assert!(round.answer("a1 b2 c3", Duration::ZERO).unwrap().correct());
        assert_eq!(round.answer("a1 b2 c3", Duration::ZERO), Err(EngineError::AlreadySolved));
    }

    #[test]
    fn hints_reveal_elements_in_order()
    {
        let meld = MindMeld::new(GameConfig::mind_meld());
        let pattern = vec![
            Element::Color(Color::Blue),
            Element::Color(Color::Cyan),
            Element::Color(Color::Blue),
        ];
        let mut round = MeldRound::new(PatternKind::Color, pattern, Difficulty::Easy, meld.config());
        assert_eq!(meld.hint(&mut round).unwrap(), "element 1 is blue");
        assert_eq!(meld.hint(&mut round).unwrap(), "element 2 is cyan");
        assert_eq!(
            meld.hint(&mut round),
            Err(EngineError::HintBudgetExhausted { budget: 2 })
        );
        assert_eq!(meld.answer(&round), "blue cyan blue");
    }

    #[test]
    fn pattern_hides_after_the_reveal_window()
    {
        let meld = MindMeld::new(GameConfig::mind_meld());
        let pattern = vec![Element::Cell(0), Element::Cell(1), Element::Cell(2)];
        let round = MeldRound::new(PatternKind::Position, pattern, Difficulty::Easy, meld.config());

        let shown = meld.prompt(&round, Duration::from_millis(100));
        assert!(shown[0].starts_with("Memorize the pattern!"));
        assert!(shown.iter().any(|line| line.contains("m 1 ")));

        let hidden = meld.prompt(&round, Duration::from_millis(2500));
        assert_eq!(hidden[0], "Repeat the 3 elements in order.");
        assert!(!hidden.iter().any(|line| line.contains("m 1 ")));
    }

    #[test]
    fn hinted_elements_stay_on_the_hidden_grid()
    {
        let meld = MindMeld::new(GameConfig::mind_meld());
        let pattern = vec![Element::Cell(0), Element::Cell(1), Element::Cell(2)];
        let mut round = MeldRound::new(PatternKind::Position, pattern, Difficulty::Easy, meld.config());
        meld.hint(&mut round).unwrap();

        let hidden = meld.prompt(&round, Duration::from_secs(5));
        assert!(hidden.iter().any(|line| line.contains("m 1 ")));
        assert!(!hidden.iter().any(|line| line.contains("m 2 ")));

        let pattern = vec![Element::Color(Color::Red), Element::Color(Color::Green)];
        let mut round = MeldRound::new(PatternKind::Color, pattern, Difficulty::Easy, meld.config());
        let before = meld.prompt(&round, Duration::from_secs(5));
        assert!(!before.iter().any(|line| line.contains("m R ")));
        meld.hint(&mut round).unwrap();
        let after = meld.prompt(&round, Duration::from_secs(5));
        assert!(after.iter().any(|line| line.contains("m R ")));
        assert!(!after.iter().any(|line| line.contains("m G ")));
    }
}
