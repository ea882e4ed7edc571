use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use log::{debug, info, warn};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::Value;

use crate::cipher::normalize;
use crate::config::GameConfig;
use crate::engine::{Attempts, ChallengeProvider, Difficulty, Outcome, RoundResult};
use crate::error::EngineError;

const OPTION_COUNT: usize = 4;
const SHAPES: [&str; 4] = ["circle", "square", "triangle", "rectangle"];
const ADJACENT_PAIRS: [&str; 4] = ["AB", "BC", "CD", "DE"];
const GAPPED_PAIRS: [&str; 4] = ["AC", "BD", "CE", "DF"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum QuestionKind
{
    #[serde(rename = "sequence", alias = "number")]
    Sequence,
    #[serde(rename = "odd_one", alias = "odd_one_out")]
    OddOneOut,
    #[serde(rename = "grid")]
    Grid,
}

impl QuestionKind
{
    pub fn label(&self) -> &'static str
    {
        match self {
            QuestionKind::Sequence => "Sequence",
            QuestionKind::OddOneOut => "Odd one out",
            QuestionKind::Grid => "Grid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question
{
    pub kind: QuestionKind,
    pub text: String,
    pub sequence: Option<Vec<i64>>,
    pub options: Vec<String>,
    /// Index into `options`.
    pub answer: usize,
}

impl Question
{
    pub fn answer_text(&self) -> &str
    {
        &self.options[self.answer]
    }
}

/// A record as stored in `<difficulty>.json`.
#[derive(Debug, Deserialize)]
struct QuestionRecord
{
    #[serde(rename = "type")]
    kind: QuestionKind,
    question: String,
    #[serde(default)]
    sequence: Option<Vec<i64>>,
    options: Vec<Value>,
    /// Option text, or for sequences the number itself, or else the option index.
    answer: Value,
}

impl QuestionRecord
{
    fn into_question(self) -> Option<Question>
    {
        let options: Vec<String> = self
            .options
            .iter()
            .map(|option| match option {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect();
        if options.len() < 2 {
            return None;
        }

        let answer = match &self.answer {
            Value::String(text) => find_option(&options, text)?,
            Value::Number(number) if self.kind == QuestionKind::Sequence => {
                find_option(&options, &number.to_string())?
            }
            Value::Number(number) => {
                let index = number.as_u64()? as usize;
                (index < options.len()).then_some(index)?
            }
            _ => return None,
        };

        Some(Question {
            kind: self.kind,
            text: self.question,
            sequence: self.sequence,
            options,
            answer,
        })
    }
}

fn find_option(options: &[String], text: &str) -> Option<usize>
{
    let wanted = normalize(text);
    options.iter().position(|option| normalize(option) == wanted)
}

/// Hand-written questions loaded from a directory, keyed by difficulty.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank
{
    questions: HashMap<Difficulty, Vec<Question>>,
}

impl QuestionBank
{
    /// Reads `easy.json`, `medium.json` and `hard.json` from `dir`. Missing
    /// files are fine; unreadable files and bad records are skipped with a warning.
    pub fn load_dir(dir: &Path) -> Self
    {
        let mut bank = Self::default();
        for difficulty in Difficulty::ALL {
            let path = dir.join(format!("{}.json", difficulty.as_str()));
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => {
                    warn!("skipping {}: {err}", path.display());
                    continue;
                }
            };
            let questions = parse_questions(&text, &path);
            info!("loaded {} questions from {}", questions.len(), path.display());
            bank.questions.insert(difficulty, questions);
        }
        bank
    }

    pub fn questions(&self, difficulty: Difficulty) -> &[Question]
    {
        self.questions
            .get(&difficulty)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize
    {
        self.questions.values().map(Vec::len).sum()
    }
}

fn parse_questions(text: &str, path: &Path) -> Vec<Question>
{
    let records: Vec<Value> = match serde_json::from_str(text) {
        Ok(records) => records,
        Err(err) => {
            warn!("skipping {}: {err}", path.display());
            return Vec::new();
        }
    };

    let mut questions = Vec::new();
    for (index, record) in records.into_iter().enumerate() {
        let question = serde_json::from_value::<QuestionRecord>(record)
            .ok()
            .and_then(QuestionRecord::into_question);
        match question {
            Some(question) => questions.push(question),
            None => warn!("{}: skipping invalid question #{}", path.display(), index + 1),
        }
    }
    questions
}

pub fn sequence_question<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Question
{
    let (sequence, answer, variance): (Vec<i64>, i64, i64) = match difficulty {
        Difficulty::Easy => {
            let start = rng.gen_range(1..=10);
            let step = rng.gen_range(1..=5);
            ((0..5).map(|i| start + i * step).collect(), start + 5 * step, 5)
        }
        Difficulty::Medium => {
            let mut sequence = vec![rng.gen_range(1..=5), rng.gen_range(6..=10)];
            for _ in 0..3 {
                let next = sequence[sequence.len() - 1] + sequence[sequence.len() - 2];
                sequence.push(next);
            }
            let answer = sequence[3] + sequence[4];
            (sequence, answer, 3)
        }
        Difficulty::Hard => {
            let start = rng.gen_range(1..=5);
            ((0..5).map(|i| start + i * i).collect(), start + 25, 2)
        }
    };

    let mut values = vec![answer];
    for _ in 0..20 {
        if values.len() == OPTION_COUNT {
            break;
        }
        let offset = rng.gen_range(1..=variance);
        let wrong = if rng.gen_bool(0.5) { answer + offset } else { answer - offset };
        if !values.contains(&wrong) {
            values.push(wrong);
        }
    }
    let mut offset = 6;
    while values.len() < OPTION_COUNT {
        if !values.contains(&(answer + offset)) {
            values.push(answer + offset);
        }
        offset += 1;
    }
    values.shuffle(rng);

    let answer = values.iter().position(|&value| value == answer).unwrap_or(0);
    Question {
        kind: QuestionKind::Sequence,
        text: "What comes next in this sequence?".to_string(),
        sequence: Some(sequence),
        options: values.iter().map(i64::to_string).collect(),
        answer,
    }
}

pub fn odd_one_out_question<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Question
{
    let (mut options, odd): (Vec<String>, String) = match difficulty {
        Difficulty::Easy => {
            let picked: Vec<&str> = SHAPES.choose_multiple(rng, 2).copied().collect();
            (vec![picked[0].to_string(); 3], picked[1].to_string())
        }
        Difficulty::Medium => {
            let evens = [2, 4, 6, 8, 10];
            let odds = [1, 3, 5, 7, 9];
            let (group, other) = if rng.gen_bool(0.5) { (evens, odds) } else { (odds, evens) };
            let options = group
                .choose_multiple(rng, 3)
                .map(|n: &i32| n.to_string())
                .collect();
            let odd = other.choose(rng).copied().unwrap_or(0);
            (options, odd.to_string())
        }
        Difficulty::Hard => {
            let options = ADJACENT_PAIRS
                .choose_multiple(rng, 3)
                .map(|pair| pair.to_string())
                .collect();
            let odd = GAPPED_PAIRS.choose(rng).copied().unwrap_or("AC");
            (options, odd.to_string())
        }
    };
    options.push(odd.clone());
    options.shuffle(rng);

    let answer = options.iter().position(|option| *option == odd).unwrap_or(0);
    Question {
        kind: QuestionKind::OddOneOut,
        text: "Which one doesn't belong with the others?".to_string(),
        sequence: None,
        options,
        answer,
    }
}

#[derive(Debug, Clone)]
pub struct ArenaRound
{
    question: Question,
    difficulty: Difficulty,
    attempts: Attempts,
    hint_budget: u32,
    hints_used: u32,
    eliminated: Vec<usize>,
    solved: bool,
}

impl ArenaRound
{
    pub fn new(question: Question, difficulty: Difficulty, config: &GameConfig) -> Self
    {
        Self {
            question,
            difficulty,
            attempts: Attempts::new(config.attempt_budget),
            hint_budget: config.hint_budget,
            hints_used: 0,
            eliminated: Vec::new(),
            solved: false,
        }
    }

    pub fn question(&self) -> &Question
    {
        &self.question
    }

    pub fn is_eliminated(&self, option: usize) -> bool
    {
        self.eliminated.contains(&option)
    }

    /// `guess` is an option number (1-based) or the option's text.
    pub fn answer(&mut self, guess: &str, elapsed: Duration) -> Result<RoundResult, EngineError>
    {
        if self.solved {
            return Err(EngineError::AlreadySolved);
        }
        let budget = self.attempts.budget();
        self.attempts
            .spend()
            .ok_or(EngineError::AttemptsExhausted { budget })?;

        // Option text wins over option numbers when the options are numbers.
        let guess = normalize(guess);
        let names_option = find_option(&self.question.options, &guess).is_some();
        let correct = match guess.parse::<usize>() {
            Ok(number) if !names_option && (1..=self.question.options.len()).contains(&number) => {
                number - 1 == self.question.answer
            }
            _ => guess == normalize(self.question.answer_text()),
        };
        self.solved = correct;
        debug!("arena answer '{guess}': {}", if correct { "correct" } else { "wrong" });

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

    /// Strikes out one wrong option.
    pub fn eliminate(&mut self) -> Result<usize, EngineError>
    {
        let exhausted = EngineError::HintBudgetExhausted {
            budget: self.hint_budget,
        };
        if self.hints_used >= self.hint_budget {
            return Err(exhausted);
        }
        let answer = normalize(self.question.answer_text());
        let option = (0..self.question.options.len())
            .find(|&i| {
                !self.eliminated.contains(&i) && normalize(&self.question.options[i]) != answer
            })
            .ok_or(exhausted)?;
        self.eliminated.push(option);
        self.hints_used += 1;
        Ok(option)
    }
}

/// Quick logic questions: finish the sequence, spot the odd one out.
pub struct LogicArena
{
    config: GameConfig,
    bank: QuestionBank,
}

impl LogicArena
{
    pub fn new(config: GameConfig, bank: QuestionBank) -> Self
    {
        Self { config, bank }
    }

    /// Generated sequence, generated odd-one-out, or a stored question when
    /// the bank has any for `difficulty`, with equal odds.
    pub fn question<R: Rng + ?Sized>(
        &self,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Result<Question, EngineError>
    {
        let stored = self.bank.questions(difficulty);
        let choices = if stored.is_empty() { 2 } else { 3 };
        match rng.gen_range(0..choices) {
            0 => Ok(sequence_question(difficulty, rng)),
            1 => Ok(odd_one_out_question(difficulty, rng)),
            _ => stored
                .choose(rng)
                .cloned()
                .ok_or_else(|| EngineError::NoQuestions(difficulty.to_string())),
        }
    }
}

impl ChallengeProvider for LogicArena
{
    type Round = ArenaRound;

    fn title(&self) -> &'static str
    {
        "Logic Arena"
    }

    fn config(&self) -> &GameConfig
    {
        &self.config
    }

    fn generate<R: Rng + ?Sized>(
        &mut self,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Result<ArenaRound, EngineError>
    {
        let question = self.question(difficulty, rng)?;
        Ok(ArenaRound::new(question, difficulty, &self.config))
    }

    fn validate(
        &self,
        round: &mut ArenaRound,
        guess: &str,
        elapsed: Duration,
    ) -> Result<RoundResult, EngineError>
    {
        round.answer(guess, elapsed)
    }

    fn hint(&self, round: &mut ArenaRound) -> Result<String, EngineError>
    {
        let option = round.eliminate()?;
        Ok(format!(
            "it is not option {} ({})",
            option + 1,
            round.question.options[option]
        ))
    }

    fn prompt(&self, round: &ArenaRound, _shown_for: Duration) -> Vec<String>
    {
        let question = &round.question;
        let mut lines = vec![format!("[{}] {}", question.kind.label(), question.text)];
        if let Some(sequence) = &question.sequence {
            let numbers: Vec<String> = sequence.iter().map(i64::to_string).collect();
            lines.push(format!("  {}, ?", numbers.join(", ")));
        }
        lines.push(String::new());
        for (i, option) in question.options.iter().enumerate() {
            if round.is_eliminated(i) {
                lines.push(format!("  {}) ---", i + 1));
            } else {
                lines.push(format!("  {}) {option}", i + 1));
            }
        }
        lines.push(String::new());
        lines.push(format!(
            "Type 1-{} or the option. Attempts left: {}   Hints left: {}",
            question.options.len(),
            round.attempts.left(),
            round.hint_budget.saturating_sub(round.hints_used)
        ));
        lines
    }

    fn answer(&self, round: &ArenaRound) -> String
    {
        round.question.answer_text().to_string()
    }

    fn difficulty(&self, round: &ArenaRound) -> Difficulty
    {
        round.difficulty
    }

    fn hints_used(&self, round: &ArenaRound) -> u32
    {
        round.hints_used
    }

    fn attempts_used(&self, round: &ArenaRound) -> u32
    {
        round.attempts.used()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::engine::Session;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn occurrences(question: &Question) -> usize
    {
        let answer = question.answer_text();
        question.options.iter().filter(|option| *option == answer).count()
    }

    #[test]
    fn generated_options_contain_the_answer_once()
    {
        let mut rng = StdRng::seed_from_u64(31);
        for _ in 0..200 {
            for difficulty in Difficulty::ALL {
                let sequence = sequence_question(difficulty, &mut rng);
                assert_eq!(sequence.options.len(), OPTION_COUNT);
                assert_eq!(occurrences(&sequence), 1);

                let odd = odd_one_out_question(difficulty, &mut rng);
                assert_eq!(odd.options.len(), OPTION_COUNT);
                assert_eq!(occurrences(&odd), 1);
            }
        }
    }

    #[test]
    fn sequences_follow_their_rule()
    {
        let mut rng = StdRng::seed_from_u64(32);
        let easy = sequence_question(Difficulty::Easy, &mut rng);
        let seq = easy.sequence.clone().unwrap();
        let step = seq[1] - seq[0];
        assert_eq!(easy.answer_text(), (seq[4] + step).to_string());

        let medium = sequence_question(Difficulty::Medium, &mut rng);
        let seq = medium.sequence.clone().unwrap();
        assert_eq!(seq[2], seq[0] + seq[1]);
        assert_eq!(medium.answer_text(), (seq[3] + seq[4]).to_string());

        let hard = sequence_question(Difficulty::Hard, &mut rng);
        let seq = hard.sequence.clone().unwrap();
        assert_eq!(hard.answer_text(), (seq[0] + 25).to_string());
    }

    #[test]
    fn answers_by_number_or_text()
    {
        let question = Question {
            kind: QuestionKind::OddOneOut,
            text: "Which one doesn't belong with the others?".to_string(),
            sequence: None,
            options: vec!["circle".into(), "circle".into(), "square".into(), "circle".into()],
            answer: 2,
        };
        let config = GameConfig::logic_arena();

        let mut round = ArenaRound::new(question.clone(), Difficulty::Easy, &config);
        assert!(round.answer("3", Duration::ZERO).unwrap().correct());

        let mut round = ArenaRound::new(question.clone(), Difficulty::Easy, &config);
        assert!(round.answer(" Square ", Duration::ZERO).unwrap().correct());

        let mut round = ArenaRound::new(question, Difficulty::Easy, &config);
        assert!(!round.answer("circle", Duration::ZERO).unwrap().correct());
        assert!(!round.answer("7", Duration::ZERO).unwrap().correct());
        let last = round.answer("1", Duration::ZERO).unwrap();
        assert!(last.is_final());
        assert_eq!(
            round.answer("3", Duration::ZERO),
            Err(EngineError::AttemptsExhausted { budget: 3 })
        );
    }

    #[test]
    fn numeric_options_match_by_value_first()
    {
        let question = Question {
            kind: QuestionKind::OddOneOut,
            text: "Which one doesn't belong with the others?".to_string(),
            sequence: None,
            options: vec!["2".into(), "4".into(), "3".into(), "8".into()],
            answer: 2,
        };
        let config = GameConfig::logic_arena();

        let mut round = ArenaRound::new(question.clone(), Difficulty::Medium, &config);
        assert!(round.answer("3", Duration::ZERO).unwrap().correct());

        let mut round = ArenaRound::new(question, Difficulty::Medium, &config);
        assert!(!round.answer("2", Duration::ZERO).unwrap().correct());
        assert!(!round.answer("1", Duration::ZERO).unwrap().correct());
    }

    #[test]
    fn hints_eliminate_wrong_options()
    {
        let question = Question {
            kind: QuestionKind::Sequence,
            text: "What comes next in this sequence?".to_string(),
            sequence: Some(vec![1, 2, 3, 4, 5]),
            options: vec!["6".into(), "7".into(), "8".into(), "9".into()],
            answer: 0,
        };
        let mut round = ArenaRound::new(question, Difficulty::Easy, &GameConfig::logic_arena());
        assert_eq!(round.eliminate(), Ok(1));
        assert_eq!(round.eliminate(), Ok(2));
        assert_eq!(
            round.eliminate(),
            Err(EngineError::HintBudgetExhausted { budget: 2 })
        );
        assert!(round.is_eliminated(1));
        assert!(!round.is_eliminated(0));
    }

    #[test]
    fn bank_parses_records_and_skips_bad_ones()
    {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("easy.json"),
            r#"[
                {"type": "sequence", "question": "Next?", "sequence": [2, 4, 6], "options": [7, 8, 9, 10], "answer": 8},
                {"type": "odd_one", "question": "Odd one?", "options": ["cat", "dog", "car", "cow"], "answer": 2},
                {"type": "grid", "question": "Which colour?", "options": ["red", "blue"], "answer": "Blue"},
                {"type": "riddle", "question": "?", "options": ["a", "b"], "answer": 0},
                {"type": "odd_one", "question": "Out of range", "options": ["a", "b"], "answer": 5}
            ]"#,
        )
        .unwrap();
        fs::write(dir.path().join("medium.json"), "not json").unwrap();

        let bank = QuestionBank::load_dir(dir.path());
        let easy = bank.questions(Difficulty::Easy);
        assert_eq!(easy.len(), 3);
        assert_eq!(easy[0].answer, 1);
        assert_eq!(easy[0].sequence, Some(vec![2, 4, 6]));
        assert_eq!(easy[1].answer_text(), "car");
        assert_eq!(easy[2].answer_text(), "blue");
        assert!(bank.questions(Difficulty::Medium).is_empty());
        assert!(bank.questions(Difficulty::Hard).is_empty());
        assert_eq!(bank.len(), 3);
    }

    #[test]
    fn stored_questions_are_mixed_in()
    {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("hard.json"),
            r#"[{"type": "grid", "question": "Stored?", "options": ["yes", "no"], "answer": "yes"}]"#,
        )
        .unwrap();
        let arena = LogicArena::new(GameConfig::logic_arena(), QuestionBank::load_dir(dir.path()));
        let mut rng = StdRng::seed_from_u64(21);
        let texts: Vec<String> = (0..60)
            .map(|_| arena.question(Difficulty::Hard, &mut rng).unwrap().text)
            .collect();
        assert!(texts.iter().any(|text| text == "Stored?"));
        assert!(texts.iter().any(|text| text != "Stored?"));

        for _ in 0..20 {
            let question = arena.question(Difficulty::Easy, &mut rng).unwrap();
            assert_ne!(question.text, "Stored?");
        }
    }

    #[test]
    fn wrong_answers_cost_time_in_a_session()
    {
        let arena = LogicArena::new(GameConfig::logic_arena(), QuestionBank::default());
        let mut session = Session::new(arena, 1, Difficulty::Easy);
        let mut rng = StdRng::seed_from_u64(33);
        session.start_round(&mut rng).unwrap();
        assert_eq!(session.time_limit(), Duration::from_secs(30));

        let round = session.round().unwrap();
        let wrong = (0..OPTION_COUNT)
            .find(|&i| i != round.question().answer)
            .unwrap();
        let report = session
            .submit(&(wrong + 1).to_string(), Duration::from_secs(2))
            .unwrap();
        assert!(!report.closed);
        assert_eq!(report.delta.penalty, Duration::from_secs(5));
        assert_eq!(session.time_limit(), Duration::from_secs(25));

        let answer = session.provider().answer(session.round().unwrap());
        let report = session.submit(&answer, Duration::from_secs(5)).unwrap();
        assert_eq!(report.delta.total(), 10 + 10);
    }
}
