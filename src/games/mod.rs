pub mod cipher_clash;
pub mod logic_arena;
pub mod mind_meld;
pub mod quantum_maze;
mod round_loop;
pub mod term;

use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::cipher::CipherKind;
use crate::config::{GameConfig, Settings};
use crate::engine::{Difficulty, Session};
use crate::error::AppError;
use crate::maze;
use crate::words::WordBank;

use cipher_clash::CipherClash;
use logic_arena::{LogicArena, QuestionBank};
use mind_meld::MindMeld;
use quantum_maze::MazeMatch;

pub struct GameDescriptor
{
    pub name: &'static str,
    pub description: &'static str,
}

pub fn registry() -> Vec<GameDescriptor>
{
    vec![GameDescriptor {
        name: "cipher-clash",
        description: "Decode a word hidden behind a classical cipher",
    },
    GameDescriptor {
        name: "logic-arena",
        description: "Number sequences and odd-one-out questions",
    },
    GameDescriptor {
        name: "mind-meld",
        description: "Memorize a flashed pattern and type it back",
    },
    GameDescriptor {
        name: "quantum-maze",
        description: "Reach the exit while phase walls flicker",
    }]
}

/// Launch options shared by every game.
#[derive(Debug, Clone)]
pub struct PlayOptions
{
    pub players: usize,
    pub difficulty: Difficulty,
    pub rounds: Option<u32>,
    pub seed: Option<u64>,
    pub cipher: Option<CipherKind>,
}

impl Default for PlayOptions
{
    fn default() -> Self
    {
        Self {
            players: 1,
            difficulty: Difficulty::Easy,
            rounds: None,
            seed: None,
            cipher: None,
        }
    }
}

impl PlayOptions
{
    fn apply(&self, mut config: GameConfig) -> GameConfig
    {
        if let Some(rounds) = self.rounds {
            config.limits.max_rounds = Some(rounds.max(1));
        }
        config
    }

    fn rng(&self) -> StdRng
    {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Looks a game up by name, ignoring case.
pub fn find(name: &str) -> Option<GameDescriptor>
{
    registry()
        .into_iter()
        .find(|game| game.name.eq_ignore_ascii_case(name))
}

/// Runs one game to completion in the terminal.
pub fn run(name: &str, settings: &Settings, options: &PlayOptions) -> Result<(), AppError>
{
    let game = find(name).ok_or_else(|| AppError::UnknownGame(name.to_string()))?;
    let mut rng = options.rng();
    let players = options.players.clamp(1, 2);
    info!(
        "launching {} for {} player(s) at {}",
        game.name, players, options.difficulty
    );

    match game.name {
        "cipher-clash" => {
            let words = WordBank::from_settings(settings.word_bank.as_deref())?;
            info!("word bank holds {} words", words.len());
            let config = options.apply(settings.cipher_clash.clone());
            let clash = CipherClash::new(config, words, options.cipher);
            let mut session = Session::new(clash, players, options.difficulty);
            round_loop::play(&mut session, &mut rng)
        }
        "logic-arena" => {
            let bank = match settings.questions_dir.as_deref() {
                Some(dir) => QuestionBank::load_dir(dir),
                None => QuestionBank::default(),
            };
            info!("question bank holds {} questions", bank.len());
            let config = options.apply(settings.logic_arena.clone());
            let mut session = Session::new(LogicArena::new(config, bank), players, options.difficulty);
            round_loop::play(&mut session, &mut rng)
        }
        "mind-meld" => {
            let config = options.apply(settings.mind_meld.clone());
            let mut session = Session::new(MindMeld::new(config), players, options.difficulty);
            round_loop::play(&mut session, &mut rng)
        }
        "quantum-maze" => {
            let levels = match settings.levels_dir.as_deref() {
                Some(dir) => maze::load_levels(dir)?,
                None => maze::builtin_levels(),
            };
            let config = options.apply(settings.quantum_maze.clone());
            let mut game = MazeMatch::new(config, levels, players, options.difficulty);
            quantum_maze::play(&mut game, &mut rng)
        }
        other => Err(AppError::UnknownGame(other.to_string())),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn registry_names_are_unique_and_findable()
    {
        let games = registry();
        assert_eq!(games.len(), 4);
        for game in &games {
            let found = find(&game.name.to_uppercase()).map(|g| g.name);
            assert_eq!(found, Some(game.name));
        }
    }

    #[test]
    fn unknown_game_is_rejected_before_the_terminal_opens()
    {
        let err = run("tetris", &Settings::default(), &PlayOptions::default()).unwrap_err();
        assert!(matches!(err, AppError::UnknownGame(name) if name == "tetris"));
    }

    #[test]
    fn rounds_option_overrides_the_preset()
    {
        let options = PlayOptions {
            rounds: Some(4),
            ..PlayOptions::default()
        };
        let config = options.apply(GameConfig::cipher_clash());
        assert_eq!(config.limits.max_rounds, Some(4));

        let config = PlayOptions::default().apply(GameConfig::cipher_clash());
        assert_eq!(config.limits.max_rounds, Some(15));
    }
}
