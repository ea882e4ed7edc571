use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

use crate::engine::{Difficulty, PerDifficulty};
use crate::error::AppError;

const CONFIG_DIR: &str = "mind-games";
const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "mind-games.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintMode
{
    /// Every hint reveals the next hidden letter.
    #[default]
    Letters,
    /// The first hint names the decoding key, later hints reveal letters.
    KeyThenLetters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig
{
    pub base_points: PerDifficulty<u32>,
    pub speed_bonus_per_sec: f64,
    pub streak_threshold: u32,
    pub streak_step: u32,
    pub streak_cap: u32,
    pub wrong_answer_penalty_secs: u64,
}

impl ScoringConfig
{
    pub fn wrong_answer_penalty(&self) -> Duration
    {
        Duration::from_secs(self.wrong_answer_penalty_secs)
    }
}

impl Default for ScoringConfig
{
    fn default() -> Self
    {
        Self {
            base_points: PerDifficulty::new(100, 200, 300),
            speed_bonus_per_sec: 10.0,
            streak_threshold: 3,
            streak_step: 50,
            streak_cap: 500,
            wrong_answer_penalty_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression
{
    pub medium_after: u32,
    pub hard_after: u32,
}

impl Progression
{
    pub fn difficulty_for(&self, solved: u32, floor: Difficulty) -> Difficulty
    {
        let earned = if solved >= self.hard_after {
            Difficulty::Hard
        } else if solved >= self.medium_after {
            Difficulty::Medium
        } else {
            Difficulty::Easy
        };
        earned.max(floor)
    }
}

impl Default for Progression
{
    fn default() -> Self
    {
        Self {
            medium_after: 5,
            hard_after: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionLimits
{
    pub max_rounds: Option<u32>,
    pub session_secs: Option<u64>,
}

impl SessionLimits
{
    pub fn session_time(&self) -> Option<Duration>
    {
        self.session_secs.map(Duration::from_secs)
    }
}

/// Everything one game needs to run a session; handed to the game at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig
{
    pub hint_budget: u32,
    pub attempt_budget: u32,
    #[serde(default)]
    pub hint_mode: HintMode,
    pub scoring: ScoringConfig,
    pub time_limits: PerDifficulty<u64>,
    #[serde(default)]
    pub progression: Progression,
    #[serde(default)]
    pub limits: SessionLimits,
}

impl GameConfig
{
    pub fn cipher_clash() -> Self
    {
        Self {
            hint_budget: 3,
            attempt_budget: 3,
            hint_mode: HintMode::KeyThenLetters,
            scoring: ScoringConfig::default(),
            time_limits: PerDifficulty::new(60, 45, 30),
            progression: Progression::default(),
            limits: SessionLimits {
                max_rounds: Some(15),
                session_secs: None,
            },
        }
    }

    pub fn logic_arena() -> Self
    {
        Self {
            hint_budget: 2,
            attempt_budget: 3,
            hint_mode: HintMode::Letters,
            scoring: ScoringConfig {
                base_points: PerDifficulty::new(10, 20, 30),
                speed_bonus_per_sec: 0.5,
                streak_threshold: 3,
                streak_step: 5,
                streak_cap: 50,
                wrong_answer_penalty_secs: 5,
            },
            time_limits: PerDifficulty::new(30, 20, 15),
            progression: Progression {
                medium_after: 3,
                hard_after: 6,
            },
            limits: SessionLimits {
                max_rounds: Some(10),
                session_secs: Some(180),
            },
        }
    }

    pub fn mind_meld() -> Self
    {
        Self {
            hint_budget: 2,
            attempt_budget: 2,
            hint_mode: HintMode::Letters,
            scoring: ScoringConfig {
                base_points: PerDifficulty::new(10, 20, 30),
                speed_bonus_per_sec: 1.0,
                streak_threshold: 3,
                streak_step: 10,
                streak_cap: 100,
                wrong_answer_penalty_secs: 0,
            },
            time_limits: PerDifficulty::new(30, 25, 20),
            progression: Progression {
                medium_after: 3,
                hard_after: 6,
            },
            limits: SessionLimits {
                max_rounds: Some(10),
                session_secs: None,
            },
        }
    }

    pub fn quantum_maze() -> Self
    {
        Self {
            hint_budget: 0,
            attempt_budget: 1,
            hint_mode: HintMode::Letters,
            scoring: ScoringConfig {
                base_points: PerDifficulty::new(100, 200, 300),
                speed_bonus_per_sec: 5.0,
                streak_threshold: 2,
                streak_step: 50,
                streak_cap: 200,
                wrong_answer_penalty_secs: 0,
            },
            time_limits: PerDifficulty::new(90, 120, 150),
            progression: Progression {
                medium_after: 1,
                hard_after: 2,
            },
            limits: SessionLimits {
                max_rounds: Some(3),
                session_secs: None,
            },
        }
    }

    pub fn time_limit(&self, difficulty: Difficulty) -> Duration
    {
        Duration::from_secs(self.time_limits.get(difficulty))
    }
}

impl Default for GameConfig
{
    fn default() -> Self
    {
        Self::cipher_clash()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings
{
    pub word_bank: Option<PathBuf>,
    pub questions_dir: Option<PathBuf>,
    pub levels_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    #[serde(deserialize_with = "cipher_clash_section")]
    pub cipher_clash: GameConfig,
    #[serde(deserialize_with = "logic_arena_section")]
    pub logic_arena: GameConfig,
    #[serde(deserialize_with = "mind_meld_section")]
    pub mind_meld: GameConfig,
    #[serde(deserialize_with = "quantum_maze_section")]
    pub quantum_maze: GameConfig,
}

impl Default for Settings
{
    fn default() -> Self
    {
        Self {
            word_bank: None,
            questions_dir: None,
            levels_dir: None,
            log_file: None,
            cipher_clash: GameConfig::cipher_clash(),
            logic_arena: GameConfig::logic_arena(),
            mind_meld: GameConfig::mind_meld(),
            quantum_maze: GameConfig::quantum_maze(),
        }
    }
}

/// Reads a game section as overrides on top of that game's preset, so a
/// section only needs the fields it changes.
fn game_section<'de, D>(deserializer: D, preset: GameConfig) -> Result<GameConfig, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = Value::deserialize(deserializer)?;
    let mut merged = serde_json::to_value(preset).map_err(de::Error::custom)?;
    merge(&mut merged, overrides);
    serde_json::from_value(merged).map_err(de::Error::custom)
}

fn merge(base: &mut Value, overrides: Value)
{
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn cipher_clash_section<'de, D: Deserializer<'de>>(deserializer: D) -> Result<GameConfig, D::Error>
{
    game_section(deserializer, GameConfig::cipher_clash())
}

fn logic_arena_section<'de, D: Deserializer<'de>>(deserializer: D) -> Result<GameConfig, D::Error>
{
    game_section(deserializer, GameConfig::logic_arena())
}

fn mind_meld_section<'de, D: Deserializer<'de>>(deserializer: D) -> Result<GameConfig, D::Error>
{
    game_section(deserializer, GameConfig::mind_meld())
}

fn quantum_maze_section<'de, D: Deserializer<'de>>(deserializer: D) -> Result<GameConfig, D::Error>
{
    game_section(deserializer, GameConfig::quantum_maze())
}

pub fn default_config_path() -> Result<PathBuf, AppError>
{
    let base = dirs::config_dir().ok_or(AppError::NoConfigDir)?;
    Ok(base.join(CONFIG_DIR).join(CONFIG_FILE))
}

pub fn default_log_path() -> Option<PathBuf>
{
    dirs::data_local_dir().map(|base| base.join(CONFIG_DIR).join(LOG_FILE))
}

/// Loads settings from `explicit`, or from the default location.
///
/// An explicit path must exist. A missing file at the default location
/// means "use the defaults".
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, AppError>
{
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Ok(path) if path.exists() => path,
            _ => {
                debug!("no config file found, using defaults");
                return Ok(Settings::default());
            }
        },
    };

    let contents = fs::read_to_string(&path).map_err(|source| AppError::Read {
        path: path.clone(),
        source,
    })?;
    let settings = serde_json::from_str(&contents).map_err(|source| AppError::Parse {
        path: path.clone(),
        source,
    })?;
    info!("loaded settings from {}", path.display());
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), AppError>
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| AppError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let contents = serde_json::to_string_pretty(settings).map_err(|source| AppError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, contents).map_err(|source| AppError::Write {
        path: path.to_path_buf(),
        source,
    })
}
