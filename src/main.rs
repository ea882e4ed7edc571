mod cipher;
mod config;
mod engine;
mod error;
mod games;
mod maze;
mod words;

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use env_logger::{Env, Target};

use crate::cipher::CipherKind;
use crate::config::Settings;
use crate::engine::Difficulty;
use crate::error::AppError;
use crate::games::PlayOptions;

#[derive(Parser)]
#[command(name = "mind-games")]
#[command(about = "Terminal puzzle games built around a cipher challenge engine", long_about = None)]
struct Cli
{
    /// Settings file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Append log output to this file. Defaults to mind-games.log in the
    /// local data directory.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands
{
    /// List the available games.
    List,
    /// Start a game directly.
    Play {
        game: String,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
        players: u8,
        #[arg(long, value_enum, default_value_t = Difficulty::Easy)]
        difficulty: Difficulty,
        /// Rounds per player.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        rounds: Option<u32>,
        /// Seed for reproducible puzzles.
        #[arg(long)]
        seed: Option<u64>,
        /// Only use this cipher (Cipher Clash).
        #[arg(long, value_enum)]
        cipher: Option<CipherKind>,
    },
    /// Show the settings in use, or write the defaults with --init.
    Config {
        #[arg(long)]
        init: bool,
    },
}

fn main()
{
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError>
{
    let settings = match (&cli.command, cli.config.as_deref()) {
        (Some(Commands::Config { init: true }), Some(path)) if !path.exists() => Settings::default(),
        (_, explicit) => config::load_settings(explicit)?,
    };
    let log_file = cli.log_file.as_deref().or(settings.log_file.as_deref());
    init_logging(log_file)?;

    match cli.command {
        None => interactive_menu(&settings),
        Some(Commands::List) => {
            list_games();
            Ok(())
        }
        Some(Commands::Play {
            game,
            players,
            difficulty,
            rounds,
            seed,
            cipher,
        }) => {
            let options = PlayOptions {
                players: players as usize,
                difficulty,
                rounds,
                seed,
                cipher,
            };
            games::run(&game, &settings, &options)
        }
        Some(Commands::Config { init }) => show_config(cli.config.as_deref(), &settings, init),
    }
}

/// `RUST_LOG` wins over the default `warn` filter. The games own the
/// terminal while they run, so logs go to a file: `path` when given,
/// otherwise the default log file. Stderr is the last resort.
fn init_logging(path: Option<&Path>) -> Result<(), AppError>
{
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    match path {
        Some(path) => {
            let file = open_log(path).map_err(|source| AppError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            builder.target(Target::Pipe(Box::new(file)));
        }
        None => {
            if let Some(file) = config::default_log_path().and_then(|path| open_log(&path).ok()) {
                builder.target(Target::Pipe(Box::new(file)));
            }
        }
    }
    if builder.try_init().is_err() {
        log::debug!("logger already installed");
    }
    Ok(())
}

fn open_log(path: &Path) -> io::Result<File>
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn interactive_menu(settings: &Settings) -> Result<(), AppError>
{
    let registry = games::registry();
    loop {
        println!("Mind Games");
        println!();
        println!("Select a game:");
        for (idx, game) in registry.iter().enumerate() {
            println!("  {}. {} - {}", idx + 1, game.name, game.description);
        }
        println!();
        print!("Enter number or name (default 1, q to quit): ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(());
        }
        let choice = input.trim();

        if choice.eq_ignore_ascii_case("q") {
            return Ok(());
        }
        let selected = if choice.is_empty() {
            Some(registry[0].name)
        } else if let Ok(index) = choice.parse::<usize>() {
            index
                .checked_sub(1)
                .and_then(|idx| registry.get(idx))
                .map(|game| game.name)
        } else {
            games::find(choice).map(|game| game.name)
        };

        match selected {
            Some(name) => games::run(name, settings, &PlayOptions::default())?,
            None => println!("Invalid selection."),
        }
        println!();
    }
}

fn list_games()
{
    println!("Available games:");
    for game in games::registry() {
        println!("  {:<13} - {}", game.name, game.description);
    }
}

fn show_config(explicit: Option<&Path>, settings: &Settings, init: bool) -> Result<(), AppError>
{
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config::default_config_path()?,
    };
    if init {
        config::save_settings(&path, settings)?;
        println!("Wrote settings to {}", path.display());
        return Ok(());
    }

    let contents = serde_json::to_string_pretty(settings).map_err(|source| AppError::Encode {
        path: path.clone(),
        source,
    })?;
    println!("Settings file: {}", path.display());
    println!("{contents}");
    Ok(())
}
