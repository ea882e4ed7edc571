use std::time::{Duration, Instant};

use log::info;
use rand::Rng;

use super::term::{self, Input, TerminalGuard, TICK_MS};
use crate::config::GameConfig;
use crate::engine::{Difficulty, RoundResult, ScoreDelta, Scorer, SessionState};
use crate::error::AppError;
use crate::maze::{Direction, MAX_ANCHORS, MAX_ENERGY, Maze, MazeRun, Step};

const ENERGY_BAR_WIDTH: usize = 20;

/// Level order, turn order and one scorer per player for a maze session.
pub struct MazeMatch
{
    config: GameConfig,
    levels: Vec<Maze>,
    scorers: Vec<Scorer>,
    round: usize,
}

impl MazeMatch
{
    pub fn new(config: GameConfig, levels: Vec<Maze>, players: usize, start: Difficulty) -> Self
    {
        let scorers = (0..players.max(1))
            .map(|_| {
                Scorer::new(
                    config.scoring.clone(),
                    config.progression,
                    start,
                    config.limits.session_time(),
                )
            })
            .collect();
        Self {
            config,
            levels,
            scorers,
            round: 0,
        }
    }

    pub fn players(&self) -> usize
    {
        self.scorers.len()
    }

    /// Every player gets each level once, up to the configured round count.
    pub fn rounds_total(&self) -> usize
    {
        let levels = match self.config.limits.max_rounds {
            Some(max) => self.levels.len().min(max as usize),
            None => self.levels.len(),
        };
        levels * self.players()
    }

    pub fn is_over(&self) -> bool
    {
        self.round >= self.rounds_total()
    }

    pub fn current_player(&self) -> usize
    {
        self.round % self.players()
    }

    pub fn level_number(&self) -> usize
    {
        self.round / self.players() + 1
    }

    pub fn state(&self, player: usize) -> Option<&SessionState>
    {
        self.scorers.get(player).map(Scorer::state)
    }

    pub fn time_limit(&self, difficulty: Difficulty) -> Duration
    {
        self.config.time_limit(difficulty)
    }

    /// The next level for whoever holds the turn, at their difficulty.
    ///
    /// Players whose session clock has run out forfeit their remaining levels.
    pub fn next_run(&mut self) -> Option<MazeRun>
    {
        if self.scorers.iter().all(|s| s.state().out_of_time()) {
            self.end();
        }
        while !self.is_over() && self.scorers[self.current_player()].state().out_of_time() {
            self.round += 1;
        }
        if self.is_over() {
            return None;
        }
        let maze = self.levels.get(self.round / self.players())?.clone();
        let difficulty = self.scorers[self.current_player()].state().difficulty;
        Some(MazeRun::new(maze, difficulty))
    }

    /// Scores a finished or abandoned run and passes the turn.
    pub fn finish(
        &mut self,
        run: &MazeRun,
        difficulty: Difficulty,
        elapsed: Duration,
    ) -> (RoundResult, ScoreDelta)
    {
        let result = if run.is_finished() {
            RoundResult::solved(difficulty, elapsed)
        } else {
            RoundResult::timed_out(difficulty, elapsed, 0, 0)
        };
        let player = self.current_player();
        let scorer = &mut self.scorers[player];
        let delta = scorer.score_round(&result, self.config.time_limit(difficulty), elapsed);
        scorer.apply(delta);
        self.round += 1;
        (result, delta)
    }

    /// Runs the current player's session clock down. True once it is empty.
    pub fn tick(&mut self, dt: Duration) -> bool
    {
        let player = self.current_player();
        let scorer = &mut self.scorers[player];
        scorer.drain(dt);
        scorer.state().out_of_time()
    }

    pub fn end(&mut self)
    {
        self.round = self.rounds_total();
    }

    pub fn winner(&self) -> Option<usize>
    {
        let best = self.scorers.iter().map(|s| s.state().score).max()?;
        let leaders: Vec<usize> = (0..self.scorers.len())
            .filter(|&i| self.scorers[i].state().score == best)
            .collect();
        match leaders.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

fn movement(input: Input) -> Option<Direction>
{
    match input {
        Input::Up | Input::Char('w') => Some(Direction::Up),
        Input::Down | Input::Char('s') => Some(Direction::Down),
        Input::Left | Input::Char('a') => Some(Direction::Left),
        Input::Right | Input::Char('d') => Some(Direction::Right),
        _ => None,
    }
}

pub fn play<R: Rng + ?Sized>(game: &mut MazeMatch, rng: &mut R) -> Result<(), AppError>
{
    let mut term = TerminalGuard::enter()?;

    'session: while let Some(mut run) = game.next_run() {
        let player = game.current_player();
        let difficulty = game.state(player).map(|s| s.difficulty).unwrap_or(Difficulty::Easy);
        let limit = game.time_limit(difficulty);
        let started = Instant::now();
        let mut last_frame = started;
        let mut last_draw: Option<Instant> = None;
        let mut message: Option<String> = None;

        loop {
            for input in term::poll_inputs()? {
                match input {
                    Input::Quit => {
                        game.end();
                        break 'session;
                    }
                    Input::Char('q') => {
                        message = Some(match run.anchor() {
                            Ok(()) => "Anchor stored.".to_string(),
                            Err(err) => err.to_string(),
                        });
                    }
                    Input::Char('e') => {
                        message = Some(match run.teleport(rng) {
                            Ok((row, col)) => format!("Teleported to row {}, column {}.", row + 1, col + 1),
                            Err(err) => err.to_string(),
                        });
                    }
                    other => {
                        if let Some(direction) = movement(other) {
                            message = match run.step(direction) {
                                Step::Blocked => Some("Blocked.".to_string()),
                                Step::Moved | Step::Exited => None,
                            };
                        }
                    }
                }
            }

            let now = Instant::now();
            let clock_out = game.tick(now - last_frame);
            last_frame = now;
            let elapsed = started.elapsed();
            if run.is_finished() || elapsed >= limit || clock_out {
                break;
            }
            if last_draw.is_none_or(|at| at.elapsed() >= Duration::from_millis(TICK_MS)) {
                let lines = run_lines(game, &run, limit.saturating_sub(elapsed), message.as_deref());
                term::draw_lines(term.stdout(), &lines)?;
                last_draw = Some(Instant::now());
            }
            std::thread::sleep(Duration::from_millis(1));
        }

        let elapsed = started.elapsed().min(limit);
        let (result, delta) = game.finish(&run, difficulty, elapsed);
        info!(
            "{} by player {}: {:?} in {} moves, +{}",
            run.maze().name(),
            player + 1,
            result.outcome,
            run.moves(),
            delta.total()
        );
        term::draw_lines(term.stdout(), &result_lines(game, player, &run, &delta))?;
        if !term::wait_for_space()? {
            game.end();
            break;
        }
    }

    term::draw_lines(term.stdout(), &summary_lines(game))?;
    term::wait_for_space()?;
    Ok(())
}

fn player_label(game: &MazeMatch, player: usize) -> String
{
    if game.players() > 1 {
        format!("Player {}", player + 1)
    } else {
        "You".to_string()
    }
}

fn run_lines(game: &MazeMatch, run: &MazeRun, left: Duration, message: Option<&str>) -> Vec<String>
{
    let player = game.current_player();
    let mut lines = vec![format!("Mind Games - Quantum Maze - {}", run.maze().name())];
    let mut header = format!("Level {}", game.level_number());
    if game.players() > 1 {
        header = format!("Player {} of {}   {header}", player + 1, game.players());
    }
    if let Some(state) = game.state(player) {
        header.push_str(&format!("   Score {}   Difficulty {}", state.score, state.difficulty));
        if let Some(left) = state.time_remaining {
            header.push_str(&format!("   Session {}", term::format_clock(left)));
        }
    }
    lines.push(header);

    let filled = (run.energy() as usize * ENERGY_BAR_WIDTH) / MAX_ENERGY as usize;
    lines.push(format!(
        "Energy {} {:>3}   Anchors {}/{}   Time {}",
        term::paint(
            &format!("{}{}", "|".repeat(filled), " ".repeat(ENERGY_BAR_WIDTH - filled)),
            term::BLUE
        ),
        run.energy(),
        run.anchors().count(),
        MAX_ANCHORS,
        term::format_clock(left)
    ));
    lines.push(format!(
        "Phase {}: walls {}   shift in {} move(s)",
        run.phase(),
        if run.phase_walls_open() { "open" } else { "closed" },
        run.moves_to_shift()
    ));
    lines.push(String::new());
    lines.extend(run.render());
    lines.push(String::new());
    lines.push(message.unwrap_or("").to_string());
    lines.push(term::paint(
        "Arrows/WASD move. Q stores an anchor, E teleports. Esc quits.",
        term::GRAY,
    ));
    lines
}

fn result_lines(game: &MazeMatch, player: usize, run: &MazeRun, delta: &ScoreDelta) -> Vec<String>
{
    let mut lines = vec![format!("Quantum Maze - {}", run.maze().name()), String::new()];
    if run.is_finished() {
        lines.push(term::paint(
            &format!("Escaped in {} moves! +{} points", run.moves(), delta.total()),
            term::GREEN,
        ));
        lines.push(format!(
            "  {} base, {} speed, {} streak",
            delta.base, delta.speed, delta.streak
        ));
    } else {
        lines.push(term::paint("Time's up!", term::RED));
    }
    if let Some(state) = game.state(player) {
        lines.push(format!("{}: {} points", player_label(game, player), state.score));
    }
    lines.push(String::new());
    if game.is_over() {
        lines.push("Press SPACE for the results.".to_string());
    } else {
        lines.push(format!(
            "Next: {} on level {}. Press SPACE, Esc to stop.",
            player_label(game, game.current_player()),
            game.level_number()
        ));
    }
    lines
}

fn summary_lines(game: &MazeMatch) -> Vec<String>
{
    let mut lines = vec!["Quantum Maze - game over".to_string(), String::new()];
    for player in 0..game.players() {
        if let Some(state) = game.state(player) {
            lines.push(format!(
                "{:<8} {:>6} points   escaped {}/{}",
                player_label(game, player),
                state.score,
                state.solved,
                state.rounds_played
            ));
        }
    }
    if game.players() > 1 {
        lines.push(String::new());
        lines.push(match game.winner() {
            Some(player) => term::paint(&format!("{} wins!", player_label(game, player)), term::GREEN),
            None => term::paint("It's a tie!", term::YELLOW),
        });
    }
    lines.push(String::new());
    lines.push("Press SPACE to exit.".to_string());
    lines
}
