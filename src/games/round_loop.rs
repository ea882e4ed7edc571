use std::time::{Duration, Instant};

use log::info;
use rand::Rng;

use super::term::{self, Input, Rgb, TerminalGuard, TICK_MS};
use crate::engine::{ChallengeProvider, Outcome, RoundReport, Session};
use crate::error::{AppError, EngineError};

const MAX_INPUT: usize = 64;
const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Feedback
{
    text: String,
    color: Rgb,
}

impl Feedback
{
    fn new(text: impl Into<String>, color: Rgb) -> Self
    {
        Self {
            text: text.into(),
            color,
        }
    }
}

/// Plays `session` in the terminal until it ends or the player quits.
pub fn play<P, R>(session: &mut Session<P>, rng: &mut R) -> Result<(), AppError>
where
    P: ChallengeProvider,
    R: Rng + ?Sized,
{
    let mut term = TerminalGuard::enter()?;

    'session: loop {
        if session.start_round(rng)?.is_none() {
            break;
        }

        let presented = Instant::now();
        let mut last_frame = presented;
        let mut last_draw: Option<Instant> = None;
        let mut buffer = String::new();
        let mut feedback: Option<Feedback> = None;

        let report = 'round: loop {
            let elapsed = presented.elapsed();
            for input in term::poll_inputs()? {
                match input {
                    Input::Quit => {
                        session.end();
                        break 'session;
                    }
                    Input::Enter => {
                        if buffer.trim().is_empty() {
                            continue;
                        }
                        match session.submit(&buffer, elapsed) {
                            Ok(report) if report.closed => break 'round report,
                            Ok(report) => {
                                feedback = Some(wrong_answer(&report));
                                buffer.clear();
                            }
                            Err(err) => feedback = Some(engine_feedback(&err)),
                        }
                    }
                    Input::Tab => {
                        feedback = Some(match session.hint() {
                            Ok(hint) => Feedback::new(format!("Hint: {hint}"), term::BLUE),
                            Err(err) => engine_feedback(&err),
                        });
                    }
                    Input::Backspace => {
                        buffer.pop();
                    }
                    Input::Char(ch) => {
                        if buffer.len() < MAX_INPUT && (ch.is_ascii_graphic() || ch == ' ') {
                            buffer.push(ch);
                        }
                    }
                    _ => {}
                }
            }

            let now = Instant::now();
            if let Some(report) = session.tick(now - last_frame, elapsed) {
                break report;
            }
            last_frame = now;
            if let Some(report) = session.expire(elapsed) {
                break report;
            }

            if last_draw.is_none_or(|at| at.elapsed() >= Duration::from_millis(TICK_MS)) {
                let lines = round_lines(session, &buffer, feedback.as_ref(), elapsed);
                term::draw_lines(term.stdout(), &lines)?;
                last_draw = Some(Instant::now());
            }
            std::thread::sleep(Duration::from_millis(1));
        };

        info!(
            "player {} closed a round: {:?} after {:.1}s, {} attempt(s), {} hint(s), +{}",
            report.player + 1,
            report.result.outcome,
            report.result.elapsed.as_secs_f64(),
            report.result.attempts_used,
            report.result.hints_used,
            report.delta.total()
        );
        term::draw_lines(term.stdout(), &report_lines(session, &report))?;
        if !term::wait_for_space()? {
            session.end();
            break;
        }
        if session.is_over() {
            break;
        }
    }

    session.end();
    term::draw_lines(term.stdout(), &summary_lines(session))?;
    term::wait_for_space()?;
    Ok(())
}

fn wrong_answer(report: &RoundReport) -> Feedback
{
    let penalty = report.delta.penalty;
    let mut text = format!(
        "Not quite. {} attempt(s) left.",
        report.result.attempts_left
    );
    if !penalty.is_zero() {
        text.push_str(&format!(" -{}s", penalty.as_secs()));
    }
    Feedback::new(text, term::RED)
}

fn engine_feedback(err: &EngineError) -> Feedback
{
    Feedback::new(capitalize(&err.to_string()), term::YELLOW)
}

fn capitalize(text: &str) -> String
{
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn player_label<P: ChallengeProvider>(session: &Session<P>, player: usize) -> String
{
    if session.players() > 1 {
        format!("Player {}", player + 1)
    } else {
        "You".to_string()
    }
}

fn round_lines<P: ChallengeProvider>(
    session: &Session<P>,
    buffer: &str,
    feedback: Option<&Feedback>,
    elapsed: Duration,
) -> Vec<String>
{
    let state = session.current_state();
    let mut lines = Vec::new();
    lines.push(format!("Mind Games - {}", session.provider().title()));

    let round = match session.limits().max_rounds {
        Some(max) => format!("Round {}/{}", state.rounds_played + 1, max),
        None => format!("Round {}", state.rounds_played + 1),
    };
    let mut header = format!("{round}   Difficulty: {}", state.difficulty);
    if session.players() > 1 {
        header = format!(
            "Player {} of {}   {header}",
            session.current_player() + 1,
            session.players()
        );
    }
    lines.push(header);
    lines.push(format!(
        "Score {}   Streak {} (best {})   Solved {}",
        state.score, state.streak, state.best_streak, state.solved
    ));

    let limit = session.time_limit();
    let mut clock = format!(
        "Time {} {}",
        term::time_bar(session.time_left(elapsed), limit, BAR_WIDTH),
        term::format_clock(session.time_left(elapsed))
    );
    if let Some(left) = state.time_remaining {
        clock.push_str(&format!("   Session {}", term::format_clock(left)));
    }
    lines.push(clock);
    lines.push(String::new());

    if let Some(round) = session.round() {
        lines.extend(session.provider().prompt(round, elapsed));
    }
    lines.push(String::new());
    lines.push(format!("> {buffer}_"));
    match feedback {
        Some(feedback) => lines.push(term::paint(&feedback.text, feedback.color)),
        None => lines.push(String::new()),
    }
    lines.push(term::paint(
        "Enter submits. Tab for a hint. Backspace edits. Esc quits.",
        term::GRAY,
    ));
    lines
}

fn report_lines<P: ChallengeProvider>(session: &Session<P>, report: &RoundReport) -> Vec<String>
{
    let mut lines = Vec::new();
    lines.push(format!("Mind Games - {}", session.provider().title()));
    lines.push(String::new());

    let who = player_label(session, report.player);
    match report.result.outcome {
        Outcome::Correct => {
            let delta = report.delta;
            lines.push(term::paint(
                &format!("Correct! +{} points", delta.total()),
                term::GREEN,
            ));
            lines.push(format!(
                "  {} base, {} speed, {} streak",
                delta.base, delta.speed, delta.streak
            ));
        }
        Outcome::Incorrect => lines.push(term::paint("Out of attempts.", term::RED)),
        Outcome::TimedOut => lines.push(term::paint("Time's up!", term::RED)),
    }
    if let Some(answer) = &report.answer {
        lines.push(format!("The answer was: {}", answer.to_uppercase()));
    }
    if let Some(state) = session.state(report.player) {
        lines.push(format!(
            "{who}: {} points, streak {}, next round {}",
            state.score, state.streak, state.difficulty
        ));
    }
    lines.push(String::new());

    if report.session_over {
        lines.push("Session over. Press SPACE for the results.".to_string());
    } else if session.players() > 1 {
        lines.push(format!(
            "{}, you're up. Press SPACE when ready, Esc to stop.",
            player_label(session, session.current_player())
        ));
    } else {
        lines.push("Press SPACE for the next round, Esc to stop.".to_string());
    }
    lines
}

fn summary_lines<P: ChallengeProvider>(session: &Session<P>) -> Vec<String>
{
    let mut lines = Vec::new();
    lines.push(format!("{} - game over", session.provider().title()));
    lines.push(String::new());
    for player in 0..session.players() {
        if let Some(state) = session.state(player) {
            lines.push(format!(
                "{:<8} {:>6} points   solved {}/{}   best streak {}",
                player_label(session, player),
                state.score,
                state.solved,
                state.rounds_played,
                state.best_streak
            ));
        }
    }
    if session.players() > 1 {
        lines.push(String::new());
        match session.winner() {
            Some(player) => lines.push(term::paint(
                &format!("{} wins!", player_label(session, player)),
                term::GREEN,
            )),
            None => lines.push(term::paint("It's a tie!", term::YELLOW)),
        }
    }
    lines.push(String::new());
    lines.push("Press SPACE to exit.".to_string());
    lines
}
