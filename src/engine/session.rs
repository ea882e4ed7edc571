use std::time::Duration;

use log::info;
use rand::Rng;

use super::{ChallengeProvider, Difficulty, RoundResult, ScoreDelta, Scorer, SessionState};
use crate::config::SessionLimits;
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundPhase
{
    Idle,
    Presented,
    Scored,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport
{
    pub player: usize,
    pub result: RoundResult,
    pub delta: ScoreDelta,
    /// Set once the round is over and the delta has been applied.
    pub closed: bool,
    pub answer: Option<String>,
    pub session_over: bool,
}

/// One game session: a provider, a scorer per player, and strict turn order.
pub struct Session<P: ChallengeProvider>
{
    provider: P,
    scorers: Vec<Scorer>,
    turn: usize,
    round: Option<P::Round>,
    phase: RoundPhase,
    penalty: Duration,
    rounds_closed: u32,
    limits: SessionLimits,
}

impl<P: ChallengeProvider> Session<P>
{
    pub fn new(provider: P, players: usize, start: Difficulty) -> Self
    {
        let config = provider.config().clone();
        let players = players.max(1);
        let scorers = (0..players)
            .map(|_| {
                Scorer::new(
                    config.scoring.clone(),
                    config.progression,
                    start,
                    config.limits.session_time(),
                )
            })
            .collect();
        info!(
            "starting {} session for {} player(s) at {}",
            provider.title(),
            players,
            start
        );
        Self {
            provider,
            scorers,
            turn: 0,
            round: None,
            phase: RoundPhase::Idle,
            penalty: Duration::ZERO,
            rounds_closed: 0,
            limits: config.limits,
        }
    }

    pub fn provider(&self) -> &P
    {
        &self.provider
    }

    pub fn limits(&self) -> &SessionLimits
    {
        &self.limits
    }

    pub fn players(&self) -> usize
    {
        self.scorers.len()
    }

    pub fn current_player(&self) -> usize
    {
        self.turn
    }

    pub fn state(&self, player: usize) -> Option<&SessionState>
    {
        self.scorers.get(player).map(Scorer::state)
    }

    pub fn current_state(&self) -> &SessionState
    {
        self.scorers[self.turn].state()
    }

    pub fn round(&self) -> Option<&P::Round>
    {
        self.round.as_ref()
    }

    pub fn is_over(&self) -> bool
    {
        self.phase == RoundPhase::Ended
    }

    /// Generates the next round for whoever holds the turn.
    ///
    /// Returns `None` when the session has ended instead.
    pub fn start_round<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Option<&P::Round>, EngineError>
    {
        if self.phase == RoundPhase::Ended {
            return Ok(None);
        }

        let mut skipped = 0;
        while self.scorers[self.turn].state().out_of_time() {
            skipped += 1;
            if skipped >= self.scorers.len() {
                self.end();
                return Ok(None);
            }
            self.turn = (self.turn + 1) % self.scorers.len();
        }

        let difficulty = self.scorers[self.turn].state().difficulty;
        let round = self.provider.generate(difficulty, rng)?;
        self.round = Some(round);
        self.phase = RoundPhase::Presented;
        self.penalty = Duration::ZERO;
        Ok(self.round.as_ref())
    }

    /// Time allowed for the current round, after wrong-answer penalties.
    pub fn time_limit(&self) -> Duration
    {
        let difficulty = match &self.round {
            Some(round) => self.provider.difficulty(round),
            None => self.current_state().difficulty,
        };
        self.provider
            .time_limit(difficulty)
            .saturating_sub(self.penalty)
    }

    pub fn time_left(&self, elapsed: Duration) -> Duration
    {
        self.time_limit().saturating_sub(elapsed)
    }

    /// Answers past the round's limit close it as timed out without being
    /// validated.
    pub fn submit(&mut self, guess: &str, elapsed: Duration) -> Result<RoundReport, EngineError>
    {
        if self.phase != RoundPhase::Presented {
            return Err(EngineError::NoActiveRound);
        }
        if elapsed >= self.time_limit() {
            return Ok(self.time_out(elapsed));
        }
        let round = self.round.as_mut().ok_or(EngineError::NoActiveRound)?;
        let result = self.provider.validate(round, guess, elapsed)?;

        if !result.is_final() {
            let delta = self.scorers[self.turn].score_round(&result, self.time_limit(), elapsed);
            self.penalty += delta.penalty;
            return Ok(RoundReport {
                player: self.turn,
                result,
                delta,
                closed: false,
                answer: None,
                session_over: false,
            });
        }
        Ok(self.close_round(result, elapsed))
    }

    pub fn hint(&mut self) -> Result<String, EngineError>
    {
        if self.phase != RoundPhase::Presented {
            return Err(EngineError::NoActiveRound);
        }
        let round = self.round.as_mut().ok_or(EngineError::NoActiveRound)?;
        self.provider.hint(round)
    }

    /// Closes the round as timed out once `elapsed` passes the round's limit.
    pub fn expire(&mut self, elapsed: Duration) -> Option<RoundReport>
    {
        if self.phase != RoundPhase::Presented || elapsed < self.time_limit() {
            return None;
        }
        Some(self.time_out(elapsed))
    }

    /// Runs the current player's session clock; a player whose clock runs
    /// out loses the round in play.
    pub fn tick(&mut self, dt: Duration, round_elapsed: Duration) -> Option<RoundReport>
    {
        if self.phase != RoundPhase::Presented {
            return None;
        }
        let scorer = &mut self.scorers[self.turn];
        scorer.drain(dt);
        if scorer.state().out_of_time() {
            return Some(self.time_out(round_elapsed));
        }
        None
    }

    /// Ends the session early (the player quit).
    pub fn end(&mut self)
    {
        if self.phase != RoundPhase::Ended {
            info!(
                "{} session ended after {} round(s)",
                self.provider.title(),
                self.rounds_closed
            );
        }
        self.round = None;
        self.phase = RoundPhase::Ended;
    }

    /// The highest scoring player, or `None` on a tie.
    pub fn winner(&self) -> Option<usize>
    {
        let best = self.scorers.iter().map(|s| s.state().score).max()?;
        let mut leaders = self
            .scorers
            .iter()
            .enumerate()
            .filter(|(_, s)| s.state().score == best);
        let (player, _) = leaders.next()?;
        if leaders.next().is_some() {
            return None;
        }
        Some(player)
    }

    fn time_out(&mut self, elapsed: Duration) -> RoundReport
    {
        let (difficulty, hints, attempts) = match &self.round {
            Some(round) => (
                self.provider.difficulty(round),
                self.provider.hints_used(round),
                self.provider.attempts_used(round),
            ),
            None => (self.current_state().difficulty, 0, 0),
        };
        let result = RoundResult::timed_out(difficulty, elapsed, hints, attempts);
        self.close_round(result, elapsed)
    }

    fn close_round(&mut self, result: RoundResult, elapsed: Duration) -> RoundReport
    {
        let limit = self.time_limit();
        let player = self.turn;
        let scorer = &mut self.scorers[player];
        let delta = scorer.score_round(&result, limit, elapsed);
        scorer.apply(delta);

        let answer = self.round.take().map(|round| self.provider.answer(&round));
        self.rounds_closed += 1;
        self.penalty = Duration::ZERO;
        self.phase = RoundPhase::Scored;
        self.turn = (self.turn + 1) % self.scorers.len();

        let players = self.scorers.len() as u32;
        let rounds_done = self
            .limits
            .max_rounds
            .is_some_and(|max| self.rounds_closed >= max.saturating_mul(players));
        let clocks_done = self.scorers.iter().all(|s| s.state().out_of_time());
        if rounds_done || clocks_done {
            self.end();
        }

        RoundReport {
            player,
            result,
            delta,
            closed: true,
            answer,
            session_over: self.is_over(),
        }
    }
}
