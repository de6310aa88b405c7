//! Game sessions and the registry that hosts them.
//!
//! A [`GameSession`] owns one engine, its two participants and the
//! append-only event log. It checks turn ownership, records the terminal
//! outcome and computes the reward exactly once.
//!
//! [`SessionRegistry`] owns every live session. It drives clocks and bot
//! turns from [`SessionRegistry::advance_time`], so nothing ever blocks on a
//! timer: a host calls `advance_time` with however much wall time has passed
//! and the registry replays the one-second ticks and due bot actions in order.

use crate::actions::{
    BackgammonAction, ChessAction, GameAction, GameEvent, GoFishAction, NavalAction, SpeedAction,
};
use crate::backgammon::{Backgammon, BackgammonPhase};
use crate::bot::Bot;
use crate::chess::ChessGame;
use crate::config::EngineConfig;
use crate::error::GameError;
use crate::go_fish::GoFish;
use crate::naval::{NavalBattle, NavalPhase};
use crate::player::{EndReason, GameResult, Outcome, Participant, Seat};
use crate::rng::{RandomSource, SeededRandom};
use crate::speed::Speed;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub type SessionId = Uuid;

const TICK: Duration = Duration::from_secs(1);

/// The five games a session can host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameType {
    Chess,
    NavalBattle,
    Backgammon,
    GoFish,
    Speed,
}

impl GameType {
    pub const ALL: [GameType; 5] = [
        GameType::Chess,
        GameType::NavalBattle,
        GameType::Backgammon,
        GameType::GoFish,
        GameType::Speed,
    ];

    /// The game a command is addressed to; `None` for game-agnostic commands
    pub fn of_action(action: &GameAction) -> Option<GameType> {
        match action {
            GameAction::Chess(_) => Some(GameType::Chess),
            GameAction::Naval(_) => Some(GameType::NavalBattle),
            GameAction::Backgammon(_) => Some(GameType::Backgammon),
            GameAction::GoFish(_) => Some(GameType::GoFish),
            GameAction::Speed(_) => Some(GameType::Speed),
            GameAction::Resign => None,
        }
    }
}

/// The engine a session hosts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Engine {
    Chess(ChessGame),
    Naval(NavalBattle),
    Backgammon(Backgammon),
    GoFish(GoFish),
    Speed(Speed),
}

impl Engine {
    pub fn new<R: RandomSource>(game_type: GameType, config: &EngineConfig, rng: &mut R) -> Self {
        match game_type {
            GameType::Chess => Engine::Chess(ChessGame::new(config.chess.clock_seconds)),
            GameType::NavalBattle => Engine::Naval(NavalBattle::new(
                config.naval.rows,
                config.naval.cols,
                config.naval.fleet.clone(),
            )),
            GameType::Backgammon => Engine::Backgammon(Backgammon::new()),
            GameType::GoFish => Engine::GoFish(GoFish::new(
                rng,
                config.go_fish.hand_size,
                config.go_fish.books_to_finish,
            )),
            GameType::Speed => Engine::Speed(Speed::new(rng, &config.speed)),
        }
    }

    pub fn game_type(&self) -> GameType {
        match self {
            Engine::Chess(_) => GameType::Chess,
            Engine::Naval(_) => GameType::NavalBattle,
            Engine::Backgammon(_) => GameType::Backgammon,
            Engine::GoFish(_) => GameType::GoFish,
            Engine::Speed(_) => GameType::Speed,
        }
    }

    pub fn result(&self) -> Option<GameResult> {
        match self {
            Engine::Chess(game) => game.result(),
            Engine::Naval(game) => game.result(),
            Engine::Backgammon(game) => game.result(),
            Engine::GoFish(game) => game.result(),
            Engine::Speed(game) => game.result(),
        }
    }

    /// The seat whose turn it is. `None` when both may act (naval setup,
    /// Speed) or when the game is over.
    pub fn turn_owner(&self) -> Option<Seat> {
        match self {
            Engine::Chess(game) => game.turn_owner(),
            Engine::Naval(game) => game.turn_owner(),
            Engine::Backgammon(game) => game.turn_owner(),
            Engine::GoFish(game) => game.turn_owner(),
            Engine::Speed(_) => None,
        }
    }

    /// Advance the game's own clock; untimed games ignore ticks
    pub fn tick(&mut self, seconds: u32) -> Vec<GameEvent> {
        match self {
            Engine::Chess(game) => game.tick(seconds),
            Engine::Speed(game) => game.tick(seconds),
            _ => Vec::new(),
        }
    }

    /// Every game command `seat` may issue right now. `Resign` is always
    /// available while the game runs and is not listed.
    pub fn valid_actions(&self, seat: Seat) -> Vec<GameAction> {
        if self.result().is_some() {
            return Vec::new();
        }
        let on_turn = self.turn_owner() == Some(seat);

        match self {
            Engine::Chess(game) if on_turn => game
                .legal_moves()
                .into_iter()
                .map(|(from, to)| GameAction::Chess(ChessAction::Move { from, to }))
                .collect(),

            Engine::Naval(battle) if battle.phase == NavalPhase::Setup => {
                let fleet = battle.fleet(seat);
                if fleet.is_complete() {
                    return Vec::new();
                }
                let mut actions = vec![GameAction::Naval(NavalAction::RandomizeFleet)];
                for ship in 0..fleet.specs().len() {
                    for origin in fleet.board.coords() {
                        for horizontal in [true, false] {
                            if fleet.fits(ship, origin, horizontal) {
                                actions.push(GameAction::Naval(NavalAction::PlaceShip {
                                    ship,
                                    origin,
                                    horizontal,
                                }));
                            }
                        }
                    }
                }
                actions
            }
            Engine::Naval(battle) if on_turn => battle
                .targets_for(seat)
                .into_iter()
                .map(|target| GameAction::Naval(NavalAction::Attack { target }))
                .collect(),

            Engine::Backgammon(game) if on_turn => match game.phase {
                BackgammonPhase::Roll => vec![GameAction::Backgammon(BackgammonAction::Roll)],
                BackgammonPhase::Move => game
                    .legal_moves()
                    .into_iter()
                    .map(|(from, distance)| {
                        GameAction::Backgammon(BackgammonAction::Move { from, distance })
                    })
                    .collect(),
            },

            Engine::GoFish(game) if on_turn => game
                .askable_ranks(seat)
                .into_iter()
                .map(|rank| GameAction::GoFish(GoFishAction::Ask { rank }))
                .collect(),

            Engine::Speed(game) => {
                let plays: Vec<GameAction> = game
                    .playable(seat)
                    .into_iter()
                    .map(|(hand_index, pile)| {
                        GameAction::Speed(SpeedAction::Play { hand_index, pile })
                    })
                    .collect();
                if plays.is_empty() && game.playable(seat.other()).is_empty() {
                    vec![GameAction::Speed(SpeedAction::Flip)]
                } else {
                    plays
                }
            }

            _ => Vec::new(),
        }
    }

    /// Route a game command to the engine
    fn apply<R: RandomSource>(
        &mut self,
        seat: Seat,
        action: GameAction,
        rng: &mut R,
        config: &EngineConfig,
    ) -> Result<Vec<GameEvent>, GameError> {
        match (self, action) {
            (engine, GameAction::Resign) => engine.resign(seat),
            (Engine::Chess(game), GameAction::Chess(ChessAction::Move { from, to })) => {
                game.apply_move(from, to)
            }
            (Engine::Naval(battle), GameAction::Naval(action)) => match action {
                NavalAction::PlaceShip {
                    ship,
                    origin,
                    horizontal,
                } => battle.place_ship(seat, ship, origin, horizontal),
                NavalAction::RandomizeFleet => {
                    battle.randomize_fleet(seat, rng, config.naval.placement_attempts)
                }
                NavalAction::Attack { target } => battle.attack(seat, target),
            },
            (Engine::Backgammon(game), GameAction::Backgammon(action)) => match action {
                BackgammonAction::Roll => game.roll_dice(rng),
                BackgammonAction::Move { from, distance } => game.apply_move(from, distance),
            },
            (Engine::GoFish(game), GameAction::GoFish(GoFishAction::Ask { rank })) => {
                game.ask_for_rank(rank)
            }
            (Engine::Speed(game), GameAction::Speed(action)) => match action {
                SpeedAction::Play { hand_index, pile } => game.play_card(seat, hand_index, pile),
                SpeedAction::Flip => game.flip(),
            },
            _ => Err(GameError::WrongGame),
        }
    }

    fn resign(&mut self, seat: Seat) -> Result<Vec<GameEvent>, GameError> {
        match self {
            Engine::Chess(game) => game.resign(seat),
            Engine::Naval(game) => game.resign(seat),
            Engine::Backgammon(game) => game.resign(seat),
            Engine::GoFish(game) => game.resign(seat),
            Engine::Speed(game) => game.resign(seat),
        }
    }
}

/// Reward for seat one, the household member the session was started for
pub fn compute_reward(engine: &Engine, result: GameResult, config: &EngineConfig) -> u32 {
    let seat_one_won = result.outcome.winner() == Some(Seat::One);
    let resigned = result.reason == EndReason::Resignation;

    match engine {
        Engine::Chess(_) => match result.reason {
            _ if !seat_one_won => 0,
            EndReason::KingCaptured => config.chess.capture_win,
            EndReason::ClockExpired => config.chess.timeout_win,
            _ => config.chess.resign_win,
        },
        Engine::Naval(battle) => {
            let naval = &config.naval;
            let tally = battle
                .tally
                .hits
                .saturating_mul(naval.hit)
                .saturating_add(battle.tally.sunk_length.saturating_mul(naval.sunk_per_length));
            let terminal = if resigned {
                config.resign_reward
            } else if battle.phase == NavalPhase::Victory {
                naval.victory
            } else {
                naval.defeat
            };
            tally.saturating_add(terminal)
        }
        Engine::Backgammon(_) => match result.reason {
            EndReason::Resignation => config.resign_reward,
            EndReason::BorneOff { gammon } if seat_one_won => {
                let multiplier = if gammon {
                    config.backgammon.gammon_multiplier
                } else {
                    1
                };
                config.backgammon.win.saturating_mul(multiplier)
            }
            _ => 0,
        },
        Engine::GoFish(_) if resigned => config.resign_reward,
        Engine::GoFish(_) => match result.outcome {
            Outcome::Player1Win => config.go_fish.win,
            Outcome::Draw => config.go_fish.draw,
            _ => config.go_fish.loss,
        },
        Engine::Speed(_) if resigned => config.resign_reward,
        Engine::Speed(_) => match result.outcome {
            Outcome::Player1Win => config.speed.win,
            Outcome::Timeout { winner } if winner != Some(Seat::Two) => config.speed.timeout,
            _ => config.speed.loss,
        },
    }
}

/// One line of the session log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub seq: usize,
    /// Seat whose command produced the event; `None` for clock ticks
    pub seat: Option<Seat>,
    pub event: GameEvent,
}

/// One game between two participants
pub struct GameSession {
    id: SessionId,
    game_type: GameType,
    players: [Participant; 2],
    engine: Engine,
    log: Vec<LogEntry>,
    result: Option<GameResult>,
    reward: Option<u32>,
    reward_paid: bool,
    config: EngineConfig,
    rng: Box<dyn RandomSource + Send>,
}

impl GameSession {
    pub fn new(
        game_type: GameType,
        players: [Participant; 2],
        config: EngineConfig,
        mut rng: Box<dyn RandomSource + Send>,
    ) -> Self {
        let engine = Engine::new(game_type, &config, &mut rng);
        Self {
            id: Uuid::new_v4(),
            game_type,
            players,
            engine,
            log: Vec::new(),
            result: None,
            reward: None,
            reward_paid: false,
            config,
            rng,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn game_type(&self) -> GameType {
        self.game_type
    }

    pub fn players(&self) -> &[Participant; 2] {
        &self.players
    }

    pub fn participant(&self, seat: Seat) -> &Participant {
        &self.players[seat.index()]
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.result.map(|r| r.outcome)
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    pub fn turn_owner(&self) -> Option<Seat> {
        if self.is_finished() {
            return None;
        }
        self.engine.turn_owner()
    }

    pub fn valid_actions(&self, seat: Seat) -> Vec<GameAction> {
        if self.is_finished() {
            return Vec::new();
        }
        self.engine.valid_actions(seat)
    }

    /// Reward earned by this session, once it has an outcome
    pub fn reward(&self) -> Option<u32> {
        self.reward
    }

    /// Apply one command from `seat`.
    ///
    /// Rejections leave the session untouched. A command that ends the game
    /// appends a `GameOver` event after the engine's own events.
    pub fn apply_action(
        &mut self,
        seat: Seat,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.is_finished() {
            return Err(GameError::AlreadyResolved);
        }
        if GameType::of_action(&action).is_some_and(|t| t != self.game_type) {
            return Err(GameError::WrongGame);
        }
        if action != GameAction::Resign {
            if let Some(owner) = self.engine.turn_owner() {
                if owner != seat {
                    return Err(GameError::NotYourTurn);
                }
            }
        }

        debug!(session = %self.id, ?seat, ?action, "Applying command");
        let events = self
            .engine
            .apply(seat, action, &mut self.rng, &self.config)
            .map_err(|err| {
                if !err.is_rejection() {
                    error!(session = %self.id, %err, "Engine invariant violated");
                }
                err
            })?;
        Ok(self.record(Some(seat), events))
    }

    /// Advance the session's clock, if its game has one
    pub fn tick(&mut self, seconds: u32) -> Vec<GameEvent> {
        if self.is_finished() {
            return Vec::new();
        }
        let events = self.engine.tick(seconds);
        self.record(None, events)
    }

    /// Append events to the log and pick up a terminal result
    fn record(&mut self, seat: Option<Seat>, mut events: Vec<GameEvent>) -> Vec<GameEvent> {
        if self.result.is_none() {
            if let Some(result) = self.engine.result() {
                let reward = compute_reward(&self.engine, result, &self.config);
                self.result = Some(result);
                self.reward = Some(reward);
                info!(
                    session = %self.id,
                    game = ?self.game_type,
                    outcome = ?result.outcome,
                    reason = ?result.reason,
                    reward,
                    "Session finished"
                );
                events.push(GameEvent::GameOver {
                    outcome: result.outcome,
                });
            }
        }

        for event in &events {
            self.log.push(LogEntry {
                seq: self.log.len(),
                seat,
                event: event.clone(),
            });
        }
        events
    }

    /// Hand out the reward the first time it is asked for after the session
    /// ends; `None` before the end and on every later call
    pub fn take_reward(&mut self) -> Option<u32> {
        if self.reward_paid {
            return None;
        }
        let reward = self.reward?;
        self.reward_paid = true;
        Some(reward)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            game_type: self.game_type,
            players: self.players.clone(),
            engine: self.engine.clone(),
            turn_owner: self.turn_owner(),
            result: self.result,
            reward: self.reward,
            log: self.log.clone(),
        }
    }
}

/// Read-only copy of a session for rendering layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub game_type: GameType,
    pub players: [Participant; 2],
    pub engine: Engine,
    pub turn_owner: Option<Seat>,
    pub result: Option<GameResult>,
    pub reward: Option<u32>,
    pub log: Vec<LogEntry>,
}

/// Host callback for finished sessions
pub trait RewardSink {
    fn on_game_complete(&mut self, game_type: GameType, reward_points: u32);
}

/// Sink that keeps every payout in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedRewards {
    pub payouts: Vec<(GameType, u32)>,
}

impl RecordedRewards {
    pub fn total(&self) -> u32 {
        self.payouts.iter().map(|(_, points)| points).sum()
    }
}

impl RewardSink for RecordedRewards {
    fn on_game_complete(&mut self, game_type: GameType, reward_points: u32) {
        self.payouts.push((game_type, reward_points));
    }
}

/// A bot turn waiting for its delay to pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledAction {
    pub session: SessionId,
    pub seat: Seat,
    /// Registry time at which the bot acts
    pub due: Duration,
}

struct HostedSession {
    session: GameSession,
    bots: [Option<Bot>; 2],
}

/// Owns every live session and the host's reward sink
pub struct SessionRegistry<S: RewardSink> {
    config: EngineConfig,
    sink: S,
    sessions: HashMap<SessionId, HostedSession>,
    pending: Vec<ScheduledAction>,
    now: Duration,
    next_tick: Duration,
}

impl<S: RewardSink> SessionRegistry<S> {
    pub fn new(config: EngineConfig, sink: S) -> Self {
        Self {
            config,
            sink,
            sessions: HashMap::new(),
            pending: Vec::new(),
            now: Duration::ZERO,
            next_tick: TICK,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Time elapsed since the registry was created
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn session(&self, id: SessionId) -> Option<&GameSession> {
        self.sessions.get(&id).map(|h| &h.session)
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Start a session shuffled and rolled from entropy
    pub fn start_session(
        &mut self,
        game_type: GameType,
        player1: Participant,
        player2: Participant,
    ) -> SessionId {
        self.start_session_with(
            game_type,
            [player1, player2],
            Box::new(SeededRandom::from_entropy()),
        )
    }

    /// Start a session drawing all of its randomness from `rng`
    pub fn start_session_with(
        &mut self,
        game_type: GameType,
        players: [Participant; 2],
        rng: Box<dyn RandomSource + Send>,
    ) -> SessionId {
        let mut session = GameSession::new(game_type, players, self.config.clone(), rng);
        let mut bots = [None, None];
        for seat in Seat::BOTH {
            let difficulty = match session.participant(seat) {
                Participant::Bot { difficulty, .. } => *difficulty,
                Participant::Human { .. } => continue,
            };
            let seed = session.rng.rand_int(0, i64::MAX) as u64;
            bots[seat.index()] = Some(Bot::with_seed(seat, difficulty, seed));
        }

        let id = session.id();
        info!(session = %id, game = ?game_type, "Session started");
        self.sessions.insert(id, HostedSession { session, bots });
        self.schedule_bots(id);
        id
    }

    /// Dispose of a session and cancel its pending bot actions
    pub fn close_session(&mut self, id: SessionId) -> Result<(), GameError> {
        self.sessions
            .remove(&id)
            .ok_or(GameError::UnknownSession)?;
        let before = self.pending.len();
        self.pending.retain(|p| p.session != id);
        info!(
            session = %id,
            cancelled = before - self.pending.len(),
            "Session closed"
        );
        Ok(())
    }

    /// Apply a command from the seat a host controls
    pub fn apply(
        &mut self,
        id: SessionId,
        seat: Seat,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        let hosted = self.sessions.get_mut(&id).ok_or(GameError::UnknownSession)?;
        let events = hosted.session.apply_action(seat, action)?;
        self.settle(id);
        self.schedule_bots(id);
        Ok(events)
    }

    pub fn pending_actions(&self, id: SessionId) -> Vec<ScheduledAction> {
        self.pending
            .iter()
            .filter(|p| p.session == id)
            .copied()
            .collect()
    }

    /// Let `elapsed` pass: run every one-second tick and due bot action in
    /// time order. Returns the events produced, tagged with their session.
    pub fn advance_time(&mut self, elapsed: Duration) -> Vec<(SessionId, GameEvent)> {
        let target = self.now + elapsed;
        let mut produced = Vec::new();

        loop {
            let next_action = self.pending.iter().map(|p| p.due).min();
            match next_action {
                Some(due) if due <= self.next_tick && due <= target => {
                    self.now = due;
                    if let Some(index) = self.pending.iter().position(|p| p.due == due) {
                        let scheduled = self.pending.remove(index);
                        produced.extend(self.run_scheduled(scheduled));
                    }
                }
                _ if self.next_tick <= target => {
                    self.now = self.next_tick;
                    self.next_tick += TICK;
                    produced.extend(self.tick_all());
                }
                _ => break,
            }
        }

        self.now = target;
        produced
    }

    fn tick_all(&mut self) -> Vec<(SessionId, GameEvent)> {
        let mut produced = Vec::new();
        for id in self.session_ids() {
            let Some(hosted) = self.sessions.get_mut(&id) else {
                continue;
            };
            let events = hosted.session.tick(1);
            if events.is_empty() {
                continue;
            }
            produced.extend(events.into_iter().map(|e| (id, e)));
            self.settle(id);
        }
        produced
    }

    fn run_scheduled(&mut self, scheduled: ScheduledAction) -> Vec<(SessionId, GameEvent)> {
        let id = scheduled.session;
        let Some(HostedSession { session, bots }) = self.sessions.get_mut(&id) else {
            warn!(session = %id, seat = ?scheduled.seat, "Dropping bot action for a closed session");
            return Vec::new();
        };
        let Some(bot) = bots[scheduled.seat.index()].as_mut() else {
            return Vec::new();
        };
        if session.is_finished() {
            debug!(session = %id, "Dropping bot action for a finished session");
            return Vec::new();
        }

        let mut produced = Vec::new();
        match bot.choose_action(session.engine()) {
            Some(action) => match session.apply_action(scheduled.seat, action) {
                Ok(events) => produced.extend(events.into_iter().map(|e| (id, e))),
                Err(err) => warn!(session = %id, %err, "Bot command rejected"),
            },
            None => debug!(session = %id, seat = ?scheduled.seat, "Bot has nothing to do"),
        }

        self.settle(id);
        self.schedule_bots(id);
        produced
    }

    /// Pay out a finished session's reward and drop its pending actions
    fn settle(&mut self, id: SessionId) {
        let Some(hosted) = self.sessions.get_mut(&id) else {
            return;
        };
        if !hosted.session.is_finished() {
            return;
        }
        self.pending.retain(|p| p.session != id);
        if let Some(points) = hosted.session.take_reward() {
            info!(session = %id, points, "Paying reward");
            self.sink.on_game_complete(hosted.session.game_type(), points);
        }
    }

    /// Queue a turn for every bot seat that has something to do
    fn schedule_bots(&mut self, id: SessionId) {
        let Some(hosted) = self.sessions.get(&id) else {
            return;
        };
        let session = &hosted.session;
        if session.is_finished() {
            return;
        }

        let delay = bot_delay(&self.config, session.game_type());
        for seat in Seat::BOTH {
            let is_bot = hosted.bots[seat.index()].is_some();
            let queued = self
                .pending
                .iter()
                .any(|p| p.session == id && p.seat == seat);
            if !is_bot || queued || session.valid_actions(seat).is_empty() {
                continue;
            }
            debug!(session = %id, ?seat, ?delay, "Scheduling bot turn");
            self.pending.push(ScheduledAction {
                session: id,
                seat,
                due: self.now + delay,
            });
        }
    }
}

/// How long a bot waits before acting in `game_type`
fn bot_delay(config: &EngineConfig, game_type: GameType) -> Duration {
    let millis = match game_type {
        GameType::Chess => config.chess.bot_delay_ms,
        GameType::NavalBattle => config.naval.opponent_delay_ms,
        GameType::Backgammon => config.backgammon.bot_delay_ms,
        GameType::GoFish => config.go_fish.opponent_delay_ms,
        GameType::Speed => config.speed.bot_interval_ms,
    };
    Duration::from_millis(millis.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Coord;
    use crate::bot::BotDifficulty;
    use crate::chess::Square;
    use crate::rng::ScriptedRandom;

    fn recording_registry(config: EngineConfig) -> SessionRegistry<RecordedRewards> {
        SessionRegistry::new(config, RecordedRewards::default())
    }

    fn humans() -> [Participant; 2] {
        [Participant::human("Ana"), Participant::human("Ben")]
    }

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn chess_move(from: &str, to: &str) -> GameAction {
        GameAction::Chess(ChessAction::Move {
            from: sq(from),
            to: sq(to),
        })
    }

    #[test]
    fn test_not_your_turn() {
        let mut registry = recording_registry(EngineConfig::default());
        let id = registry.start_session_with(
            GameType::Chess,
            humans(),
            Box::new(ScriptedRandom::new(vec![0])),
        );
        assert_eq!(
            registry.apply(id, Seat::Two, chess_move("e7", "e5")),
            Err(GameError::NotYourTurn)
        );
        registry.apply(id, Seat::One, chess_move("e2", "e4")).unwrap();
        assert_eq!(
            registry.session(id).unwrap().turn_owner(),
            Some(Seat::Two)
        );
    }

    #[test]
    fn test_wrong_game() {
        let mut registry = recording_registry(EngineConfig::default());
        let id = registry.start_session_with(
            GameType::Chess,
            humans(),
            Box::new(ScriptedRandom::new(vec![0])),
        );
        let roll = GameAction::Backgammon(BackgammonAction::Roll);
        assert_eq!(registry.apply(id, Seat::One, roll), Err(GameError::WrongGame));
    }

    #[test]
    fn test_reward_paid_at_most_once() {
        let mut registry = recording_registry(EngineConfig::default());
        let id = registry.start_session_with(
            GameType::Backgammon,
            humans(),
            Box::new(ScriptedRandom::new(vec![0])),
        );
        let events = registry.apply(id, Seat::Two, GameAction::Resign).unwrap();
        assert_eq!(
            events.last(),
            Some(&GameEvent::GameOver {
                outcome: Outcome::Player1Win
            })
        );
        assert_eq!(
            registry.apply(id, Seat::One, GameAction::Resign),
            Err(GameError::AlreadyResolved)
        );
        registry.advance_time(Duration::from_secs(5));
        assert_eq!(registry.sink().payouts.len(), 1);
    }

    #[test]
    fn test_take_reward_once() {
        let mut session = GameSession::new(
            GameType::GoFish,
            humans(),
            EngineConfig::default(),
            Box::new(SeededRandom::with_seed(4)),
        );
        assert_eq!(session.take_reward(), None);
        session.apply_action(Seat::One, GameAction::Resign).unwrap();
        assert_eq!(session.take_reward(), Some(0));
        assert_eq!(session.take_reward(), None);
        assert_eq!(session.reward(), Some(0));
    }

    #[test]
    fn test_chess_clock_ticks_through_registry() {
        let mut config = EngineConfig::default();
        config.chess.clock_seconds = 3;
        let mut registry = recording_registry(config);
        let id = registry.start_session_with(
            GameType::Chess,
            humans(),
            Box::new(ScriptedRandom::new(vec![0])),
        );

        let events = registry.advance_time(Duration::from_millis(2500));
        assert!(events.is_empty());
        let events = registry.advance_time(Duration::from_millis(600));
        assert!(events
            .iter()
            .any(|(_, e)| matches!(e, GameEvent::GameOver { .. })));

        let session = registry.session(id).unwrap();
        assert_eq!(
            session.outcome(),
            Some(Outcome::Timeout {
                winner: Some(Seat::Two)
            })
        );
        // White flagged, so seat one earns nothing
        assert_eq!(registry.sink().payouts, vec![(GameType::Chess, 0)]);
    }

    #[test]
    fn test_bot_reply_waits_for_delay() {
        let mut registry = recording_registry(EngineConfig::default());
        let id = registry.start_session_with(
            GameType::Chess,
            [
                Participant::human("Ana"),
                Participant::bot("Rook", BotDifficulty::Easy),
            ],
            Box::new(SeededRandom::with_seed(11)),
        );
        assert!(registry.pending_actions(id).is_empty());

        registry.apply(id, Seat::One, chess_move("e2", "e4")).unwrap();
        let pending = registry.pending_actions(id);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].seat, Seat::Two);

        registry.advance_time(Duration::from_millis(999));
        assert_eq!(registry.session(id).unwrap().turn_owner(), Some(Seat::Two));
        registry.advance_time(Duration::from_millis(1));
        assert_eq!(registry.session(id).unwrap().turn_owner(), Some(Seat::One));
    }

    #[test]
    fn test_close_cancels_pending() {
        let mut registry = recording_registry(EngineConfig::default());
        let id = registry.start_session_with(
            GameType::NavalBattle,
            [
                Participant::human("Ana"),
                Participant::bot("Admiral", BotDifficulty::Medium),
            ],
            Box::new(SeededRandom::with_seed(5)),
        );
        // The bot seat queues its fleet placement right away
        assert_eq!(registry.pending_actions(id).len(), 1);

        registry.close_session(id).unwrap();
        assert!(registry.pending_actions(id).is_empty());
        assert!(registry.advance_time(Duration::from_secs(10)).is_empty());
        assert!(registry.session(id).is_none());
        assert!(registry.sink().payouts.is_empty());
        assert_eq!(registry.close_session(id), Err(GameError::UnknownSession));
    }

    #[test]
    fn test_naval_setup_then_bot_attacks() {
        let mut registry = recording_registry(EngineConfig::default());
        let id = registry.start_session_with(
            GameType::NavalBattle,
            [
                Participant::human("Ana"),
                Participant::bot("Admiral", BotDifficulty::Easy),
            ],
            Box::new(SeededRandom::with_seed(8)),
        );
        registry
            .apply(id, Seat::One, GameAction::Naval(NavalAction::RandomizeFleet))
            .unwrap();
        registry.advance_time(Duration::from_secs(1));

        let session = registry.session(id).unwrap();
        let Engine::Naval(battle) = session.engine() else {
            panic!("expected a naval engine");
        };
        assert_eq!(battle.phase, NavalPhase::Battle);
        assert_eq!(session.turn_owner(), Some(Seat::One));

        let target = GameAction::Naval(NavalAction::Attack {
            target: Coord::new(0, 0),
        });
        registry.apply(id, Seat::One, target).unwrap();
        registry.advance_time(Duration::from_secs(1));
        let log = registry.session(id).unwrap().log();
        assert!(log.iter().any(|entry| matches!(
            entry.event,
            GameEvent::Attacked {
                attacker: Seat::Two,
                ..
            }
        )));
    }

    #[test]
    fn test_chess_rewards_differ_by_reason() {
        let config = EngineConfig::default();
        let engine = Engine::Chess(ChessGame::new(600));
        let capture = GameResult::new(Outcome::Player1Win, EndReason::KingCaptured);
        let flag = GameResult::new(
            Outcome::Timeout {
                winner: Some(Seat::One),
            },
            EndReason::ClockExpired,
        );
        assert_eq!(compute_reward(&engine, capture, &config), 20);
        assert_eq!(compute_reward(&engine, flag, &config), 5);
    }

    #[test]
    fn test_large_rewards_saturate() {
        let mut config = EngineConfig::default();
        config.naval.hit = u32::MAX;
        config.backgammon.win = u32::MAX;

        let mut battle = NavalBattle::new(10, 10, config.naval.fleet.clone());
        battle.tally.hits = 3;
        battle.phase = NavalPhase::Victory;
        let win = GameResult::new(Outcome::Player1Win, EndReason::FleetSunk);
        assert_eq!(compute_reward(&Engine::Naval(battle), win, &config), u32::MAX);

        let gammon = GameResult::new(Outcome::Player1Win, EndReason::BorneOff { gammon: true });
        let engine = Engine::Backgammon(Backgammon::new());
        assert_eq!(compute_reward(&engine, gammon, &config), u32::MAX);
    }

    #[test]
    fn test_log_is_sequenced() {
        let mut session = GameSession::new(
            GameType::Chess,
            humans(),
            EngineConfig::default(),
            Box::new(SeededRandom::with_seed(1)),
        );
        session.apply_action(Seat::One, chess_move("e2", "e4")).unwrap();
        session.apply_action(Seat::Two, chess_move("e7", "e5")).unwrap();
        let seqs: Vec<usize> = session.log().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, (0..session.log().len()).collect::<Vec<_>>());
        assert_eq!(session.log()[0].seat, Some(Seat::One));
    }
}
