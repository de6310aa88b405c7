//! Session hosting for connected clients.

use gamenight_core::{
    BotDifficulty, EngineConfig, GameAction, GameError, GameEvent, GameType, Outcome, Participant,
    Seat, SessionId, SessionRegistry, SessionSnapshot,
};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::ledger::PointsLedger;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Already playing a session")]
    AlreadyInSession,

    #[error("No active session")]
    NoSession,

    #[error("Seat {0:?} is not yours")]
    NotYourSeat(Seat),

    #[error(transparent)]
    Game(#[from] GameError),
}

/// The session a client plays and the seats it controls.
#[derive(Debug, Clone)]
struct Seating {
    session: SessionId,
    seats: Vec<Seat>,
}

/// Everything one client should hear about after time passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientUpdate {
    pub client: Uuid,
    pub events: Vec<GameEvent>,
    /// Set when the session reached its outcome during this update
    pub finished: Option<(Outcome, u32)>,
}

/// Hosts one session per client over a shared registry.
pub struct SessionHost {
    registry: SessionRegistry<PointsLedger>,
    seating: HashMap<Uuid, Seating>,
}

impl SessionHost {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            registry: SessionRegistry::new(config, PointsLedger::new()),
            seating: HashMap::new(),
        }
    }

    pub fn ledger(&self) -> &PointsLedger {
        self.registry.sink()
    }

    pub fn session_of(&self, client: Uuid) -> Option<SessionId> {
        self.seating.get(&client).map(|s| s.session)
    }

    /// Start a session for `client`. Against a bot the client takes seat one;
    /// without one the client plays both seats.
    ///
    /// A finished session is released automatically.
    pub fn start(
        &mut self,
        client: Uuid,
        game: GameType,
        player_name: String,
        bot: Option<BotDifficulty>,
    ) -> Result<SessionSnapshot, HostError> {
        if let Some(current) = self.seating.get(&client) {
            let finished = self
                .registry
                .session(current.session)
                .map_or(true, |s| s.is_finished());
            if !finished {
                return Err(HostError::AlreadyInSession);
            }
            self.close(client)?;
        }

        let (opponent, seats) = match bot {
            Some(difficulty) => (Participant::bot("Bot", difficulty), vec![Seat::One]),
            None => (
                Participant::human(format!("{player_name} (seat two)")),
                vec![Seat::One, Seat::Two],
            ),
        };
        let id = self
            .registry
            .start_session(game, Participant::human(player_name), opponent);
        self.seating.insert(client, Seating { session: id, seats });
        info!(%client, session = %id, ?game, "Client started session");
        self.snapshot(client)
    }

    /// Apply an action for the client. Without an explicit seat the client's
    /// only seat is used, or the seat whose turn it is when playing both.
    pub fn act(
        &mut self,
        client: Uuid,
        seat: Option<Seat>,
        action: GameAction,
    ) -> Result<(Vec<GameEvent>, Option<(Outcome, u32)>), HostError> {
        let seating = self.seating.get(&client).ok_or(HostError::NoSession)?;
        let seat = match seat {
            Some(seat) => seat,
            None if seating.seats.len() == 1 => seating.seats[0],
            None => self
                .registry
                .session(seating.session)
                .and_then(|s| s.turn_owner())
                .unwrap_or(Seat::One),
        };
        if !seating.seats.contains(&seat) {
            return Err(HostError::NotYourSeat(seat));
        }

        let id = seating.session;
        let events = self.registry.apply(id, seat, action)?;
        let finished = self.finish_of(id, &events);
        Ok((events, finished))
    }

    pub fn snapshot(&self, client: Uuid) -> Result<SessionSnapshot, HostError> {
        let id = self.session_of(client).ok_or(HostError::NoSession)?;
        let session = self.registry.session(id).ok_or(GameError::UnknownSession)?;
        Ok(session.snapshot())
    }

    pub fn valid_actions(&self, client: Uuid, seat: Seat) -> Result<Vec<GameAction>, HostError> {
        let id = self.session_of(client).ok_or(HostError::NoSession)?;
        let session = self.registry.session(id).ok_or(GameError::UnknownSession)?;
        Ok(session.valid_actions(seat))
    }

    /// Release the client's session and cancel its bot turns
    pub fn close(&mut self, client: Uuid) -> Result<(), HostError> {
        let seating = self.seating.remove(&client).ok_or(HostError::NoSession)?;
        self.registry.close_session(seating.session)?;
        Ok(())
    }

    /// Let wall time pass and group what happened by client
    pub fn advance(&mut self, elapsed: Duration) -> Vec<ClientUpdate> {
        let produced = self.registry.advance_time(elapsed);
        if produced.is_empty() {
            return Vec::new();
        }

        let mut by_session: HashMap<SessionId, Vec<GameEvent>> = HashMap::new();
        for (id, event) in produced {
            by_session.entry(id).or_default().push(event);
        }

        let mut updates = Vec::new();
        for (client, seating) in &self.seating {
            let Some(events) = by_session.remove(&seating.session) else {
                continue;
            };
            let finished = self.finish_of(seating.session, &events);
            updates.push(ClientUpdate {
                client: *client,
                events,
                finished,
            });
        }
        debug!(updates = updates.len(), "Advanced sessions");
        updates
    }

    fn finish_of(&self, id: SessionId, events: &[GameEvent]) -> Option<(Outcome, u32)> {
        let outcome = events.iter().find_map(|event| match event {
            GameEvent::GameOver { outcome } => Some(*outcome),
            _ => None,
        })?;
        let reward = self.registry.session(id)?.reward().unwrap_or(0);
        Some((outcome, reward))
    }
}
