//! Round control and phase state machine
//!
//! This module contains the top-level controller for one bingo round. It
//! owns the pre-generated draw order, the number caller, the player
//! roster and the winner set, and advances the round through its three
//! phases: a pre-game countdown, the calling game itself, and the
//! terminal post-game.
//!
//! The controller is driven by a single cooperative `update` entry point
//! called by the host loop at whatever cadence it likes. All timing is
//! measured against real elapsed time, never a blocking sleep, so the
//! host's rendering and audio loop is never stalled.

use std::fmt::Debug;

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use web_time::{Duration, SystemTime};

use crate::{
    TruncatedVec,
    caller::{DrawScheduler, StepOutcome},
    draw::{DrawOrder, Rng},
    names::Names,
    player::Player,
    session::Tunnel,
    ticket::Ticket,
    watcher::{Id, PlayerValue, Value, ValueKind, Watchers},
};

/// The round's top-level phase
///
/// Phases only ever advance forward within a round; the only way back to
/// `PreGame` is a full reset with a fresh controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Countdown running, players registering
    PreGame,
    /// Numbers being called
    Game,
    /// Round over; winners (if any) are final
    PostGame,
}

type ValidationResult = garde::Result;

/// Validates that a duration falls within specified bounds
fn validate_duration<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    field: &'static str,
    val: &Duration,
) -> ValidationResult {
    if (MIN_SECONDS..=MAX_SECONDS).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "{field} is outside of the bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

/// Validates the delay between two consecutive calls
fn validate_call_delay(val: &Duration) -> ValidationResult {
    validate_duration::<
        { crate::constants::caller::MIN_CALL_DELAY },
        { crate::constants::caller::MAX_CALL_DELAY },
    >("call_delay", val)
}

/// Validates the duration of the pre-game countdown
fn validate_pregame_countdown(val: &Duration) -> ValidationResult {
    validate_duration::<
        { crate::constants::round::MIN_PREGAME_COUNTDOWN },
        { crate::constants::round::MAX_PREGAME_COUNTDOWN },
    >("pregame_countdown", val)
}

/// Configuration for one bingo round
///
/// Defines the callable range, the ticket size and the two timers. The
/// cross-field requirements (a non-empty range, a ticket that fits in
/// it) are enforced when the controller is built.
#[serde_with::serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoundConfig {
    /// Smallest callable number (inclusive)
    #[garde(skip)]
    pub range_min: u32,
    /// Largest callable number (inclusive)
    #[garde(skip)]
    pub range_max: u32,
    /// Count of distinct numbers on each ticket
    #[garde(range(
        min = crate::constants::ticket::MIN_SIZE,
        max = crate::constants::ticket::MAX_SIZE
    ))]
    pub ticket_size: usize,
    /// Fixed delay between two consecutive calls
    #[garde(custom(|v, _| validate_call_delay(v)))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub call_delay: Duration,
    /// Duration of the pre-game countdown
    #[garde(custom(|v, _| validate_pregame_countdown(v)))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub pregame_countdown: Duration,
}

impl Default for RoundConfig {
    /// The classic demo setup: numbers 1 to 36, 12 per ticket, a call
    /// every 3 seconds after an 8 second countdown.
    fn default() -> Self {
        Self {
            range_min: crate::constants::draw::DEFAULT_RANGE_MIN,
            range_max: crate::constants::draw::DEFAULT_RANGE_MAX,
            ticket_size: crate::constants::ticket::DEFAULT_SIZE,
            call_delay: Duration::from_secs(crate::constants::caller::DEFAULT_CALL_DELAY),
            pregame_countdown: Duration::from_secs(
                crate::constants::round::DEFAULT_PREGAME_COUNTDOWN,
            ),
        }
    }
}

/// Errors that can occur while setting up or running a round
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The draw range could not be generated
    #[error(transparent)]
    Draw(#[from] crate::draw::Error),
    /// A ticket could not be built from the draw order
    #[error(transparent)]
    Ticket(#[from] crate::ticket::Error),
    /// The player name was rejected
    #[error(transparent)]
    Name(#[from] crate::names::Error),
    /// The participant could not be added to the registry
    #[error(transparent)]
    Watcher(#[from] crate::watcher::Error),
    /// Players can only register during the pre-game countdown
    #[error("registration is closed once the round has started")]
    RegistrationClosed,
}

/// Messages that can be sent by players
#[derive(Debug, Deserialize, Clone, Copy)]
pub enum IncomingPlayerMessage {
    /// Flip the auto-mark preference
    ToggleAutoMark,
    /// Manually confirm the given call on the ticket
    ConfirmCall(u32),
    /// Give up the round
    Forfeit,
}

/// Messages received from participants
///
/// This enum categorizes incoming messages by the sender's role so that
/// only appropriate messages are processed from each participant kind.
#[derive(Debug, Deserialize, Clone, Copy)]
pub enum IncomingMessage {
    /// Messages from players
    Player(IncomingPlayerMessage),
}

impl IncomingMessage {
    /// Validates that a message matches the sender's participant kind
    fn follows(&self, sender_kind: ValueKind) -> bool {
        matches!(
            (self, sender_kind),
            (IncomingMessage::Player(_), ValueKind::Player)
        )
    }
}

/// Update messages sent to participants about round state changes
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// The pre-game countdown reached a new whole second
    Countdown {
        /// Whole seconds left before the round starts
        seconds_left: u64,
    },
    /// The round started; calls will follow
    ///
    /// Raised exactly once, on the PreGame to Game transition.
    /// Collaborators use it to reveal tickets and begin listening for
    /// calls.
    RoundStarted,
    /// The recipient's ticket numbers, sent at round start
    TicketAssign {
        /// The ticket numbers in ascending order
        numbers: Vec<u32>,
    },
    /// A manual confirmation was accepted and marked
    CallAccepted {
        /// The confirmed number
        number: u32,
    },
    /// A manual confirmation was rejected
    ///
    /// A normal outcome, not a fault: the number was stale, already
    /// matched, or not on the ticket.
    CallRejected {
        /// The rejected number
        number: u32,
    },
    /// The final roster, sent to displays at round start
    Roster {
        /// Names of every registered player, in registration order
        players: TruncatedVec<String>,
    },
    /// The round ended with these winners
    Winners {
        /// Names of every winning player, no ordering between them
        winners: TruncatedVec<String>,
    },
}

/// Sync messages sent to participants to synchronize their view
#[derive(Debug, Serialize, Clone)]
pub enum SyncMessage {
    /// Countdown still running
    PreGame {
        /// Whole seconds left before the round starts
        seconds_left: u64,
        /// Names of registered players
        players: TruncatedVec<String>,
    },
    /// Round in progress, player view with their ticket
    Ticket {
        /// The ticket numbers in ascending order
        numbers: Vec<u32>,
        /// The matched numbers in ascending order
        matched: Vec<u32>,
        /// The most recently called number, if any
        latest_call: Option<u32>,
        /// Count of calls already emitted
        index: usize,
        /// Total count of numbers in the draw order
        count: usize,
    },
    /// Round over
    PostGame {
        /// Names of every winning player; empty if the round was
        /// abandoned
        winners: TruncatedVec<String>,
    },
}

/// Limit on the number of names included in broadcast lists
const NAME_LIST_LIMIT: usize = 50;

/// The top-level controller for one bingo round
///
/// Owns all round state exclusively; one instance runs one round and is
/// discarded afterwards. During the game phase the cooperative tick is
/// the only source of state mutation besides player confirmations, and
/// each call is broadcast synchronously to every participant before the
/// next delay is armed.
#[derive(Serialize, Deserialize)]
pub struct RoundController {
    /// The round configuration
    config: RoundConfig,
    /// Current phase; advances forward only
    phase: Phase,
    /// Participant registry for broadcasts
    watchers: Watchers,
    /// Player name assignments
    names: Names,
    /// Players in registration order
    players: Vec<(Id, Player)>,
    /// The timed number caller over the pre-generated draw order
    scheduler: DrawScheduler,
    /// When the pre-game countdown ends
    countdown_deadline: SystemTime,
    /// Last whole second announced for the countdown
    last_countdown: Option<u64>,
    /// Winning players; set at most once, only during the game phase
    winners: Option<Vec<Id>>,
}

impl Debug for RoundController {
    /// Custom debug implementation that avoids dumping the full state
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundController")
            .field("phase", &self.phase)
            .field("players", &self.players.len())
            .finish_non_exhaustive()
    }
}

impl RoundController {
    /// Creates a controller for a new round
    ///
    /// The full draw order is generated here, before anything else
    /// happens: the round's entire call sequence is fixed once this
    /// returns, and tickets are guaranteed to be fully callable.
    ///
    /// # Arguments
    ///
    /// * `config` - The round configuration
    /// * `rng` - Random source for the draw order
    /// * `now` - Current time; the countdown is measured from here
    ///
    /// # Errors
    ///
    /// Returns [`Error::Draw`] if the range is inverted, or
    /// [`Error::Ticket`] if the ticket size exceeds the range.
    pub fn new<R: Rng>(config: RoundConfig, rng: &mut R, now: SystemTime) -> Result<Self, Error> {
        let order = DrawOrder::generate(config.range_min, config.range_max, rng)?;

        // Tickets are a prefix of the draw order; reject a size the
        // order cannot cover so later ticket assignment cannot fail.
        let _ = Ticket::from_prefix(&order, config.ticket_size)?;

        let countdown_deadline = now + config.pregame_countdown;

        Ok(Self {
            scheduler: DrawScheduler::new(order, config.call_delay),
            config,
            phase: Phase::PreGame,
            watchers: Watchers::default(),
            names: Names::default(),
            players: Vec::new(),
            countdown_deadline,
            last_countdown: None,
            winners: None,
        })
    }

    /// Registers a player for the round
    ///
    /// Must happen before the pre-game countdown ends. Registering the
    /// same player twice is recovered by ignoring the second
    /// registration. The player's ticket is assigned immediately from
    /// the prefix of the draw order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RegistrationClosed`] outside the pre-game phase,
    /// [`Error::Name`] if the name is rejected, or [`Error::Watcher`] if
    /// the round is full.
    pub fn register_player(&mut self, player_id: Id, name: &str) -> Result<(), Error> {
        if self.phase != Phase::PreGame {
            return Err(Error::RegistrationClosed);
        }

        if self.watchers.has_watcher(player_id) {
            log::warn!("ignoring duplicate registration of player {player_id}");
            return Ok(());
        }

        // Capacity is checked before the name is reserved, otherwise a
        // rejected registration would keep the name taken.
        if self.watchers.is_full() {
            return Err(crate::watcher::Error::MaximumParticipants.into());
        }

        let name = self.names.set_name(player_id, name)?;
        let ticket = Ticket::from_prefix(self.scheduler.order(), self.config.ticket_size)?;

        self.watchers
            .add_watcher(player_id, Value::Player(PlayerValue { name }))?;
        self.players.push((player_id, Player::new(ticket)));

        Ok(())
    }

    /// Registers a display collaborator (rendering, audio)
    ///
    /// Displays receive every broadcast but hold no ticket. They may
    /// join during any phase.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Watcher`] if the round is full or the ID is
    /// already registered.
    pub fn register_display(&mut self, display_id: Id) -> Result<(), Error> {
        self.watchers.add_watcher(display_id, Value::Display)?;
        Ok(())
    }

    /// Performs one cooperative tick of the round
    ///
    /// In the pre-game phase this advances the countdown against real
    /// elapsed time and starts the round when it expires. In the game
    /// phase it drives the number caller: winners are checked before a
    /// new call is scheduled and again after every call, so the first
    /// completion freezes the caller with no further numbers emitted.
    /// In the post-game phase it does nothing.
    ///
    /// # Arguments
    ///
    /// * `now` - Current time, supplied by the host loop
    /// * `tunnel_finder` - Function to find tunnels for participants
    pub fn update<T: Tunnel, F: Fn(Id) -> Option<T>>(&mut self, now: SystemTime, tunnel_finder: F) {
        match self.phase {
            Phase::PreGame => {
                let remaining = self
                    .countdown_deadline
                    .duration_since(now)
                    .unwrap_or(Duration::ZERO);

                if remaining.is_zero() {
                    self.start_round(&tunnel_finder);
                } else {
                    let seconds_left = remaining.as_secs();
                    if self.last_countdown != Some(seconds_left) {
                        self.last_countdown = Some(seconds_left);
                        self.watchers
                            .announce(&UpdateMessage::Countdown { seconds_left }.into(), &tunnel_finder);
                    }
                }
            }
            Phase::Game => {
                if self.detect_winners(&tunnel_finder) {
                    return;
                }

                match self.scheduler.step(now, &self.watchers, &tunnel_finder) {
                    Ok(StepOutcome::Called(number)) => {
                        // Every player observes the call before the next
                        // delay can be armed.
                        for (_, player) in &mut self.players {
                            player.observe_call(number);
                        }
                        self.detect_winners(&tunnel_finder);
                    }
                    Ok(StepOutcome::Scheduled | StepOutcome::Pending) => {}
                    Err(error) => {
                        log::error!("round aborted: {error}");
                        self.force_post_game();
                    }
                }
            }
            Phase::PostGame => {}
        }
    }

    /// Transitions to the game phase and announces the start
    fn start_round<T: Tunnel, F: Fn(Id) -> Option<T>>(&mut self, tunnel_finder: F) {
        self.phase = Phase::Game;

        self.watchers
            .announce(&UpdateMessage::RoundStarted.into(), &tunnel_finder);

        // Displays render the final roster; players already know their
        // own name.
        self.watchers.announce_specific(
            ValueKind::Display,
            &UpdateMessage::Roster {
                players: self.player_names(),
            }
            .into(),
            &tunnel_finder,
        );

        for (player_id, player) in &self.players {
            self.watchers.send_message(
                &UpdateMessage::TicketAssign {
                    numbers: player.ticket().numbers(),
                }
                .into(),
                *player_id,
                &tunnel_finder,
            );
        }
    }

    /// Collects completed players into the winner set
    ///
    /// All players completing on the same call are included together
    /// with no ordering between them. On the first non-empty poll the
    /// round transitions to the post-game phase and the caller freezes.
    ///
    /// # Returns
    ///
    /// `true` if the round is over (winners set now or previously).
    fn detect_winners<T: Tunnel, F: Fn(Id) -> Option<T>>(&mut self, tunnel_finder: F) -> bool {
        if self.winners.is_some() {
            return true;
        }

        let winner_ids = self
            .players
            .iter()
            .filter(|(_, player)| player.is_winner())
            .map(|(id, _)| *id)
            .collect_vec();

        if winner_ids.is_empty() {
            return false;
        }

        self.winners = Some(winner_ids);
        self.phase = Phase::PostGame;
        self.scheduler.freeze();

        self.watchers.announce(
            &UpdateMessage::Winners {
                winners: self.winner_names(),
            }
            .into(),
            tunnel_finder,
        );

        true
    }

    /// Forces the terminal phase with no winners
    fn force_post_game(&mut self) {
        self.phase = Phase::PostGame;
        self.scheduler.freeze();
    }

    /// Abandons the round (external teardown)
    ///
    /// Forces the post-game phase with no winners. No call is ever
    /// emitted afterwards; each step is atomic, so there is no in-flight
    /// work to unwind.
    pub fn abandon(&mut self) {
        if self.phase != Phase::PostGame {
            self.force_post_game();
        }
    }

    /// Synchronizes a participant's session (for reconnection)
    ///
    /// Sends the participant the sync view of the current phase so a
    /// late or reconnecting client can rebuild its state. Unknown
    /// participants are ignored.
    ///
    /// # Arguments
    ///
    /// * `watcher_id` - ID of the participant reconnecting
    /// * `now` - Current time, for the countdown remainder
    /// * `tunnel_finder` - Function to find tunnels for participants
    pub fn update_session<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        watcher_id: Id,
        now: SystemTime,
        tunnel_finder: F,
    ) {
        let Some(watcher_value) = self.watchers.get_watcher_value(watcher_id) else {
            return;
        };

        self.watchers.send_state(
            &self.state_message(watcher_id, watcher_value.kind(), now),
            watcher_id,
            tunnel_finder,
        );
    }

    /// Removes a departing participant from the round
    ///
    /// Closes their tunnel and frees their registry slot. A player who
    /// leaves mid-play forfeits; a player who already finished keeps
    /// their winner eligibility.
    ///
    /// # Arguments
    ///
    /// * `watcher_id` - ID of the departing participant
    /// * `tunnel_finder` - Function to find tunnels for participants
    pub fn remove_watcher<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        watcher_id: Id,
        tunnel_finder: F,
    ) {
        if let Some(player) = self.player_mut(watcher_id) {
            if player.is_active() {
                player.forfeit();
            }
        }

        self.watchers
            .remove_watcher_session(&watcher_id, tunnel_finder);
    }

    /// Handles an incoming message from a participant
    ///
    /// Messages from unknown participants or with a kind that does not
    /// match the sender's role are ignored.
    ///
    /// # Arguments
    ///
    /// * `watcher_id` - ID of the sender
    /// * `message` - The incoming message
    /// * `tunnel_finder` - Function to find tunnels for participants
    pub fn receive_message<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        watcher_id: Id,
        message: IncomingMessage,
        tunnel_finder: F,
    ) {
        let Some(watcher_value) = self.watchers.get_watcher_value(watcher_id) else {
            return;
        };

        if !message.follows(watcher_value.kind()) {
            return;
        }

        match message {
            IncomingMessage::Player(IncomingPlayerMessage::ToggleAutoMark) => {
                self.toggle_auto_mark(watcher_id);
            }
            IncomingMessage::Player(IncomingPlayerMessage::ConfirmCall(number)) => {
                let message = if self.confirm_call(watcher_id, number) {
                    UpdateMessage::CallAccepted { number }
                } else {
                    UpdateMessage::CallRejected { number }
                };
                self.watchers
                    .send_message(&message.into(), watcher_id, tunnel_finder);
            }
            IncomingMessage::Player(IncomingPlayerMessage::Forfeit) => {
                if let Some(player) = self.player_mut(watcher_id) {
                    player.forfeit();
                }
            }
        }
    }

    /// Flips a player's auto-mark preference
    ///
    /// # Returns
    ///
    /// The new preference, or `None` if the player is unknown.
    pub fn toggle_auto_mark(&mut self, player_id: Id) -> Option<bool> {
        self.player_mut(player_id).map(Player::toggle_auto_mark)
    }

    /// Manually confirms a call on a player's ticket
    ///
    /// # Returns
    ///
    /// `true` iff the number is the most recently called and currently
    /// unmatched on that player's ticket.
    pub fn confirm_call(&mut self, player_id: Id, number: u32) -> bool {
        self.player_mut(player_id)
            .is_some_and(|player| player.confirm_call(number))
    }

    /// Returns whether a player's ticket is complete
    pub fn is_bingo(&self, player_id: Id) -> bool {
        self.player(player_id).is_some_and(Player::is_bingo)
    }

    /// Returns the full pre-generated draw order, first call first
    ///
    /// Read-only; ticket-rendering collaborators use the prefix of
    /// future calls.
    pub fn draw_order(&self) -> &[u32] {
        self.scheduler.order().numbers()
    }

    /// Returns the current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the winning players, if the round has been won
    pub fn winners(&self) -> Option<&[Id]> {
        self.winners.as_deref()
    }

    /// Returns the message necessary to synchronize a participant's view
    ///
    /// # Arguments
    ///
    /// * `watcher_id` - ID of the participant to synchronize
    /// * `watcher_kind` - Kind of participant (player or display)
    /// * `now` - Current time, for the countdown remainder
    pub fn state_message(
        &self,
        watcher_id: Id,
        watcher_kind: ValueKind,
        now: SystemTime,
    ) -> super::SyncMessage {
        match self.phase {
            Phase::PreGame => SyncMessage::PreGame {
                seconds_left: self
                    .countdown_deadline
                    .duration_since(now)
                    .unwrap_or(Duration::ZERO)
                    .as_secs(),
                players: self.player_names(),
            }
            .into(),
            Phase::Game => match (watcher_kind, self.player(watcher_id)) {
                (ValueKind::Player, Some(player)) => SyncMessage::Ticket {
                    numbers: player.ticket().numbers(),
                    matched: player.ticket().matched(),
                    latest_call: self.scheduler.latest_call(),
                    index: self.scheduler.current_index(),
                    count: self.scheduler.order().len(),
                }
                .into(),
                _ => self.scheduler.state_message().into(),
            },
            Phase::PostGame => SyncMessage::PostGame {
                winners: self.winner_names(),
            }
            .into(),
        }
    }

    /// Returns the registered player names in registration order
    fn player_names(&self) -> TruncatedVec<String> {
        TruncatedVec::new(
            self.players
                .iter()
                .filter_map(|(id, _)| self.names.get_name(id)),
            NAME_LIST_LIMIT,
            self.players.len(),
        )
    }

    /// Returns the winner names, empty if there are none
    fn winner_names(&self) -> TruncatedVec<String> {
        let winners = self.winners.as_deref().unwrap_or_default();
        TruncatedVec::new(
            winners.iter().filter_map(|id| self.names.get_name(id)),
            NAME_LIST_LIMIT,
            winners.len(),
        )
    }

    fn player(&self, player_id: Id) -> Option<&Player> {
        self.players
            .iter()
            .find(|(id, _)| *id == player_id)
            .map(|(_, player)| player)
    }

    fn player_mut(&mut self, player_id: Id) -> Option<&mut Player> {
        self.players
            .iter_mut()
            .find(|(id, _)| *id == player_id)
            .map(|(_, player)| player)
    }
}
