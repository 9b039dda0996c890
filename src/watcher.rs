//! Participant registry and call broadcast
//!
//! This module tracks everyone subscribed to a round's events: the
//! players and the display collaborators (renderers, audio) that react to
//! each call. It provides the broadcast primitives the round controller
//! and the number caller use to fan events out, and it is where the
//! subscription lifecycle lives: a collaborator whose tunnel can no
//! longer be found is silently skipped, so nothing dangles after
//! teardown.

use std::{
    collections::{HashMap, HashSet},
    fmt::Display as FmtDisplay,
    str::FromStr,
};

use enum_map::{Enum, EnumMap};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use uuid::Uuid;

use super::{SyncMessage, UpdateMessage, session::Tunnel};

/// A unique identifier for participants in a round
///
/// Each participant (player or display collaborator) gets a unique ID
/// that persists for the duration of the round.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random participant ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Id {
    /// Creates a new random participant ID (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl FmtDisplay for Id {
    /// Formats the ID as a UUID string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    /// Parses an ID from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// The role and state of a participant in the round
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// A display collaborator that renders calls and plays audio cues
    Display,
    /// A player holding a ticket
    Player(PlayerValue),
}

/// The kind of participant without associated data
///
/// This enum represents just the discriminant of the [`Value`] enum,
/// useful for filtering participants by role without needing the
/// associated data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
pub enum ValueKind {
    /// A display collaborator
    Display,
    /// A player
    Player,
}

impl Value {
    /// Returns the kind of this value without the associated data
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Display => ValueKind::Display,
            Value::Player(_) => ValueKind::Player,
        }
    }
}

/// Player-specific registry data
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerValue {
    /// The player's validated display name
    pub name: String,
}

/// Serialization helper for the [`Watchers`] struct
#[derive(Deserialize)]
struct WatchersSerde {
    mapping: HashMap<Id, Value>,
}

/// Tracks all participants subscribed to a round's events
///
/// This struct maintains the primary mapping from participant ID to role
/// along with a reverse index by kind, and provides the broadcast helpers
/// used to deliver messages to everyone, to one participant, or to all
/// participants of one kind.
#[derive(Default, Serialize, Deserialize)]
#[serde(from = "WatchersSerde")]
pub struct Watchers {
    /// Primary mapping from participant ID to their role
    mapping: HashMap<Id, Value>,

    /// Reverse index organized by participant kind
    #[serde(skip_serializing)]
    reverse_mapping: EnumMap<ValueKind, HashSet<Id>>,
}

impl From<WatchersSerde> for Watchers {
    /// Reconstructs the registry from serialized data
    ///
    /// The reverse index is rebuilt from the primary mapping since it is
    /// not serialized.
    fn from(serde: WatchersSerde) -> Self {
        let WatchersSerde { mapping } = serde;
        let mut reverse_mapping: EnumMap<ValueKind, HashSet<Id>> = EnumMap::default();
        for (id, value) in &mapping {
            reverse_mapping[value.kind()].insert(*id);
        }
        Self {
            mapping,
            reverse_mapping,
        }
    }
}

/// Errors that can occur when managing participants
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The round has reached the maximum number of participants
    #[error("maximum number of participants reached")]
    MaximumParticipants,
    /// The participant is already registered
    #[error("participant is already registered")]
    DuplicateParticipant,
}

impl Watchers {
    /// Gets a vector of all participants with their tunnels and roles
    ///
    /// # Arguments
    ///
    /// * `tunnel_finder` - Function to retrieve the tunnel for a given ID
    ///
    /// # Returns
    ///
    /// Vector of (ID, Tunnel, Value) tuples for all participants with
    /// active tunnels
    pub fn vec<T: Tunnel, F: Fn(Id) -> Option<T>>(&self, tunnel_finder: F) -> Vec<(Id, T, Value)> {
        self.reverse_mapping
            .values()
            .flat_map(|v| v.iter())
            .filter_map(|x| match (tunnel_finder(*x), self.mapping.get(x)) {
                (Some(t), Some(v)) => Some((*x, t, v.to_owned())),
                _ => None,
            })
            .collect_vec()
    }

    /// Gets a vector of participants of a specific kind with their tunnels
    ///
    /// # Arguments
    ///
    /// * `filter` - The kind of participants to include
    /// * `tunnel_finder` - Function to retrieve the tunnel for a given ID
    pub fn specific_vec<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        filter: ValueKind,
        tunnel_finder: F,
    ) -> Vec<(Id, T, Value)> {
        self.reverse_mapping[filter]
            .iter()
            .filter_map(|x| match (tunnel_finder(*x), self.mapping.get(x)) {
                (Some(t), Some(v)) => Some((*x, t, v.to_owned())),
                _ => None,
            })
            .collect_vec()
    }

    /// Gets the count of participants of a specific kind
    pub fn specific_count(&self, filter: ValueKind) -> usize {
        self.reverse_mapping[filter].len()
    }

    /// Adds a new participant to the round
    ///
    /// # Arguments
    ///
    /// * `watcher_id` - The unique ID for the new participant
    /// * `watcher_value` - The role for the new participant
    ///
    /// # Errors
    ///
    /// Returns [`Error::MaximumParticipants`] if the round is full, or
    /// [`Error::DuplicateParticipant`] if the ID is already registered.
    pub fn add_watcher(&mut self, watcher_id: Id, watcher_value: Value) -> Result<(), Error> {
        let kind = watcher_value.kind();

        if self.is_full() {
            return Err(Error::MaximumParticipants);
        }

        if self.mapping.contains_key(&watcher_id) {
            return Err(Error::DuplicateParticipant);
        }

        self.mapping.insert(watcher_id, watcher_value);
        self.reverse_mapping[kind].insert(watcher_id);

        Ok(())
    }

    /// Gets the role of a specific participant
    pub fn get_watcher_value(&self, watcher_id: Id) -> Option<Value> {
        self.mapping.get(&watcher_id).map(|v| v.to_owned())
    }

    /// Checks if a participant is registered in the round
    pub fn has_watcher(&self, watcher_id: Id) -> bool {
        self.mapping.contains_key(&watcher_id)
    }

    /// Checks whether the registry has reached the participant limit
    pub fn is_full(&self) -> bool {
        self.mapping.len() >= crate::constants::round::MAX_PLAYER_COUNT
    }

    /// Removes a participant and closes their tunnel
    ///
    /// The participant is dropped from both mappings, freeing their slot
    /// for someone else.
    ///
    /// # Arguments
    ///
    /// * `watcher_id` - The ID of the participant whose session to remove
    /// * `tunnel_finder` - Function to retrieve the tunnel for the participant
    pub fn remove_watcher_session<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        watcher_id: &Id,
        tunnel_finder: F,
    ) {
        if let Some(value) = self.mapping.remove(watcher_id) {
            self.reverse_mapping[value.kind()].remove(watcher_id);
        }
        if let Some(x) = tunnel_finder(*watcher_id) {
            x.close();
        }
    }

    /// Sends an update message to a specific participant
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to send
    /// * `watcher_id` - The ID of the participant to send to
    /// * `tunnel_finder` - Function to retrieve the tunnel for the participant
    pub fn send_message<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        message: &UpdateMessage,
        watcher_id: Id,
        tunnel_finder: F,
    ) {
        let Some(session) = tunnel_finder(watcher_id) else {
            return;
        };

        session.send_message(message);
    }

    /// Sends a state synchronization message to a specific participant
    ///
    /// # Arguments
    ///
    /// * `message` - The sync message to send
    /// * `watcher_id` - The ID of the participant to send to
    /// * `tunnel_finder` - Function to retrieve the tunnel for the participant
    pub fn send_state<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        message: &SyncMessage,
        watcher_id: Id,
        tunnel_finder: F,
    ) {
        let Some(session) = tunnel_finder(watcher_id) else {
            return;
        };

        session.send_state(message);
    }

    /// Gets the display name of a participant
    ///
    /// This only returns a name for players, not display collaborators.
    pub fn get_name(&self, watcher_id: Id) -> Option<String> {
        self.get_watcher_value(watcher_id).and_then(|v| match v {
            Value::Player(player_value) => Some(player_value.name),
            Value::Display => None,
        })
    }

    /// Sends personalized messages to all participants using a sender function
    ///
    /// The sender function is called for each participant and can return
    /// different messages based on the participant's ID and kind, or
    /// `None` to skip sending.
    ///
    /// # Arguments
    ///
    /// * `sender` - Function that generates messages for each participant
    /// * `tunnel_finder` - Function to retrieve tunnels for participants
    pub fn announce_with<S, T: Tunnel, F: Fn(Id) -> Option<T>>(&self, sender: S, tunnel_finder: F)
    where
        S: Fn(Id, ValueKind) -> Option<super::UpdateMessage>,
    {
        for (watcher, session, v) in self.vec(tunnel_finder) {
            let Some(message) = sender(watcher, v.kind()) else {
                continue;
            };

            session.send_message(&message);
        }
    }

    /// Broadcasts an update message to every participant
    ///
    /// Broadcast is synchronous and ordered: every participant with an
    /// active tunnel observes the message before this method returns.
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to broadcast
    /// * `tunnel_finder` - Function to retrieve tunnels for participants
    pub fn announce<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        message: &super::UpdateMessage,
        tunnel_finder: F,
    ) {
        self.announce_with(|_, _| Some(message.to_owned()), tunnel_finder);
    }

    /// Sends an update message to all participants of a specific kind
    ///
    /// # Arguments
    ///
    /// * `filter` - The kind of participants to send to
    /// * `message` - The update message to send
    /// * `tunnel_finder` - Function to retrieve tunnels for participants
    pub fn announce_specific<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        filter: ValueKind,
        message: &super::UpdateMessage,
        tunnel_finder: F,
    ) {
        for (_, session, _) in self.specific_vec(filter, tunnel_finder) {
            session.send_message(message);
        }
    }
}
