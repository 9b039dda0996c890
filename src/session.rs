//! Communication session management
//!
//! This module defines the trait for tunneling messages between the round
//! engine and its collaborators (player devices and the shared display
//! that renders calls and plays their audio cues). The tunnel abstraction
//! keeps the engine agnostic of the actual transport or UI framework.

use super::{SyncMessage, UpdateMessage};

/// Trait for sending messages through a communication tunnel
///
/// This trait abstracts the mechanism used to deliver messages to
/// connected collaborators. Implementations might drive a UI layer
/// directly, or forward over WebSockets, Server-Sent Events, or any other
/// real-time channel.
pub trait Tunnel {
    /// Sends an update message to the collaborator
    ///
    /// Update messages notify collaborators about changes that affect
    /// their current view, such as a number being called.
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to send
    fn send_message(&self, message: &UpdateMessage);

    /// Sends a state synchronization message to the collaborator
    ///
    /// Sync messages are used to synchronize the collaborator's view with
    /// the current round state, typically when they connect or reconnect.
    ///
    /// # Arguments
    ///
    /// * `state` - The synchronization message to send
    fn send_state(&self, state: &SyncMessage);

    /// Closes the communication tunnel
    ///
    /// This method should be called when the collaborator goes away or
    /// when the round has been torn down.
    fn close(self);
}
