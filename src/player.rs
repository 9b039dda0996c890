//! Per-player call reaction state
//!
//! A player owns exactly one ticket and reacts to each broadcast call.
//! With auto-mark enabled, matching calls are marked silently as they
//! arrive. With auto-mark disabled, the player must confirm each call
//! through an external affordance, and the confirmation window only
//! covers the most recent call: a call left unconfirmed will not come
//! around again.

use serde::{Deserialize, Serialize};

use super::ticket::Ticket;

/// Whether a player is still reacting to calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Standing {
    /// Still in play, reacting to every call
    Playing,
    /// Completed their ticket; no longer reacting
    Finished,
    /// Gave up; no longer reacting and excluded from winners
    Forfeited,
}

/// One player of the round: a ticket plus reaction preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// The player's ticket, exclusively owned
    ticket: Ticket,
    /// Whether matching calls are marked automatically
    auto_mark: bool,
    /// Whether the player still reacts to calls
    standing: Standing,
    /// The most recent call observed while in play
    latest_call: Option<u32>,
}

impl Player {
    /// Creates a player holding the given ticket
    ///
    /// Auto-mark starts disabled; the player confirms calls manually
    /// until they opt in.
    pub fn new(ticket: Ticket) -> Self {
        Self {
            ticket,
            auto_mark: false,
            standing: Standing::Playing,
            latest_call: None,
        }
    }

    /// Reacts to a broadcast call
    ///
    /// Players who have finished or forfeited ignore calls entirely. An
    /// auto-marking player marks a matching number immediately; a manual
    /// player only records the call so that [`Self::confirm_call`] can
    /// accept it until the next call lands.
    pub fn observe_call(&mut self, number: u32) {
        if self.standing != Standing::Playing {
            return;
        }

        self.latest_call = Some(number);

        if self.auto_mark {
            self.ticket.mark(number);
            if self.ticket.is_complete() {
                self.standing = Standing::Finished;
            }
        }
    }

    /// Returns whether a manual confirmation of `number` would be accepted
    ///
    /// The external confirm affordance is enabled exactly when this is
    /// true: the number is the most recent call and still unmatched on
    /// the ticket.
    pub fn can_confirm(&self, number: u32) -> bool {
        self.standing == Standing::Playing
            && self.latest_call == Some(number)
            && self.ticket.is_unmatched(number)
    }

    /// Manually confirms a call, marking it on the ticket
    ///
    /// # Returns
    ///
    /// `true` if the confirmation was accepted. A rejected confirmation
    /// (stale call, number not on the ticket, already matched) is a
    /// normal outcome, not a fault.
    pub fn confirm_call(&mut self, number: u32) -> bool {
        if !self.can_confirm(number) {
            return false;
        }

        self.ticket.mark(number);
        if self.ticket.is_complete() {
            self.standing = Standing::Finished;
        }
        true
    }

    /// Flips the auto-mark preference
    ///
    /// Applying the toggle twice restores the prior state. Enabling
    /// auto-mark mid-round only affects future calls; numbers already
    /// called and left unconfirmed stay unmatched.
    pub fn toggle_auto_mark(&mut self) -> bool {
        self.auto_mark = !self.auto_mark;
        self.auto_mark
    }

    /// Returns whether auto-mark is enabled
    pub fn auto_mark(&self) -> bool {
        self.auto_mark
    }

    /// Gives up the round; the player stops reacting to calls
    ///
    /// A forfeited player is never included in the winners, even if their
    /// ticket was already complete.
    pub fn forfeit(&mut self) {
        self.standing = Standing::Forfeited;
    }

    /// Returns whether every number on the ticket has been called
    pub fn is_bingo(&self) -> bool {
        self.ticket.is_complete()
    }

    /// Returns whether the player counts as a winner
    pub fn is_winner(&self) -> bool {
        self.ticket.is_complete() && self.standing != Standing::Forfeited
    }

    /// Returns whether the player is still reacting to calls
    pub fn is_active(&self) -> bool {
        self.standing == Standing::Playing
    }

    /// Returns the player's standing
    pub fn standing(&self) -> Standing {
        self.standing
    }

    /// Returns the player's ticket
    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    /// Returns the most recent call observed while in play
    pub fn latest_call(&self) -> Option<u32> {
        self.latest_call
    }
}
