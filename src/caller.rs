//! Timed number calling
//!
//! This module advances through the pre-generated draw order one step at
//! a time, gated by a fixed delay between calls. The scheduler is driven
//! by the round's cooperative tick rather than a blocking sleep: each
//! tick either arms the delay for the next call, keeps waiting, or emits
//! the due number to every subscriber.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::{Duration, SystemTime};

use crate::{
    draw::DrawOrder,
    session::Tunnel,
    watcher::{Id, Watchers},
};

/// Errors that can occur while calling numbers
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The scheduler would advance past the end of the draw order
    ///
    /// Unreachable as long as the ticket size does not exceed the range,
    /// since some ticket completes by then. Treated as fatal if it ever
    /// triggers.
    #[error("draw order exhausted after {called} calls")]
    CallOverrun {
        /// Count of calls already emitted
        called: usize,
    },
}

/// The result of one scheduler tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A new step started; the inter-call delay is now armed
    Scheduled,
    /// A step is in flight and its delay has not elapsed yet
    Pending,
    /// The due number was emitted to all subscribers
    Called(u32),
}

/// Update messages sent to participants about calls
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// A number was called
    ///
    /// Raised once per draw step, after the number is finalized.
    /// Collaborators use it to render the call and play its audio cue
    /// (looked up by the call number, one-to-one).
    NumberCalled {
        /// The called number
        number: u32,
        /// Zero-based position of this call in the draw order
        index: usize,
        /// Total count of numbers in the draw order
        count: usize,
    },
}

/// Sync messages for participants joining during the calling phase
#[derive(Debug, Serialize, Clone)]
pub enum SyncMessage {
    /// Synchronizes the calling view
    Calling {
        /// The most recently called number, if any
        latest_call: Option<u32>,
        /// Count of calls already emitted
        index: usize,
        /// Total count of numbers in the draw order
        count: usize,
    },
}

/// Advances through the draw order on a fixed delay
///
/// At most one call is ever in flight: an armed deadline is the
/// re-entrancy guard, and a new step cannot start until the previous one
/// has emitted its number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawScheduler {
    /// The pre-generated call order for the round
    order: DrawOrder,
    /// Position of the next call in the order
    current_index: usize,
    /// Fixed delay between consecutive calls
    call_delay: Duration,
    /// Deadline of the in-flight step; `Some` means a step is in flight
    deadline: Option<SystemTime>,
    /// The most recently emitted number
    latest_call: Option<u32>,
    /// Whether the scheduler has been permanently stopped
    frozen: bool,
}

impl DrawScheduler {
    /// Creates a scheduler over the given draw order
    pub fn new(order: DrawOrder, call_delay: Duration) -> Self {
        Self {
            order,
            current_index: 0,
            call_delay,
            deadline: None,
            latest_call: None,
            frozen: false,
        }
    }

    /// Performs one cooperative tick of the calling loop
    ///
    /// With no step in flight, arms the inter-call delay for the next
    /// number. With a step in flight, emits its number once the delay
    /// has elapsed, broadcasting [`UpdateMessage::NumberCalled`] to every
    /// participant, and increments the call index. Ticks while the delay
    /// is still running do nothing.
    ///
    /// # Arguments
    ///
    /// * `now` - Current time, supplied by the driving loop
    /// * `watchers` - Participant registry to broadcast through
    /// * `tunnel_finder` - Function to find tunnels for participants
    ///
    /// # Errors
    ///
    /// Returns [`Error::CallOverrun`] when the draw order is exhausted.
    pub fn step<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        now: SystemTime,
        watchers: &Watchers,
        tunnel_finder: F,
    ) -> Result<StepOutcome, Error> {
        if self.frozen {
            return Ok(StepOutcome::Pending);
        }

        let Some(deadline) = self.deadline else {
            if self.current_index >= self.order.len() {
                return Err(Error::CallOverrun {
                    called: self.current_index,
                });
            }
            self.deadline = Some(now + self.call_delay);
            return Ok(StepOutcome::Scheduled);
        };

        if now.duration_since(deadline).is_err() {
            // Delay still running; the in-flight guard forbids starting
            // another step.
            return Ok(StepOutcome::Pending);
        }

        let Some(number) = self.order.get(self.current_index) else {
            return Err(Error::CallOverrun {
                called: self.current_index,
            });
        };

        self.latest_call = Some(number);
        self.current_index += 1;
        self.deadline = None;

        watchers.announce(
            &UpdateMessage::NumberCalled {
                number,
                index: self.current_index - 1,
                count: self.order.len(),
            }
            .into(),
            tunnel_finder,
        );

        Ok(StepOutcome::Called(number))
    }

    /// Permanently stops the scheduler
    ///
    /// Cancels any in-flight step; no number is ever emitted afterwards.
    pub fn freeze(&mut self) {
        self.deadline = None;
        self.frozen = true;
    }

    /// Returns the sync view of the calling state
    pub fn state_message(&self) -> SyncMessage {
        SyncMessage::Calling {
            latest_call: self.latest_call,
            index: self.current_index,
            count: self.order.len(),
        }
    }

    /// Returns the most recently called number
    pub fn latest_call(&self) -> Option<u32> {
        self.latest_call
    }

    /// Returns the count of calls already emitted
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Returns the pre-generated call order
    pub fn order(&self) -> &DrawOrder {
        &self.order
    }
}
