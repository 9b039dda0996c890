//! # Bingo Round Engine
//!
//! This library provides the core round logic for a multiplayer bingo
//! game. It handles the pre-generated draw order, timed number calling,
//! player tickets and bingo detection, winner declaration, and real-time
//! synchronization between players and display clients.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::ignored_unit_patterns)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
use derive_where::derive_where;
use itertools::Itertools;
use serde::Serialize;

pub mod constants;

pub mod caller;
pub mod draw;
pub mod names;
pub mod player;
pub mod round;
pub mod session;
pub mod ticket;
pub mod watcher;

/// Messages sent to synchronize state between participants
///
/// This enum represents all possible synchronization messages that can be
/// sent to bring a late or reconnecting participant up to date with the
/// round.
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum SyncMessage {
    /// Round phase synchronization messages
    Round(round::SyncMessage),
    /// Number calling synchronization messages
    Caller(caller::SyncMessage),
}

impl SyncMessage {
    /// Converts the sync message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Messages sent to update participants about round state changes
///
/// Update messages notify clients about changes that affect their local
/// view of the round, such as a new call or the winner announcement.
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum UpdateMessage {
    /// Round phase update messages
    Round(round::UpdateMessage),
    /// Number calling update messages
    Caller(caller::UpdateMessage),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// A truncated vector that maintains the exact count while limiting displayed items
///
/// This structure is useful for displaying a limited number of items while
/// still showing the total count. For example, showing "60 players" but
/// only displaying the first 50 names.
#[derive(Debug, Clone, Serialize)]
#[derive_where(Default)]
pub struct TruncatedVec<T> {
    /// The exact total count of items
    exact_count: usize,
    /// The truncated list of items (up to the limit)
    items: Vec<T>,
}

impl<T: Clone> TruncatedVec<T> {
    /// Creates a new truncated vector from an iterator
    ///
    /// # Arguments
    ///
    /// * `list` - An iterator over items to include
    /// * `limit` - Maximum number of items to include in the truncated vector
    /// * `exact_count` - The exact total count of items (may be larger than limit)
    pub fn new<I: Iterator<Item = T>>(list: I, limit: usize, exact_count: usize) -> Self {
        let items = list.take(limit).collect_vec();
        Self { exact_count, items }
    }

    /// Maps a function over the items in the truncated vector
    pub fn map<F, U>(self, f: F) -> TruncatedVec<U>
    where
        F: Fn(T) -> U,
    {
        TruncatedVec {
            exact_count: self.exact_count,
            items: self.items.into_iter().map(f).collect_vec(),
        }
    }

    /// Returns the exact count of items
    pub fn exact_count(&self) -> usize {
        self.exact_count
    }

    /// Returns the truncated items
    pub fn items(&self) -> &[T] {
        &self.items
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_vec_new() {
        let data = vec![1, 2, 3, 4, 5];
        let truncated = TruncatedVec::new(data.into_iter(), 3, 5);

        assert_eq!(truncated.exact_count(), 5);
        assert_eq!(truncated.items(), &[1, 2, 3]);
    }

    #[test]
    fn test_truncated_vec_new_limit_larger_than_items() {
        let data = vec![1, 2, 3];
        let truncated = TruncatedVec::new(data.into_iter(), 5, 3);

        assert_eq!(truncated.exact_count(), 3);
        assert_eq!(truncated.items(), &[1, 2, 3]);
    }

    #[test]
    fn test_truncated_vec_new_empty() {
        let data: Vec<i32> = vec![];
        let truncated = TruncatedVec::new(data.into_iter(), 5, 0);

        assert_eq!(truncated.exact_count(), 0);
        let empty: &[i32] = &[];
        assert_eq!(truncated.items(), empty);
    }

    #[test]
    fn test_truncated_vec_map() {
        let data = vec![1, 2, 3];
        let truncated = TruncatedVec::new(data.into_iter(), 3, 5);
        let mapped = truncated.map(|x| x * 2);

        assert_eq!(mapped.exact_count(), 5);
        assert_eq!(mapped.items(), &[2, 4, 6]);
    }

    #[test]
    fn test_sync_message_to_message() {
        let sync_msg = SyncMessage::Caller(caller::SyncMessage::Calling {
            latest_call: Some(17),
            index: 4,
            count: 36,
        });
        let json_str = sync_msg.to_message();

        assert!(json_str.contains("Caller"));
        assert!(json_str.contains("Calling"));
        assert!(json_str.contains("17"));
    }

    #[test]
    fn test_update_message_to_message() {
        let update_msg = UpdateMessage::Caller(caller::UpdateMessage::NumberCalled {
            number: 23,
            index: 0,
            count: 36,
        });
        let json_str = update_msg.to_message();

        assert!(json_str.contains("Caller"));
        assert!(json_str.contains("NumberCalled"));
        assert!(json_str.contains("23"));
    }
}
