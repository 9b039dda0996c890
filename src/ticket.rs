//! Player tickets
//!
//! A ticket is a fixed-size set of distinct numbers a player must match
//! against the calls of the round. Ticket numbers are taken as a
//! contiguous prefix of the round's pre-generated draw order, which
//! guarantees every ticket can complete within the round.

use std::collections::HashSet;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::draw::DrawOrder;

/// Errors that can occur while building a ticket
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The provided numbers do not amount to the requested ticket size
    #[error("expected {expected} distinct numbers, got {actual}")]
    WrongSize {
        /// Requested ticket size
        expected: usize,
        /// Count of distinct numbers actually provided
        actual: usize,
    },
}

/// A player's fixed set of numbers to match against calls
///
/// Invariants: the set of numbers never changes after construction, and
/// `matched` is always a subset of `numbers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// The numbers assigned to this ticket
    numbers: HashSet<u32>,
    /// The subset of `numbers` already called and marked
    matched: HashSet<u32>,
}

impl Ticket {
    /// Creates a ticket from explicit numbers
    ///
    /// # Arguments
    ///
    /// * `numbers` - The candidate numbers; duplicates collapse
    /// * `size` - The required ticket size
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongSize`] if the distinct numbers do not count
    /// exactly `size`.
    pub fn new(numbers: impl IntoIterator<Item = u32>, size: usize) -> Result<Self, Error> {
        let numbers: HashSet<u32> = numbers.into_iter().collect();

        if numbers.len() != size {
            return Err(Error::WrongSize {
                expected: size,
                actual: numbers.len(),
            });
        }

        Ok(Self {
            numbers,
            matched: HashSet::new(),
        })
    }

    /// Creates a ticket from the first `size` numbers of the draw order
    ///
    /// Tickets are built only after the draw order exists, so a prefix
    /// ticket is guaranteed to be fully callable by draw index
    /// `size - 1`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongSize`] if the draw order holds fewer than
    /// `size` numbers.
    pub fn from_prefix(order: &DrawOrder, size: usize) -> Result<Self, Error> {
        Self::new(order.prefix(size).iter().copied(), size)
    }

    /// Marks a called number on the ticket
    ///
    /// Marking a number that is not on the ticket is a no-op, since every
    /// player receives every call.
    ///
    /// # Returns
    ///
    /// `true` if the number was on the ticket and newly matched.
    pub fn mark(&mut self, number: u32) -> bool {
        self.numbers.contains(&number) && self.matched.insert(number)
    }

    /// Returns whether every number on the ticket has been matched
    pub fn is_complete(&self) -> bool {
        self.matched.len() == self.numbers.len()
    }

    /// Returns the count of numbers still waiting to be matched
    pub fn remaining(&self) -> usize {
        self.numbers.len() - self.matched.len()
    }

    /// Returns whether the number is on the ticket
    pub fn contains(&self, number: u32) -> bool {
        self.numbers.contains(&number)
    }

    /// Returns whether the number is on the ticket and not yet matched
    pub fn is_unmatched(&self, number: u32) -> bool {
        self.numbers.contains(&number) && !self.matched.contains(&number)
    }

    /// Returns the ticket numbers in ascending order
    pub fn numbers(&self) -> Vec<u32> {
        self.numbers.iter().copied().sorted().collect_vec()
    }

    /// Returns the matched numbers in ascending order
    pub fn matched(&self) -> Vec<u32> {
        self.matched.iter().copied().sorted().collect_vec()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::draw::FastrandRng;

    fn ticket(numbers: &[u32]) -> Ticket {
        Ticket::new(numbers.iter().copied(), numbers.len()).unwrap()
    }

    #[test]
    fn test_new_wrong_size() {
        let result = Ticket::new([1, 2, 3], 4);
        assert_eq!(
            result.unwrap_err(),
            Error::WrongSize {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_new_duplicates_collapse() {
        let result = Ticket::new([1, 1, 2], 3);
        assert_eq!(
            result.unwrap_err(),
            Error::WrongSize {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_mark_and_complete() {
        let mut ticket = ticket(&[3, 7, 11]);

        assert!(!ticket.is_complete());
        assert!(ticket.mark(7));
        assert!(ticket.mark(3));
        assert_eq!(ticket.remaining(), 1);
        assert!(!ticket.is_complete());
        assert!(ticket.mark(11));
        assert!(ticket.is_complete());
        assert_eq!(ticket.remaining(), 0);
    }

    #[test]
    fn test_mark_irrelevant_is_noop() {
        let mut ticket = ticket(&[1, 2]);
        assert!(!ticket.mark(99));
        assert_eq!(ticket.remaining(), 2);
        assert!(ticket.matched().is_empty());
    }

    #[test]
    fn test_mark_twice_reports_once() {
        let mut ticket = ticket(&[1, 2]);
        assert!(ticket.mark(1));
        assert!(!ticket.mark(1));
        assert_eq!(ticket.matched(), vec![1]);
    }

    #[test]
    fn test_matched_subset_of_numbers() {
        let mut ticket = ticket(&[4, 8, 15]);
        for n in 0..20 {
            ticket.mark(n);
        }
        for n in ticket.matched() {
            assert!(ticket.contains(n));
        }
    }

    #[test]
    fn test_is_unmatched() {
        let mut ticket = ticket(&[5, 6]);
        assert!(ticket.is_unmatched(5));
        assert!(!ticket.is_unmatched(99));
        ticket.mark(5);
        assert!(!ticket.is_unmatched(5));
    }

    #[test]
    fn test_from_prefix() {
        let order =
            crate::draw::DrawOrder::generate(1, 36, &mut FastrandRng::with_seed(3)).unwrap();
        let ticket = Ticket::from_prefix(&order, 12).unwrap();

        assert_eq!(ticket.numbers().len(), 12);
        for n in order.prefix(12) {
            assert!(ticket.contains(*n));
        }
    }

    #[test]
    fn test_from_prefix_completes_at_size() {
        let order =
            crate::draw::DrawOrder::generate(1, 36, &mut FastrandRng::with_seed(9)).unwrap();
        let mut ticket = Ticket::from_prefix(&order, 12).unwrap();

        for (i, n) in order.numbers().iter().enumerate().take(12) {
            assert!(!ticket.is_complete());
            ticket.mark(*n);
            assert_eq!(ticket.is_complete(), i == 11);
        }
    }

    #[test]
    fn test_from_prefix_too_short() {
        let order = crate::draw::DrawOrder::generate(1, 5, &mut FastrandRng::with_seed(0)).unwrap();
        let result = Ticket::from_prefix(&order, 12);
        assert_eq!(
            result.unwrap_err(),
            Error::WrongSize {
                expected: 12,
                actual: 5
            }
        );
    }
}
