//! Player name management and validation
//!
//! Players register for a round under a display name. This module keeps
//! the bidirectional mapping between player IDs and names, enforcing
//! uniqueness, length limits and content filtering at registration time.

use std::collections::{HashMap, HashSet, hash_map::Entry};

use rustrict::CensorStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::watcher::Id;

/// Serialization helper for the [`Names`] struct
#[derive(Deserialize)]
struct NamesSerde {
    mapping: HashMap<Id, String>,
}

/// Manages player names and their associations with player IDs
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(from = "NamesSerde")]
pub struct Names {
    /// Primary mapping from player ID to name
    mapping: HashMap<Id, String>,

    /// Reverse mapping from name to player ID (not serialized)
    #[serde(skip_serializing)]
    reverse_mapping: HashMap<String, Id>,
    /// Set of all taken names for quick uniqueness checks (not serialized)
    #[serde(skip_serializing)]
    existing: HashSet<String>,
}

impl From<NamesSerde> for Names {
    /// Reconstructs the struct from serialized data, rebuilding the
    /// reverse mapping and the taken-name set from the primary mapping.
    fn from(serde: NamesSerde) -> Self {
        let NamesSerde { mapping } = serde;
        let mut reverse_mapping = HashMap::new();
        let mut existing = HashSet::new();
        for (id, name) in &mapping {
            reverse_mapping.insert(name.to_owned(), *id);
            existing.insert(name.to_owned());
        }
        Self {
            mapping,
            reverse_mapping,
            existing,
        }
    }
}

/// Errors that can occur during name validation and assignment
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The requested name is already in use by another player
    #[error("name already in-use")]
    Used,
    /// The player already has an assigned name
    #[error("player has an existing name")]
    Assigned,
    /// The name is empty or contains only whitespace
    #[error("name cannot be empty")]
    Empty,
    /// The name contains inappropriate content
    #[error("name is inappropriate")]
    Sinful,
    /// The name exceeds the maximum allowed length
    #[error("name is too long")]
    TooLong,
}

impl Names {
    /// Retrieves the name associated with a player ID
    pub fn get_name(&self, id: &Id) -> Option<String> {
        self.mapping.get(id).map(std::borrow::ToOwned::to_owned)
    }

    /// Assigns a name to a player after validation
    ///
    /// The name is trimmed of surrounding whitespace before being checked
    /// for length, content and uniqueness.
    ///
    /// # Arguments
    ///
    /// * `id` - The player ID to assign the name to
    /// * `name` - The requested name
    ///
    /// # Returns
    ///
    /// The cleaned and assigned name on success.
    ///
    /// # Errors
    ///
    /// * [`Error::TooLong`] - name exceeds the length limit
    /// * [`Error::Empty`] - name is empty after trimming
    /// * [`Error::Sinful`] - name contains inappropriate content
    /// * [`Error::Used`] - name is already taken by another player
    /// * [`Error::Assigned`] - player already has a name
    pub fn set_name(&mut self, id: Id, name: &str) -> Result<String, Error> {
        if name.len() > crate::constants::round::MAX_NAME_LENGTH {
            return Err(Error::TooLong);
        }
        let name = rustrict::trim_whitespace(name);
        if name.is_empty() {
            return Err(Error::Empty);
        }
        if name.is_inappropriate() {
            return Err(Error::Sinful);
        }
        if !self.existing.insert(name.to_owned()) {
            return Err(Error::Used);
        }
        match self.mapping.entry(id) {
            Entry::Occupied(_) => Err(Error::Assigned),
            Entry::Vacant(v) => {
                v.insert(name.to_owned());
                self.reverse_mapping.insert(name.to_owned(), id);
                Ok(name.to_owned())
            }
        }
    }

    /// Retrieves the player ID associated with a name
    pub fn get_id(&self, name: &str) -> Option<Id> {
        self.reverse_mapping.get(name).copied()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut names = Names::default();
        let id = Id::new();

        assert_eq!(names.set_name(id, "Caller"), Ok("Caller".to_owned()));
        assert_eq!(names.get_name(&id), Some("Caller".to_owned()));
        assert_eq!(names.get_id("Caller"), Some(id));
    }

    #[test]
    fn test_too_long() {
        let mut names = Names::default();
        let long = "a".repeat(crate::constants::round::MAX_NAME_LENGTH + 1);
        assert_eq!(names.set_name(Id::new(), &long), Err(Error::TooLong));
    }

    #[test]
    fn test_empty_after_trim() {
        let mut names = Names::default();
        assert_eq!(names.set_name(Id::new(), "   "), Err(Error::Empty));
    }

    #[test]
    fn test_whitespace_trimmed() {
        let mut names = Names::default();
        let id = Id::new();
        assert_eq!(names.set_name(id, "  Dabber  "), Ok("Dabber".to_owned()));
        assert_eq!(names.get_id("Dabber"), Some(id));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut names = Names::default();
        names.set_name(Id::new(), "Lucky").unwrap();
        assert_eq!(names.set_name(Id::new(), "Lucky"), Err(Error::Used));
        assert_eq!(names.set_name(Id::new(), " Lucky "), Err(Error::Used));
    }

    #[test]
    fn test_renaming_rejected() {
        let mut names = Names::default();
        let id = Id::new();
        names.set_name(id, "First").unwrap();
        assert_eq!(names.set_name(id, "Second"), Err(Error::Assigned));
        assert_eq!(names.get_name(&id), Some("First".to_owned()));
    }

    #[test]
    fn test_inappropriate_rejected() {
        let mut names = Names::default();
        assert_eq!(names.set_name(Id::new(), "fuck"), Err(Error::Sinful));
    }

    #[test]
    fn test_serde_rebuilds_reverse_mapping() {
        let mut original = Names::default();
        let id = Id::new();
        original.set_name(id, "Roundhouse").unwrap();

        let serialized = serde_json::to_string(&original).unwrap();
        let mut deserialized: Names = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized.get_id("Roundhouse"), Some(id));
        assert_eq!(
            deserialized.set_name(Id::new(), "Roundhouse"),
            Err(Error::Used)
        );
    }
}
