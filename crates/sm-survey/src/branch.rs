//! Branching between blocks
//!
//! A question may send the respondent to a later top-level block depending on the
//! option they select. Blocks follow one of three branch policies.

use crate::error::ParseError;
use crate::ids::{BlockId, OptionId};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Marker for "continue with the following block"
pub const NEXT: &str = "NEXT";

/// Where an option sends the respondent
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BranchDestination {
    /// A top-level block
    Block(BlockId),
    /// Defer to the next block in order
    Next,
}

impl BranchDestination {
    /// Destination block, if any
    #[inline]
    #[must_use]
    pub fn block(&self) -> Option<&BlockId> {
        match self {
            Self::Block(id) => Some(id),
            Self::Next => None,
        }
    }
}

impl Display for BranchDestination {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block(id) => Display::fmt(id, f),
            Self::Next => f.write_str(NEXT),
        }
    }
}

impl FromStr for BranchDestination {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(NEXT) {
            Ok(Self::Next)
        } else {
            BlockId::new(s).map(Self::Block)
        }
    }
}

impl Serialize for BranchDestination {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Option → destination mapping for one question
///
/// Options without an explicit branch go to [`BranchDestination::Next`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BranchMap {
    entries: Vec<(OptionId, BranchDestination)>,
}

impl BranchMap {
    /// Map every option to `Next`
    #[must_use]
    pub fn for_options<'a>(options: impl IntoIterator<Item = &'a OptionId>) -> Self {
        Self {
            entries: options
                .into_iter()
                .map(|id| (id.clone(), BranchDestination::Next))
                .collect(),
        }
    }

    /// Set the destination for an option, appending it if not yet mapped
    pub fn set(&mut self, option: OptionId, destination: BranchDestination) {
        match self.entries.iter_mut().find(|(id, _)| *id == option) {
            Some(entry) => entry.1 = destination,
            None => self.entries.push((option, destination)),
        }
    }

    /// Destination for an option
    #[must_use]
    pub fn get(&self, option: &str) -> Option<&BranchDestination> {
        self.entries
            .iter()
            .find(|(id, _)| id.as_str() == option)
            .map(|(_, dest)| dest)
    }

    /// Destinations in option order
    pub fn destinations(&self) -> impl Iterator<Item = &BranchDestination> {
        self.entries.iter().map(|(_, dest)| dest)
    }

    /// All `(option, destination)` pairs
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[(OptionId, BranchDestination)] {
        &self.entries
    }
}

impl Serialize for BranchMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (option, destination) in &self.entries {
            map.serialize_entry(option, destination)?;
        }
        map.end()
    }
}

/// Branch policy of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchPolicy {
    /// No question branches
    BranchNone,
    /// Exactly one question branches
    BranchOne,
    /// Every question branches, all to the same destinations
    BranchAll,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt(id: &str) -> OptionId {
        OptionId::new(id).unwrap()
    }

    #[test]
    fn destination_parses_next() {
        assert_eq!("next".parse::<BranchDestination>().unwrap(), BranchDestination::Next);
        assert_eq!(
            "2".parse::<BranchDestination>().unwrap(),
            BranchDestination::Block(BlockId::new("2").unwrap())
        );
    }

    #[test]
    fn map_defaults_to_next_and_overrides() {
        let options = [opt("a"), opt("b")];
        let mut map = BranchMap::for_options(&options);
        assert_eq!(map.get("a"), Some(&BranchDestination::Next));

        map.set(opt("b"), BranchDestination::Block(BlockId::new("3").unwrap()));
        let rendered: Vec<String> = map.destinations().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["NEXT", "3"]);
    }

    #[test]
    fn map_serializes_as_object() {
        let mut map = BranchMap::default();
        map.set(opt("a"), BranchDestination::Block(BlockId::new("2").unwrap()));
        map.set(opt("b"), BranchDestination::Next);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"a":"2","b":"NEXT"}"#);
    }
}
