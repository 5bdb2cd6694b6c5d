//! Correlation groups
//!
//! A correlation group ties the answers of two or more questions together. The
//! relation is expressed over option *positions*, so members must offer the same
//! number of options.

use crate::error::ParseError;
use crate::ids::{CorrelationKey, QuestionId};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// How member answers co-vary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorrelationRelation {
    /// Every member selects the same option position
    #[default]
    SameIndex,

    /// The anchor selects position `i`, every other member selects `n - 1 - i`
    /// (reverse-coded items)
    ReverseIndex,
}

impl CorrelationRelation {
    /// Position a member must select given the anchor's position
    ///
    /// `member` is the member's index within the group (0 is the anchor) and
    /// `option_count` the shared number of options.
    #[inline]
    #[must_use]
    pub fn derive(self, anchor_position: usize, member: usize, option_count: usize) -> usize {
        match self {
            Self::SameIndex => anchor_position,
            Self::ReverseIndex if member == 0 => anchor_position,
            Self::ReverseIndex => option_count - 1 - anchor_position,
        }
    }
}

impl Display for CorrelationRelation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameIndex => f.write_str("same"),
            Self::ReverseIndex => f.write_str("reverse"),
        }
    }
}

impl FromStr for CorrelationRelation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "same" | "same-index" => Ok(Self::SameIndex),
            "reverse" | "reverse-index" => Ok(Self::ReverseIndex),
            _ => Err(ParseError::InvalidCell {
                column: "CORRELATION",
                value: s.to_string(),
            }),
        }
    }
}

/// Named relation over two or more questions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelationGroup {
    key: CorrelationKey,
    relation: CorrelationRelation,
    members: Vec<QuestionId>,
}

impl CorrelationGroup {
    pub(crate) fn new(
        key: CorrelationKey,
        relation: CorrelationRelation,
        members: Vec<QuestionId>,
    ) -> Self {
        Self {
            key,
            relation,
            members,
        }
    }

    /// Group key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &CorrelationKey {
        &self.key
    }

    /// Declared relation
    #[inline]
    #[must_use]
    pub fn relation(&self) -> CorrelationRelation {
        self.relation
    }

    /// Members in survey declaration order; the first is the anchor
    #[inline]
    #[must_use]
    pub fn members(&self) -> &[QuestionId] {
        &self.members
    }

    /// The member whose answer the others are derived from
    #[inline]
    #[must_use]
    pub fn anchor(&self) -> &QuestionId {
        &self.members[0]
    }

    /// Whether a question belongs to this group
    #[inline]
    #[must_use]
    pub fn contains(&self, question: &str) -> bool {
        self.members.iter().any(|m| m.as_str() == question)
    }

    /// Check the relation against selected positions, given in member order
    #[must_use]
    pub fn holds(&self, positions: &[usize], option_count: usize) -> bool {
        let Some(&anchor) = positions.first() else {
            return false;
        };
        positions.len() == self.members.len()
            && anchor < option_count
            && positions
                .iter()
                .enumerate()
                .all(|(member, &p)| p == self.relation.derive(anchor, member, option_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(relation: CorrelationRelation, n: usize) -> CorrelationGroup {
        CorrelationGroup::new(
            CorrelationKey::new("g").unwrap(),
            relation,
            (0..n)
                .map(|i| QuestionId::new(format!("q{i}")).unwrap())
                .collect(),
        )
    }

    #[test]
    fn same_index_holds() {
        let g = group(CorrelationRelation::SameIndex, 3);
        assert!(g.holds(&[1, 1, 1], 4));
        assert!(!g.holds(&[1, 2, 1], 4));
        assert!(!g.holds(&[1, 1], 4));
    }

    #[test]
    fn reverse_index_holds() {
        let g = group(CorrelationRelation::ReverseIndex, 2);
        assert!(g.holds(&[0, 4], 5));
        assert!(g.holds(&[2, 2], 5));
        assert!(!g.holds(&[1, 1], 5));
    }

    #[test]
    fn relation_parses() {
        assert_eq!(
            "".parse::<CorrelationRelation>().unwrap(),
            CorrelationRelation::SameIndex
        );
        assert_eq!(
            "Reverse".parse::<CorrelationRelation>().unwrap(),
            CorrelationRelation::ReverseIndex
        );
        assert!("sideways".parse::<CorrelationRelation>().is_err());
    }

    #[test]
    fn anchor_and_membership() {
        let g = group(CorrelationRelation::SameIndex, 2);
        assert_eq!(g.anchor().as_str(), "q0");
        assert!(g.contains("q1"));
        assert!(!g.contains("q2"));
    }
}
