//! Quality-control actions
//!
//! An [`QcActions`] set is the whole outcome of one assessment. The
//! orchestration layer translates each action into platform effects.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};

/// One instruction for the orchestration layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QcAction {
    /// Refuse the submission
    Reject,
    /// Refuse the submission and block the worker
    Block,
    /// Accept the submission
    Approve,
    /// Prevent the worker from submitting to this survey again
    Dequalify,
}

impl QcAction {
    /// Upper-case action name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Reject => "REJECT",
            Self::Block => "BLOCK",
            Self::Approve => "APPROVE",
            Self::Dequalify => "DEQUALIFY",
        }
    }
}

impl Display for QcAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered, duplicate-free set of actions
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QcActions(SmallVec<[QcAction; 2]>);

impl QcActions {
    /// Empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `{REJECT, DEQUALIFY}`
    #[must_use]
    pub fn rejected() -> Self {
        Self::from_iter([QcAction::Reject, QcAction::Dequalify])
    }

    /// `{BLOCK, DEQUALIFY}`
    #[must_use]
    pub fn blocked() -> Self {
        Self::from_iter([QcAction::Block, QcAction::Dequalify])
    }

    /// `{APPROVE, DEQUALIFY}`
    #[must_use]
    pub fn approved() -> Self {
        Self::from_iter([QcAction::Approve, QcAction::Dequalify])
    }

    /// Append an action unless already present
    pub fn push(&mut self, action: QcAction) {
        if !self.contains(action) {
            self.0.push(action);
        }
    }

    /// Whether the set holds `action`
    #[inline]
    #[must_use]
    pub fn contains(&self, action: QcAction) -> bool {
        self.0.contains(&action)
    }

    /// Actions in order
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[QcAction] {
        &self.0
    }

    /// Number of actions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in order
    pub fn iter(&self) -> impl Iterator<Item = QcAction> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<QcAction> for QcActions {
    fn from_iter<I: IntoIterator<Item = QcAction>>(iter: I) -> Self {
        let mut actions = Self::new();
        for action in iter {
            actions.push(action);
        }
        actions
    }
}

impl IntoIterator for QcActions {
    type Item = QcAction;
    type IntoIter = smallvec::IntoIter<[QcAction; 2]>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Display for QcActions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, action) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{action}")?;
        }
        f.write_str("}")
    }
}
