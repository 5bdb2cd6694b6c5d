//! Survey identifiers
//!
//! Questions, options, blocks and correlation groups are addressed by validated
//! string identifiers. Surveys get a ULID so that two live surveys never share an id.

use crate::error::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use ulid::Ulid;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("identifier pattern is valid"));

/// Dotted block path: no empty segment
static BLOCK_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_\-]+(\.[A-Za-z0-9_\-]+)*$").expect("block path pattern is valid")
});

/// Header fields reserved by the response codec
pub const RESERVED_QUESTION_IDS: [&str; 2] = ["WORKERID", "CORRELATION"];

/// Unique survey identifier (ULID, assigned once at construction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SurveyId(pub Ulid);

impl SurveyId {
    /// Generate new survey ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SurveyId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SurveyId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal, $pattern:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap an identifier
            ///
            /// # Errors
            /// `ParseError::InvalidIdentifier` when the value is empty or contains
            /// characters outside `[A-Za-z0-9_.-]`; block ids also reject empty
            /// dotted segments (`.1`, `1..2`, `1.`)
            pub fn new(value: impl Into<String>) -> Result<Self, ParseError> {
                let value = value.into();
                if $pattern.is_match(&value) {
                    Ok(Self(value))
                } else {
                    Err(ParseError::InvalidIdentifier { kind: $kind, value })
                }
            }

            /// Identifier text
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s.trim())
            }
        }

        impl TryFrom<String> for $name {
            type Error = ParseError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Question identifier, unique within a survey
    QuestionId,
    "question",
    IDENTIFIER
);

string_id!(
    /// Option identifier, unique within its question
    OptionId,
    "option",
    IDENTIFIER
);

string_id!(
    /// Block identifier; sub-blocks use dotted paths (`1.2`)
    BlockId,
    "block",
    BLOCK_PATH
);

string_id!(
    /// Correlation group key
    CorrelationKey,
    "correlation",
    IDENTIFIER
);

impl QuestionId {
    /// Whether the identifier collides with a codec header field
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        RESERVED_QUESTION_IDS
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(&self.0))
    }
}

impl BlockId {
    /// Parent block for dotted sub-block ids
    #[must_use]
    pub fn parent(&self) -> Option<BlockId> {
        self.0
            .rsplit_once('.')
            .map(|(parent, _)| BlockId(parent.to_string()))
    }

    /// Outermost ancestor (the block itself when top-level)
    #[must_use]
    pub fn top_level(&self) -> BlockId {
        match self.0.split_once('.') {
            Some((top, _)) => BlockId(top.to_string()),
            None => self.clone(),
        }
    }

    /// Whether this block sits at the top level of the survey
    #[inline]
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        !self.0.contains('.')
    }

    /// Chain of ids from the outermost ancestor down to this block
    #[must_use]
    pub fn lineage(&self) -> Vec<BlockId> {
        let mut chain = Vec::new();
        let mut current = String::new();
        for segment in self.0.split('.') {
            if !current.is_empty() {
                current.push('.');
            }
            current.push_str(segment);
            chain.push(BlockId(current.clone()));
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_validate_characters() {
        assert!(QuestionId::new("q_1.a-b").is_ok());
        assert!(matches!(
            QuestionId::new("q 1"),
            Err(ParseError::InvalidIdentifier { kind: "question", .. })
        ));
        assert!(OptionId::new("").is_err());
        assert!(OptionId::new("a,b").is_err());
    }

    #[test]
    fn from_str_trims() {
        let id: QuestionId = "  q1 ".parse().unwrap();
        assert_eq!(id.as_str(), "q1");
    }

    #[test]
    fn reserved_ids_are_case_insensitive() {
        assert!(QuestionId::new("workerid").unwrap().is_reserved());
        assert!(QuestionId::new("Correlation").unwrap().is_reserved());
        assert!(!QuestionId::new("q1").unwrap().is_reserved());
    }

    #[test]
    fn block_lineage() {
        let id = BlockId::new("1.2.3").unwrap();
        assert_eq!(id.parent().unwrap().as_str(), "1.2");
        assert_eq!(id.top_level().as_str(), "1");
        assert!(!id.is_top_level());
        let chain: Vec<_> = id.lineage().iter().map(|b| b.as_str().to_string()).collect();
        assert_eq!(chain, vec!["1", "1.2", "1.2.3"]);
    }

    #[test]
    fn block_ids_reject_empty_segments() {
        for bad in [".1", "1..2", "1.", "."] {
            assert!(
                matches!(
                    BlockId::new(bad),
                    Err(ParseError::InvalidIdentifier { kind: "block", .. })
                ),
                "{bad} accepted"
            );
        }
        assert!(serde_json::from_str::<BlockId>("\"1..2\"").is_err());
        // other identifiers may still contain dots anywhere
        assert!(QuestionId::new(".q").is_ok());
        assert!(BlockId::new("_r-1.b_2")
            .unwrap()
            .lineage()
            .iter()
            .all(|b| !b.as_str().is_empty()));
    }

    #[test]
    fn survey_ids_are_distinct() {
        assert_ne!(SurveyId::new(), SurveyId::new());
    }

    #[test]
    fn serde_rejects_invalid_identifier() {
        let ok: QuestionId = serde_json::from_str("\"q1\"").unwrap();
        assert_eq!(ok.as_str(), "q1");
        assert!(serde_json::from_str::<QuestionId>("\"bad id\"").is_err());
    }
}
