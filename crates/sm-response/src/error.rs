//! Error types for response encoding and decoding

use std::io;

/// A worker identifier was empty or contained a line break
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid worker id {value:?}")]
pub struct InvalidWorkerId {
    /// Rejected value
    pub value: String,
}

/// Failure producing response text, or a response that does not fit its survey
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    /// A survey question has no answer
    #[error("no answer for question {question}")]
    MissingAnswer { question: String },

    /// An answer names a question the survey does not declare
    #[error("answer for undeclared question {question}")]
    UnexpectedAnswer { question: String },

    /// An answer names an option the question does not offer
    #[error("question {question} has no option {option}")]
    UnknownOption { question: String, option: String },

    /// A field would be split by the separator
    #[error("{field} {value:?} contains the separator {separator:?}")]
    SeparatorInField {
        field: &'static str,
        value: String,
        separator: char,
    },

    /// Separator unusable for the format
    #[error("invalid separator {separator:?}")]
    InvalidSeparator { separator: char },

    /// Writer failure
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

/// Failure reading response text
///
/// Row numbers are 1-based line numbers of the input stream.
#[derive(Debug, thiserror::Error)]
pub enum DecodingError {
    /// Stream has no header line
    #[error("missing header line")]
    MissingHeader,

    /// Header does not describe the survey
    #[error("header does not match survey: {reason}")]
    HeaderMismatch { reason: String },

    /// Row width differs from the header width
    #[error("row {row}: expected {expected} fields, found {found}")]
    ColumnCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Row has an empty worker field
    #[error("row {row}: empty worker id")]
    EmptyWorker { row: usize },

    /// Value is not an option of its question
    #[error("row {row}: question {question} has no option {option:?}")]
    UnknownOption {
        row: usize,
        question: String,
        option: String,
    },

    /// Correlation marker names a group the survey does not declare
    #[error("row {row}: unknown correlation group {key:?}")]
    UnknownCorrelation { row: usize, key: String },

    /// Reader failure
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}

impl DecodingError {
    /// Offending row, when the error is tied to one
    #[must_use]
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::ColumnCount { row, .. }
            | Self::EmptyWorker { row }
            | Self::UnknownOption { row, .. }
            | Self::UnknownCorrelation { row, .. } => Some(*row),
            Self::MissingHeader | Self::HeaderMismatch { .. } | Self::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_accessor() {
        let err = DecodingError::UnknownOption {
            row: 4,
            question: "q1".into(),
            option: "zz".into(),
        };
        assert_eq!(err.row(), Some(4));
        assert!(err.to_string().starts_with("row 4:"));
        assert_eq!(DecodingError::MissingHeader.row(), None);
    }
}
