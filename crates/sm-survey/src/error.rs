//! Error types for survey construction
//!
//! Every failure aborts construction of the [`Survey`](crate::Survey); nothing is
//! partially built. Errors raised while reading tabular rows are wrapped in
//! [`ParseError::AtLine`] so callers can point at the offending row.

/// Survey definition errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Error located at a specific input row (1-based, header is line 1)
    #[error("line {line}: {source}")]
    AtLine {
        /// Input line number
        line: usize,
        /// Underlying error
        #[source]
        source: Box<ParseError>,
    },

    /// No header row, or no questions at all
    #[error("survey definition is empty")]
    EmptyInput,

    /// Required column absent from the header
    #[error("missing required column {column}")]
    MissingColumn { column: &'static str },

    /// Column named twice in the header
    #[error("duplicate column {column}")]
    DuplicateColumn { column: String },

    /// Column not part of the schema
    #[error("unknown column {column}")]
    UnknownColumn { column: String },

    /// Row width differs from the header width
    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },

    /// Identifier with characters outside `[A-Za-z0-9_.-]`, or empty
    #[error("invalid {kind} identifier {value:?}")]
    InvalidIdentifier { kind: &'static str, value: String },

    /// Identifier collides with a reserved response column
    #[error("question identifier {id} is reserved")]
    ReservedIdentifier { id: String },

    /// Question identifier declared more than once
    #[error("question {id} declared more than once")]
    DuplicateQuestion { id: String },

    /// Reference names a question that was never declared
    #[error("reference to undeclared question {id}")]
    UndeclaredQuestion { id: String },

    /// Continuation row appears before any question is declared
    #[error("row continues a question, but no question has been declared")]
    OrphanRow,

    /// Option identifier repeated within one question
    #[error("option {option} repeated in question {question}")]
    DuplicateOption { question: String, option: String },

    /// Option not declared on the question
    #[error("question {question} has no option {option}")]
    UnknownOption { question: String, option: String },

    /// Question without any options
    #[error("question {id} has no options")]
    EmptyQuestion { id: String },

    /// Correlation group names a question missing from the survey
    #[error("correlation group {group} references unknown question {question}")]
    UnknownCorrelationTarget { group: String, question: String },

    /// Correlation group violates its structural rules
    #[error("malformed correlation group {group}: {reason}")]
    MalformedCorrelation { group: String, reason: String },

    /// Branch destination is not a top-level block
    #[error("question {question} branches to {target}, which is not a top-level block")]
    UnknownBranchTarget { question: String, target: String },

    /// Branch destination does not lie after the question's block
    #[error("question {question} does not branch forward to {target}")]
    BranchNotForward { question: String, target: String },

    /// Block mixes branching questions in an unsupported way
    #[error("block {block}: {reason}")]
    InvalidBranchPolicy { block: String, reason: String },

    /// Cell value could not be interpreted
    #[error("invalid value {value:?} in column {column}")]
    InvalidCell { column: &'static str, value: String },
}

impl ParseError {
    /// Attach a row number, unless one is already attached
    #[must_use]
    pub fn at_line(self, line: usize) -> Self {
        match self {
            located @ Self::AtLine { .. } => located,
            other => Self::AtLine {
                line,
                source: Box::new(other),
            },
        }
    }

    /// Row number, if the error came from tabular input
    #[inline]
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::AtLine { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Error with any row location stripped
    #[must_use]
    pub fn root(&self) -> &ParseError {
        match self {
            Self::AtLine { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_line_wraps_once() {
        let err = ParseError::EmptyInput.at_line(3).at_line(7);
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.root(), &ParseError::EmptyInput);
    }

    #[test]
    fn display_includes_context() {
        let err = ParseError::DuplicateQuestion { id: "q1".into() }.at_line(4);
        assert_eq!(err.to_string(), "line 4: question q1 declared more than once");

        let err = ParseError::OrphanRow.at_line(2);
        assert_eq!(err.root(), &ParseError::OrphanRow);
    }
}
