//! SurveyMan Survey Model
//!
//! Immutable, validated representation of a survey:
//! - **Blocks** holding questions and nested sub-blocks
//! - **Questions** with ordered options and optional branch maps
//! - **Correlation groups** constraining how answers co-vary
//!
//! Surveys come from tabular rows ([`build`]) or programmatic construction
//! ([`SurveyBuilder`]). Both paths enforce the same rules and fail with a
//! [`ParseError`] instead of producing a partial survey.
//!
//! # Example
//!
//! ```rust
//! use sm_survey::build;
//!
//! let rows = vec![
//!     vec!["QUESTION", "OPTIONS", "CORRELATION"],
//!     vec!["q1", "agree", "trust"],
//!     vec!["", "disagree", ""],
//!     vec!["q2", "agree", "trust"],
//!     vec!["", "disagree", ""],
//! ];
//! let survey = build(rows).unwrap();
//! assert_eq!(survey.len(), 2);
//! assert!(survey.has_correlations());
//! ```

#![warn(missing_docs)]

pub mod branch;
pub mod builder;
pub mod correlation;
pub mod error;
pub mod ids;
pub mod model;
pub mod rows;

// Re-exports
pub use branch::{BranchDestination, BranchMap, BranchPolicy, NEXT};
pub use builder::{SurveyBuilder, DEFAULT_BLOCK};
pub use correlation::{CorrelationGroup, CorrelationRelation};
pub use error::ParseError;
pub use ids::{BlockId, CorrelationKey, OptionId, QuestionId, SurveyId, RESERVED_QUESTION_IDS};
pub use model::{Block, Question, Survey, SurveyOption};
pub use rows::{build, Column, Schema};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for survey construction
    pub use crate::{
        build, CorrelationGroup, CorrelationRelation, OptionId, ParseError, Question,
        QuestionId, Survey, SurveyBuilder, SurveyId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
