//! Automated-behavior classification
//!
//! The engine asks a [`Classifier`] whether a first-time submission looks
//! automated, given the valid responses accepted so far. Statistical tests
//! plug in here without changing the engine's decision flow.

use crate::engine::Assessed;
use sm_response::SurveyResponse;
use sm_survey::Survey;

/// Classifier verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Submission looks machine-generated
    Automated,
    /// Submission looks human
    Genuine,
}

/// Decides whether a candidate response is automated
#[cfg_attr(test, mockall::automock)]
pub trait Classifier: Send + Sync {
    /// Classify `candidate` against the accepted `history` at significance `alpha`
    fn classify(
        &self,
        survey: &Survey,
        history: &[Assessed],
        candidate: &SurveyResponse,
        alpha: f64,
    ) -> Classification;
}

/// Classifier that treats every submission as genuine
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledClassifier;

impl Classifier for DisabledClassifier {
    fn classify(
        &self,
        _survey: &Survey,
        _history: &[Assessed],
        _candidate: &SurveyResponse,
        _alpha: f64,
    ) -> Classification {
        Classification::Genuine
    }
}
