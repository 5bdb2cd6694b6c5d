//! Per-survey quality-control engine
//!
//! Each [`QualityControlEngine::assess`] call is one transition:
//! 1. A worker already in the participation registry gets `{REJECT, DEQUALIFY}`
//!    and nothing is recorded.
//! 2. Otherwise the classifier sees the accepted history; an automated verdict
//!    records the response as automated and yields `{BLOCK, DEQUALIFY}`.
//! 3. Otherwise the response is accepted and yields `{APPROVE, DEQUALIFY}`.
//!
//! The registry check, classification and recording happen under one lock, so
//! concurrent duplicate submissions from one worker cannot both be approved.
//! Once [`QualityControlEngine::close`] has run, every submission fails with
//! [`AssessError::Closed`] and the closing snapshot stays final.

use crate::action::QcActions;
use crate::classifier::{Classification, Classifier, DisabledClassifier};
use crate::config::{CompletionCriteria, Properties, QcConfig};
use crate::error::{AssessError, ConfigurationError};
use crate::registry::ParticipationRegistry;
use parking_lot::Mutex;
use serde::Serialize;
use sm_response::{SurveyResponse, WorkerId};
use sm_survey::{Survey, SurveyId};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// A recorded submission and its position in submission order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessed {
    sequence: u64,
    response: SurveyResponse,
}

impl Assessed {
    /// Create a record; sequences are 1-based
    #[inline]
    #[must_use]
    pub fn new(sequence: u64, response: SurveyResponse) -> Self {
        Self { sequence, response }
    }

    /// Submission sequence number
    #[inline]
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Submitted response
    #[inline]
    #[must_use]
    pub fn response(&self) -> &SurveyResponse {
        &self.response
    }

    /// Submitting worker
    #[inline]
    #[must_use]
    pub fn worker_id(&self) -> &WorkerId {
        self.response.worker_id()
    }
}

/// Engine state at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineSnapshot {
    /// Survey the engine served
    pub survey: SurveyId,
    /// Accepted responses in submission order
    pub valid: Vec<Assessed>,
    /// Responses classified as automated, in submission order
    pub automated: Vec<Assessed>,
    /// Every assessed worker, sorted
    pub participants: Vec<WorkerId>,
}

#[derive(Debug)]
struct EngineState {
    registry: ParticipationRegistry,
    valid: Vec<Assessed>,
    automated: Vec<Assessed>,
    sequence: u64,
    closed: bool,
}

impl EngineState {
    fn snapshot(&self, survey: SurveyId) -> EngineSnapshot {
        EngineSnapshot {
            survey,
            valid: self.valid.clone(),
            automated: self.automated.clone(),
            participants: self.registry.workers(),
        }
    }
}

/// Quality control for one survey's collection window
pub struct QualityControlEngine {
    survey: Arc<Survey>,
    classifier: Arc<dyn Classifier>,
    config: QcConfig,
    state: Mutex<EngineState>,
}

impl fmt::Debug for QualityControlEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualityControlEngine")
            .field("survey", &self.survey.id())
            .field("config", &self.config)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl QualityControlEngine {
    /// Start quality control for `survey` with the classifier disabled
    #[must_use]
    pub fn new(survey: Arc<Survey>) -> Self {
        let registry = ParticipationRegistry::new(survey.id());
        Self {
            survey,
            classifier: Arc::new(DisabledClassifier),
            config: QcConfig::default(),
            state: Mutex::new(EngineState {
                registry,
                valid: Vec::new(),
                automated: Vec::new(),
                sequence: 0,
                closed: false,
            }),
        }
    }

    /// With a classifier
    #[must_use]
    pub fn with_classifier(self, classifier: impl Classifier + 'static) -> Self {
        self.with_shared_classifier(Arc::new(classifier))
    }

    /// With a classifier shared across engines
    #[inline]
    #[must_use]
    pub fn with_shared_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: QcConfig) -> Self {
        self.config = config;
        self
    }

    /// Assess one submission
    ///
    /// # Errors
    /// `Closed` after [`close`](Self::close); `InvalidResponse` when a
    /// first-time submission does not answer exactly the survey's questions.
    /// No state changes in either case
    pub fn assess(&self, response: SurveyResponse) -> Result<QcActions, AssessError> {
        let survey = self.survey.id();
        let mut state = self.state.lock();

        if state.closed {
            warn!(%survey, worker = %response.worker_id(), "submission after close refused");
            return Err(AssessError::Closed { survey });
        }

        if state.registry.contains(response.worker_id()) {
            warn!(%survey, worker = %response.worker_id(), "repeat submission rejected");
            return Ok(QcActions::rejected());
        }

        response.validate(&self.survey)?;

        let verdict =
            self.classifier
                .classify(&self.survey, &state.valid, &response, self.config.alpha());

        state.sequence += 1;
        let sequence = state.sequence;
        let worker = response.worker_id().clone();
        state.registry.register(worker.clone());

        match verdict {
            Classification::Automated => {
                state.automated.push(Assessed::new(sequence, response));
                warn!(%survey, %worker, sequence, "automated submission blocked");
                Ok(QcActions::blocked())
            }
            Classification::Genuine => {
                state.valid.push(Assessed::new(sequence, response));
                info!(
                    %survey,
                    %worker,
                    sequence,
                    valid = state.valid.len(),
                    "submission approved"
                );
                Ok(QcActions::approved())
            }
        }
    }

    /// Whether collection is complete under a property bag
    ///
    /// Without `target-sample-size` the survey is always complete.
    ///
    /// # Errors
    /// `InvalidValue` for a malformed target
    pub fn is_complete(&self, properties: &Properties) -> Result<bool, ConfigurationError> {
        let criteria = CompletionCriteria::from_properties(properties)?;
        Ok(self.is_complete_with(&criteria))
    }

    /// Whether collection is complete under explicit criteria
    #[must_use]
    pub fn is_complete_with(&self, criteria: &CompletionCriteria) -> bool {
        criteria.is_met(self.valid_count())
    }

    /// Whether the configured target sample size is met
    #[must_use]
    pub fn is_target_met(&self) -> bool {
        self.is_complete_with(&self.config.criteria())
    }

    /// Survey under control
    #[inline]
    #[must_use]
    pub fn survey(&self) -> &Arc<Survey> {
        &self.survey
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &QcConfig {
        &self.config
    }

    /// Classifier significance threshold
    #[inline]
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.config.alpha()
    }

    /// Accepted responses in submission order
    #[must_use]
    pub fn valid_responses(&self) -> Vec<Assessed> {
        self.state.lock().valid.clone()
    }

    /// Responses classified as automated, in submission order
    #[must_use]
    pub fn automated_responses(&self) -> Vec<Assessed> {
        self.state.lock().automated.clone()
    }

    /// Number of accepted responses
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.state.lock().valid.len()
    }

    /// Number of responses classified as automated
    #[must_use]
    pub fn automated_count(&self) -> usize {
        self.state.lock().automated.len()
    }

    /// Every assessed worker, sorted
    #[must_use]
    pub fn participants(&self) -> Vec<WorkerId> {
        self.state.lock().registry.workers()
    }

    /// Copy of the participation registry
    #[must_use]
    pub fn registry(&self) -> ParticipationRegistry {
        self.state.lock().registry.clone()
    }

    /// Whether `worker` has been assessed
    #[must_use]
    pub fn has_participated(&self, worker: &WorkerId) -> bool {
        self.state.lock().registry.contains(worker)
    }

    /// Consistent copy of the engine state
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        self.state.lock().snapshot(self.survey.id())
    }

    /// Stop accepting submissions and return the final state
    ///
    /// Closing twice returns the same snapshot.
    pub fn close(&self) -> EngineSnapshot {
        let mut state = self.state.lock();
        state.closed = true;
        state.snapshot(self.survey.id())
    }

    /// Whether [`close`](Self::close) has run
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}
