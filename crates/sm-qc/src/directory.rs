//! Engines for every survey currently collecting responses
//!
//! Engines for different surveys share nothing, so submissions to unrelated
//! surveys proceed in parallel; the directory itself only guards lookup.
//! A closed survey stays closed: it cannot be opened again, so no worker is
//! approved twice across a close.

use crate::action::QcActions;
use crate::classifier::{Classifier, DisabledClassifier};
use crate::config::QcConfig;
use crate::engine::{EngineSnapshot, QualityControlEngine};
use crate::error::AssessError;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use sm_response::SurveyResponse;
use sm_survey::{Survey, SurveyId};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Concurrent map from survey to its quality-control engine
pub struct EngineDirectory {
    engines: DashMap<SurveyId, Arc<QualityControlEngine>>,
    closed: DashSet<SurveyId>,
    classifier: Arc<dyn Classifier>,
    config: QcConfig,
}

impl fmt::Debug for EngineDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineDirectory")
            .field("surveys", &self.engines.len())
            .field("closed", &self.closed.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for EngineDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineDirectory {
    /// Empty directory opening engines with the disabled classifier
    #[must_use]
    pub fn new() -> Self {
        Self {
            engines: DashMap::new(),
            closed: DashSet::new(),
            classifier: Arc::new(DisabledClassifier),
            config: QcConfig::default(),
        }
    }

    /// With the classifier given to newly opened engines
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// With the configuration given to newly opened engines
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: QcConfig) -> Self {
        self.config = config;
        self
    }

    /// Begin quality control for `survey`, or return its open engine
    ///
    /// # Errors
    /// `Closed` when the survey was closed in this directory
    pub fn open(&self, survey: Arc<Survey>) -> Result<Arc<QualityControlEngine>, AssessError> {
        let id = survey.id();
        match self.engines.entry(id) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                // checked under the shard lock that `close` also holds
                if self.closed.contains(&id) {
                    warn!(survey = %id, "reopen of closed survey refused");
                    return Err(AssessError::Closed { survey: id });
                }
                info!(survey = %id, questions = survey.len(), "quality control opened");
                let engine = QualityControlEngine::new(survey)
                    .with_shared_classifier(Arc::clone(&self.classifier))
                    .with_config(self.config);
                Ok(Arc::clone(entry.insert(Arc::new(engine)).value()))
            }
        }
    }

    /// Open engine for a survey
    #[must_use]
    pub fn get(&self, survey: &SurveyId) -> Option<Arc<QualityControlEngine>> {
        self.engines.get(survey).map(|engine| Arc::clone(engine.value()))
    }

    /// Assess a submission with the survey's engine
    ///
    /// # Errors
    /// `Closed` for a closed survey, `UnknownSurvey` when no engine is open,
    /// otherwise as [`QualityControlEngine::assess`]
    pub fn assess(
        &self,
        survey: &SurveyId,
        response: SurveyResponse,
    ) -> Result<QcActions, AssessError> {
        // Clone out of the map so the shard lock is not held during assessment.
        let Some(engine) = self.get(survey) else {
            if self.is_closed(survey) {
                return Err(AssessError::Closed { survey: *survey });
            }
            return Err(AssessError::UnknownSurvey { survey: *survey });
        };
        engine.assess(response)
    }

    /// End quality control for a survey, returning its final state
    ///
    /// Engine handles obtained earlier refuse further submissions, and the
    /// survey cannot be opened again. `None` when no engine is open.
    pub fn close(&self, survey: &SurveyId) -> Option<EngineSnapshot> {
        let engine = match self.engines.entry(*survey) {
            Entry::Occupied(entry) => {
                self.closed.insert(*survey);
                entry.remove()
            }
            Entry::Vacant(_) => return None,
        };
        let snapshot = engine.close();
        info!(
            %survey,
            valid = snapshot.valid.len(),
            automated = snapshot.automated.len(),
            "quality control closed"
        );
        Some(snapshot)
    }

    /// Whether the survey was closed in this directory
    #[must_use]
    pub fn is_closed(&self, survey: &SurveyId) -> bool {
        self.closed.contains(survey)
    }

    /// Number of open engines
    #[must_use]
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Whether no engine is open
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Surveys with an open engine, sorted
    #[must_use]
    pub fn surveys(&self) -> Vec<SurveyId> {
        let mut surveys: Vec<_> = self.engines.iter().map(|entry| *entry.key()).collect();
        surveys.sort();
        surveys
    }
}
