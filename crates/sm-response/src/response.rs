//! Survey responses
//!
//! A [`SurveyResponse`] is one worker's answers: exactly one option per survey
//! question. Answers keep insertion order for display, but equality ignores it.

use crate::error::{EncodingError, InvalidWorkerId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sm_survey::{CorrelationGroup, OptionId, QuestionId, Survey};
use std::fmt::{self, Display, Formatter};

/// Identifier of the worker who submitted a response
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkerId(String);

impl WorkerId {
    /// Wrap a worker identifier
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    /// `InvalidWorkerId` for empty values or values with line breaks
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidWorkerId> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.contains(['\n', '\r']) {
            return Err(InvalidWorkerId { value });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Identifier text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for WorkerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for WorkerId {
    type Error = InvalidWorkerId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkerId> for String {
    fn from(id: WorkerId) -> Self {
        id.0
    }
}

/// One worker's answers to a survey
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyResponse {
    worker_id: WorkerId,
    answers: IndexMap<QuestionId, OptionId>,
}

impl SurveyResponse {
    /// Create an empty response
    #[inline]
    #[must_use]
    pub fn new(worker_id: WorkerId) -> Self {
        Self {
            worker_id,
            answers: IndexMap::new(),
        }
    }

    /// With an answer
    #[inline]
    #[must_use]
    pub fn with_answer(mut self, question: QuestionId, option: OptionId) -> Self {
        self.answers.insert(question, option);
        self
    }

    /// Record an answer, returning the previous one for the question
    pub fn insert(&mut self, question: QuestionId, option: OptionId) -> Option<OptionId> {
        self.answers.insert(question, option)
    }

    /// Submitting worker
    #[inline]
    #[must_use]
    pub fn worker_id(&self) -> &WorkerId {
        &self.worker_id
    }

    /// All answers in insertion order
    #[inline]
    #[must_use]
    pub fn answers(&self) -> &IndexMap<QuestionId, OptionId> {
        &self.answers
    }

    /// Selected option for a question
    #[inline]
    #[must_use]
    pub fn answer(&self, question: &str) -> Option<&OptionId> {
        self.answers.get(question)
    }

    /// Number of answers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// Whether nothing has been answered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Check that the response answers exactly the survey's questions with
    /// options those questions offer
    ///
    /// # Errors
    /// The first missing, unexpected or unknown answer found
    pub fn validate(&self, survey: &Survey) -> Result<(), EncodingError> {
        for question in survey.questions() {
            let Some(option) = self.answers.get(question.id().as_str()) else {
                return Err(EncodingError::MissingAnswer {
                    question: question.id().to_string(),
                });
            };
            if question.option(option.as_str()).is_none() {
                return Err(EncodingError::UnknownOption {
                    question: question.id().to_string(),
                    option: option.to_string(),
                });
            }
        }
        if let Some(extra) = self
            .answers
            .keys()
            .find(|q| !survey.contains_question(q.as_str()))
        {
            return Err(EncodingError::UnexpectedAnswer {
                question: extra.to_string(),
            });
        }
        Ok(())
    }

    /// Whether the answers satisfy a correlation group's relation
    ///
    /// Unanswered or unknown members make the group unsatisfied.
    #[must_use]
    pub fn satisfies(&self, survey: &Survey, group: &CorrelationGroup) -> bool {
        let Some(option_count) = survey.question(group.anchor().as_str()).map(|q| q.option_count())
        else {
            return false;
        };
        let positions: Option<Vec<usize>> = group
            .members()
            .iter()
            .map(|m| {
                let option = self.answer(m.as_str())?;
                survey.option_position(m.as_str(), option.as_str())
            })
            .collect();
        positions.is_some_and(|p| group.holds(&p, option_count))
    }
}
