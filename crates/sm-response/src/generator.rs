//! Synthetic response generation
//!
//! Each question receives one option picked by a [`Strategy`]. Correlated
//! questions are not sampled independently: the group's anchor is sampled and
//! every other member derives its position from the group relation, so every
//! generated response satisfies every correlation group of its survey.

use crate::response::{SurveyResponse, WorkerId};
use crate::strategy::Strategy;
use rand::Rng;
use sm_survey::{CorrelationKey, Survey};
use std::collections::HashMap;

/// Generates well-formed responses for a survey
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseGenerator {
    strategy: Strategy,
}

impl ResponseGenerator {
    /// Create a generator using `strategy`
    #[inline]
    #[must_use]
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    /// Selection strategy
    #[inline]
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Generate one response for `worker`
    pub fn generate<R: Rng + ?Sized>(
        &self,
        survey: &Survey,
        worker: WorkerId,
        rng: &mut R,
    ) -> SurveyResponse {
        let mut anchors: HashMap<&CorrelationKey, usize> = HashMap::new();
        let mut response = SurveyResponse::new(worker);

        for question in survey.questions() {
            let option_count = question.option_count();
            let position = match survey.correlation_of(question.id().as_str()) {
                Some(group) => {
                    let anchor = *anchors
                        .entry(group.key())
                        .or_insert_with(|| self.strategy.pick(option_count, rng));
                    let member = group
                        .members()
                        .iter()
                        .position(|m| m == question.id())
                        .unwrap_or(0);
                    group.relation().derive(anchor, member, option_count)
                }
                None => self.strategy.pick(option_count, rng),
            };
            let option = &question.options()[position];
            response.insert(question.id().clone(), option.id().clone());
        }

        tracing::trace!(
            worker = %response.worker_id(),
            strategy = %self.strategy,
            "generated response"
        );
        response
    }

    /// Generate `count` responses for workers named `{prefix}{n}`, `n` from 1
    ///
    /// # Errors
    /// `InvalidWorkerId` when `prefix` produces an unusable worker id
    pub fn generate_batch<R: Rng + ?Sized>(
        &self,
        survey: &Survey,
        prefix: &str,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<SurveyResponse>, crate::error::InvalidWorkerId> {
        (1..=count)
            .map(|n| {
                let worker = WorkerId::new(format!("{prefix}{n}"))?;
                Ok(self.generate(survey, worker, rng))
            })
            .collect()
    }
}

/// Generate one response for `worker` using `strategy`
pub fn generate<R: Rng + ?Sized>(
    survey: &Survey,
    strategy: Strategy,
    rng: &mut R,
    worker: WorkerId,
) -> SurveyResponse {
    ResponseGenerator::new(strategy).generate(survey, worker, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sm_survey::{CorrelationRelation, SurveyBuilder};

    fn survey(relation: CorrelationRelation) -> Survey {
        let mut b = SurveyBuilder::new();
        for id in ["q1", "q2", "q3"] {
            b.add_question("1", id, "").unwrap();
            for opt in ["a", "b", "c", "d"] {
                b.add_option(id, opt, "").unwrap();
            }
        }
        b.correlate("g", relation, &["q1", "q3"]).unwrap();
        b.build().unwrap()
    }

    fn worker() -> WorkerId {
        WorkerId::new("w").unwrap()
    }

    #[test]
    fn first_strategy_answers_first_options() {
        let survey = survey(CorrelationRelation::SameIndex);
        let mut rng = StdRng::seed_from_u64(1);
        let response = generate(&survey, Strategy::First, &mut rng, worker());
        assert!(response.answers().values().all(|o| o.as_str() == "a"));
        assert!(response.validate(&survey).is_ok());
    }

    #[test]
    fn reverse_group_mirrors_anchor() {
        let survey = survey(CorrelationRelation::ReverseIndex);
        let mut rng = StdRng::seed_from_u64(1);
        let response = generate(&survey, Strategy::First, &mut rng, worker());
        assert_eq!(response.answer("q1").unwrap().as_str(), "a");
        assert_eq!(response.answer("q3").unwrap().as_str(), "d");
    }

    #[test]
    fn same_seed_same_response() {
        let survey = survey(CorrelationRelation::SameIndex);
        let generator = ResponseGenerator::new(Strategy::Uniform);
        let a = generator.generate(&survey, worker(), &mut StdRng::seed_from_u64(42));
        let b = generator.generate(&survey, worker(), &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn batch_names_workers() {
        let survey = survey(CorrelationRelation::SameIndex);
        let mut rng = StdRng::seed_from_u64(5);
        let batch = ResponseGenerator::default()
            .generate_batch(&survey, "sim-", 3, &mut rng)
            .unwrap();
        let names: Vec<_> = batch.iter().map(|r| r.worker_id().as_str()).collect();
        assert_eq!(names, ["sim-1", "sim-2", "sim-3"]);
    }
}
