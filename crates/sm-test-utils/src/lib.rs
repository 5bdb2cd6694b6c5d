//! Testing utilities for SurveyMan workspace
//!
//! Shared survey fixtures, seeded randomness and log setup.

#![allow(missing_docs)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use sm_survey::{build, CorrelationRelation, Survey, SurveyBuilder};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Install a test log subscriber once; honors `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Parse borrowed rows, header first
pub fn survey_from_rows(rows: &[&[&str]]) -> Survey {
    build(rows.iter().copied()).unwrap()
}

/// `q1` and `q2` with options `a`/`b`, no correlations
pub fn two_question_survey() -> Arc<Survey> {
    Arc::new(survey_from_rows(&[
        &["QUESTION", "OPTIONS"],
        &["q1", "a"],
        &["", "b"],
        &["q2", "a"],
        &["", "b"],
    ]))
}

/// `q1`..`q3` with four options each; `q1` and `q3` in group `consistency`
pub fn correlated_survey() -> Arc<Survey> {
    Arc::new(survey_from_rows(&[
        &["QUESTION", "OPTIONS", "CORRELATION"],
        &["q1", "o1", "consistency"],
        &["", "o2", ""],
        &["", "o3", ""],
        &["", "o4", ""],
        &["q2", "o1", ""],
        &["", "o2", ""],
        &["", "o3", ""],
        &["", "o4", ""],
        &["q3", "o1", "consistency"],
        &["", "o2", ""],
        &["", "o3", ""],
        &["", "o4", ""],
    ]))
}

/// `pos` and `neg` on a five-point scale in reverse-coded group `scale`
pub fn reverse_coded_survey() -> Arc<Survey> {
    let mut builder = SurveyBuilder::new();
    for id in ["pos", "neg"] {
        builder.add_question("1", id, "").unwrap();
        for point in ["p1", "p2", "p3", "p4", "p5"] {
            builder.add_option(id, point, "").unwrap();
        }
    }
    builder
        .correlate("scale", CorrelationRelation::ReverseIndex, &["pos", "neg"])
        .unwrap();
    Arc::new(builder.build().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_build() {
        init_tracing();
        assert_eq!(two_question_survey().len(), 2);
        assert_eq!(correlated_survey().correlations().len(), 1);
        let reverse = reverse_coded_survey();
        assert_eq!(
            reverse.correlation_of("neg").unwrap().relation(),
            CorrelationRelation::ReverseIndex
        );
    }
}
