//! SurveyMan Quality Control
//!
//! Decides what happens to each worker submission:
//! - **Engine**: one [`QualityControlEngine`] per survey, serializing
//!   assessments so a worker is approved at most once
//! - **Classifier**: pluggable automated-behavior detection ([`Classifier`])
//! - **Completion**: target sample size from a [`Properties`] bag or [`QcConfig`]
//! - **Directory**: [`EngineDirectory`] holding the engines of open surveys
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sm_qc::{EngineDirectory, Properties, QcActions};
//! use sm_response::{generate, Strategy, WorkerId};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let survey = Arc::new(sm_survey::build(vec![
//!     vec!["QUESTION", "OPTIONS"],
//!     vec!["q1", "yes"],
//!     vec!["", "no"],
//! ]).unwrap());
//!
//! let directory = EngineDirectory::new();
//! let engine = directory.open(Arc::clone(&survey)).unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(1);
//! let w1 = generate(&survey, Strategy::Uniform, &mut rng, WorkerId::new("w1").unwrap());
//! assert_eq!(engine.assess(w1.clone()).unwrap(), QcActions::approved());
//! assert_eq!(engine.assess(w1).unwrap(), QcActions::rejected());
//!
//! let props = Properties::parse("target-sample-size = 1");
//! assert!(engine.is_complete(&props).unwrap());
//!
//! let snapshot = directory.close(&survey.id()).unwrap();
//! assert_eq!(snapshot.valid.len(), 1);
//! assert!(directory.open(survey).is_err());
//! ```

#![warn(missing_docs)]

pub mod action;
pub mod classifier;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod registry;

// Re-exports
pub use action::{QcAction, QcActions};
pub use classifier::{Classification, Classifier, DisabledClassifier};
pub use config::{CompletionCriteria, Properties, QcConfig, DEFAULT_ALPHA, TARGET_SAMPLE_SIZE};
pub use directory::EngineDirectory;
pub use engine::{Assessed, EngineSnapshot, QualityControlEngine};
pub use error::{AssessError, ConfigurationError};
pub use registry::ParticipationRegistry;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for quality control
    pub use crate::{
        AssessError, Classification, Classifier, ConfigurationError, EngineDirectory,
        Properties, QcAction, QcActions, QcConfig, QualityControlEngine,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
