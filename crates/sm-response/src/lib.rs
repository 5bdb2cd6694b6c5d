//! SurveyMan Responses
//!
//! Worker responses to a [`Survey`](sm_survey::Survey):
//! - **Responses**: one option per question, checked against the survey
//! - **Generation**: seeded synthetic respondents under a selection [`Strategy`]
//!   that always honor correlation groups
//! - **Codec**: the header + row text format used for storage and exchange
//!
//! # Example
//!
//! ```rust
//! use rand::{rngs::StdRng, SeedableRng};
//! use sm_response::{generate, ResponseCodec, Strategy, WorkerId};
//!
//! let survey = sm_survey::build(vec![
//!     vec!["QUESTION", "OPTIONS"],
//!     vec!["q1", "yes"],
//!     vec!["", "no"],
//! ])
//! .unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let response = generate(&survey, Strategy::First, &mut rng, WorkerId::new("w1").unwrap());
//!
//! let codec = ResponseCodec::new();
//! let text = codec.output_headers(&survey) + &codec.output_response(&survey, &response).unwrap();
//! assert_eq!(text, "WORKERID,q1\nw1,yes\n");
//! assert_eq!(codec.read_responses(&survey, text.as_bytes()).unwrap(), vec![response]);
//! ```

#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod generator;
pub mod response;
pub mod strategy;

// Re-exports
pub use codec::{ResponseCodec, CORRELATION_FIELD, CORRELATION_SEPARATOR, WORKER_FIELD};
pub use error::{DecodingError, EncodingError, InvalidWorkerId};
pub use generator::{generate, ResponseGenerator};
pub use response::{SurveyResponse, WorkerId};
pub use strategy::{Strategy, UnknownStrategy};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with responses
    pub use crate::{
        generate, DecodingError, EncodingError, ResponseCodec, ResponseGenerator, Strategy,
        SurveyResponse, WorkerId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
