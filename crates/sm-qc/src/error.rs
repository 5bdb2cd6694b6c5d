//! Error types for quality control

use sm_response::EncodingError;
use sm_survey::SurveyId;

/// Malformed completion or engine configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// A recognized key holds a value that does not parse
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// Significance threshold outside (0, 1)
    #[error("alpha must lie strictly between 0 and 1, got {value}")]
    InvalidAlpha { value: f64 },

    /// Configuration file does not parse
    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Failure assessing a submission
#[derive(Debug, thiserror::Error)]
pub enum AssessError {
    /// Response does not answer exactly the survey's questions
    #[error("invalid response: {0}")]
    InvalidResponse(#[from] EncodingError),

    /// No engine is open for the survey
    #[error("no quality control open for survey {survey}")]
    UnknownSurvey { survey: SurveyId },

    /// Quality control for the survey has been closed
    #[error("quality control closed for survey {survey}")]
    Closed { survey: SurveyId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_key() {
        let err = ConfigurationError::InvalidValue {
            key: "target-sample-size".into(),
            value: "-1".into(),
            reason: "invalid digit found in string".into(),
        };
        assert!(err.to_string().contains("target-sample-size"));
        assert!(ConfigurationError::InvalidAlpha { value: 1.5 }
            .to_string()
            .contains("1.5"));
    }
}
