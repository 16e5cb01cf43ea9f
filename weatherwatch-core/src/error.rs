use chrono::NaiveDateTime;
use std::fmt;
use thiserror::Error;

/// Failures of the local-time / timezone conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid local time '{input}', expected YYYY-MM-DD HH:MM: {source}")]
    Parse {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("local time {local} does not exist in timezone '{tz}'")]
    NonexistentLocalTime { local: NaiveDateTime, tz: String },
}

/// Failures of a single provider fetch.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no location found matching '{query}'")]
    LocationNotFound { query: String },

    #[error("provider request failed with status {status} (code {code:?}): {message}")]
    Status {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("malformed provider response: missing mandatory field `{field}`")]
    MalformedResponse { field: &'static str },

    #[error("malformed provider response: invalid value '{value}' for `{field}`")]
    InvalidField { field: &'static str, value: String },

    #[error("failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("request to provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider reported an unusable timestamp: {0}")]
    Timestamp(#[from] ConvertError),
}

impl ProviderError {
    pub fn is_location_not_found(&self) -> bool {
        matches!(self, ProviderError::LocationNotFound { .. })
    }
}

/// One field that fell outside its permitted domain.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} (expected {})", self.field, self.value, self.expected)
    }
}

/// Every domain violation found on an observation, never just the first.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn fields(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.field).collect()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("observation failed validation: ")?;
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("observation database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Errors surfaced by [`crate::Pipeline::refresh_location`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no location found matching '{query}'")]
    LocationNotFound { query: String },

    #[error(transparent)]
    Provider(ProviderError),

    #[error(transparent)]
    Validation(ValidationError),

    #[error(transparent)]
    Storage(StoreError),

    #[error("storage task did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<ProviderError> for PipelineError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::LocationNotFound { query } => PipelineError::LocationNotFound { query },
            other => PipelineError::Provider(other),
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(v) => PipelineError::Validation(v),
            other => PipelineError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_violation() {
        let err = ValidationError {
            violations: vec![
                FieldViolation { field: "humidity_pct", value: "150".into(), expected: "0..=100" },
                FieldViolation { field: "uv_index", value: "14".into(), expected: "0..=11" },
            ],
        };

        let msg = err.to_string();
        assert!(msg.contains("humidity_pct = 150"));
        assert!(msg.contains("uv_index = 14"));
        assert_eq!(err.fields(), vec!["humidity_pct", "uv_index"]);
    }

    #[test]
    fn location_not_found_is_lifted_out_of_provider_errors() {
        let err: PipelineError =
            ProviderError::LocationNotFound { query: "atlantis".into() }.into();
        assert!(matches!(err, PipelineError::LocationNotFound { ref query } if query == "atlantis"));

        let err: PipelineError = ProviderError::MalformedResponse { field: "current.temp_c" }.into();
        assert!(matches!(err, PipelineError::Provider(ProviderError::MalformedResponse { .. })));
    }

    #[test]
    fn store_validation_is_lifted_out_of_storage_errors() {
        let err: PipelineError = StoreError::Validation(ValidationError { violations: vec![] }).into();
        assert!(matches!(err, PipelineError::Validation(_)));
    }
}
