//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every condition the engine can reject. Business-rule variants carry the
//! human-readable reason verbatim, so `to_string()` is what a caller sees.

use thiserror::Error;

/// The main error type for the payroll engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::bad_request("Start date must be before end date");
/// assert_eq!(error.to_string(), "Start date must be before end date");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A referenced entity does not exist.
    #[error("{message}")]
    NotFound {
        /// The reason shown to the caller.
        message: String,
    },

    /// The request violates a business rule.
    #[error("{message}")]
    BadRequest {
        /// The reason shown to the caller.
        message: String,
    },

    /// The request collides with existing state (overlap, duplicate key).
    #[error("{message}")]
    Conflict {
        /// The reason shown to the caller.
        message: String,
    },

    /// The entity exists but its lifecycle state forbids the change.
    #[error("{message}")]
    Forbidden {
        /// The reason shown to the caller.
        message: String,
    },

    /// No acting user identity was supplied.
    #[error("{message}")]
    Unauthorized {
        /// The reason shown to the caller.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A payroll calculation could not be carried out.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },

    /// The record store failed to complete a unit of work.
    #[error("Store error: {message}")]
    StoreError {
        /// A description of the store failure.
        message: String,
    },
}

impl EngineError {
    /// Creates a [`EngineError::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a [`EngineError::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a [`EngineError::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a [`EngineError::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a [`EngineError::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a [`EngineError::CalculationError`].
    pub fn calculation(message: impl Into<String>) -> Self {
        Self::CalculationError {
            message: message.into(),
        }
    }

    /// Creates a [`EngineError::StoreError`].
    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreError {
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_errors_display_reason_verbatim() {
        assert_eq!(
            EngineError::bad_request("Cannot submit attendance on weekends").to_string(),
            "Cannot submit attendance on weekends"
        );
        assert_eq!(
            EngineError::not_found("Attendance period not found").to_string(),
            "Attendance period not found"
        );
        assert_eq!(
            EngineError::conflict("Period overlaps with existing active period").to_string(),
            "Period overlaps with existing active period"
        );
        assert_eq!(
            EngineError::forbidden("Cannot update overtime that has been processed").to_string(),
            "Cannot update overtime that has been processed"
        );
    }

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/payroll.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/payroll.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_calculation_error_displays_message() {
        let error = EngineError::calculation("Attendance period has no working days");
        assert_eq!(
            error.to_string(),
            "Calculation error: Attendance period has no working days"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_not_found() -> EngineResult<()> {
            Err(EngineError::not_found("Employee not found"))
        }

        fn propagates_error() -> EngineResult<()> {
            returns_not_found()?;
            Ok(())
        }

        assert_eq!(
            propagates_error(),
            Err(EngineError::not_found("Employee not found"))
        );
    }
}
