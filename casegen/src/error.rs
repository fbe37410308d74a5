//! Error types for constraint handling, generation and suite emission.

use std::fmt;
use std::path::PathBuf;

use crate::config::ConfigError;

/// Result alias used throughout the crate
pub type GenResult<T> = Result<T, GenError>;

/// Every failure the generator engine, the parser and the emitter can report.
///
/// All errors are synchronous and final: a failing call produces no partial value, and the
/// caller decides whether to abort the run or skip the offending case.
#[derive(Debug, Clone, PartialEq)]
pub enum GenError {
    /// A constraint was built or updated with the wrong number of arguments
    InvalidArguments {
        constraint: &'static str,
        expected: &'static str,
        found: usize,
    },

    /// A bounded constraint whose lower bound is larger than its upper bound
    EmptyRange { bounds: String },

    /// The choices of a bounded constraint were requested but its bounds are not integers
    NotEnumerable { bounds: String },

    /// A generator-backed constraint was sampled before `initialize`
    NotInitialized,

    /// The size parameter of a generator is not an integer or a bounded constraint
    InvalidSize { message: String },

    /// A strategy tag that the generator does not know
    UnknownType {
        requested: String,
        choices: Vec<String>,
    },

    /// A mandatory generator parameter was not supplied
    MissingParameter {
        name: &'static str,
        context: String,
    },

    /// A named constraint exists but is of a different variant than required
    WrongVariant {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The requested configuration cannot be satisfied
    Infeasible { message: String },

    /// The parser was asked to narrow a constraint that has no bounds
    NotNarrowable { field: String },

    /// A narrowed bound escapes the enclosing scope; `value` is the evaluated bound, or the
    /// expression itself when it does not fit in 64 bits
    OutOfScope { value: String, field: String },

    /// Narrowing left `min > max`
    InvertedBounds { field: String },

    /// The override expression does not follow the `LOW~HIGH` grammar or does not evaluate
    MalformedOverride {
        field: String,
        expression: String,
        message: String,
    },

    /// A constraint name that the case definition never declared
    UnknownConstraint { field: String },

    /// Invalid suite or generator configuration
    Config(ConfigError),

    /// The declarative specification document could not be read
    Spec { message: String },

    /// Writing case files failed
    Io {
        path: Option<PathBuf>,
        message: String,
    },

    /// The reference solution exited unsuccessfully
    SolutionFailed { command: String, status: String },
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenError::InvalidArguments {
                constraint,
                expected,
                found,
            } => write!(
                f,
                "{} takes {} (got {})",
                constraint, expected, found
            ),
            GenError::EmptyRange { bounds } => write!(
                f,
                "BoundedConstraint {} is empty: the lower bound is larger than the upper bound",
                bounds
            ),
            GenError::NotEnumerable { bounds } => write!(
                f,
                "Cannot determine the possible choices or the number of choices of {}: bounds are not integers",
                bounds
            ),
            GenError::NotInitialized => write!(
                f,
                "initialize() must be called first to initialize the generator."
            ),
            GenError::InvalidSize { message } => {
                write!(f, "N must be an integer or a BoundedConstraint: {}", message)
            }
            GenError::UnknownType { requested, choices } => write!(
                f,
                "Unknown type {}. Choices: {}",
                requested,
                choices.join(", ")
            ),
            GenError::MissingParameter { name, context } => {
                write!(f, "{} must be specified ({})", name, context)
            }
            GenError::WrongVariant {
                field,
                expected,
                found,
            } => write!(
                f,
                "Constraint {} is a {} constraint, expected a {} constraint",
                field, found, expected
            ),
            GenError::Infeasible { message } => write!(f, "Impossible to generate: {}", message),
            GenError::NotNarrowable { field } => write!(
                f,
                "The parser does not support modifying constraint {} as it is not a BoundedConstraint",
                field
            ),
            GenError::OutOfScope { value, field } => write!(
                f,
                "{} for constraint {} is not in the global or batch constraints",
                value, field
            ),
            GenError::InvertedBounds { field } => write!(
                f,
                "Lowerbound is larger than upperbound for constraint {}",
                field
            ),
            GenError::MalformedOverride {
                field,
                expression,
                message,
            } => write!(
                f,
                "Invalid override `{}` for constraint {}: {}",
                expression, field, message
            ),
            GenError::UnknownConstraint { field } => write!(f, "Unknown constraint {}", field),
            GenError::Config(err) => write!(f, "Configuration error: {}", err),
            GenError::Spec { message } => write!(f, "Invalid specification: {}", message),
            GenError::Io { path, message } => {
                write!(f, "I/O error: {}", message)?;
                if let Some(path) = path {
                    write!(f, " (path: {})", path.display())?;
                }
                Ok(())
            }
            GenError::SolutionFailed { command, status } => {
                write!(f, "Reference solution `{}` failed: {}", command, status)
            }
        }
    }
}

impl std::error::Error for GenError {}

impl GenError {
    /// Create an infeasibility error
    pub fn infeasible(message: impl Into<String>) -> Self {
        Self::Infeasible {
            message: message.into(),
        }
    }

    /// Create an unknown-strategy error listing the valid tags
    pub fn unknown_type<T: fmt::Display>(requested: impl Into<String>, choices: &[T]) -> Self {
        Self::UnknownType {
            requested: requested.into(),
            choices: choices.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Create a size error
    pub fn invalid_size(message: impl Into<String>) -> Self {
        Self::InvalidSize {
            message: message.into(),
        }
    }

    /// Create a grammar error for an override expression
    pub fn malformed_override(
        field: impl Into<String>,
        expression: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::MalformedOverride {
            field: field.into(),
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error bound to the path that failed
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: Some(path.into()),
            message: err.to_string(),
        }
    }

    /// True for the errors the parser raises while narrowing a scope
    pub fn is_scope_error(&self) -> bool {
        matches!(
            self,
            GenError::NotNarrowable { .. }
                | GenError::OutOfScope { .. }
                | GenError::InvertedBounds { .. }
                | GenError::MalformedOverride { .. }
                | GenError::UnknownConstraint { .. }
        )
    }
}

impl From<ConfigError> for GenError {
    fn from(err: ConfigError) -> Self {
        GenError::Config(err)
    }
}

impl From<std::io::Error> for GenError {
    fn from(err: std::io::Error) -> Self {
        GenError::Io {
            path: None,
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for GenError {
    fn from(err: serde_yaml::Error) -> Self {
        GenError::Spec {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_error_display() {
        let error = GenError::InvalidArguments {
            constraint: "BoundedConstraint",
            expected: "exactly 2 arguments",
            found: 3,
        };
        assert_eq!(
            error.to_string(),
            "BoundedConstraint takes exactly 2 arguments (got 3)"
        );
    }

    #[test]
    fn test_unknown_type_lists_choices() {
        let error = GenError::unknown_type("aa", &["standard", "sorted"]);
        assert_eq!(error.to_string(), "Unknown type aa. Choices: standard, sorted");
    }

    #[test]
    fn test_scope_errors_name_the_field() {
        let error = GenError::OutOfScope {
            value: "101".to_string(),
            field: "N".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "101 for constraint N is not in the global or batch constraints"
        );
        assert!(error.is_scope_error());

        let error = GenError::InvertedBounds {
            field: "M".to_string(),
        };
        assert!(error.to_string().contains("Lowerbound is larger than upperbound"));
        assert!(error.to_string().ends_with("constraint M"));
        assert!(!GenError::NotInitialized.is_scope_error());
    }

    #[test]
    fn test_io_error_carries_path() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = GenError::io("cases/batch1/0.in", err);
        let rendered = error.to_string();
        assert!(rendered.contains("missing"));
        assert!(rendered.contains("cases/batch1/0.in"));
    }

    #[test]
    fn test_config_error_conversion() {
        let error: GenError = ConfigError::EmptyBatchPrefix.into();
        assert!(matches!(error, GenError::Config(ConfigError::EmptyBatchPrefix)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_err = serde_yaml::from_str::<Vec<i32>>("not: [yaml").unwrap_err();
        let error: GenError = yaml_err.into();
        assert!(matches!(error, GenError::Spec { .. }));
    }
}
