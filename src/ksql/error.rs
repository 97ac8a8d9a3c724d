//! Error types for KSQL generation
//!
//! Every failure raised while translating an expression tree is reported as a
//! single [`KsqlError`]. Builder and statement-level failures wrap the original
//! error so that callers see the clause or statement that was being produced
//! alongside the rule that was violated.

/// Main error type for expression-to-KSQL translation
#[derive(Debug, thiserror::Error)]
pub enum KsqlError {
    /// A query-shaping operation was invoked outside a model creation scope
    #[error("'{operation}' can only be used while the model is being defined (inside a model creation scope)")]
    ScopeViolation { operation: String },

    /// Structurally illegal clause content
    #[error("{message}")]
    Validation { clause: String, message: String },

    /// Node shapes or operators the translator does not recognize
    #[error("{message}")]
    Unsupported {
        clause: String,
        construct: String,
        message: String,
    },

    /// Host type without a KSQL column mapping
    #[error("Type '{type_name}' is not supported.")]
    UnsupportedType { type_name: String },

    /// Failure raised inside a clause builder invocation
    #[error("{builder} builder failed during {operation}: {source}")]
    Builder {
        builder: String,
        operation: String,
        #[source]
        source: Box<KsqlError>,
    },

    /// Failure raised while generating a complete statement
    #[error("{operation} failed ({context}): {source}")]
    Generation {
        operation: String,
        context: String,
        #[source]
        source: Box<KsqlError>,
    },

    /// Query structure could not be rendered
    #[error("Query assembly failed: {message}")]
    Assembly { message: String },

    /// Generator or builder configuration problem
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl KsqlError {
    pub fn scope_violation(operation: impl Into<String>) -> Self {
        KsqlError::ScopeViolation {
            operation: operation.into(),
        }
    }

    pub fn validation(clause: impl Into<String>, message: impl Into<String>) -> Self {
        KsqlError::Validation {
            clause: clause.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(
        clause: impl Into<String>,
        construct: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        KsqlError::Unsupported {
            clause: clause.into(),
            construct: construct.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        KsqlError::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    pub fn builder(
        builder: impl Into<String>,
        operation: impl Into<String>,
        source: KsqlError,
    ) -> Self {
        KsqlError::Builder {
            builder: builder.into(),
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    pub fn generation(
        operation: impl Into<String>,
        context: impl Into<String>,
        source: KsqlError,
    ) -> Self {
        KsqlError::Generation {
            operation: operation.into(),
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn assembly(message: impl Into<String>) -> Self {
        KsqlError::Assembly {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        KsqlError::Config {
            message: message.into(),
        }
    }

    /// Unwrap builder and generation wrappers down to the failure that started it
    pub fn root_cause(&self) -> &KsqlError {
        match self {
            KsqlError::Builder { source, .. } | KsqlError::Generation { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.root_cause(), KsqlError::Validation { .. })
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(
            self.root_cause(),
            KsqlError::Unsupported { .. } | KsqlError::UnsupportedType { .. }
        )
    }
}

impl From<serde_yaml::Error> for KsqlError {
    fn from(err: serde_yaml::Error) -> Self {
        KsqlError::config(format!("Invalid YAML: {}", err))
    }
}

impl From<serde_json::Error> for KsqlError {
    fn from(err: serde_json::Error) -> Self {
        KsqlError::assembly(format!("Invalid context metadata: {}", err))
    }
}

impl From<std::io::Error> for KsqlError {
    fn from(err: std::io::Error) -> Self {
        KsqlError::config(format!("I/O error: {}", err))
    }
}

/// Result type for KSQL generation
pub type KsqlResult<T> = Result<T, KsqlError>;
