//! Error types shared by every docspace subsystem
//!
//! All failures collapse into a single [`StoreError`] tagged with an
//! [`ErrorKind`]. Error codes:
//! - DOCSPACE_SCHEMA_VALIDATION
//! - DOCSPACE_DUPLICATE_PROPERTY
//! - DOCSPACE_TYPE_ALREADY_REGISTERED
//! - DOCSPACE_TYPE_NOT_FOUND (not found class)
//! - DOCSPACE_UNSUPPORTED_PRIMITIVE_TYPE
//! - DOCSPACE_COERCION_FAILURE
//! - DOCSPACE_RECORD_NOT_FOUND (not found class)
//! - DOCSPACE_NESTING_TOO_DEEP
//! - DOCSPACE_INVALID_REQUEST
//! - DOCSPACE_COLLABORATOR

use std::fmt;

use thiserror::Error;

/// Error kinds as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or illegal schema description field
    SchemaValidation,
    /// Fixed property name repeated within one schema description
    DuplicateProperty,
    /// Type name already present in the registry
    TypeAlreadyRegistered,
    /// Operation against an unregistered type
    TypeNotFound,
    /// Target type is not a primitive (it must be treated as a nested type)
    UnsupportedPrimitiveType,
    /// Value text cannot be converted to the declared primitive
    CoercionFailure,
    /// Id or query matched nothing where a result is required
    RecordNotFound,
    /// Nested documents exceed the configured depth bound
    NestingTooDeep,
    /// Missing argument or malformed payload at the boundary
    InvalidRequest,
    /// Failure raised by the storage collaborator
    Collaborator,
}

impl ErrorKind {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::SchemaValidation => "DOCSPACE_SCHEMA_VALIDATION",
            ErrorKind::DuplicateProperty => "DOCSPACE_DUPLICATE_PROPERTY",
            ErrorKind::TypeAlreadyRegistered => "DOCSPACE_TYPE_ALREADY_REGISTERED",
            ErrorKind::TypeNotFound => "DOCSPACE_TYPE_NOT_FOUND",
            ErrorKind::UnsupportedPrimitiveType => "DOCSPACE_UNSUPPORTED_PRIMITIVE_TYPE",
            ErrorKind::CoercionFailure => "DOCSPACE_COERCION_FAILURE",
            ErrorKind::RecordNotFound => "DOCSPACE_RECORD_NOT_FOUND",
            ErrorKind::NestingTooDeep => "DOCSPACE_NESTING_TOO_DEEP",
            ErrorKind::InvalidRequest => "DOCSPACE_INVALID_REQUEST",
            ErrorKind::Collaborator => "DOCSPACE_COLLABORATOR",
        }
    }

    /// Whether this kind maps to a "not found" class response
    pub fn is_not_found(&self) -> bool {
        matches!(self, ErrorKind::TypeNotFound | ErrorKind::RecordNotFound)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error with kind and context
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct StoreError {
    kind: ErrorKind,
    message: String,
    type_name: Option<String>,
    class: Option<String>,
}

impl StoreError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            type_name: None,
            class: None,
        }
    }

    fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Create a schema validation error
    pub fn schema_validation(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::SchemaValidation, reason)
    }

    /// Create a duplicate fixed property error
    pub fn duplicate_property(property: impl Into<String>) -> Self {
        let property = property.into();
        Self::new(
            ErrorKind::DuplicateProperty,
            format!("Fixed property '{}' is declared more than once", property),
        )
    }

    /// Create a type already registered error
    pub fn type_already_registered(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self::new(
            ErrorKind::TypeAlreadyRegistered,
            format!("Type: {} is already introduced", type_name),
        )
        .with_type(type_name)
    }

    /// Create a type not found error
    pub fn type_not_found(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self::new(
            ErrorKind::TypeNotFound,
            format!("Type: {} is not registered", type_name),
        )
        .with_type(type_name)
    }

    /// Create an unsupported primitive type error
    pub fn unsupported_primitive(type_name: impl Into<String>, property: &str) -> Self {
        let type_name = type_name.into();
        Self::new(
            ErrorKind::UnsupportedPrimitiveType,
            format!(
                "Property '{}' is declared with non-primitive type '{}'",
                property, type_name
            ),
        )
        .with_type(type_name)
    }

    /// Create a coercion failure error
    pub fn coercion_failure(property: &str, reason: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::CoercionFailure,
            format!("Cannot convert property '{}': {}", property, reason.into()),
        )
    }

    /// Create a record not found error
    pub fn record_not_found(type_name: impl Into<String>, what: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self::new(
            ErrorKind::RecordNotFound,
            format!("No {} entry matches {}", type_name, what.into()),
        )
        .with_type(type_name)
    }

    /// Create a nesting too deep error
    pub fn nesting_too_deep(type_name: impl Into<String>, max_depth: usize) -> Self {
        let type_name = type_name.into();
        Self::new(
            ErrorKind::NestingTooDeep,
            format!(
                "Nested document of type '{}' exceeds the maximum depth of {}",
                type_name, max_depth
            ),
        )
        .with_type(type_name)
    }

    /// Create an invalid request error
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, reason)
    }

    /// Create a storage collaborator error
    pub fn collaborator(class: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new(ErrorKind::Collaborator, message);
        err.class = Some(class.into());
        err
    }

    /// Returns the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the type name if applicable
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Returns the collaborator error class, set only for collaborator errors
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// Whether this error maps to a "not found" class response
    pub fn is_not_found(&self) -> bool {
        self.kind.is_not_found()
    }
}

/// Result type for docspace operations
pub type StoreResult<T> = Result<T, StoreError>;
