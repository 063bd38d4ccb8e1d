//! Error types for the persistence layer.
//!
//! This module defines all error types used throughout the persistence layer,
//! following a hierarchy that separates entity state errors, validation errors
//! raised while building criteria or checking writes, and backend errors.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all storage operations.
///
/// This enum encompasses all possible errors that can occur during persistence
/// operations, organized by category.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Entity state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Validation errors (criteria, pagination, write-path rules)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl StorageError {
    /// Returns true if this error reports a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Resource(ResourceError::NotFound { .. }))
    }
}

/// Errors related to entity state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The requested entity was not found.
    #[error("entity not found: {entity}/{id}")]
    NotFound { entity: String, id: i64 },
}

/// Errors raised while validating inbound requests.
///
/// Filter errors are raised while the criteria is being constructed, so a
/// malformed request never reaches the specification builder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The operator or value is not valid for the filter.
    #[error("invalid filter '{field}.{operator}': {message}")]
    InvalidFilter {
        field: String,
        operator: String,
        message: String,
    },

    /// The criteria has no slot with this name.
    #[error("unknown criteria field '{field}' for {entity} (expected one of: {expected})")]
    UnknownField {
        entity: String,
        field: String,
        expected: String,
    },

    /// A criteria parameter is not of the form `field.operator=value`.
    #[error("malformed criteria parameter '{parameter}'")]
    MalformedParameter { parameter: String },

    /// The page request is out of range.
    #[error("invalid pagination: {message}")]
    InvalidPagination { message: String },

    /// The sort property is not a field of the entity.
    #[error("invalid sort property '{property}' for {entity}")]
    InvalidSortProperty { entity: String, property: String },

    /// A new entity must not carry an identifier.
    #[error("a new {entity} cannot already have an id")]
    IdExists { entity: String },

    /// An updated entity must carry an identifier.
    #[error("invalid id: {entity} to update has no id")]
    IdNull { entity: String },

    /// The store rejected the write because of a constraint.
    #[error("constraint violation on {entity}: {message}")]
    ConstraintViolation { entity: String, message: String },

    /// A configuration value is out of range.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// No pooled connection became available within the timeout.
    #[error("connection pool exhausted for {backend_name}: {message}")]
    PoolExhausted {
        backend_name: String,
        message: String,
    },

    /// Schema migration error.
    #[error("schema migration failed: {message}")]
    MigrationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Query execution error.
    #[error("query execution failed: {message}")]
    QueryError { message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// Implement conversions from common error types

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
        })
    }
}
