// ABOUTME: Unified error type and error codes shared by every Matchbox component
// ABOUTME: Maps store, cache, and configuration failures onto one typed taxonomy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

//! # Unified Error Handling System
//!
//! Every fallible operation in the workspace returns [`AppResult`]. The
//! [`ErrorCode`] carried by an [`AppError`] is the contract with callers:
//! store failures keep their code when they cross the service boundary, so a
//! caller can match on `code` without parsing messages.

#[cfg(feature = "database-errors")]
mod database;

#[cfg(feature = "cache-errors")]
mod cache;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (3000-3999)
    /// Caller supplied an argument that can never be valid
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    /// A referenced entity exists but the relationship is not allowed
    /// (e.g. a sender who is not a participant of the chat)
    #[serde(rename = "INVALID_REFERENCE")]
    InvalidReference = 3001,

    // Resource Management (4000-4999)
    /// Chat, message, or participant does not exist
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,
    /// Duplicate canonical participant pair
    #[serde(rename = "RESOURCE_ALREADY_EXISTS")]
    ResourceAlreadyExists = 4001,

    // Backends (5000-5999)
    /// Relational or cache backend I/O failure
    #[serde(rename = "UNAVAILABLE")]
    Unavailable = 5000,
    /// Caller deadline expired before the operation completed
    #[serde(rename = "TIMEOUT")]
    Timeout = 5001,

    // Configuration (6000-6999)
    /// Configuration could not be loaded or is invalid
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,

    // Internal Errors (9000-9999)
    /// Unexpected internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    /// Data serialization/deserialization failed
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9003,
}

impl ErrorCode {
    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::InvalidReference => "The referenced entity is not valid in this context",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ResourceAlreadyExists => "A resource with this identifier already exists",
            Self::Unavailable => "A storage backend is currently unavailable",
            Self::Timeout => "The operation did not complete before its deadline",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal error occurred",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }

    /// Whether retrying the same call later could succeed
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Unavailable | Self::Timeout)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::InvalidReference => "INVALID_REFERENCE",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::ResourceAlreadyExists => "RESOURCE_ALREADY_EXISTS",
            Self::Unavailable => "UNAVAILABLE",
            Self::Timeout => "TIMEOUT",
            Self::ConfigError => "CONFIG_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
            Self::SerializationError => "SERIALIZATION_ERROR",
        };
        f.write_str(name)
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Resource already exists
    pub fn already_exists(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceAlreadyExists,
            format!("{} already exists", resource.into()),
        )
    }

    /// Invalid reference between existing entities
    pub fn invalid_reference(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidReference, message)
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Relational backend failure
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::Unavailable,
            format!("database: {}", message.into()),
        )
    }

    /// Cache backend failure
    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unavailable, format!("cache: {}", message.into()))
    }

    /// Deadline expired while running `operation`
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::Timeout,
            format!("{} exceeded its deadline", operation.into()),
        )
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string()).with_source(error)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_codes() {
        assert_eq!(AppError::not_found("Chat 7").code, ErrorCode::ResourceNotFound);
        assert_eq!(
            AppError::already_exists("Chat").code,
            ErrorCode::ResourceAlreadyExists
        );
        assert_eq!(
            AppError::invalid_reference("sender").code,
            ErrorCode::InvalidReference
        );
        assert_eq!(AppError::database("boom").code, ErrorCode::Unavailable);
        assert_eq!(AppError::cache("boom").code, ErrorCode::Unavailable);
        assert_eq!(AppError::timeout("send").code, ErrorCode::Timeout);
    }

    #[test]
    fn test_display_includes_description_and_message() {
        let error = AppError::not_found("Chat 7");
        let rendered = error.to_string();
        assert!(rendered.contains("was not found"));
        assert!(rendered.contains("Chat 7 not found"));
    }

    #[test]
    fn test_transient_codes() {
        assert!(ErrorCode::Unavailable.is_transient());
        assert!(ErrorCode::Timeout.is_transient());
        assert!(!ErrorCode::ResourceNotFound.is_transient());
        assert!(!ErrorCode::InvalidReference.is_transient());
    }

    #[test]
    fn test_json_error_maps_to_serialization() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let error: AppError = parse.unwrap_err().into();
        assert_eq!(error.code, ErrorCode::SerializationError);
        assert!(std::error::Error::source(&error).is_some());
    }
}
