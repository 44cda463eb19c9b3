use std::fmt;

use axum::http::StatusCode;

use super::domain::ResourceKind;
use super::entitlement::Allowance;
use super::repository::RepositoryError;

/// Error raised by marketplace commands and queries.
///
/// Every variant is recoverable and user-facing; a failed command never leaves a partial
/// write behind.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
    #[error("cannot {action} {entity} in state '{from}'")]
    IllegalTransition {
        entity: &'static str,
        from: &'static str,
        action: &'static str,
    },
    #[error("limit reached: plan allows {cap} {resource}")]
    EntitlementExceeded {
        resource: ResourceKind,
        cap: Allowance,
    },
    #[error("not permitted: {0}")]
    Forbidden(String),
    #[error("{0}")]
    AlreadyExists(String),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl MarketError {
    pub(crate) fn not_found(kind: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn illegal(entity: &'static str, from: &'static str, action: &'static str) -> Self {
        Self::IllegalTransition {
            entity,
            from,
            action,
        }
    }

    /// Stable machine-readable tag for API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::IllegalTransition { .. } => "illegal_transition",
            Self::EntitlementExceeded { .. } => "entitlement_exceeded",
            Self::Forbidden(_) => "forbidden",
            Self::AlreadyExists(_) => "already_exists",
            Self::Validation(_) => "validation",
            Self::Repository(RepositoryError::Conflict) => "write_conflict",
            Self::Repository(_) => "repository_unavailable",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::IllegalTransition { .. } | Self::AlreadyExists(_) => StatusCode::CONFLICT,
            Self::EntitlementExceeded { .. } | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            Self::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
