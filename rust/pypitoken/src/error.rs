//! Error types for loading, restricting and validating tokens.
//!
//! Every failure surfaced by this crate is one of [`LoadError`],
//! [`InvalidRestriction`] or [`ValidationError`], and all three convert into
//! the root [`Error`]. Messages are plain English and safe to show to the
//! bearer of a token.

use pypitoken_macaroon::{MacaroonError, VerifyError};
use serde_json::Value;

use crate::{ContextField, RestrictionKind};

/// A token or one of its caveats could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The raw token has no `-` separating the prefix from the macaroon.
    #[error("Token is missing a prefix")]
    MissingPrefix,

    /// The macaroon part could not be deserialized.
    #[error("Deserialization error: {0}")]
    DeserializationFailed(#[source] MacaroonError),

    /// A caveat is not valid JSON.
    #[error("Error while loading caveat: {0}")]
    MalformedEncoding(#[source] serde_json::Error),

    /// No registered kind accepts the caveat.
    #[error("Could not find matching Restriction for {value}")]
    UnrecognizedRestriction {
        /// The parsed caveat.
        value: Value,
    },
}

/// Restriction parameters that cannot describe a valid caveat.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRestriction {
    /// Only one bound of a time window was given.
    #[error(
        "`{before}` and `{after}` parameters must be used together. \
         Either define both or neither. \
         Received {before}={} and {after}={}",
        display_bound(.not_before),
        display_bound(.not_after)
    )]
    IncompleteWindow {
        /// Name of the lower bound parameter.
        before: &'static str,
        /// Name of the upper bound parameter.
        after: &'static str,
        /// Lower bound as received.
        not_before: Option<i64>,
        /// Upper bound as received.
        not_after: Option<i64>,
    },

    /// The restriction would encode to a caveat its own schema rejects,
    /// e.g. a project name that is not normalized.
    #[error("Invalid {kind} restriction: {value} is not an accepted value")]
    Malformed {
        /// Kind of the rejected restriction.
        kind: RestrictionKind,
        /// Its encoded form.
        value: Value,
    },

    /// The caveat cannot be carried by the token's macaroon format.
    #[error("Restriction cannot be attached: {0}")]
    Unrepresentable(#[source] MacaroonError),
}

fn display_bound(bound: &Option<i64>) -> String {
    match bound {
        Some(timestamp) => timestamp.to_string(),
        None => "None".to_string(),
    }
}

/// The token must be rejected.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The check was invoked without a context value a restriction needs.
    /// This usually points at the caller rather than at the token, but the
    /// token is rejected all the same.
    #[error(
        "The restriction couldn't be checked because the context is missing required values: {field}"
    )]
    MissingContext {
        /// The absent field.
        field: ContextField,
    },

    /// The current time falls outside `[not_before, not_after)`.
    #[error(
        "This token can only be used between timestamps {not_before} (incl) and {not_after} (excl). Received: {now}"
    )]
    OutsideWindow {
        /// Inclusive lower bound.
        not_before: i64,
        /// Exclusive upper bound.
        not_after: i64,
        /// Time of the check.
        now: i64,
    },

    /// The requested project name is not allowed.
    #[error(
        "This token can only be used for project(s): {}. Received: {received}",
        .allowed.join(", ")
    )]
    ProjectNameNotAllowed {
        /// Names the token is restricted to.
        allowed: Vec<String>,
        /// Name from the context.
        received: String,
    },

    /// The requested project id is not allowed.
    #[error(
        "This token can only be used for project(s): {}. Received: {received}",
        .allowed.join(", ")
    )]
    ProjectIdNotAllowed {
        /// Ids the token is restricted to.
        allowed: Vec<String>,
        /// Id from the context.
        received: String,
    },

    /// The token belongs to another user.
    #[error("This token can only be used by user with id: {expected}. Received: {received}")]
    UserIdMismatch {
        /// User id the token is restricted to.
        expected: String,
        /// User id from the context.
        received: String,
    },

    /// A caveat could not be decoded.
    #[error(transparent)]
    Caveat(#[from] LoadError),

    /// The macaroon itself failed verification.
    #[error(transparent)]
    Macaroon(#[from] VerifyError),
}

/// Root error for everything this crate reports.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// See [`LoadError`].
    #[error(transparent)]
    Load(#[from] LoadError),

    /// See [`InvalidRestriction`].
    #[error(transparent)]
    InvalidRestriction(#[from] InvalidRestriction),

    /// See [`ValidationError`].
    #[error("Error while validating token: {0}")]
    Validation(#[from] ValidationError),

    /// The macaroon could not be minted with the requested options.
    #[error(transparent)]
    Macaroon(#[from] MacaroonError),
}
