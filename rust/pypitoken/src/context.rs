use std::fmt;

use crate::{IntoTimestamp, ValidationError, timestamp};

/// A value a restriction may need from the [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextField {
    /// Normalized name of the project being uploaded to.
    ProjectName,
    /// Id of the project being uploaded to.
    ProjectId,
    /// Id of the user presenting the token.
    UserId,
    /// Time of the check.
    Now,
}

impl ContextField {
    /// Parameter name as callers know it.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextField::ProjectName => "project_name",
            ContextField::ProjectId => "project_id",
            ContextField::UserId => "user_id",
            ContextField::Now => "now",
        }
    }
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the bearer is trying to do with a token.
///
/// Restrictions are checked against a context. Every value is optional
/// except the time, which defaults to the moment the context is built. A
/// restriction that needs a value the context does not carry fails with
/// [`ValidationError::MissingContext`].
///
/// ```rust
/// use pypitoken::Context;
///
/// let context = Context::new()
///     .with_project_name("requests")
///     .with_now(1_700_000_000);
///
/// assert_eq!(context.project_name(), Some("requests"));
/// assert_eq!(context.user_id(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    project_name: Option<String>,
    project_id: Option<String>,
    user_id: Option<String>,
    now: i64,
}

impl Context {
    /// An empty context stamped with the current time.
    pub fn new() -> Self {
        Self {
            project_name: None,
            project_id: None,
            user_id: None,
            now: timestamp::now(),
        }
    }

    /// Normalized name of the project the token is used for.
    pub fn with_project_name(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = Some(project_name.into());
        self
    }

    /// Id of the project the token is used for.
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Id of the user presenting the token.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Check time-based restrictions against `now` instead of the clock.
    pub fn with_now(mut self, now: impl IntoTimestamp) -> Self {
        self.now = now.into_timestamp();
        self
    }

    /// See [`Context::with_project_name`].
    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    /// See [`Context::with_project_id`].
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// See [`Context::with_user_id`].
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Time of the check, in Unix seconds.
    pub fn now(&self) -> i64 {
        self.now
    }

    /// Whether `field` carries a value.
    pub fn has(&self, field: ContextField) -> bool {
        match field {
            ContextField::ProjectName => self.project_name.is_some(),
            ContextField::ProjectId => self.project_id.is_some(),
            ContextField::UserId => self.user_id.is_some(),
            ContextField::Now => true,
        }
    }

    pub(crate) fn require(&self, field: ContextField) -> Result<(), ValidationError> {
        if self.has(field) {
            Ok(())
        } else {
            Err(ValidationError::MissingContext { field })
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
