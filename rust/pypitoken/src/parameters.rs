use crate::IntoTimestamp;

/// What [`Token::restrict`](crate::Token::restrict) should attach.
///
/// Each field feeds exactly one restriction kind; unset fields attach
/// nothing. Window bounds must be given in pairs.
///
/// ```rust
/// use pypitoken::RestrictionParameters;
///
/// let parameters = RestrictionParameters::new()
///     .window(1_700_000_000, 1_700_003_600)
///     .project_names(["requests", "urllib3"]);
/// # let _ = parameters;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestrictionParameters {
    pub(crate) not_before: Option<i64>,
    pub(crate) not_after: Option<i64>,
    pub(crate) project_names: Option<Vec<String>>,
    pub(crate) project_ids: Option<Vec<String>>,
    pub(crate) user_id: Option<String>,
    pub(crate) legacy_not_before: Option<i64>,
    pub(crate) legacy_not_after: Option<i64>,
    pub(crate) legacy_project_names: Option<Vec<String>>,
    pub(crate) legacy_noop: bool,
}

impl RestrictionParameters {
    /// Parameters that attach nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// The token is not valid before this moment.
    pub fn not_before(mut self, moment: impl IntoTimestamp) -> Self {
        self.not_before = Some(moment.into_timestamp());
        self
    }

    /// The token is not valid from this moment on.
    pub fn not_after(mut self, moment: impl IntoTimestamp) -> Self {
        self.not_after = Some(moment.into_timestamp());
        self
    }

    /// Shorthand for [`not_before`](Self::not_before) and
    /// [`not_after`](Self::not_after).
    pub fn window(self, not_before: impl IntoTimestamp, not_after: impl IntoTimestamp) -> Self {
        self.not_before(not_before).not_after(not_after)
    }

    /// Only these normalized project names.
    pub fn project_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.project_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Only these project ids.
    pub fn project_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.project_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Only this user.
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Lower bound of the legacy `{"nbf", "exp"}` window.
    pub fn legacy_not_before(mut self, moment: impl IntoTimestamp) -> Self {
        self.legacy_not_before = Some(moment.into_timestamp());
        self
    }

    /// Upper bound of the legacy window.
    pub fn legacy_not_after(mut self, moment: impl IntoTimestamp) -> Self {
        self.legacy_not_after = Some(moment.into_timestamp());
        self
    }

    /// Shorthand for both legacy bounds.
    pub fn legacy_window(
        self,
        not_before: impl IntoTimestamp,
        not_after: impl IntoTimestamp,
    ) -> Self {
        self.legacy_not_before(not_before)
            .legacy_not_after(not_after)
    }

    /// Project names in the legacy object format. Not pattern checked.
    pub fn legacy_project_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.legacy_project_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Attach the legacy caveat that restricts nothing.
    pub fn legacy_noop(mut self, enabled: bool) -> Self {
        self.legacy_noop = enabled;
        self
    }

    /// Whether no restriction would be attached.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
