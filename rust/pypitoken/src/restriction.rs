//! Restrictions: the typed form of a token's caveats.
//!
//! A caveat is a JSON document. Two wire families coexist:
//!
//! - the compact form, a tagged array such as `[1, ["requests"]]`, where the
//!   leading integer names the kind (`0` date, `1` project names, `2` project
//!   ids, `3` user id);
//! - the legacy form, an object such as
//!   `{"version":1,"permissions":{"projects":["requests"]}}`.
//!
//! Every kind owns a strict JSON schema. Decoding tries the kinds of
//! [`RestrictionKind::ALL`] in order and returns the first whose schema
//! accepts the caveat. The list is closed: a caveat matching no entry is
//! rejected, never interpreted loosely.

use std::fmt;

use jsonschema::JSONSchema;
use serde_json::Value;
use tracing::trace;

use crate::{
    Context, ContextField, InvalidRestriction, LoadError, RestrictionParameters, ValidationError,
};

mod schema;

mod date;
pub use date::*;

mod project;
pub use project::*;

mod user;
pub use user::*;

mod legacy;
pub use legacy::*;

/// Behaviour shared by every restriction kind.
///
/// Implementors describe their wire shape and predicate; loading and the
/// context precondition are provided.
pub trait Caveat: Sized + Into<Restriction> {
    /// Registry entry of this kind.
    const KIND: RestrictionKind;

    /// Context values the predicate reads.
    const NEEDS: &'static [ContextField];

    /// Compiled wire schema.
    fn schema() -> &'static JSONSchema;

    /// Build from a value the schema has already accepted.
    fn extract(value: Value) -> Result<Self, serde_json::Error>;

    /// Wire form.
    fn dump(&self) -> Value;

    /// The kind's predicate. Called once [`Caveat::NEEDS`] are known to be
    /// present.
    fn verify(&self, context: &Context) -> Result<(), ValidationError>;

    /// Build from [`Token::restrict`](crate::Token::restrict) parameters, or
    /// `None` when none of this kind's parameters are set.
    fn from_parameters(
        parameters: &RestrictionParameters,
    ) -> Result<Option<Self>, InvalidRestriction>;

    /// Decode `value`, or `None` when it does not have this kind's wire
    /// shape.
    fn load(value: &Value) -> Option<Self> {
        if !Self::schema().is_valid(value) {
            return None;
        }
        Self::extract(value.clone()).ok()
    }

    /// Check the restriction against `context`.
    fn check(&self, context: &Context) -> Result<(), ValidationError> {
        for field in Self::NEEDS {
            context.require(*field)?;
        }
        self.verify(context)
    }
}

/// The registry of restriction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestrictionKind {
    /// See [`DateRestriction`].
    Date,
    /// See [`ProjectNamesRestriction`].
    ProjectNames,
    /// See [`ProjectIdsRestriction`].
    ProjectIds,
    /// See [`UserIdRestriction`].
    UserId,
    /// See [`LegacyNoopRestriction`].
    LegacyNoop,
    /// See [`LegacyProjectNamesRestriction`].
    LegacyProjectNames,
    /// See [`LegacyDateRestriction`].
    LegacyDate,
}

impl RestrictionKind {
    /// Every recognized kind, in decoding order. Parameters are also turned
    /// into caveats in this order.
    pub const ALL: [RestrictionKind; 7] = [
        RestrictionKind::Date,
        RestrictionKind::ProjectNames,
        RestrictionKind::ProjectIds,
        RestrictionKind::UserId,
        RestrictionKind::LegacyNoop,
        RestrictionKind::LegacyProjectNames,
        RestrictionKind::LegacyDate,
    ];

    /// Display name, e.g. `ProjectIDs`.
    pub fn name(&self) -> &'static str {
        match self {
            RestrictionKind::Date => "Date",
            RestrictionKind::ProjectNames => "ProjectNames",
            RestrictionKind::ProjectIds => "ProjectIDs",
            RestrictionKind::UserId => "UserID",
            RestrictionKind::LegacyNoop => "LegacyNoop",
            RestrictionKind::LegacyProjectNames => "LegacyProjectNames",
            RestrictionKind::LegacyDate => "LegacyDate",
        }
    }

    /// Leading integer of the compact form, `None` for legacy kinds.
    pub fn tag(&self) -> Option<u64> {
        match self {
            RestrictionKind::Date => Some(DateRestriction::TAG),
            RestrictionKind::ProjectNames => Some(ProjectNamesRestriction::TAG),
            RestrictionKind::ProjectIds => Some(ProjectIdsRestriction::TAG),
            RestrictionKind::UserId => Some(UserIdRestriction::TAG),
            RestrictionKind::LegacyNoop
            | RestrictionKind::LegacyProjectNames
            | RestrictionKind::LegacyDate => None,
        }
    }

    /// Context values a restriction of this kind needs.
    pub fn needs(&self) -> &'static [ContextField] {
        match self {
            RestrictionKind::Date => DateRestriction::NEEDS,
            RestrictionKind::ProjectNames => ProjectNamesRestriction::NEEDS,
            RestrictionKind::ProjectIds => ProjectIdsRestriction::NEEDS,
            RestrictionKind::UserId => UserIdRestriction::NEEDS,
            RestrictionKind::LegacyNoop => LegacyNoopRestriction::NEEDS,
            RestrictionKind::LegacyProjectNames => LegacyProjectNamesRestriction::NEEDS,
            RestrictionKind::LegacyDate => LegacyDateRestriction::NEEDS,
        }
    }

    /// Compiled wire schema of this kind.
    pub fn schema(&self) -> &'static JSONSchema {
        match self {
            RestrictionKind::Date => DateRestriction::schema(),
            RestrictionKind::ProjectNames => ProjectNamesRestriction::schema(),
            RestrictionKind::ProjectIds => ProjectIdsRestriction::schema(),
            RestrictionKind::UserId => UserIdRestriction::schema(),
            RestrictionKind::LegacyNoop => LegacyNoopRestriction::schema(),
            RestrictionKind::LegacyProjectNames => LegacyProjectNamesRestriction::schema(),
            RestrictionKind::LegacyDate => LegacyDateRestriction::schema(),
        }
    }

    /// Whether `value` has this kind's wire shape.
    pub fn accepts(&self, value: &Value) -> bool {
        self.schema().is_valid(value)
    }

    /// Decode `value` as this kind, or `None` when the kind does not accept
    /// it.
    pub fn load(&self, value: &Value) -> Option<Restriction> {
        match self {
            RestrictionKind::Date => DateRestriction::load(value).map(Into::into),
            RestrictionKind::ProjectNames => ProjectNamesRestriction::load(value).map(Into::into),
            RestrictionKind::ProjectIds => ProjectIdsRestriction::load(value).map(Into::into),
            RestrictionKind::UserId => UserIdRestriction::load(value).map(Into::into),
            RestrictionKind::LegacyNoop => LegacyNoopRestriction::load(value).map(Into::into),
            RestrictionKind::LegacyProjectNames => {
                LegacyProjectNamesRestriction::load(value).map(Into::into)
            }
            RestrictionKind::LegacyDate => LegacyDateRestriction::load(value).map(Into::into),
        }
    }

    fn from_parameters(
        &self,
        parameters: &RestrictionParameters,
    ) -> Result<Option<Restriction>, InvalidRestriction> {
        match self {
            RestrictionKind::Date => build::<DateRestriction>(parameters),
            RestrictionKind::ProjectNames => build::<ProjectNamesRestriction>(parameters),
            RestrictionKind::ProjectIds => build::<ProjectIdsRestriction>(parameters),
            RestrictionKind::UserId => build::<UserIdRestriction>(parameters),
            RestrictionKind::LegacyNoop => build::<LegacyNoopRestriction>(parameters),
            RestrictionKind::LegacyProjectNames => {
                build::<LegacyProjectNamesRestriction>(parameters)
            }
            RestrictionKind::LegacyDate => build::<LegacyDateRestriction>(parameters),
        }
    }
}

impl fmt::Display for RestrictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Run a kind's factory and make sure the result encodes to a caveat the
/// kind itself would decode.
fn build<C: Caveat>(
    parameters: &RestrictionParameters,
) -> Result<Option<Restriction>, InvalidRestriction> {
    let Some(caveat) = C::from_parameters(parameters)? else {
        return Ok(None);
    };

    let value = caveat.dump();
    if !C::schema().is_valid(&value) {
        return Err(InvalidRestriction::Malformed {
            kind: C::KIND,
            value,
        });
    }
    Ok(Some(caveat.into()))
}

/// A decoded caveat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restriction {
    /// Time window.
    Date(DateRestriction),
    /// Allowed project names.
    ProjectNames(ProjectNamesRestriction),
    /// Allowed project ids.
    ProjectIds(ProjectIdsRestriction),
    /// Single user.
    UserId(UserIdRestriction),
    /// Legacy caveat that restricts nothing.
    LegacyNoop(LegacyNoopRestriction),
    /// Allowed project names, legacy format.
    LegacyProjectNames(LegacyProjectNamesRestriction),
    /// Time window, legacy format.
    LegacyDate(LegacyDateRestriction),
}

macro_rules! dispatch {
    ($restriction:expr, $inner:ident => $body:expr) => {
        match $restriction {
            Restriction::Date($inner) => $body,
            Restriction::ProjectNames($inner) => $body,
            Restriction::ProjectIds($inner) => $body,
            Restriction::UserId($inner) => $body,
            Restriction::LegacyNoop($inner) => $body,
            Restriction::LegacyProjectNames($inner) => $body,
            Restriction::LegacyDate($inner) => $body,
        }
    };
}

impl Restriction {
    /// Decode a parsed caveat, trying each kind of [`RestrictionKind::ALL`]
    /// in order.
    pub fn load(value: &Value) -> Result<Self, LoadError> {
        RestrictionKind::ALL
            .into_iter()
            .find_map(|kind| {
                let restriction = kind.load(value)?;
                trace!(%kind, "caveat matched");
                Some(restriction)
            })
            .ok_or_else(|| LoadError::UnrecognizedRestriction {
                value: value.clone(),
            })
    }

    /// Decode a raw caveat.
    pub fn decode(caveat: &[u8]) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_slice(caveat).map_err(LoadError::MalformedEncoding)?;
        Self::load(&value)
    }

    /// Decode a caveat held as a string.
    pub fn load_json(caveat: &str) -> Result<Self, LoadError> {
        Self::decode(caveat.as_bytes())
    }

    /// Wire form of the restriction.
    pub fn dump(&self) -> Value {
        dispatch!(self, inner => inner.dump())
    }

    /// Compact JSON text of [`Restriction::dump`], as attached to tokens.
    pub fn dump_json(&self) -> String {
        self.dump().to_string()
    }

    /// Check the restriction against `context`.
    pub fn check(&self, context: &Context) -> Result<(), ValidationError> {
        dispatch!(self, inner => inner.check(context))
    }

    /// Registry entry this restriction belongs to.
    pub fn kind(&self) -> RestrictionKind {
        match self {
            Restriction::Date(_) => RestrictionKind::Date,
            Restriction::ProjectNames(_) => RestrictionKind::ProjectNames,
            Restriction::ProjectIds(_) => RestrictionKind::ProjectIds,
            Restriction::UserId(_) => RestrictionKind::UserId,
            Restriction::LegacyNoop(_) => RestrictionKind::LegacyNoop,
            Restriction::LegacyProjectNames(_) => RestrictionKind::LegacyProjectNames,
            Restriction::LegacyDate(_) => RestrictionKind::LegacyDate,
        }
    }

    /// Every restriction `parameters` describe, in registry order. Either
    /// all of them are valid or none is returned.
    pub fn from_parameters(
        parameters: &RestrictionParameters,
    ) -> Result<Vec<Self>, InvalidRestriction> {
        let mut restrictions = Vec::new();
        for kind in RestrictionKind::ALL {
            if let Some(restriction) = kind.from_parameters(parameters)? {
                restrictions.push(restriction);
            }
        }
        Ok(restrictions)
    }
}

macro_rules! into_restriction {
    ($($variant:ident($caveat:ty)),* $(,)?) => {
        $(
            impl From<$caveat> for Restriction {
                fn from(caveat: $caveat) -> Self {
                    Restriction::$variant(caveat)
                }
            }
        )*
    };
}

into_restriction! {
    Date(DateRestriction),
    ProjectNames(ProjectNamesRestriction),
    ProjectIds(ProjectIdsRestriction),
    UserId(UserIdRestriction),
    LegacyNoop(LegacyNoopRestriction),
    LegacyProjectNames(LegacyProjectNamesRestriction),
    LegacyDate(LegacyDateRestriction),
}
