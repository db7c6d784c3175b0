//! Caveats in the object-based format of the first PyPI tokens.
//!
//! New tokens should use the compact kinds. These remain decodable so older
//! tokens keep working, and can still be produced on request.

use std::sync::OnceLock;

use jsonschema::JSONSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{
    date::{window, within},
    schema,
};
use crate::{
    Caveat, Context, ContextField, InvalidRestriction, RestrictionKind, RestrictionParameters,
    ValidationError,
};

/// Looks like a restriction, restricts nothing.
///
/// Wire form: `{"version":1,"permissions":"user"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LegacyNoopRestriction;

impl Caveat for LegacyNoopRestriction {
    const KIND: RestrictionKind = RestrictionKind::LegacyNoop;
    const NEEDS: &'static [ContextField] = &[];

    fn schema() -> &'static JSONSchema {
        static SCHEMA: OnceLock<JSONSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            schema::compile(json!({
                "type": "object",
                "properties": {
                    "version": { "type": "integer", "const": 1 },
                    "permissions": { "type": "string", "const": "user" },
                },
                "required": ["version", "permissions"],
                "additionalProperties": false,
            }))
        })
    }

    fn extract(_: Value) -> Result<Self, serde_json::Error> {
        Ok(Self)
    }

    fn dump(&self) -> Value {
        json!({ "version": 1, "permissions": "user" })
    }

    fn verify(&self, _: &Context) -> Result<(), ValidationError> {
        Ok(())
    }

    fn from_parameters(
        parameters: &RestrictionParameters,
    ) -> Result<Option<Self>, InvalidRestriction> {
        Ok(parameters.legacy_noop.then_some(Self))
    }
}

/// Only for projects with one of these names.
///
/// Wire form: `{"version":1,"permissions":{"projects":[names...]}}`. Names
/// are not pattern checked in this format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LegacyProjectNamesRestriction {
    /// Allowed names, as written in the caveat.
    pub project_names: Vec<String>,
}

impl LegacyProjectNamesRestriction {
    /// Allow exactly `project_names`.
    pub fn new<I, S>(project_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            project_names: project_names.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Deserialize)]
struct LegacyPermissions {
    projects: Vec<String>,
}

#[derive(Deserialize)]
struct LegacyProjectsCaveat {
    permissions: LegacyPermissions,
}

impl Caveat for LegacyProjectNamesRestriction {
    const KIND: RestrictionKind = RestrictionKind::LegacyProjectNames;
    const NEEDS: &'static [ContextField] = &[ContextField::ProjectName];

    fn schema() -> &'static JSONSchema {
        static SCHEMA: OnceLock<JSONSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            schema::compile(json!({
                "type": "object",
                "properties": {
                    "version": { "type": "integer", "const": 1 },
                    "permissions": {
                        "type": "object",
                        "properties": {
                            "projects": schema::array_of(json!({ "type": "string" })),
                        },
                        "required": ["projects"],
                        "additionalProperties": false,
                    },
                },
                "required": ["version", "permissions"],
                "additionalProperties": false,
            }))
        })
    }

    fn extract(value: Value) -> Result<Self, serde_json::Error> {
        let caveat: LegacyProjectsCaveat = serde_json::from_value(value)?;
        Ok(Self {
            project_names: caveat.permissions.projects,
        })
    }

    fn dump(&self) -> Value {
        json!({ "version": 1, "permissions": { "projects": self.project_names } })
    }

    fn verify(&self, context: &Context) -> Result<(), ValidationError> {
        let received = context.project_name().unwrap_or_default();
        if self.project_names.iter().any(|name| name == received) {
            Ok(())
        } else {
            Err(ValidationError::ProjectNameNotAllowed {
                allowed: self.project_names.clone(),
                received: received.to_string(),
            })
        }
    }

    fn from_parameters(
        parameters: &RestrictionParameters,
    ) -> Result<Option<Self>, InvalidRestriction> {
        Ok(parameters.legacy_project_names.as_ref().map(Self::new))
    }
}

/// Only valid within `[not_before, not_after)`, in Unix seconds.
///
/// Wire form: `{"nbf":not_before,"exp":not_after}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LegacyDateRestriction {
    /// Inclusive lower bound.
    pub not_before: i64,
    /// Exclusive upper bound.
    pub not_after: i64,
}

impl LegacyDateRestriction {
    /// Valid from `not_before` up to, not including, `not_after`.
    pub fn new(not_before: i64, not_after: i64) -> Self {
        Self {
            not_before,
            not_after,
        }
    }
}

#[derive(Deserialize)]
struct LegacyDateCaveat {
    nbf: i64,
    exp: i64,
}

impl Caveat for LegacyDateRestriction {
    const KIND: RestrictionKind = RestrictionKind::LegacyDate;
    const NEEDS: &'static [ContextField] = &[ContextField::Now];

    fn schema() -> &'static JSONSchema {
        static SCHEMA: OnceLock<JSONSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            schema::compile(json!({
                "type": "object",
                "properties": {
                    "nbf": { "type": "integer" },
                    "exp": { "type": "integer" },
                },
                "required": ["nbf", "exp"],
                "additionalProperties": false,
            }))
        })
    }

    fn extract(value: Value) -> Result<Self, serde_json::Error> {
        let caveat: LegacyDateCaveat = serde_json::from_value(value)?;
        Ok(Self::new(caveat.nbf, caveat.exp))
    }

    fn dump(&self) -> Value {
        json!({ "nbf": self.not_before, "exp": self.not_after })
    }

    fn verify(&self, context: &Context) -> Result<(), ValidationError> {
        within(self.not_before, self.not_after, context.now())
    }

    fn from_parameters(
        parameters: &RestrictionParameters,
    ) -> Result<Option<Self>, InvalidRestriction> {
        window(
            "legacy_not_before",
            "legacy_not_after",
            parameters.legacy_not_before,
            parameters.legacy_not_after,
        )
        .map(|bounds| bounds.map(|(not_before, not_after)| Self::new(not_before, not_after)))
    }
}
