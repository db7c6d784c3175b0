use std::sync::OnceLock;

use jsonschema::JSONSchema;
use serde_json::{Value, json};

use super::schema;
use crate::{
    Caveat, Context, ContextField, InvalidRestriction, RestrictionKind, RestrictionParameters,
    ValidationError,
};

/// Only for projects with one of these normalized names.
///
/// Wire form: `[1, [names...]]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectNamesRestriction {
    /// Allowed normalized names.
    pub project_names: Vec<String>,
}

impl ProjectNamesRestriction {
    /// Leading integer of the wire form.
    pub const TAG: u64 = 1;

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

impl Caveat for ProjectNamesRestriction {
    const KIND: RestrictionKind = RestrictionKind::ProjectNames;
    const NEEDS: &'static [ContextField] = &[ContextField::ProjectName];

    fn schema() -> &'static JSONSchema {
        static SCHEMA: OnceLock<JSONSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            schema::compile(schema::tagged(
                Self::TAG,
                &[schema::array_of(schema::string_matching(
                    schema::PROJECT_NAME_PATTERN,
                ))],
            ))
        })
    }

    fn extract(value: Value) -> Result<Self, serde_json::Error> {
        let (_, project_names): (u64, Vec<String>) = serde_json::from_value(value)?;
        Ok(Self { project_names })
    }

    fn dump(&self) -> Value {
        json!([Self::TAG, self.project_names])
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
        Ok(parameters.project_names.as_ref().map(Self::new))
    }
}

/// Only for projects with one of these ids.
///
/// Wire form: `[2, [uuids...]]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectIdsRestriction {
    /// Allowed lowercase UUIDs.
    pub project_ids: Vec<String>,
}

impl ProjectIdsRestriction {
    /// Leading integer of the wire form.
    pub const TAG: u64 = 2;

    /// Allow exactly `project_ids`.
    pub fn new<I, S>(project_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            project_ids: project_ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl Caveat for ProjectIdsRestriction {
    const KIND: RestrictionKind = RestrictionKind::ProjectIds;
    const NEEDS: &'static [ContextField] = &[ContextField::ProjectId];

    fn schema() -> &'static JSONSchema {
        static SCHEMA: OnceLock<JSONSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            schema::compile(schema::tagged(
                Self::TAG,
                &[schema::array_of(schema::string_matching(schema::UUID_PATTERN))],
            ))
        })
    }

    fn extract(value: Value) -> Result<Self, serde_json::Error> {
        let (_, project_ids): (u64, Vec<String>) = serde_json::from_value(value)?;
        Ok(Self { project_ids })
    }

    fn dump(&self) -> Value {
        json!([Self::TAG, self.project_ids])
    }

    fn verify(&self, context: &Context) -> Result<(), ValidationError> {
        let received = context.project_id().unwrap_or_default();
        if self.project_ids.iter().any(|id| id == received) {
            Ok(())
        } else {
            Err(ValidationError::ProjectIdNotAllowed {
                allowed: self.project_ids.clone(),
                received: received.to_string(),
            })
        }
    }

    fn from_parameters(
        parameters: &RestrictionParameters,
    ) -> Result<Option<Self>, InvalidRestriction> {
        Ok(parameters.project_ids.as_ref().map(Self::new))
    }
}
