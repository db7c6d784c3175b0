use std::sync::OnceLock;

use jsonschema::JSONSchema;
use serde_json::{Value, json};

use super::schema;
use crate::{
    Caveat, Context, ContextField, InvalidRestriction, RestrictionKind, RestrictionParameters,
    ValidationError,
};

/// Only usable by the user with this id.
///
/// Wire form: `[3, uuid]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserIdRestriction {
    /// Lowercase UUID of the user.
    pub user_id: String,
}

impl UserIdRestriction {
    /// Leading integer of the wire form.
    pub const TAG: u64 = 3;

    /// Allow only `user_id`.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

impl Caveat for UserIdRestriction {
    const KIND: RestrictionKind = RestrictionKind::UserId;
    const NEEDS: &'static [ContextField] = &[ContextField::UserId];

    fn schema() -> &'static JSONSchema {
        static SCHEMA: OnceLock<JSONSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            schema::compile(schema::tagged(
                Self::TAG,
                &[schema::string_matching(schema::UUID_PATTERN)],
            ))
        })
    }

    fn extract(value: Value) -> Result<Self, serde_json::Error> {
        let (_, user_id): (u64, String) = serde_json::from_value(value)?;
        Ok(Self { user_id })
    }

    fn dump(&self) -> Value {
        json!([Self::TAG, self.user_id])
    }

    fn verify(&self, context: &Context) -> Result<(), ValidationError> {
        let received = context.user_id().unwrap_or_default();
        if received == self.user_id {
            Ok(())
        } else {
            Err(ValidationError::UserIdMismatch {
                expected: self.user_id.clone(),
                received: received.to_string(),
            })
        }
    }

    fn from_parameters(
        parameters: &RestrictionParameters,
    ) -> Result<Option<Self>, InvalidRestriction> {
        Ok(parameters.user_id.as_deref().map(Self::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ID: &str = "4c43d5f8-6ef7-4e49-a4d7-32e3eb51d4b0";
    const OTHER: &str = "d1e1fa2d-3a7b-4b43-8a4b-2a2cbe2f5a10";

    #[test]
    fn it_encodes_the_user_id() {
        let restriction = UserIdRestriction::new(ID);
        assert_eq!(restriction.dump().to_string(), format!(r#"[3,"{ID}"]"#));
        assert_eq!(UserIdRestriction::load(&restriction.dump()).unwrap(), restriction);
    }

    #[test]
    fn it_rejects_malformed_ids() {
        assert!(UserIdRestriction::load(&json!([3, ID.to_uppercase()])).is_none());
        assert!(UserIdRestriction::load(&json!([3, [ID]])).is_none());
        assert!(UserIdRestriction::load(&json!([3, "alice"])).is_none());
    }

    #[test]
    fn it_matches_the_user() {
        let restriction = UserIdRestriction::new(ID);
        assert!(restriction.check(&Context::new().with_user_id(ID)).is_ok());

        let error = restriction
            .check(&Context::new().with_user_id(OTHER))
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            format!("This token can only be used by user with id: {ID}. Received: {OTHER}")
        );
    }

    #[test]
    fn it_needs_a_user_id() {
        assert!(matches!(
            UserIdRestriction::new(ID).check(&Context::new()),
            Err(ValidationError::MissingContext {
                field: ContextField::UserId
            })
        ));
    }
}
