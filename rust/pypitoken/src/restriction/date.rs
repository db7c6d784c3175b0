use std::sync::OnceLock;

use jsonschema::JSONSchema;
use serde_json::{Value, json};

use super::schema;
use crate::{
    Caveat, Context, ContextField, InvalidRestriction, RestrictionKind, RestrictionParameters,
    ValidationError,
};

/// Only valid within `[not_before, not_after)`, in Unix seconds.
///
/// Wire form: `[0, not_after, not_before]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRestriction {
    /// Inclusive lower bound.
    pub not_before: i64,
    /// Exclusive upper bound.
    pub not_after: i64,
}

impl DateRestriction {
    /// Leading integer of the wire form.
    pub const TAG: u64 = 0;

    /// Valid from `not_before` up to, not including, `not_after`.
    pub fn new(not_before: i64, not_after: i64) -> Self {
        Self {
            not_before,
            not_after,
        }
    }
}

impl Caveat for DateRestriction {
    const KIND: RestrictionKind = RestrictionKind::Date;
    const NEEDS: &'static [ContextField] = &[ContextField::Now];

    fn schema() -> &'static JSONSchema {
        static SCHEMA: OnceLock<JSONSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            schema::compile(schema::tagged(
                Self::TAG,
                &[json!({ "type": "integer" }), json!({ "type": "integer" })],
            ))
        })
    }

    fn extract(value: Value) -> Result<Self, serde_json::Error> {
        let (_, not_after, not_before): (u64, i64, i64) = serde_json::from_value(value)?;
        Ok(Self::new(not_before, not_after))
    }

    fn dump(&self) -> Value {
        json!([Self::TAG, self.not_after, self.not_before])
    }

    fn verify(&self, context: &Context) -> Result<(), ValidationError> {
        within(self.not_before, self.not_after, context.now())
    }

    fn from_parameters(
        parameters: &RestrictionParameters,
    ) -> Result<Option<Self>, InvalidRestriction> {
        window("not_before", "not_after", parameters.not_before, parameters.not_after)
            .map(|bounds| bounds.map(|(not_before, not_after)| Self::new(not_before, not_after)))
    }
}

/// Half-open window check shared by the date kinds.
pub(super) fn within(not_before: i64, not_after: i64, now: i64) -> Result<(), ValidationError> {
    if (not_before..not_after).contains(&now) {
        Ok(())
    } else {
        Err(ValidationError::OutsideWindow {
            not_before,
            not_after,
            now,
        })
    }
}

/// Pair up window bounds: both or neither.
pub(super) fn window(
    before: &'static str,
    after: &'static str,
    not_before: Option<i64>,
    not_after: Option<i64>,
) -> Result<Option<(i64, i64)>, InvalidRestriction> {
    match (not_before, not_after) {
        (None, None) => Ok(None),
        (Some(not_before), Some(not_after)) => Ok(Some((not_before, not_after))),
        (not_before, not_after) => Err(InvalidRestriction::IncompleteWindow {
            before,
            after,
            not_before,
            not_after,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn it_puts_the_upper_bound_first_on_the_wire() {
        let restriction = DateRestriction::new(1_000, 2_000);
        assert_eq!(restriction.dump(), json!([0, 2_000, 1_000]));
        assert_eq!(
            DateRestriction::load(&json!([0, 2_000, 1_000])).unwrap(),
            restriction
        );
    }

    #[test]
    fn it_rejects_other_shapes() {
        for value in [
            json!([0, 2_000]),
            json!([0, 2_000, 1_000, 0]),
            json!([0, "2000", 1_000]),
            json!([0, 2_000.5, 1_000]),
            json!([1, 2_000, 1_000]),
            json!({ "nbf": 1_000, "exp": 2_000 }),
        ] {
            assert!(DateRestriction::load(&value).is_none(), "{value}");
        }
    }

    #[test]
    fn it_holds_inside_a_half_open_window() {
        let restriction = DateRestriction::new(1_000, 2_000);
        let at = |now: i64| restriction.check(&Context::new().with_now(now));

        assert!(at(1_000).is_ok());
        assert!(at(1_999).is_ok());
        assert!(matches!(at(999), Err(ValidationError::OutsideWindow { .. })));
        assert!(matches!(at(2_000), Err(ValidationError::OutsideWindow { .. })));
    }

    #[test]
    fn it_explains_the_window() {
        let error = DateRestriction::new(1_000, 2_000)
            .check(&Context::new().with_now(3_000))
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "This token can only be used between timestamps 1000 (incl) and 2000 (excl). Received: 3000"
        );
    }

    #[test]
    fn it_requires_both_bounds() {
        let parameters = RestrictionParameters::new().not_before(1_000);
        assert_eq!(
            DateRestriction::from_parameters(&parameters),
            Err(InvalidRestriction::IncompleteWindow {
                before: "not_before",
                after: "not_after",
                not_before: Some(1_000),
                not_after: None,
            })
        );

        let parameters = RestrictionParameters::new().window(1_000, 2_000);
        assert_eq!(
            DateRestriction::from_parameters(&parameters),
            Ok(Some(DateRestriction::new(1_000, 2_000)))
        );
        assert_eq!(
            DateRestriction::from_parameters(&RestrictionParameters::new()),
            Ok(None)
        );
    }
}
