//! PyPI API tokens.
//!
//! A PyPI token is a [macaroon](pypitoken_macaroon) with a short prefix
//! (`pypi-...`). Its caveats are [`Restriction`]s: JSON documents that limit
//! what the token may be used for, such as a set of projects, a time window
//! or a single user. Anyone can add restrictions to a token they hold; only
//! the issuer, who knows the key, can check them.
//!
//! # Example
//!
//! ```rust
//! use pypitoken::{Context, RestrictionParameters, Token};
//!
//! // Issuer side: mint a token.
//! let token = Token::create("pypi.org", "user-identifier", "secret-key");
//!
//! // Holder side: narrow it to two projects before handing it to CI.
//! let mut token = Token::load(&token.dump()).unwrap();
//! token
//!     .restrict(&RestrictionParameters::new().project_names(["requests", "urllib3"]))
//!     .unwrap();
//!
//! // Issuer side again: check an upload attempt.
//! let token = Token::load(&token.dump()).unwrap();
//! assert!(
//!     token
//!         .check("secret-key", &Context::new().with_project_name("requests"))
//!         .is_ok()
//! );
//!
//! let error = token
//!     .check("secret-key", &Context::new().with_project_name("django"))
//!     .unwrap_err();
//! assert_eq!(
//!     error.to_string(),
//!     "This token can only be used for project(s): requests, urllib3. Received: django"
//! );
//! ```
//!
//! # Restrictions
//!
//! | Kind | Wire form | Needs |
//! |------|-----------|-------|
//! | [`DateRestriction`] | `[0, not_after, not_before]` | time |
//! | [`ProjectNamesRestriction`] | `[1, [names]]` | project name |
//! | [`ProjectIdsRestriction`] | `[2, [ids]]` | project id |
//! | [`UserIdRestriction`] | `[3, id]` | user id |
//! | [`LegacyNoopRestriction`] | `{"version":1,"permissions":"user"}` | |
//! | [`LegacyProjectNamesRestriction`] | `{"version":1,"permissions":{"projects":[names]}}` | project name |
//! | [`LegacyDateRestriction`] | `{"nbf":not_before,"exp":not_after}` | time |
//!
//! The set is closed: [`RestrictionKind::ALL`] is the only source of kinds
//! the decoder tries, and a caveat none of them accepts makes the token
//! invalid.

#![warn(missing_docs)]

mod error;
pub use error::*;

mod timestamp;
pub use timestamp::IntoTimestamp;

mod context;
pub use context::*;

mod parameters;
pub use parameters::*;

mod restriction;
pub use restriction::*;

mod token;
pub use token::*;

pub use pypitoken_macaroon::{Format, Macaroon, MacaroonError, VerifyError};
