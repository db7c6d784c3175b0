//! First-party macaroons.
//!
//! A macaroon is a bearer credential made of a location, an identifier, an
//! ordered list of caveats and a signature. The signature is an HMAC chain:
//! it starts from a key derived from the root secret and is re-keyed with
//! every caveat appended, so anyone holding a macaroon can narrow it further
//! but nobody without the root secret can remove a caveat.
//!
//! This crate implements the subset needed to mint, attenuate, transport and
//! verify macaroons carrying first-party caveats. Serialization follows the
//! libmacaroons V1 (packet) and V2 (binary) layouts, base64url encoded, so
//! tokens round-trip with other implementations.
//!
//! # Example
//!
//! ```rust
//! use pypitoken_macaroon::{Macaroon, VerifyError};
//!
//! let mut macaroon = Macaroon::create("example.com", "123foo", "ohsosecret");
//! macaroon.add_first_party_caveat("user = alice").unwrap();
//!
//! let wire = macaroon.serialize();
//! let loaded = Macaroon::deserialize(&wire).unwrap();
//!
//! assert!(loaded.verify("ohsosecret", |caveat| caveat == b"user = alice").is_ok());
//! assert_eq!(
//!     loaded.verify("wrong", |_| true),
//!     Err(VerifyError::SignatureMismatch)
//! );
//! ```
//!
//! Third-party caveats are not supported: they are never produced, and a
//! serialized macaroon that contains one is rejected on deserialization.

#![warn(missing_docs)]

mod error;
pub use error::*;

mod signature;
pub use signature::*;

mod format;
pub use format::Format;

mod macaroon;
pub use macaroon::*;
