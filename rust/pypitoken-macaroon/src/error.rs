//! Error types for macaroon construction, decoding and verification.

/// Errors raised while building or decoding a macaroon.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MacaroonError {
    /// The serialized input was empty.
    #[error("empty macaroon")]
    Empty,

    /// The serialized input is not valid base64.
    #[error("{0}")]
    Base64(#[from] base64::DecodeError),

    /// The first decoded byte matches neither the V1 nor the V2 layout.
    #[error("cannot determine data format of binary-encoded macaroon")]
    UnknownFormat,

    /// A length prefix points beyond the end of the input.
    #[error("field data extends past end of buffer")]
    Truncated,

    /// A LEB128 varint could not be decoded.
    #[error("invalid varint: {0}")]
    Varint(String),

    /// A V2 field appeared where another one was expected.
    #[error("unexpected field type {found}, expected {expected}")]
    UnexpectedField {
        /// Field type required at this position.
        expected: u64,
        /// Field type actually read.
        found: u64,
    },

    /// A V1 packet is malformed.
    #[error("invalid packet: {0}")]
    InvalidPacket(String),

    /// A V1 packet would not fit the 4 hex digit length header.
    #[error("packet of {0} bytes exceeds the V1 limit of 65535 bytes")]
    PacketTooLarge(usize),

    /// A mandatory field is missing.
    #[error("missing {0}")]
    Missing(&'static str),

    /// A text field holds bytes that are not UTF-8.
    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    /// The macaroon carries a third-party caveat.
    #[error("third-party caveats are not supported")]
    ThirdPartyCaveat,

    /// The signature has the wrong length.
    #[error("signature must be 32 bytes, found {0}")]
    SignatureLength(usize),

    /// Bytes remain after the signature.
    #[error("trailing data after signature")]
    TrailingData,
}

/// Reasons a macaroon fails verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// The satisfier rejected a caveat. Verification stops at the first one.
    #[error("Caveat not met. Unable to satisfy: {0}")]
    CaveatNotMet(String),

    /// The recomputed HMAC chain does not match the carried signature,
    /// typically because the key is wrong or the macaroon was tampered with.
    #[error("Signatures do not match")]
    SignatureMismatch,
}
