//! Wire layouts and the base64 transport encoding.
//!
//! Both layouts are carried as base64url without padding. Decoding is
//! lenient: padding is optional, stray trailing bits are ignored, and the
//! standard alphabet is accepted when the input contains `+` or `/`.

use base64::{
    Engine,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde::{Deserialize, Serialize};

use crate::{Macaroon, MacaroonError};

mod v1;
mod v2;

pub(crate) use v1::{ensure_fits, ensure_macaroon_fits};

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

const URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Binary layout of a serialized macaroon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Text packets with a 4 hex digit length header.
    V1,
    /// Compact binary fields with LEB128 type and length prefixes.
    #[default]
    V2,
}

pub(crate) fn encode(macaroon: &Macaroon) -> String {
    let bytes = match macaroon.format() {
        Format::V1 => v1::encode(macaroon),
        Format::V2 => v2::encode(macaroon),
    };
    URL_SAFE.encode(bytes)
}

pub(crate) fn decode(raw: &str) -> Result<Macaroon, MacaroonError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(MacaroonError::Empty);
    }

    let engine = if raw.contains(['+', '/']) {
        &STANDARD
    } else {
        &URL_SAFE
    };
    let bytes = engine.decode(raw)?;

    match bytes.first() {
        None => Err(MacaroonError::Empty),
        Some(&v2::VERSION) => v2::decode(&bytes[1..]),
        Some(byte) if byte.is_ascii_hexdigit() => v1::decode(&bytes),
        Some(_) => Err(MacaroonError::UnknownFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_rejects_empty_input() {
        assert_eq!(decode("").unwrap_err(), MacaroonError::Empty);
        assert_eq!(decode("  ").unwrap_err(), MacaroonError::Empty);
    }

    #[test]
    fn it_rejects_unknown_leading_byte() {
        assert_eq!(decode("baz").unwrap_err(), MacaroonError::UnknownFormat);
    }

    #[test]
    fn it_reports_invalid_base64() {
        assert!(matches!(
            decode("not base64!").unwrap_err(),
            MacaroonError::Base64(_)
        ));
    }

    #[test]
    fn it_accepts_padded_and_standard_alphabet() {
        let macaroon = Macaroon::create("loc", "id", "key");
        let unpadded = encode(&macaroon);

        let mut padded = unpadded.clone();
        while padded.len() % 4 != 0 {
            padded.push('=');
        }
        assert_eq!(decode(&padded).unwrap(), macaroon);

        let standard = unpadded.replace('-', "+").replace('_', "/");
        assert_eq!(decode(&standard).unwrap(), macaroon);
    }

    #[test]
    fn it_names_formats_in_lowercase() {
        assert_eq!(serde_json::to_string(&Format::V1).unwrap(), "\"v1\"");
        assert_eq!(
            serde_json::from_str::<Format>("\"v2\"").unwrap(),
            Format::V2
        );
    }
}
