//! HMAC-SHA256 signature chain.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::MacaroonError;

/// The size of a macaroon signature in bytes.
pub const SIGNATURE_SIZE: usize = 32;

/// Fixed HMAC key used to turn a root secret into the chain's first key.
const KEY_GENERATOR: &[u8] = b"macaroons-key-generator";

/// A macaroon signature: one link of the HMAC chain.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    /// Signature of a fresh macaroon, before any caveat is attached.
    pub fn initial(key: &[u8], identifier: &[u8]) -> Self {
        let derived = hmac_sha256(KEY_GENERATOR, key);
        Self(hmac_sha256(&derived, identifier))
    }

    /// Next link of the chain after appending `caveat`.
    #[must_use]
    pub fn chain(&self, caveat: &[u8]) -> Self {
        Self(hmac_sha256(&self.0, caveat))
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    /// Compare two signatures in constant time.
    pub fn ct_eq(&self, other: &Self) -> bool {
        bool::from(self.0[..].ct_eq(&other.0[..]))
    }
}

impl From<[u8; SIGNATURE_SIZE]> for Signature {
    fn from(value: [u8; SIGNATURE_SIZE]) -> Self {
        Self(value)
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = MacaroonError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; SIGNATURE_SIZE] = value
            .try_into()
            .map_err(|_| MacaroonError::SignatureLength(value.len()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(self.0))
    }
}

/// Compute HMAC-SHA256.
fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; SIGNATURE_SIZE] {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);

    let mut output = [0u8; SIGNATURE_SIZE];
    output.copy_from_slice(&mac.finalize().into_bytes());
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_chains_deterministically() {
        let first = Signature::initial(b"secret", b"id").chain(b"a = 1");
        let second = Signature::initial(b"secret", b"id").chain(b"a = 1");
        assert_eq!(first, second);
        assert!(first.ct_eq(&second));
    }

    #[test]
    fn it_tells_apart_signatures_differing_in_one_byte() {
        let mut bytes = [0x11; SIGNATURE_SIZE];
        let one = Signature::from(bytes);
        bytes[SIGNATURE_SIZE - 1] ^= 0x01;
        let other = Signature::from(bytes);

        assert!(one.ct_eq(&one));
        assert!(!one.ct_eq(&other));
        assert!(!other.ct_eq(&one));
    }

    #[test]
    fn it_depends_on_caveat_order() {
        let root = Signature::initial(b"secret", b"id");
        let ab = root.chain(b"a").chain(b"b");
        let ba = root.chain(b"b").chain(b"a");
        assert!(!ab.ct_eq(&ba));
    }

    #[test]
    fn it_depends_on_the_key() {
        let one = Signature::initial(b"secret", b"id");
        let other = Signature::initial(b"Secret", b"id");
        assert!(!one.ct_eq(&other));
    }

    #[test]
    fn it_rejects_short_signatures() {
        let result = Signature::try_from(&[0u8; 31][..]);
        assert_eq!(result, Err(MacaroonError::SignatureLength(31)));
    }

    #[test]
    fn it_formats_as_hex() {
        let signature = Signature::from([0xab; SIGNATURE_SIZE]);
        assert_eq!(
            format!("{signature:?}"),
            format!("Signature({})", "ab".repeat(SIGNATURE_SIZE))
        );
    }
}
