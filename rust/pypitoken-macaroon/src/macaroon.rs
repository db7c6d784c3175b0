use std::{fmt, str::FromStr};

use tracing::{debug, trace};

use crate::{Format, MacaroonError, Signature, VerifyError, format};

/// A macaroon with first-party caveats.
///
/// The signature always reflects the identifier and every caveat in order;
/// the only way to extend a macaroon is [`Macaroon::add_first_party_caveat`],
/// which re-keys the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macaroon {
    location: Option<String>,
    identifier: Vec<u8>,
    caveats: Vec<Vec<u8>>,
    signature: Signature,
    format: Format,
}

impl Macaroon {
    /// Mint a macaroon for `location`, identified by `identifier` and signed
    /// with `key`. The result serializes to [`Format::V2`].
    pub fn create(
        location: impl Into<String>,
        identifier: impl Into<Vec<u8>>,
        key: impl AsRef<[u8]>,
    ) -> Self {
        Self::mint(Some(location.into()), identifier.into(), key.as_ref())
    }

    /// Mint a macaroon that carries no location hint.
    pub fn create_without_location(identifier: impl Into<Vec<u8>>, key: impl AsRef<[u8]>) -> Self {
        Self::mint(None, identifier.into(), key.as_ref())
    }

    fn mint(location: Option<String>, identifier: Vec<u8>, key: &[u8]) -> Self {
        let signature = Signature::initial(key, &identifier);
        Self {
            location,
            identifier,
            caveats: Vec::new(),
            signature,
            format: Format::default(),
        }
    }

    pub(crate) fn from_parts(
        location: Option<String>,
        identifier: Vec<u8>,
        caveats: Vec<Vec<u8>>,
        signature: Signature,
        format: Format,
    ) -> Self {
        Self {
            location,
            identifier,
            caveats,
            signature,
            format,
        }
    }

    /// Switch the serialization layout. Fails if a field is too large for
    /// [`Format::V1`].
    pub fn with_format(mut self, format: Format) -> Result<Self, MacaroonError> {
        if format == Format::V1 {
            format::ensure_macaroon_fits(&self)?;
        }
        self.format = format;
        Ok(self)
    }

    /// Append a caveat and extend the signature chain.
    ///
    /// Nothing is appended when the caveat cannot be represented in the
    /// macaroon's format.
    pub fn add_first_party_caveat(
        &mut self,
        predicate: impl Into<Vec<u8>>,
    ) -> Result<(), MacaroonError> {
        let predicate = predicate.into();
        if self.format == Format::V1 {
            format::ensure_fits("cid", &predicate)?;
        }

        trace!(size = predicate.len(), "appending first-party caveat");
        self.signature = self.signature.chain(&predicate);
        self.caveats.push(predicate);
        Ok(())
    }

    /// Check the macaroon against `key`.
    ///
    /// `satisfier` is called once per caveat, in order, and verification
    /// stops at the first caveat it rejects. Once every caveat is satisfied
    /// the recomputed signature is compared with the carried one.
    pub fn verify<F>(&self, key: impl AsRef<[u8]>, mut satisfier: F) -> Result<(), VerifyError>
    where
        F: FnMut(&[u8]) -> bool,
    {
        let mut signature = Signature::initial(key.as_ref(), &self.identifier);

        for (index, caveat) in self.caveats.iter().enumerate() {
            if !satisfier(caveat) {
                debug!(index, "caveat not satisfied");
                return Err(VerifyError::CaveatNotMet(
                    String::from_utf8_lossy(caveat).into_owned(),
                ));
            }
            signature = signature.chain(caveat);
        }

        if signature.ct_eq(&self.signature) {
            Ok(())
        } else {
            debug!("signature mismatch");
            Err(VerifyError::SignatureMismatch)
        }
    }

    /// Encode as base64url without padding.
    pub fn serialize(&self) -> String {
        format::encode(self)
    }

    /// Decode a base64 encoded V1 or V2 macaroon.
    pub fn deserialize(raw: &str) -> Result<Self, MacaroonError> {
        format::decode(raw)
    }

    /// Location hint, usually the domain of the issuer.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Identifier the macaroon was minted with.
    pub fn identifier(&self) -> &[u8] {
        &self.identifier
    }

    /// Caveat predicates in the order they were added.
    pub fn caveats(&self) -> impl ExactSizeIterator<Item = &[u8]> {
        self.caveats.iter().map(Vec::as_slice)
    }

    /// Current end of the signature chain.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Layout used by [`Macaroon::serialize`].
    pub fn format(&self) -> Format {
        self.format
    }
}

impl fmt::Display for Macaroon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl FromStr for Macaroon {
    type Err = MacaroonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::deserialize(s)
    }
}
