use std::{fmt, str::FromStr, str::Utf8Error};

use pypitoken_macaroon::{Format, Macaroon};
use serde::Deserialize;
use tracing::debug;

use crate::{
    Context, Error, InvalidRestriction, LoadError, Restriction, RestrictionParameters,
    ValidationError,
};

/// Prefix of tokens issued by PyPI.
pub const PREFIX: &str = "pypi";

/// How [`Token::create_with`] mints a token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TokenOptions {
    /// Text before the first `-` of the dumped token. Must not contain `-`.
    pub prefix: String,
    /// Macaroon serialization layout.
    pub format: Format,
}

impl Default for TokenOptions {
    fn default() -> Self {
        Self {
            prefix: PREFIX.to_string(),
            format: Format::default(),
        }
    }
}

/// A PyPI API token: a prefix and a macaroon whose caveats are
/// [`Restriction`]s.
///
/// Anyone holding a token can [`restrict`](Token::restrict) it further.
/// Only the holder of the key it was minted with can [`check`](Token::check)
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    prefix: String,
    macaroon: Macaroon,
}

impl Token {
    /// Wrap an existing macaroon. Usually [`Token::create`] or
    /// [`Token::load`] is what you want.
    pub fn new(prefix: impl Into<String>, macaroon: Macaroon) -> Self {
        Self {
            prefix: prefix.into(),
            macaroon,
        }
    }

    /// Mint an unrestricted token for `domain` (usually `pypi.org`).
    ///
    /// `identifier` is how the issuer finds the token and its owner; it stays
    /// readable in the dumped token. `key` is the secret needed to check the
    /// token later.
    pub fn create(domain: &str, identifier: &str, key: impl AsRef<[u8]>) -> Self {
        Self::new(PREFIX, Macaroon::create(domain, identifier, key))
    }

    /// [`Token::create`] with an explicit prefix and macaroon format.
    pub fn create_with(
        domain: &str,
        identifier: &str,
        key: impl AsRef<[u8]>,
        options: &TokenOptions,
    ) -> Result<Self, Error> {
        let macaroon = Macaroon::create(domain, identifier, key).with_format(options.format)?;
        Ok(Self::new(options.prefix.as_str(), macaroon))
    }

    /// Parse a dumped token. The token is not checked.
    pub fn load(raw: &str) -> Result<Self, LoadError> {
        let (prefix, raw_macaroon) = raw.split_once('-').ok_or(LoadError::MissingPrefix)?;
        let macaroon =
            Macaroon::deserialize(raw_macaroon).map_err(LoadError::DeserializationFailed)?;

        debug!(prefix, caveats = macaroon.caveats().len(), "loaded token");
        Ok(Self::new(prefix, macaroon))
    }

    /// Attach the restrictions `parameters` describe, in registry order.
    ///
    /// Restrictions only ever narrow a token. Nothing is attached if any
    /// requested restriction is invalid.
    pub fn restrict(
        &mut self,
        parameters: &RestrictionParameters,
    ) -> Result<&mut Self, InvalidRestriction> {
        let restrictions = Restriction::from_parameters(parameters)?;

        let mut macaroon = self.macaroon.clone();
        for restriction in &restrictions {
            macaroon
                .add_first_party_caveat(restriction.dump_json())
                .map_err(InvalidRestriction::Unrepresentable)?;
        }
        self.macaroon = macaroon;

        debug!(
            added = restrictions.len(),
            caveats = self.macaroon.caveats().len(),
            "restricted token"
        );
        Ok(self)
    }

    /// Verify the token against `key` and every restriction against
    /// `context`.
    ///
    /// When several caveats fail, the first failure is reported. A wrong key
    /// or tampered token surfaces as [`ValidationError::Macaroon`].
    ///
    /// The error describes the failed restriction only. Converted into the
    /// root [`Error`] it reads `Error while validating token: <reason>`:
    ///
    /// ```rust
    /// use pypitoken::{Context, Error, RestrictionParameters, Token};
    ///
    /// let mut token = Token::create("pypi.org", "id", "key");
    /// token
    ///     .restrict(&RestrictionParameters::new().project_names(["a"]))
    ///     .unwrap();
    ///
    /// let error = token
    ///     .check("key", &Context::new().with_project_name("b"))
    ///     .unwrap_err();
    /// assert_eq!(
    ///     error.to_string(),
    ///     "This token can only be used for project(s): a. Received: b"
    /// );
    /// assert_eq!(
    ///     Error::from(error).to_string(),
    ///     "Error while validating token: \
    ///      This token can only be used for project(s): a. Received: b"
    /// );
    /// ```
    pub fn check(&self, key: impl AsRef<[u8]>, context: &Context) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        let verified = self.macaroon.verify(key, |caveat| match check_caveat(caveat, context) {
            Ok(()) => true,
            Err(error) => {
                debug!(%error, "caveat rejected");
                errors.push(error);
                false
            }
        });

        match verified {
            Ok(()) => Ok(()),
            Err(error) => Err(errors
                .into_iter()
                .next()
                .unwrap_or(ValidationError::Macaroon(error))),
        }
    }

    /// Every attached restriction, in attachment order.
    pub fn restrictions(&self) -> Result<Vec<Restriction>, LoadError> {
        self.macaroon.caveats().map(Restriction::decode).collect()
    }

    /// The token as a string, e.g. for an `Authorization` header.
    pub fn dump(&self) -> String {
        format!("{}-{}", self.prefix, self.macaroon.serialize())
    }

    /// Text before the first `-`, `pypi` for PyPI tokens.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Domain the token was minted for.
    pub fn domain(&self) -> Option<&str> {
        self.macaroon.location()
    }

    /// Identifier the token was minted with. Fails when the identifier is
    /// not UTF-8; the raw bytes are available through
    /// [`Macaroon::identifier`].
    pub fn identifier(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(self.macaroon.identifier())
    }

    /// The underlying macaroon.
    pub fn macaroon(&self) -> &Macaroon {
        &self.macaroon
    }
}

fn check_caveat(caveat: &[u8], context: &Context) -> Result<(), ValidationError> {
    Restriction::decode(caveat)?.check(context)
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}

impl FromStr for Token {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::load(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    #[test]
    fn it_splits_on_the_first_separator() -> TestResult {
        let token = Token::create("example.com", "123foo", "ohsosecret");
        let raw = format!("my-prefix{}", &token.dump()["pypi".len()..]);

        let error = Token::load(&raw).unwrap_err();
        assert!(matches!(error, LoadError::DeserializationFailed(_)));

        let loaded = Token::load(&token.dump())?;
        assert_eq!(loaded.prefix(), "pypi");
        Ok(())
    }

    #[test]
    fn it_refuses_to_guess_a_non_utf8_identifier() {
        let token = Token::new("pypi", Macaroon::create("pypi.org", vec![b'i', 0xff], "key"));
        assert!(token.identifier().is_err());
        assert_eq!(token.macaroon().identifier(), &[b'i', 0xff][..]);

        let token = Token::create("pypi.org", "id", "key");
        assert_eq!(token.identifier(), Ok("id"));
    }

    #[test]
    fn it_reads_options_from_config() -> TestResult {
        let options: TokenOptions = serde_json::from_str(r#"{"prefix":"test"}"#)?;
        assert_eq!(options.prefix, "test");
        assert_eq!(options.format, Format::V2);
        Ok(())
    }

    #[test]
    fn it_leaves_the_token_untouched_on_invalid_parameters() {
        let mut token = Token::create("example.com", "123foo", "ohsosecret");
        let before = token.clone();

        let parameters = RestrictionParameters::new()
            .project_names(["a"])
            .not_before(1);
        assert!(token.restrict(&parameters).is_err());
        assert_eq!(token, before);
    }

    #[test]
    fn it_reports_the_first_failed_caveat() -> TestResult {
        let mut token = Token::create("example.com", "123foo", "ohsosecret");
        token.restrict(
            &RestrictionParameters::new()
                .window(0, 1)
                .project_names(["a"]),
        )?;

        let error = token
            .check("ohsosecret", &Context::new().with_project_name("b").with_now(5))
            .unwrap_err();
        assert!(matches!(error, ValidationError::OutsideWindow { .. }));
        Ok(())
    }
}
