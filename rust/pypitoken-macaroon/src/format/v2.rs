//! libmacaroons V2 binary layout.
//!
//! ```text
//! version(2)
//! [location field] identifier field EOS
//! (identifier field EOS)*            first-party caveats
//! EOS
//! signature field
//! ```
//!
//! Each field is a LEB128 type, a LEB128 length and that many bytes. EOS is a
//! single zero type byte with no length.

use crate::{Format, Macaroon, MacaroonError, Signature};

pub(super) const VERSION: u8 = 2;

const EOS: u64 = 0;
const LOCATION: u64 = 1;
const IDENTIFIER: u64 = 2;
const VID: u64 = 4;
const SIGNATURE: u64 = 6;

pub(super) fn encode(macaroon: &Macaroon) -> Vec<u8> {
    let mut out = vec![VERSION];

    if let Some(location) = macaroon.location() {
        write_field(&mut out, LOCATION, location.as_bytes());
    }
    write_field(&mut out, IDENTIFIER, macaroon.identifier());
    write_varint(&mut out, EOS);

    for caveat in macaroon.caveats() {
        write_field(&mut out, IDENTIFIER, caveat);
        write_varint(&mut out, EOS);
    }
    write_varint(&mut out, EOS);

    write_field(&mut out, SIGNATURE, macaroon.signature().as_bytes());
    out
}

pub(super) fn decode(data: &[u8]) -> Result<Macaroon, MacaroonError> {
    let mut reader = Reader { data };

    let mut field = reader.field()?.ok_or(MacaroonError::Missing("identifier"))?;
    let location = if field.kind == LOCATION {
        let location = String::from_utf8(field.value.to_vec())
            .map_err(|_| MacaroonError::InvalidUtf8("location"))?;
        field = reader.field()?.ok_or(MacaroonError::Missing("identifier"))?;
        Some(location)
    } else {
        None
    };
    let identifier = field.expect(IDENTIFIER)?.to_vec();
    reader.end_of_section()?;

    let mut caveats = Vec::new();
    while let Some(field) = reader.field()? {
        if field.kind == LOCATION {
            return Err(MacaroonError::ThirdPartyCaveat);
        }
        caveats.push(field.expect(IDENTIFIER)?.to_vec());
        match reader.field()? {
            None => {}
            Some(Field { kind: VID, .. }) => return Err(MacaroonError::ThirdPartyCaveat),
            Some(other) => {
                return Err(MacaroonError::UnexpectedField {
                    expected: EOS,
                    found: other.kind,
                });
            }
        }
    }

    let field = reader.field()?.ok_or(MacaroonError::Missing("signature"))?;
    let signature = Signature::try_from(field.expect(SIGNATURE)?)?;

    if !reader.data.is_empty() {
        return Err(MacaroonError::TrailingData);
    }

    Ok(Macaroon::from_parts(
        location,
        identifier,
        caveats,
        signature,
        Format::V2,
    ))
}

struct Field<'a> {
    kind: u64,
    value: &'a [u8],
}

impl<'a> Field<'a> {
    fn expect(self, kind: u64) -> Result<&'a [u8], MacaroonError> {
        if self.kind == kind {
            Ok(self.value)
        } else {
            Err(MacaroonError::UnexpectedField {
                expected: kind,
                found: self.kind,
            })
        }
    }
}

struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn varint(&mut self) -> Result<u64, MacaroonError> {
        leb128::read::unsigned(&mut self.data).map_err(|error| match error {
            leb128::read::Error::IoError(_) => MacaroonError::Truncated,
            other => MacaroonError::Varint(other.to_string()),
        })
    }

    /// Read the next field, or `None` at an end-of-section marker.
    fn field(&mut self) -> Result<Option<Field<'a>>, MacaroonError> {
        let kind = self.varint()?;
        if kind == EOS {
            return Ok(None);
        }

        let length = usize::try_from(self.varint()?).map_err(|_| MacaroonError::Truncated)?;
        if length > self.data.len() {
            return Err(MacaroonError::Truncated);
        }
        let (value, rest) = self.data.split_at(length);
        self.data = rest;

        Ok(Some(Field { kind, value }))
    }

    fn end_of_section(&mut self) -> Result<(), MacaroonError> {
        match self.field()? {
            None => Ok(()),
            Some(field) => Err(MacaroonError::UnexpectedField {
                expected: EOS,
                found: field.kind,
            }),
        }
    }
}

fn write_field(out: &mut Vec<u8>, kind: u64, value: &[u8]) {
    write_varint(out, kind);
    write_varint(out, value.len() as u64);
    out.extend_from_slice(value);
}

fn write_varint(out: &mut Vec<u8>, value: u64) {
    leb128::write::unsigned(out, value).expect("writing to a Vec cannot fail");
}
