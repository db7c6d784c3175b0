//! libmacaroons V1 packet layout.
//!
//! A V1 macaroon is a sequence of packets. Each packet is a 4 digit
//! lowercase hex length (counting the header itself), a key, a space, the
//! value and a newline. Packets appear in the order `location`,
//! `identifier`, `cid` per caveat, then `signature`.

use std::io::Write;

use crate::{Format, Macaroon, MacaroonError, Signature};

const HEADER_SIZE: usize = 4;
const MAX_PACKET_SIZE: usize = 0xFFFF;

const LOCATION: &str = "location";
const IDENTIFIER: &str = "identifier";
const CID: &str = "cid";
const VID: &str = "vid";
const CL: &str = "cl";
const SIGNATURE: &str = "signature";

/// Reject values whose packet would not fit the length header.
pub(crate) fn ensure_fits(key: &str, value: &[u8]) -> Result<(), MacaroonError> {
    let size = packet_size(key, value);
    if size > MAX_PACKET_SIZE {
        return Err(MacaroonError::PacketTooLarge(size));
    }
    Ok(())
}

/// Checks every packet of `macaroon` against the V1 size limit.
pub(crate) fn ensure_macaroon_fits(macaroon: &Macaroon) -> Result<(), MacaroonError> {
    if let Some(location) = macaroon.location() {
        ensure_fits(LOCATION, location.as_bytes())?;
    }
    ensure_fits(IDENTIFIER, macaroon.identifier())?;
    for caveat in macaroon.caveats() {
        ensure_fits(CID, caveat)?;
    }
    Ok(())
}

pub(super) fn encode(macaroon: &Macaroon) -> Vec<u8> {
    let mut out = Vec::new();

    if let Some(location) = macaroon.location() {
        write_packet(&mut out, LOCATION, location.as_bytes());
    }
    write_packet(&mut out, IDENTIFIER, macaroon.identifier());
    for caveat in macaroon.caveats() {
        write_packet(&mut out, CID, caveat);
    }
    write_packet(&mut out, SIGNATURE, macaroon.signature().as_bytes());
    out
}

pub(super) fn decode(data: &[u8]) -> Result<Macaroon, MacaroonError> {
    let mut packets = Packets { data };

    let mut packet = packets.next()?.ok_or(MacaroonError::Missing("identifier"))?;
    let location = if packet.key == LOCATION {
        let location = String::from_utf8(packet.value.to_vec())
            .map_err(|_| MacaroonError::InvalidUtf8("location"))?;
        packet = packets.next()?.ok_or(MacaroonError::Missing("identifier"))?;
        Some(location)
    } else {
        None
    };
    let identifier = packet.expect(IDENTIFIER)?.to_vec();

    let mut caveats = Vec::new();
    let signature = loop {
        let packet = packets.next()?.ok_or(MacaroonError::Missing("signature"))?;
        match packet.key {
            CID => caveats.push(packet.value.to_vec()),
            VID | CL => return Err(MacaroonError::ThirdPartyCaveat),
            SIGNATURE => break Signature::try_from(packet.value)?,
            other => {
                return Err(MacaroonError::InvalidPacket(format!(
                    "unexpected key {other:?}"
                )));
            }
        }
    };

    if !packets.data.is_empty() {
        return Err(MacaroonError::TrailingData);
    }

    Ok(Macaroon::from_parts(
        location,
        identifier,
        caveats,
        signature,
        Format::V1,
    ))
}

fn packet_size(key: &str, value: &[u8]) -> usize {
    HEADER_SIZE + key.len() + 1 + value.len() + 1
}

fn write_packet(out: &mut Vec<u8>, key: &str, value: &[u8]) {
    let size = packet_size(key, value);
    write!(out, "{size:04x}{key} ").expect("writing to a Vec cannot fail");
    out.extend_from_slice(value);
    out.push(b'\n');
}

struct Packet<'a> {
    key: &'a str,
    value: &'a [u8],
}

impl<'a> Packet<'a> {
    fn expect(self, key: &str) -> Result<&'a [u8], MacaroonError> {
        if self.key == key {
            Ok(self.value)
        } else {
            Err(MacaroonError::InvalidPacket(format!(
                "expected {key:?}, found {:?}",
                self.key
            )))
        }
    }
}

struct Packets<'a> {
    data: &'a [u8],
}

impl<'a> Packets<'a> {
    fn next(&mut self) -> Result<Option<Packet<'a>>, MacaroonError> {
        if self.data.is_empty() {
            return Ok(None);
        }
        if self.data.len() < HEADER_SIZE {
            return Err(MacaroonError::Truncated);
        }

        let mut header = [0u8; HEADER_SIZE / 2];
        hex::decode_to_slice(&self.data[..HEADER_SIZE], &mut header).map_err(|error| {
            MacaroonError::InvalidPacket(format!("length header is not hexadecimal: {error}"))
        })?;
        let size = usize::from(u16::from_be_bytes(header));
        if size < HEADER_SIZE + 2 {
            return Err(MacaroonError::InvalidPacket(format!(
                "packet length {size} is too short"
            )));
        }
        if size > self.data.len() {
            return Err(MacaroonError::Truncated);
        }

        let (packet, rest) = self.data.split_at(size);
        self.data = rest;

        let body = match packet[HEADER_SIZE..].split_last() {
            Some((b'\n', body)) => body,
            _ => {
                return Err(MacaroonError::InvalidPacket(
                    "packet does not end with a newline".into(),
                ));
            }
        };
        let separator = body
            .iter()
            .position(|byte| *byte == b' ')
            .ok_or_else(|| MacaroonError::InvalidPacket("packet has no key".into()))?;
        let key = std::str::from_utf8(&body[..separator])
            .map_err(|_| MacaroonError::InvalidUtf8("packet key"))?;

        Ok(Some(Packet {
            key,
            value: &body[separator + 1..],
        }))
    }
}
