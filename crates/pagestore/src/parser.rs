//! Append-log format parser using nom
//!
//! File format:
//! ```text
//! PGSTORE1\n
//! S <klen> <vlen>\n<key><value>\n     set record
//! R <klen>\n<key>\n                   remove record
//! ...
//! ```
//!
//! Lengths are decimal byte counts, so keys and values may contain
//! newlines or spaces without escaping.

use nom::{
    branch::alt,
    bytes::complete::{tag, take},
    character::complete::{char, digit1},
    combinator::map_res,
    sequence::{delimited, separated_pair},
    IResult,
};

use crate::error::{Result, StorageError};

/// Magic header for store log files
pub const STORE_MAGIC: &[u8] = b"PGSTORE1\n";

/// One entry of the append log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record<'a> {
    /// Key was written with a value
    Set {
        /// Raw key bytes
        key: &'a [u8],
        /// Raw value bytes
        value: &'a [u8],
    },
    /// Key was removed
    Remove {
        /// Raw key bytes
        key: &'a [u8],
    },
}

/// Strip and validate the magic header, returning the record section
pub fn parse_header(input: &[u8]) -> Result<&[u8]> {
    if input.len() < STORE_MAGIC.len() {
        return Err(StorageError::Corrupt("Input too short for header".to_string()));
    }

    if &input[..STORE_MAGIC.len()] != STORE_MAGIC {
        return Err(StorageError::Corrupt("Invalid store magic header".to_string()));
    }

    Ok(&input[STORE_MAGIC.len()..])
}

fn length(input: &[u8]) -> IResult<&[u8], usize> {
    map_res(digit1, |digits: &[u8]| {
        std::str::from_utf8(digits)
            .map_err(|_| ())
            .and_then(|s| s.parse::<usize>().map_err(|_| ()))
    })(input)
}

fn set_record(input: &[u8]) -> IResult<&[u8], Record<'_>> {
    let (input, (klen, vlen)) = delimited(
        tag("S "),
        separated_pair(length, char(' '), length),
        char('\n'),
    )(input)?;
    let (input, key) = take(klen)(input)?;
    let (input, value) = take(vlen)(input)?;
    let (input, _) = char('\n')(input)?;
    Ok((input, Record::Set { key, value }))
}

fn remove_record(input: &[u8]) -> IResult<&[u8], Record<'_>> {
    let (input, klen) = delimited(tag("R "), length, char('\n'))(input)?;
    let (input, key) = take(klen)(input)?;
    let (input, _) = char('\n')(input)?;
    Ok((input, Record::Remove { key }))
}

/// Parse a single log record
pub fn parse_record(input: &[u8]) -> IResult<&[u8], Record<'_>> {
    alt((set_record, remove_record))(input)
}

/// Parse every complete record in the section after the header.
///
/// Returns the records and the number of bytes they occupy. Anything past
/// that offset is a torn or garbled tail.
pub fn parse_records(input: &[u8]) -> (Vec<Record<'_>>, usize) {
    let mut records = Vec::new();
    let mut rest = input;

    while !rest.is_empty() {
        match parse_record(rest) {
            Ok((remaining, record)) => {
                records.push(record);
                rest = remaining;
            }
            Err(_) => break,
        }
    }

    (records, input.len() - rest.len())
}

/// Encode a set record
pub fn encode_set(key: &str, value: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(key.len() + value.len() + 24);
    buf.extend_from_slice(format!("S {} {}\n", key.len(), value.len()).as_bytes());
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(value.as_bytes());
    buf.push(b'\n');
    buf
}

/// Encode a remove record
pub fn encode_remove(key: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(key.len() + 16);
    buf.extend_from_slice(format!("R {}\n", key.len()).as_bytes());
    buf.extend_from_slice(key.as_bytes());
    buf.push(b'\n');
    buf
}
