//! Line-oriented text encoding of exchanged records.
//!
//! A record is a fixed number of unsigned integers, one per line, written as
//! uppercase hexadecimal. Readers also accept a `0x` prefix, and decimal
//! values when the line starts with `dec:`.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use num_bigint::BigUint;
use num_traits::Num;
use zeroize::Zeroizing;

use crate::errors::{Error, Result};

/// A value one party hands to the other.
pub trait Record: Sized {
    /// Name the record is stored under, e.g. its file name.
    const NAME: &'static str;

    /// Number of integers in the record.
    const LINES: usize;

    /// Whether the record carries private exponent material.
    const SECRET: bool = false;

    /// Integers in storage order.
    fn to_values(&self) -> Vec<&BigUint>;

    /// Rebuilds the record from exactly [`Record::LINES`] integers. Values
    /// may be taken out of the slice.
    fn from_values(values: &mut [BigUint]) -> Result<Self>;
}

/// Encodes `record` as newline-terminated hexadecimal lines.
pub fn encode<T: Record>(record: &T) -> Zeroizing<String> {
    let mut out = Zeroizing::new(String::new());
    for value in record.to_values() {
        // writing to a String cannot fail
        let _ = writeln!(out, "{:X}", value);
    }
    out
}

/// Decodes a record previously written by [`encode`].
pub fn decode<T: Record>(text: &str) -> Result<T> {
    let mut lines: Vec<&str> = text.lines().map(str::trim).collect();
    while lines.last().map_or(false, |line| line.is_empty()) {
        lines.pop();
    }

    if lines.len() != T::LINES {
        return Err(Error::Parse {
            record: T::NAME,
            reason: format!("expected {} values, found {} lines", T::LINES, lines.len()),
        });
    }

    let mut values = Zeroizing::new(Vec::with_capacity(T::LINES));
    for (i, line) in lines.iter().enumerate() {
        let value = parse_uint(line).ok_or_else(|| Error::Parse {
            record: T::NAME,
            reason: if line.is_empty() {
                format!("line {} is empty", i + 1)
            } else {
                format!("line {} is not an unsigned integer", i + 1)
            },
        })?;
        values.push(value);
    }

    T::from_values(&mut values)
}

/// Parses one integer line: hexadecimal by default, `dec:` for decimal.
pub fn parse_uint(line: &str) -> Option<BigUint> {
    let line = line.trim();
    let (digits, radix) = if let Some(rest) = line.strip_prefix("dec:") {
        (rest.trim(), 10)
    } else if let Some(rest) = line
        .strip_prefix("0x")
        .or_else(|| line.strip_prefix("0X"))
    {
        (rest, 16)
    } else {
        (line, 16)
    };

    if digits.is_empty() || digits.starts_with('+') || digits.starts_with('_') {
        return None;
    }
    BigUint::from_str_radix(digits, radix).ok()
}
