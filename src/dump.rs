//! Read captured descriptor dumps, either raw binary or hex text
//!
//! Hex text is whitespace or comma separated bytes, with or without `0x`, and runs of digits
//! are split into bytes: `09 02 19 00`, `0x09,0x02` and `09021900` are all the same. Anything
//! after `#` on a line is a comment.
use std::fs;
use std::path::Path;

use crate::error::{Error, ErrorKind, Result};

/// Decode hex text into bytes
///
/// ```
/// use uvcscan::dump::parse_hex;
///
/// assert_eq!(parse_hex("09 02 # config\n0x19,0x00").unwrap(), vec![0x09, 0x02, 0x19, 0x00]);
/// assert_eq!(parse_hex("0902").unwrap(), vec![0x09, 0x02]);
/// assert!(parse_hex("090").is_err());
/// ```
pub fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let mut ret = Vec::new();

    for (n, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default();
        for token in line.split(|c: char| c.is_whitespace() || c == ',') {
            let token = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            if token.is_empty() {
                continue;
            }
            if token.len() % 2 != 0 || !token.is_ascii() {
                return Err(Error::new(
                    ErrorKind::Parsing,
                    &format!("line {}: '{}' is not whole hex bytes", n + 1, token),
                ));
            }
            ret.try_reserve(token.len() / 2)?;
            for i in (0..token.len()).step_by(2) {
                ret.push(u8::from_str_radix(&token[i..i + 2], 16)?);
            }
        }
    }

    Ok(ret)
}

/// Whether `data` is hex text [`parse_hex`] accepts rather than a binary dump
pub fn is_hex_text(data: &[u8]) -> bool {
    std::str::from_utf8(data)
        .ok()
        .filter(|s| s.chars().any(|c| c.is_ascii_hexdigit()))
        .map(|s| parse_hex(s).is_ok())
        .unwrap_or(false)
}

/// Read a dump file, decoding hex text if `hex` or if the content looks like it
pub fn read_dump<P: AsRef<Path>>(path: P, hex: bool) -> Result<Vec<u8>> {
    let data = fs::read(path.as_ref())?;

    if hex || is_hex_text(&data) {
        log::debug!("Reading {:?} as hex text", path.as_ref());
        let text = String::from_utf8(data).map_err(|e| {
            Error::new(
                ErrorKind::Parsing,
                &format!("{:?} is not text: {}", path.as_ref(), e),
            )
        })?;
        parse_hex(&text)
    } else {
        log::debug!("Reading {:?} as binary", path.as_ref());
        Ok(data)
    }
}
