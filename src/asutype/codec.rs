//! UTF-16 line codec for `asutype.config`

use crate::error::{UserDataError, UserDataResult};

const BOM_LE: [u8; 2] = [0xFF, 0xFE];
const BOM_BE: [u8; 2] = [0xFE, 0xFF];

/// Decode a UTF-16 config into lines
///
/// Honours either byte-order mark; without one the data is taken as
/// little-endian. A trailing line break does not produce an empty last line.
pub fn decode_lines(bytes: &[u8]) -> UserDataResult<Vec<String>> {
    let (body, big_endian) = if bytes.starts_with(&BOM_LE) {
        (&bytes[2..], false)
    } else if bytes.starts_with(&BOM_BE) {
        (&bytes[2..], true)
    } else {
        (bytes, false)
    };

    if body.len() % 2 != 0 {
        return Err(UserDataError::Validation(
            "config has an odd number of bytes for UTF-16".into(),
        ));
    }

    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();

    let text = String::from_utf16(&units)
        .map_err(|e| UserDataError::Validation(format!("config is not valid UTF-16: {}", e)))?;

    let mut lines: Vec<String> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect();
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    Ok(lines)
}

/// Encode lines as UTF-16LE with a BOM, each line ending in CRLF
pub fn encode_lines(lines: &[String]) -> Vec<u8> {
    let mut bytes = BOM_LE.to_vec();
    for line in lines {
        for unit in line.encode_utf16().chain("\r\n".encode_utf16()) {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
    }
    bytes
}
