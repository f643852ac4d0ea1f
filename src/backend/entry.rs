//! Binary layout of a single on-disk entry.
//!
//! ```text
//! [format version: u8][tag: u8][payload ...][crc32 of the preceding bytes: u32 LE]
//! ```
//!
//! | tag | kind   | payload          |
//! |-----|--------|------------------|
//! | 0   | int    | i32 LE           |
//! | 1   | long   | i64 LE           |
//! | 2   | float  | f64 LE           |
//! | 3   | bool   | u8 (0 or 1)      |
//! | 4   | string | UTF-8 bytes      |

use crate::value::Primitive;

/// Current entry format version.
pub const ENTRY_VERSION: u8 = 1;

const TAG_INT: u8 = 0;
const TAG_LONG: u8 = 1;
const TAG_FLOAT: u8 = 2;
const TAG_BOOL: u8 = 3;
const TAG_STRING: u8 = 4;

const HEADER_LEN: usize = 2;
const CHECKSUM_LEN: usize = 4;

/// Encodes a primitive into its on-disk bytes.
pub fn encode(value: &Primitive) -> Vec<u8> {
    let (tag, payload): (u8, Vec<u8>) = match value {
        Primitive::Int(v) => (TAG_INT, v.to_le_bytes().to_vec()),
        Primitive::Long(v) => (TAG_LONG, v.to_le_bytes().to_vec()),
        Primitive::Float(v) => (TAG_FLOAT, v.to_le_bytes().to_vec()),
        Primitive::Bool(v) => (TAG_BOOL, vec![u8::from(*v)]),
        Primitive::String(v) => (TAG_STRING, v.as_bytes().to_vec()),
    };

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len() + CHECKSUM_LEN);
    bytes.push(ENTRY_VERSION);
    bytes.push(tag);
    bytes.extend_from_slice(&payload);
    let checksum = crc32fast::hash(&bytes);
    bytes.extend_from_slice(&checksum.to_le_bytes());
    bytes
}

/// Decodes on-disk bytes. The error is a human-readable reason.
pub fn decode(bytes: &[u8]) -> Result<Primitive, String> {
    if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(format!("entry too short ({} bytes)", bytes.len()));
    }

    let (body, checksum_bytes) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    let stored_checksum = u32::from_le_bytes(
        checksum_bytes
            .try_into()
            .map_err(|_| "invalid checksum field".to_string())?,
    );
    let actual_checksum = crc32fast::hash(body);
    if stored_checksum != actual_checksum {
        return Err(format!(
            "checksum mismatch: stored {stored_checksum:#010x}, computed {actual_checksum:#010x}"
        ));
    }

    let (header, payload) = body.split_at(HEADER_LEN);
    let [version, tag] = header else {
        return Err("invalid header".to_string());
    };
    if *version != ENTRY_VERSION {
        return Err(format!(
            "unsupported entry version {version}, expected {ENTRY_VERSION}"
        ));
    }

    match *tag {
        TAG_INT => fixed::<4>(payload).map(|b| Primitive::Int(i32::from_le_bytes(b))),
        TAG_LONG => fixed::<8>(payload).map(|b| Primitive::Long(i64::from_le_bytes(b))),
        TAG_FLOAT => fixed::<8>(payload).map(|b| Primitive::Float(f64::from_le_bytes(b))),
        TAG_BOOL => match payload {
            [0] => Ok(Primitive::Bool(false)),
            [1] => Ok(Primitive::Bool(true)),
            _ => Err("invalid bool payload".to_string()),
        },
        TAG_STRING => String::from_utf8(payload.to_vec())
            .map(Primitive::String)
            .map_err(|e| format!("invalid UTF-8: {e}")),
        other => Err(format!("unknown tag {other}")),
    }
}

fn fixed<const N: usize>(payload: &[u8]) -> Result<[u8; N], String> {
    payload
        .try_into()
        .map_err(|_| format!("expected {N} payload bytes, got {}", payload.len()))
}
