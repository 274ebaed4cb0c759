//! Header Map Codec
//!
//! Wire format shared with the host for header/trailer maps:
//!
//! ```text
//! [N:u32le] ([key_len:u32le][value_len:u32le]) * N  (key \0 value \0) * N
//! ```
//!
//! Pair order is preserved and duplicate keys are kept; the host decides
//! merge semantics.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Size of the pair-count prefix
const COUNT_SIZE: usize = 4;
/// Size of one (key_len, value_len) entry in the size table
const SIZE_ENTRY: usize = 8;

/// Malformed header map payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// Payload ends before the declared content
    Truncated { needed: usize, actual: usize },
    /// Byte after a key or value is not NUL
    MissingTerminator { offset: usize },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Truncated { needed, actual } => write!(
                f,
                "header map truncated: need {} bytes, got {}",
                needed, actual
            ),
            MapError::MissingTerminator { offset } => {
                write!(f, "header map missing NUL terminator at offset {}", offset)
            }
        }
    }
}

impl std::error::Error for MapError {}

/// Number of bytes `encode` produces for `pairs`
pub fn encoded_len<K: AsRef<[u8]>, V: AsRef<[u8]>>(pairs: &[(K, V)]) -> usize {
    pairs.iter().fold(COUNT_SIZE, |acc, (k, v)| {
        acc + SIZE_ENTRY + k.as_ref().len() + v.as_ref().len() + 2
    })
}

/// Serialize pairs into the host wire format.
///
/// An empty map encodes to exactly four zero bytes.
pub fn encode<K: AsRef<[u8]>, V: AsRef<[u8]>>(pairs: &[(K, V)]) -> Bytes {
    let mut buf = BytesMut::with_capacity(encoded_len(pairs));
    buf.put_u32_le(pairs.len() as u32);
    for (k, v) in pairs {
        buf.put_u32_le(k.as_ref().len() as u32);
        buf.put_u32_le(v.as_ref().len() as u32);
    }
    for (k, v) in pairs {
        buf.put_slice(k.as_ref());
        buf.put_u8(0);
        buf.put_slice(v.as_ref());
        buf.put_u8(0);
    }
    buf.freeze()
}

/// Deserialize a host map into raw byte pairs
pub fn decode_bytes(data: &[u8]) -> Result<Vec<(Bytes, Bytes)>, MapError> {
    if data.len() < COUNT_SIZE {
        return Err(MapError::Truncated {
            needed: COUNT_SIZE,
            actual: data.len(),
        });
    }

    let mut sizes = data;
    let count = sizes.get_u32_le() as usize;
    let table_end = count
        .checked_mul(SIZE_ENTRY)
        .and_then(|n| n.checked_add(COUNT_SIZE))
        .unwrap_or(usize::MAX);
    if data.len() < table_end {
        return Err(MapError::Truncated {
            needed: table_end,
            actual: data.len(),
        });
    }

    let mut pairs = Vec::with_capacity(count);
    let mut pos = table_end;
    for _ in 0..count {
        let key_len = sizes.get_u32_le() as usize;
        let value_len = sizes.get_u32_le() as usize;
        let key = read_field(data, &mut pos, key_len)?;
        let value = read_field(data, &mut pos, value_len)?;
        pairs.push((key, value));
    }

    Ok(pairs)
}

/// Deserialize a host map into string pairs.
///
/// Non UTF-8 bytes are replaced rather than rejected.
pub fn decode(data: &[u8]) -> Result<Vec<(String, String)>, MapError> {
    Ok(decode_bytes(data)?
        .into_iter()
        .map(|(k, v)| {
            (
                String::from_utf8_lossy(&k).into_owned(),
                String::from_utf8_lossy(&v).into_owned(),
            )
        })
        .collect())
}

/// Read `len` bytes at `pos` followed by exactly one NUL
fn read_field(data: &[u8], pos: &mut usize, len: usize) -> Result<Bytes, MapError> {
    let end = pos.saturating_add(len);
    if end >= data.len() {
        return Err(MapError::Truncated {
            needed: end.saturating_add(1),
            actual: data.len(),
        });
    }
    if data[end] != 0 {
        return Err(MapError::MissingTerminator { offset: end });
    }
    let field = Bytes::copy_from_slice(&data[*pos..end]);
    *pos = end + 1;
    Ok(field)
}

/// Encode a property path as NUL separated segments
pub fn serialize_property_path(path: &[&str]) -> Bytes {
    let len = path.iter().map(|p| p.len() + 1).sum::<usize>();
    let mut buf = BytesMut::with_capacity(len);
    for (i, segment) in path.iter().enumerate() {
        if i > 0 {
            buf.put_u8(0);
        }
        buf.put_slice(segment.as_bytes());
    }
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_map_is_four_zero_bytes() {
        let pairs: Vec<(&str, &str)> = Vec::new();
        assert_eq!(&encode(&pairs)[..], &[0, 0, 0, 0]);
        assert_eq!(decode(&[0, 0, 0, 0]).unwrap(), Vec::<(String, String)>::new());
    }

    #[test]
    fn test_encode_layout() {
        let encoded = encode(&[(":path", "/foo"), ("x-key", "v")]);
        let mut expected = Vec::new();
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(&5u32.to_le_bytes());
        expected.extend_from_slice(&4u32.to_le_bytes());
        expected.extend_from_slice(&5u32.to_le_bytes());
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(b":path\0/foo\0x-key\0v\0");
        assert_eq!(&encoded[..], &expected[..]);
        assert_eq!(encoded.len(), encoded_len(&[(":path", "/foo"), ("x-key", "v")]));
    }

    #[test]
    fn test_first_key_starts_after_size_table() {
        let encoded = encode(&[("a", "1"), ("b", "2"), ("c", "3")]);
        assert_eq!(encoded[4 + 8 * 3], b'a');
    }

    #[test]
    fn test_decode_preserves_order_and_duplicates() {
        let pairs = vec![
            ("set-cookie".to_string(), "a=1".to_string()),
            ("x".to_string(), String::new()),
            ("set-cookie".to_string(), "b=2".to_string()),
        ];
        assert_eq!(decode(&encode(&pairs)).unwrap(), pairs);
    }

    #[test]
    fn test_decode_rejects_short_size_table() {
        let mut data = Vec::new();
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 8]);
        assert_eq!(
            decode(&data),
            Err(MapError::Truncated { needed: 20, actual: 12 })
        );
        assert!(decode(&[1, 0]).is_err());
    }

    #[test]
    fn test_decode_rejects_missing_terminator() {
        let mut data = encode(&[("k", "v")]).to_vec();
        // overwrite the NUL following the key
        data[13] = b'!';
        assert_eq!(decode(&data), Err(MapError::MissingTerminator { offset: 13 }));
    }

    #[test]
    fn test_decode_rejects_truncated_trailing_nul() {
        let mut data = encode(&[("k", "v")]).to_vec();
        data.pop();
        assert!(matches!(decode(&data), Err(MapError::Truncated { .. })));
    }

    #[test]
    fn test_decode_huge_count_does_not_overflow() {
        let data = u32::MAX.to_le_bytes();
        assert!(matches!(decode(&data), Err(MapError::Truncated { .. })));
    }

    #[test]
    fn test_serialize_property_path() {
        assert_eq!(&serialize_property_path(&["request", "path"])[..], b"request\0path");
        assert!(serialize_property_path(&[]).is_empty());
    }
}
