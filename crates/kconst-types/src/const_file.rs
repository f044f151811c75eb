//! Constant file codec.
//!
//! The on-disk format is line oriented and meant to be checked into version
//! control, so the encoding must be byte-stable:
//!
//! ```text
//! # AUTOGENERATED FILE
//! EINVAL = 22
//! O_NONBLOCK = 2048
//! ```
//!
//! Names are written in ascending byte order and values in canonical decimal.
//! An empty map encodes to the header line alone.

use crate::error::ExtractError;
use crate::requirements::ConstantMap;

/// First line of every generated constant file.
pub const HEADER: &str = "# AUTOGENERATED FILE";

/// Encode a constant map.
pub fn serialize(consts: &ConstantMap) -> Vec<u8> {
    let mut out = String::with_capacity(HEADER.len() + 1 + consts.len() * 24);
    out.push_str(HEADER);
    out.push('\n');
    // BTreeMap iterates in key order, which is what keeps the output stable.
    for (name, value) in consts {
        out.push_str(name);
        out.push_str(" = ");
        out.push_str(&value.to_string());
        out.push('\n');
    }
    out.into_bytes()
}

/// Decode a constant file produced by [`serialize`].
///
/// Blank lines and `#` comments are ignored, so hand-edited files still load.
pub fn deserialize(data: &[u8]) -> Result<ConstantMap, ExtractError> {
    let text = std::str::from_utf8(data).map_err(|e| ExtractError::CorruptFormat {
        line: line_of_offset(data, e.valid_up_to()),
        reason: "invalid UTF-8".to_string(),
    })?;

    let mut consts = ConstantMap::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let corrupt = |reason: String| ExtractError::CorruptFormat { line, reason };

        let (name, value) = trimmed
            .split_once('=')
            .ok_or_else(|| corrupt(format!("expected `NAME = VALUE`, got {:?}", trimmed)))?;
        let name = name.trim();
        let value = value.trim();

        if !is_identifier(name) {
            return Err(corrupt(format!("invalid constant name {:?}", name)));
        }
        let value: u64 = value
            .parse()
            .map_err(|_| corrupt(format!("invalid value {:?} for {}", value, name)))?;
        if consts.insert(name.to_string(), value).is_some() {
            return Err(corrupt(format!("duplicate constant {}", name)));
        }
    }
    Ok(consts)
}

/// C identifier check: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn line_of_offset(data: &[u8], offset: usize) -> usize {
    data[..offset].iter().filter(|&&b| b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, u64)]) -> ConstantMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_serialize_layout() {
        let consts = map(&[("O_NONBLOCK", 2048), ("EINVAL", 22)]);
        let text = String::from_utf8(serialize(&consts)).unwrap();
        assert_eq!(text, "# AUTOGENERATED FILE\nEINVAL = 22\nO_NONBLOCK = 2048\n");
    }

    #[test]
    fn test_empty_map() {
        let bytes = serialize(&ConstantMap::new());
        assert_eq!(bytes, b"# AUTOGENERATED FILE\n");
        assert!(deserialize(&bytes).unwrap().is_empty());
        assert!(deserialize(b"").unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_with_extremes() {
        let consts = map(&[
            ("ZERO", 0),
            ("MAX", u64::MAX),
            ("AT_FDCWD", (-100i64) as u64),
            ("__NR_read", 0),
        ]);
        assert_eq!(deserialize(&serialize(&consts)).unwrap(), consts);
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut a = ConstantMap::new();
        a.insert("B".to_string(), 2);
        a.insert("A".to_string(), 1);
        a.insert("C".to_string(), 3);

        let mut b = ConstantMap::new();
        b.insert("C".to_string(), 3);
        b.insert("A".to_string(), 1);
        b.insert("B".to_string(), 2);

        assert_eq!(serialize(&a), serialize(&b));
    }

    #[test]
    fn test_deserialize_tolerates_comments_and_spacing() {
        let data = b"# header\n\n  EINVAL=22  \n# trailing comment\nEPERM =   1\n";
        let consts = deserialize(data).unwrap();
        assert_eq!(consts, map(&[("EINVAL", 22), ("EPERM", 1)]));
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        let err = deserialize(b"# AUTOGENERATED FILE\nEINVAL 22\n").unwrap_err();
        assert!(matches!(err, ExtractError::CorruptFormat { line: 2, .. }));

        let err = deserialize(b"EINVAL = twenty\n").unwrap_err();
        assert!(matches!(err, ExtractError::CorruptFormat { line: 1, .. }));

        let err = deserialize(b"EINVAL = 18446744073709551616\n").unwrap_err();
        assert!(matches!(err, ExtractError::CorruptFormat { line: 1, .. }));

        let err = deserialize(b"1BAD = 3\n").unwrap_err();
        assert!(matches!(err, ExtractError::CorruptFormat { line: 1, .. }));
    }

    #[test]
    fn test_deserialize_rejects_duplicates() {
        let err = deserialize(b"A = 1\nA = 1\n").unwrap_err();
        assert!(matches!(err, ExtractError::CorruptFormat { line: 2, .. }));
    }

    #[test]
    fn test_deserialize_rejects_invalid_utf8() {
        let err = deserialize(b"A = 1\n\xff = 2\n").unwrap_err();
        assert!(matches!(err, ExtractError::CorruptFormat { line: 2, .. }));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("__NR_read"));
        assert!(is_identifier("O_NONBLOCK"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("9LIVES"));
        assert!(!is_identifier("A-B"));
    }
}
