//! Reading values back out of the generated assembly.

use std::collections::HashSet;

use kconst_types::ConstantMap;

use crate::error::ProbeError;
use crate::unit::MARKER;

/// Extract `MARKER <name> <hi> <lo>` lines for `symbols` from assembly text.
///
/// Each half is printed by the compiler as a plain immediate and may come out
/// signed (GCC prints `0xffffffff` as `-1` for 32-bit operands), so halves are
/// masked to 32 bits before being combined.
pub fn parse_markers(assembly: &str, symbols: &[&str]) -> Result<ConstantMap, ProbeError> {
    let wanted: HashSet<&str> = symbols.iter().copied().collect();
    let mut consts = ConstantMap::new();

    for line in assembly.lines() {
        let Some(idx) = line.find(MARKER) else {
            continue;
        };
        let rest = line[idx + MARKER.len()..].trim();
        let mut fields = rest.split_whitespace();
        let (Some(name), Some(hi), Some(lo)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(ProbeError::MalformedValue {
                symbol: rest.split_whitespace().next().unwrap_or("").to_string(),
                output: line.trim().to_string(),
            });
        };
        if !wanted.contains(name) {
            continue;
        }

        let malformed = || ProbeError::MalformedValue {
            symbol: name.to_string(),
            output: line.trim().to_string(),
        };
        let hi = parse_half(hi).ok_or_else(malformed)?;
        let lo = parse_half(lo).ok_or_else(malformed)?;
        let value = (u64::from(hi) << 32) | u64::from(lo);

        if let Some(previous) = consts.insert(name.to_string(), value) {
            if previous != value {
                return Err(malformed());
            }
        }
    }

    if let Some(missing) = symbols.iter().find(|s| !consts.contains_key(**s)) {
        return Err(ProbeError::MalformedValue {
            symbol: missing.to_string(),
            output: "no value marker in toolchain output".to_string(),
        });
    }
    Ok(consts)
}

/// Parse one 32-bit half: decimal or `0x` hex, optionally negative (and
/// then two's complement). Anything outside `[-2^31, 2^32)` is rejected.
fn parse_half(text: &str) -> Option<u32> {
    // Some assemblers print immediates with a sigil.
    let text = text.trim_start_matches(['$', '#']);
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u64>().ok()?,
    };
    if negative {
        if magnitude > 1 << 31 {
            return None;
        }
        Some((magnitude as u32).wrapping_neg())
    } else {
        u32::try_from(magnitude).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_markers_gcc_style() {
        let asm = "\
\t.file\t\"kconst_probe.c\"
#APP
# 6 \"kconst_probe.c\" 1
\t@@KCONST@@ EINVAL 0 22
# 0 \"\" 2
#NO_APP
#APP
\t@@KCONST@@ O_NONBLOCK 0 2048
#NO_APP
";
        let consts = parse_markers(asm, &["EINVAL", "O_NONBLOCK"]).unwrap();
        assert_eq!(consts.get("EINVAL"), Some(&22));
        assert_eq!(consts.get("O_NONBLOCK"), Some(&2048));
        assert_eq!(consts.len(), 2);
    }

    #[test]
    fn test_negative_and_wide_values() {
        let asm = "\
@@KCONST@@ AT_FDCWD -1 -100
@@KCONST@@ BIG 1 0x0
@@KCONST@@ ALL_ONES 4294967295 -1
";
        let consts = parse_markers(asm, &["AT_FDCWD", "BIG", "ALL_ONES"]).unwrap();
        assert_eq!(consts["AT_FDCWD"], (-100i64) as u64);
        assert_eq!(consts["BIG"], 1 << 32);
        assert_eq!(consts["ALL_ONES"], u64::MAX);
    }

    #[test]
    fn test_sigils_are_tolerated() {
        let consts = parse_markers("@@KCONST@@ X $0 #7\n", &["X"]).unwrap();
        assert_eq!(consts["X"], 7);
    }

    #[test]
    fn test_missing_marker() {
        let err = parse_markers("@@KCONST@@ A 0 1\n", &["A", "B"]).unwrap_err();
        assert_eq!(
            err,
            ProbeError::MalformedValue {
                symbol: "B".to_string(),
                output: "no value marker in toolchain output".to_string(),
            }
        );
    }

    #[test]
    fn test_non_numeric_and_oversized_halves() {
        let err = parse_markers("@@KCONST@@ A 0 foo\n", &["A"]).unwrap_err();
        assert!(matches!(err, ProbeError::MalformedValue { ref symbol, .. } if symbol == "A"));

        let err = parse_markers("@@KCONST@@ A 4294967296 0\n", &["A"]).unwrap_err();
        assert!(matches!(err, ProbeError::MalformedValue { .. }));

        let err = parse_markers("@@KCONST@@ A 0\n", &["A"]).unwrap_err();
        assert!(matches!(err, ProbeError::MalformedValue { .. }));
    }

    #[test]
    fn test_conflicting_duplicate_marker() {
        let asm = "@@KCONST@@ A 0 1\n@@KCONST@@ A 0 1\n";
        assert_eq!(parse_markers(asm, &["A"]).unwrap()["A"], 1);

        let asm = "@@KCONST@@ A 0 1\n@@KCONST@@ A 0 2\n";
        assert!(parse_markers(asm, &["A"]).is_err());
    }
}
