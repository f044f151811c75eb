//! Compiler diagnostic parsing.
//!
//! GCC and Clang both report `file:line:col: severity: message`. Errors are
//! grouped with the notes that follow them, and a group is blamed on a probe
//! symbol when the error or one of its notes points at that symbol's line in
//! the probe source. Clang puts the error on the use site; GCC often puts it
//! inside the header and adds an "in expansion of macro" note on the use site.

use std::collections::BTreeSet;
use std::path::Path;

use crate::unit::{ProbeUnit, PROBE_SOURCE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerDiagnostic {
    pub file: String,
    pub line: Option<usize>,
    pub severity: Severity,
    pub message: String,
    /// The complete original line.
    pub raw: String,
}

/// Outcome of attributing a failed compilation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Attribution {
    /// Symbols the compiler could not evaluate.
    pub symbols: BTreeSet<String>,
    /// Errors not tied to any symbol line.
    pub unattributed: Vec<String>,
}

const SEVERITIES: &[(&str, Severity)] = &[
    (": fatal error: ", Severity::Error),
    (": error: ", Severity::Error),
    (": warning: ", Severity::Warning),
    (": note: ", Severity::Note),
];

/// Parse one line of compiler output. Lines that are not diagnostics
/// ("In file included from", source excerpts, carets) yield `None`.
pub fn parse_line(line: &str) -> Option<CompilerDiagnostic> {
    let (idx, marker, severity) = SEVERITIES
        .iter()
        .find_map(|(marker, severity)| line.find(marker).map(|idx| (idx, *marker, *severity)))?;
    let location = &line[..idx];
    let message = line[idx + marker.len()..].trim().to_string();

    let parts: Vec<&str> = location.rsplitn(3, ':').collect();
    let is_num = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let (file, line_no) = match parts.as_slice() {
        [col, line_no, file] if is_num(col) && is_num(line_no) => {
            (file.to_string(), line_no.parse().ok())
        }
        [line_no, rest @ ..] if is_num(line_no) && !rest.is_empty() => {
            // `file:line:` without a column; rsplitn put the file back together
            // only partially, so rebuild from the location string.
            let file = &location[..location.len() - line_no.len() - 1];
            (file.to_string(), line_no.parse().ok())
        }
        _ => (location.to_string(), None),
    };

    Some(CompilerDiagnostic {
        file,
        line: line_no,
        severity,
        message,
        raw: line.to_string(),
    })
}

/// Parse all diagnostics from compiler stderr.
pub fn parse(stderr: &str) -> Vec<CompilerDiagnostic> {
    stderr.lines().filter_map(parse_line).collect()
}

fn symbol_at<'u>(unit: &'u ProbeUnit, diag: &CompilerDiagnostic) -> Option<&'u String> {
    let is_probe = Path::new(&diag.file)
        .file_name()
        .is_some_and(|name| name == PROBE_SOURCE);
    if !is_probe {
        return None;
    }
    unit.symbol_lines.get(&diag.line?)
}

/// Blame each error group on a probe symbol where possible.
pub fn attribute(stderr: &str, unit: &ProbeUnit) -> Attribution {
    let mut attribution = Attribution::default();
    let mut groups: Vec<Vec<CompilerDiagnostic>> = Vec::new();
    for diag in parse(stderr) {
        match diag.severity {
            Severity::Error => groups.push(vec![diag]),
            Severity::Note => {
                if let Some(group) = groups.last_mut() {
                    group.push(diag);
                }
            }
            Severity::Warning => {}
        }
    }

    for group in groups {
        match group.iter().find_map(|diag| symbol_at(unit, diag)) {
            Some(symbol) => {
                attribution.symbols.insert(symbol.clone());
            }
            None => attribution.unattributed.push(group[0].raw.clone()),
        }
    }
    attribution
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn unit() -> ProbeUnit {
        let mut symbol_lines = BTreeMap::new();
        symbol_lines.insert(6, "EINVAL".to_string());
        symbol_lines.insert(7, "ARCH_ONLY_CONST".to_string());
        symbol_lines.insert(8, "WRAPPED".to_string());
        ProbeUnit {
            source: String::new(),
            symbol_lines,
            args: Vec::new(),
        }
    }

    #[test]
    fn test_parse_line_forms() {
        let d = parse_line("kconst_probe.c:7:92: error: 'X' undeclared (first use in this function)")
            .unwrap();
        assert_eq!(d.file, "kconst_probe.c");
        assert_eq!(d.line, Some(7));
        assert_eq!(d.severity, Severity::Error);
        assert!(d.message.starts_with("'X' undeclared"));

        let d = parse_line("/k/include/a.h:3: fatal error: b.h: No such file or directory").unwrap();
        assert_eq!(d.file, "/k/include/a.h");
        assert_eq!(d.line, Some(3));
        assert_eq!(d.severity, Severity::Error);

        let d = parse_line("cc1: error: unrecognized command-line option '-mfoo'").unwrap();
        assert_eq!(d.file, "cc1");
        assert_eq!(d.line, None);

        assert!(parse_line("In file included from kconst_probe.c:3:").is_none());
        assert!(parse_line("    7 | void __kconst_probe_1(void) { ... }").is_none());
    }

    #[test]
    fn test_attribute_gcc_undeclared() {
        let stderr = "\
kconst_probe.c: In function '__kconst_probe_1':
kconst_probe.c:7:80: error: 'ARCH_ONLY_CONST' undeclared (first use in this function)
kconst_probe.c:7:80: note: each undeclared identifier is reported only once for each function it appears in
";
        let attribution = attribute(stderr, &unit());
        assert_eq!(
            attribution.symbols.into_iter().collect::<Vec<_>>(),
            vec!["ARCH_ONLY_CONST"]
        );
        assert!(attribution.unattributed.is_empty());
    }

    #[test]
    fn test_attribute_macro_expansion_note() {
        let stderr = "\
In file included from kconst_probe.c:3:
/linux/include/uapi/linux/foo.h:12:20: error: 'INNER' undeclared (first use in this function)
kconst_probe.c:8:90: note: in expansion of macro 'WRAPPED'
";
        let attribution = attribute(stderr, &unit());
        assert!(attribution.symbols.contains("WRAPPED"));
        assert!(attribution.unattributed.is_empty());
    }

    #[test]
    fn test_attribute_structural_failure() {
        let stderr = "\
kconst_probe.c:3:10: fatal error: linux/missing.h: No such file or directory
compilation terminated.
";
        let attribution = attribute(stderr, &unit());
        assert!(attribution.symbols.is_empty());
        assert_eq!(attribution.unattributed.len(), 1);
        assert!(attribution.unattributed[0].contains("linux/missing.h"));
    }

    #[test]
    fn test_attribute_clang_and_warnings() {
        let stderr = "\
/tmp/kconst-probe-x/kconst_probe.c:6:60: error: use of undeclared identifier 'EINVAL'
/tmp/kconst-probe-x/kconst_probe.c:2:9: warning: 'FOO' macro redefined [-Wmacro-redefined]
";
        let attribution = attribute(stderr, &unit());
        assert_eq!(attribution.symbols.len(), 1);
        assert!(attribution.symbols.contains("EINVAL"));
        assert!(attribution.unattributed.is_empty());
    }
}
