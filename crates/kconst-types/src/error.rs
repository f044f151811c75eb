//! Error types shared across the extraction pipeline.

/// Failures raised by the architecture registry, requirement extraction and
/// the constant-file codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The requested architecture is not in the registry.
    UnknownArchitecture {
        /// Identifier that was asked for
        name: String,
    },

    /// A constant file could not be decoded.
    CorruptFormat {
        /// 1-based line number of the offending line
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// The same macro was defined twice with different values.
    ConflictingDefine {
        /// Macro name
        name: String,
        /// Value from the first definition
        first: Option<String>,
        /// Value from the conflicting definition
        second: Option<String>,
    },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::UnknownArchitecture { name } => {
                write!(
                    f,
                    "unknown arch {} (known: {})",
                    name,
                    crate::arch::names().collect::<Vec<_>>().join(", ")
                )
            }
            ExtractError::CorruptFormat { line, reason } => {
                write!(f, "corrupt constant file at line {}: {}", line, reason)
            }
            ExtractError::ConflictingDefine {
                name,
                first,
                second,
            } => write!(
                f,
                "conflicting definitions of macro {}: {:?} vs {:?}",
                name,
                first.as_deref().unwrap_or(""),
                second.as_deref().unwrap_or("")
            ),
        }
    }
}

impl std::error::Error for ExtractError {}
