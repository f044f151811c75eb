//! Probe failure taxonomy.

/// Errors from resolving constants through the toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The toolchain could not run, timed out, or failed on something other
    /// than an individual symbol (syntax error, missing header, bad flag).
    ToolchainInvocationFailed {
        /// Command line that was run
        command: String,
        /// What went wrong, including the first compiler errors if any
        reason: String,
    },

    /// Toolchain output was present but a value could not be read from it.
    MalformedValue {
        /// Symbol whose value was unreadable
        symbol: String,
        /// The offending output fragment
        output: String,
    },

    /// Strict mode only: symbols the headers do not define for this architecture.
    UnresolvedSymbols {
        /// Unavailable symbol names, sorted
        names: Vec<String>,
    },

    /// The batch worker pool could not be created.
    WorkerPool(String),
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::ToolchainInvocationFailed { command, reason } => {
                write!(f, "toolchain invocation failed: {} (command: {})", reason, command)
            }
            ProbeError::MalformedValue { symbol, output } => {
                write!(f, "malformed value for {}: {:?}", symbol, output)
            }
            ProbeError::UnresolvedSymbols { names } => {
                write!(
                    f,
                    "{} symbols are not defined for this architecture: {}",
                    names.len(),
                    names.join(", ")
                )
            }
            ProbeError::WorkerPool(reason) => write!(f, "failed to start probe workers: {}", reason),
        }
    }
}

impl std::error::Error for ProbeError {}
