use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Description file to extract constants for (`.txt`).
    #[arg(value_name = "INPUT", required_unless_present = "list_archs")]
    pub input: Option<PathBuf>,

    /// Kernel source tree.
    #[arg(
        long,
        env = "KCONST_LINUX",
        value_name = "DIR",
        required_unless_present = "list_archs"
    )]
    pub linux: Option<PathBuf>,

    /// Kernel build tree holding generated headers. Defaults to `--linux`.
    #[arg(long, env = "KCONST_LINUXBLD", value_name = "DIR")]
    pub linuxbld: Option<PathBuf>,

    /// Target architecture (see `--list-archs`).
    #[arg(long, value_name = "ARCH", required_unless_present = "list_archs")]
    pub arch: Option<String>,

    /// Host C compiler (GCC or Clang command line).
    #[arg(long, env = "KCONST_CC", value_name = "PATH", default_value = "gcc")]
    pub cc: PathBuf,

    /// Per-invocation toolchain timeout in seconds (env `KCONST_TIMEOUT_SECS`).
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Maximum concurrent toolchain invocations (env `KCONST_JOBS`).
    #[arg(long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Symbols per probe unit (env `KCONST_BATCH_SIZE`).
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Fail if any requested symbol is not defined for the architecture
    /// instead of omitting it (env `KCONST_STRICT`).
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Write the constant file here instead of next to the input.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Print a JSON summary to stdout.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// List supported architectures and exit.
    #[arg(long, default_value_t = false)]
    pub list_archs: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
