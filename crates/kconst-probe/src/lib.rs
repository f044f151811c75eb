//! Probe & resolve engine.
//!
//! Evaluates kernel constants for one architecture by generating a C probe
//! unit, compiling it to assembly with a host toolchain and reading the
//! values back from marker lines:
//!
//! 1. [`unit`] builds the probe source and compiler flags
//! 2. [`executor`] runs the toolchain ([`ToolchainExecutor`]) behind the
//!    [`ProbeExecutor`] trait
//! 3. [`diagnostics`] blames compile failures on individual symbols
//! 4. [`markers`] decodes values from the assembly
//! 5. [`resolve`] drives batching, retries and merging
//!
//! ```no_run
//! use kconst_probe::{resolve, KernelTree, ProbeConfig, ProbeRequest, ToolchainExecutor};
//! use kconst_types::{arch, ConstantInfoBuilder};
//!
//! let mut builder = ConstantInfoBuilder::new();
//! builder.add_name("EINVAL");
//! builder.add_include("uapi/linux/errno.h");
//! let info = builder.build();
//!
//! let kernel = KernelTree::new("/src/linux", None);
//! let request = ProbeRequest { arch: arch::lookup("amd64")?, info: &info, kernel: &kernel };
//! let config = ProbeConfig::default();
//! let executor = ToolchainExecutor::new("gcc", config.timeout);
//! let outcome = resolve(&request, &executor, &config)?;
//! println!("EINVAL = {:?}", outcome.consts.get("EINVAL"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod executor;
pub mod markers;
pub mod resolve;
pub mod unit;

pub use config::ProbeConfig;
pub use error::ProbeError;
pub use executor::{CompileOutput, ProbeExecutor, ToolchainExecutor};
pub use resolve::{resolve, ResolveOutcome};
pub use unit::{KernelTree, ProbeRequest, ProbeUnit};
