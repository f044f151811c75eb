//! Kernel constant extraction.
//!
//! Resolves the numeric values of the symbolic constants a description file
//! refers to, as defined by a kernel's headers for one target architecture,
//! and writes them out as a byte-stable constant file.
//!
//! The work is split across the workspace:
//! - `kconst-types`: architecture registry, requirements, constant file codec
//! - `kconst-description`: description parsing and requirement extraction
//! - `kconst-probe`: the probe & resolve engine driving a C toolchain
//!
//! This crate holds the command-line surface ([`args`]) and the end-to-end
//! orchestration ([`pipeline`]).

pub mod args;
pub mod pipeline;
