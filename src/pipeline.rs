//! End-to-end extraction for one description file and one architecture.
//!
//! Stages run strictly in order and fail fast: architecture lookup (before
//! any file I/O), description parsing, requirement extraction, probing, and
//! finally an atomic write of the constant file. Nothing is written unless
//! every stage succeeded.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use kconst_description::{extract_requirements, parse};
use kconst_probe::{
    resolve, KernelTree, ProbeConfig, ProbeExecutor, ProbeRequest, ResolveOutcome,
    ToolchainExecutor,
};
use kconst_types::{arch, const_file, paths};

/// Inputs of one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub input: PathBuf,
    pub linux: PathBuf,
    pub linuxbld: Option<PathBuf>,
    pub arch: String,
    pub cc: PathBuf,
    /// Overrides the derived `<stem>_<arch>.const` path.
    pub out: Option<PathBuf>,
    pub probe: ProbeConfig,
}

/// What a successful run produced, for `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractSummary {
    pub arch: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub requested: usize,
    pub resolved: usize,
    pub unavailable: Vec<String>,
}

/// Run the pipeline with the host toolchain.
pub fn run(opts: &ExtractOptions) -> Result<ExtractSummary> {
    let executor = ToolchainExecutor::new(&opts.cc, opts.probe.timeout);
    run_with_executor(opts, &executor)
}

/// Run the pipeline with a caller-supplied executor.
pub fn run_with_executor(
    opts: &ExtractOptions,
    executor: &dyn ProbeExecutor,
) -> Result<ExtractSummary> {
    let arch = arch::lookup(&opts.arch)?;

    let data = std::fs::read(&opts.input)
        .with_context(|| format!("read {}", opts.input.display()))?;
    let source_name = opts.input.display().to_string();
    let desc = match parse(&data, &source_name) {
        Ok(desc) => desc,
        Err(err) => {
            for diag in &err.diagnostics {
                error!("{}", diag);
            }
            return Err(err.into());
        }
    };
    let info = extract_requirements(&desc)
        .with_context(|| format!("extract constants from {}", opts.input.display()))?;

    // Nothing to evaluate: the kernel tree and the toolchain are never touched.
    let outcome = if info.is_empty() {
        info!("no constants requested by {}", opts.input.display());
        ResolveOutcome::default()
    } else {
        let kernel = kernel_tree(&opts.linux, opts.linuxbld.as_deref())?;
        let request = ProbeRequest {
            arch,
            info: &info,
            kernel: &kernel,
        };
        resolve(&request, executor, &opts.probe)?
    };

    let output = opts
        .out
        .clone()
        .unwrap_or_else(|| paths::const_file_path(&opts.input, arch.name));
    paths::atomic_write(&output, &const_file::serialize(&outcome.consts))?;
    info!(
        path = %output.display(),
        constants = outcome.consts.len(),
        "wrote constant file"
    );

    Ok(ExtractSummary {
        arch: arch.name.to_string(),
        input: opts.input.clone(),
        output,
        requested: info.names.len(),
        resolved: outcome.consts.len(),
        unavailable: outcome.unavailable,
    })
}

/// Resolve the kernel trees to absolute paths. The toolchain runs inside a
/// scratch directory, so relative `-I` paths would point nowhere.
fn kernel_tree(linux: &Path, linuxbld: Option<&Path>) -> Result<KernelTree> {
    let source = linux
        .canonicalize()
        .with_context(|| format!("kernel source tree {}", linux.display()))?;
    let build = match linuxbld {
        Some(dir) => dir
            .canonicalize()
            .with_context(|| format!("kernel build tree {}", dir.display()))?,
        None => {
            info!(
                "--linuxbld not set, using kernel source tree {} as build tree",
                source.display()
            );
            source.clone()
        }
    };
    Ok(KernelTree::new(source, Some(build)))
}
