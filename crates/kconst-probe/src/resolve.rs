//! Probe & resolve: turn requested names into concrete values.
//!
//! Names are split into batches. Each batch compiles as one probe unit; when
//! the compile fails, the symbols the compiler blamed are marked unavailable
//! and the unit is regenerated without them. Batches run on a local rayon
//! pool and are merged in batch order, so the result does not depend on
//! scheduling.

use std::collections::BTreeSet;

use kconst_types::ConstantMap;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::ProbeConfig;
use crate::diagnostics::{self, Severity};
use crate::error::ProbeError;
use crate::executor::ProbeExecutor;
use crate::markers::parse_markers;
use crate::unit::{ProbeRequest, ProbeUnit};

/// Number of compiler error lines quoted in a structural failure.
const QUOTED_ERRORS: usize = 3;

/// What a resolve run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOutcome {
    /// Values for every symbol the headers define.
    pub consts: ConstantMap,
    /// Requested symbols the headers do not define for this architecture, sorted.
    pub unavailable: Vec<String>,
}

/// Evaluate every name in `request.info.names`.
///
/// Unavailable symbols are omitted from [`ResolveOutcome::consts`] and listed
/// in [`ResolveOutcome::unavailable`], or reported as
/// [`ProbeError::UnresolvedSymbols`] when `config.strict` is set. An empty
/// request never invokes the executor.
pub fn resolve(
    request: &ProbeRequest<'_>,
    executor: &dyn ProbeExecutor,
    config: &ProbeConfig,
) -> Result<ResolveOutcome, ProbeError> {
    let names: Vec<&str> = request.info.names.iter().map(String::as_str).collect();
    if names.is_empty() {
        debug!("no constants requested, skipping toolchain");
        return Ok(ResolveOutcome::default());
    }

    let batch_size = config.batch_size.max(1);
    let batches: Vec<&[&str]> = names.chunks(batch_size).collect();
    info!(
        arch = request.arch.name,
        symbols = names.len(),
        batches = batches.len(),
        "resolving constants"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs.max(1))
        .thread_name(|idx| format!("kconst-probe-{}", idx))
        .build()
        .map_err(|e| ProbeError::WorkerPool(e.to_string()))?;

    let results: Vec<Result<ResolveOutcome, ProbeError>> = pool.install(|| {
        batches
            .par_iter()
            .enumerate()
            .map(|(idx, batch)| resolve_batch(idx, request, batch, executor))
            .collect()
    });

    let mut outcome = ResolveOutcome::default();
    let mut unavailable = BTreeSet::new();
    for result in results {
        let batch = result?;
        outcome.consts.extend(batch.consts);
        unavailable.extend(batch.unavailable);
    }
    outcome.unavailable = unavailable.into_iter().collect();

    if !outcome.unavailable.is_empty() {
        if config.strict {
            return Err(ProbeError::UnresolvedSymbols {
                names: outcome.unavailable,
            });
        }
        info!(
            count = outcome.unavailable.len(),
            "omitting symbols not defined for {}", request.arch.name
        );
        for name in &outcome.unavailable {
            debug!("unavailable: {}", name);
        }
    }
    Ok(outcome)
}

fn resolve_batch(
    idx: usize,
    request: &ProbeRequest<'_>,
    batch: &[&str],
    executor: &dyn ProbeExecutor,
) -> Result<ResolveOutcome, ProbeError> {
    let mut remaining: Vec<&str> = batch.to_vec();
    let mut unavailable: Vec<String> = Vec::new();
    let mut attempt = 0usize;

    loop {
        if remaining.is_empty() {
            return Ok(ResolveOutcome {
                consts: ConstantMap::new(),
                unavailable,
            });
        }
        attempt += 1;
        let unit = ProbeUnit::generate(request, &remaining);
        debug!(batch = idx, attempt, symbols = remaining.len(), "compiling probe unit");
        let output = executor.compile(&unit)?;

        if output.success {
            let consts = parse_markers(&output.assembly, &remaining)?;
            return Ok(ResolveOutcome {
                consts,
                unavailable,
            });
        }

        let attribution = diagnostics::attribute(&output.diagnostics, &unit);
        if !attribution.unattributed.is_empty() || attribution.symbols.is_empty() {
            return Err(ProbeError::ToolchainInvocationFailed {
                command: output.command,
                reason: failure_reason(&output.diagnostics, &attribution.unattributed),
            });
        }

        debug!(
            batch = idx,
            dropped = attribution.symbols.len(),
            "dropping symbols the compiler rejected"
        );
        remaining.retain(|name| !attribution.symbols.contains(*name));
        unavailable.extend(attribution.symbols);
    }
}

/// Summarize a compile failure nobody could be blamed for.
fn failure_reason(stderr: &str, unattributed: &[String]) -> String {
    let mut quoted: Vec<String> = unattributed.iter().take(QUOTED_ERRORS).cloned().collect();
    if quoted.is_empty() {
        quoted = diagnostics::parse(stderr)
            .into_iter()
            .filter(|d| d.severity == Severity::Error)
            .take(QUOTED_ERRORS)
            .map(|d| d.raw)
            .collect();
    }
    if quoted.is_empty() {
        let tail = stderr.trim();
        if tail.is_empty() {
            warn!("toolchain failed without diagnostics");
            return "toolchain failed without diagnostics".to_string();
        }
        quoted = tail.lines().take(QUOTED_ERRORS).map(str::to_string).collect();
    }
    format!("compilation failed: {}", quoted.join("; "))
}
