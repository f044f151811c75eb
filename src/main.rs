//! `kconst-extract`: resolve the constants of one description file for one
//! architecture.
//!
//! ```text
//! kconst-extract --linux ~/linux --arch amd64 sys/linux/fs.txt
//! ```
//!
//! writes `sys/linux/fs_amd64.const`. Exit status is 0 on success and 1 on
//! any failure, with a one-line diagnostic on stderr.
use anyhow::{anyhow, Result};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use kconst_extract::args::Args;
use kconst_extract::pipeline::{self, ExtractOptions};
use kconst_probe::ProbeConfig;
use kconst_types::arch;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("kconst-extract: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr without timestamps. `-v` raises the level one step at a
/// time from `warn`; `RUST_LOG` wins when set.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<()> {
    if args.list_archs {
        return list_archs(args.json);
    }

    let json = args.json;
    let opts = extract_options(args)?;
    let summary = pipeline::run(&opts)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn list_archs(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(arch::ARCHITECTURES)?);
        return Ok(());
    }
    for arch in arch::ARCHITECTURES {
        println!(
            "{:<8} arch/{:<8} {}",
            arch.name,
            arch.kernel_header_arch,
            arch.cflags.join(" ")
        );
    }
    Ok(())
}

/// CLI flags layered over the `KCONST_*` environment defaults.
fn extract_options(args: Args) -> Result<ExtractOptions> {
    let mut probe = ProbeConfig::from_env();
    if let Some(secs) = args.timeout_secs {
        probe.timeout = Duration::from_secs(secs);
    }
    if let Some(jobs) = args.jobs {
        probe.jobs = jobs;
    }
    if let Some(batch_size) = args.batch_size {
        probe.batch_size = batch_size;
    }
    probe.strict |= args.strict;

    Ok(ExtractOptions {
        input: args.input.ok_or_else(|| anyhow!("no input file given"))?,
        linux: args
            .linux
            .ok_or_else(|| anyhow!("--linux (or KCONST_LINUX) is required"))?,
        linuxbld: args.linuxbld,
        arch: args.arch.ok_or_else(|| anyhow!("--arch is required"))?,
        cc: args.cc,
        out: args.out,
        probe,
    })
}
