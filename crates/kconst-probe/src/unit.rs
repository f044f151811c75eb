//! Probe unit generation.
//!
//! A probe unit is a C source file plus the compiler flags needed to build it
//! for one architecture. Every requested symbol gets its own function whose
//! body is a single inline asm statement:
//!
//! ```c
//! void __kconst_probe_0(void) { __asm__ volatile("@@KCONST@@ EINVAL %c0 %c1" : : "i"(KCONST_HI(EINVAL)), "i"(KCONST_LO(EINVAL))); }
//! ```
//!
//! Compiled with `-S`, the marker lands in the assembly with both 32-bit
//! halves substituted as plain immediates. One function per symbol keeps
//! compiler diagnostics on the symbol's own line and avoids "reported only
//! once per function" suppression.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use kconst_types::{Architecture, ConstantInfo};

/// File name of the generated probe source inside the work directory.
pub const PROBE_SOURCE: &str = "kconst_probe.c";

/// File name of the assembly the toolchain is asked to produce.
pub const PROBE_ASM: &str = "kconst_probe.s";

/// Marker prefix preceding `<name> <hi> <lo>` in the generated assembly.
pub const MARKER: &str = "@@KCONST@@";

/// Kernel checkout the headers come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelTree {
    /// Source checkout.
    pub source: PathBuf,
    /// Build directory holding generated headers. Usually the same as `source`.
    pub build: PathBuf,
}

impl KernelTree {
    pub fn new(source: impl Into<PathBuf>, build: Option<PathBuf>) -> Self {
        let source = source.into();
        let build = build.unwrap_or_else(|| source.clone());
        Self { source, build }
    }

    /// Include search path, generated (build tree) directories ahead of
    /// their source tree counterparts. Duplicates are dropped, keeping the
    /// first occurrence.
    pub fn search_paths(&self, arch: &Architecture, incdirs: &[String]) -> Vec<PathBuf> {
        let src = &self.source;
        let bld = &self.build;
        let arch_dir = Path::new("arch").join(arch.kernel_header_arch);

        let mut paths = vec![
            bld.join(&arch_dir).join("include/generated/uapi"),
            bld.join(&arch_dir).join("include/generated"),
            src.join(&arch_dir).join("include"),
            src.join(&arch_dir).join("include/uapi"),
            bld.join("include/generated/uapi"),
            bld.join("include"),
            src.join("include"),
            src.join("include/uapi"),
        ];
        paths.extend(incdirs.iter().map(|dir| src.join(dir)));
        paths.push(src.clone());

        let mut seen = std::collections::HashSet::new();
        paths.retain(|p| seen.insert(p.clone()));
        paths
    }

    /// `include/linux/kconfig.h`, when the tree has one.
    pub fn kconfig_header(&self) -> Option<PathBuf> {
        let path = self.source.join("include/linux/kconfig.h");
        path.is_file().then_some(path)
    }
}

/// Everything needed to evaluate one description's constants.
#[derive(Debug, Clone, Copy)]
pub struct ProbeRequest<'a> {
    pub arch: &'a Architecture,
    pub info: &'a ConstantInfo,
    pub kernel: &'a KernelTree,
}

impl ProbeRequest<'_> {
    /// Requested includes followed by the architecture's syscall header.
    pub fn includes(&self) -> Vec<&str> {
        let mut includes: Vec<&str> = self.info.includes.iter().map(String::as_str).collect();
        if !includes.contains(&self.arch.kernel_include) {
            includes.push(self.arch.kernel_include);
        }
        includes
    }

    /// Compiler flags shared by every unit of this request: architecture
    /// macros, architecture flags verbatim, then the include search path.
    pub fn compiler_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self.arch.macro_flags().collect();
        args.extend(self.arch.cflags.iter().map(|f| f.to_string()));
        for dir in self.kernel.search_paths(self.arch, &self.info.incdirs) {
            args.push(format!("-I{}", dir.display()));
        }
        if let Some(kconfig) = self.kernel.kconfig_header() {
            args.push("-include".to_string());
            args.push(kconfig.display().to_string());
        }
        args
    }
}

/// One generated compilation unit.
#[derive(Debug, Clone)]
pub struct ProbeUnit {
    /// C source text.
    pub source: String,
    /// 1-based source line → symbol evaluated on that line.
    pub symbol_lines: BTreeMap<usize, String>,
    /// Compiler flags, excluding input and output file arguments.
    pub args: Vec<String>,
}

impl ProbeUnit {
    /// Generate a unit evaluating `symbols`.
    pub fn generate(request: &ProbeRequest<'_>, symbols: &[&str]) -> Self {
        let mut lines: Vec<String> = vec!["/* kconst probe unit, generated */".to_string()];
        for (name, value) in &request.info.defines {
            match value {
                Some(value) => lines.push(format!("#define {} {}", name, value)),
                None => lines.push(format!("#define {}", name)),
            }
        }
        for include in request.includes() {
            lines.push(format!("#include <{}>", include));
        }
        lines.push(
            "#define KCONST_HI(x) ((unsigned int)((unsigned long long)(x) >> 32))".to_string(),
        );
        lines.push("#define KCONST_LO(x) ((unsigned int)((unsigned long long)(x)))".to_string());

        let mut symbol_lines = BTreeMap::new();
        for (idx, symbol) in symbols.iter().enumerate() {
            let mut line = String::new();
            let _ = write!(
                line,
                "void __kconst_probe_{idx}(void) {{ __asm__ volatile(\"{MARKER} {symbol} %c0 %c1\" : : \"i\"(KCONST_HI({symbol})), \"i\"(KCONST_LO({symbol}))); }}"
            );
            lines.push(line);
            symbol_lines.insert(lines.len(), symbol.to_string());
        }

        let mut source = lines.join("\n");
        source.push('\n');
        Self {
            source,
            symbol_lines,
            args: request.compiler_args(),
        }
    }

    /// Symbols evaluated by this unit, in source order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbol_lines.values().map(String::as_str)
    }
}
