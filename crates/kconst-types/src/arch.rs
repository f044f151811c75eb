//! Architecture registry.
//!
//! Every supported target is a row in [`ARCHITECTURES`]. The table is built at
//! compile time and never mutated; [`lookup`] is the only way in.

use serde::Serialize;

use crate::error::ExtractError;

/// Target architecture as seen by the kernel headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Architecture {
    /// Identifier used on the command line and in output file names.
    pub name: &'static str,
    /// Macros the target compiler would predefine. Conditional headers key off these.
    pub predefined_macros: &'static [&'static str],
    /// Subdirectory under `arch/` in the kernel tree.
    pub kernel_header_arch: &'static str,
    /// Header that provides the `__NR_*` syscall numbers.
    pub kernel_include: &'static str,
    /// Extra compiler flags passed verbatim (word size selection and the like).
    pub cflags: &'static [&'static str],
}

impl Architecture {
    /// `-D` flags selecting this architecture in conditional headers.
    pub fn macro_flags(&self) -> impl Iterator<Item = String> + '_ {
        self.predefined_macros.iter().map(|m| format!("-D{}", m))
    }
}

pub static ARCHITECTURES: &[Architecture] = &[
    Architecture {
        name: "amd64",
        predefined_macros: &["__x86_64__"],
        kernel_header_arch: "x86",
        kernel_include: "asm/unistd.h",
        cflags: &["-m64"],
    },
    Architecture {
        name: "386",
        predefined_macros: &["__i386__"],
        kernel_header_arch: "x86",
        kernel_include: "asm/unistd.h",
        cflags: &["-m32"],
    },
    Architecture {
        name: "arm64",
        predefined_macros: &["__aarch64__"],
        kernel_header_arch: "arm64",
        kernel_include: "asm/unistd.h",
        cflags: &[],
    },
    Architecture {
        name: "arm",
        predefined_macros: &["__arm__"],
        kernel_header_arch: "arm",
        kernel_include: "asm/unistd.h",
        cflags: &["-D__LINUX_ARM_ARCH__=6", "-m32"],
    },
    Architecture {
        name: "ppc64le",
        predefined_macros: &["__ppc64__", "__PPC64__", "__powerpc64__"],
        kernel_header_arch: "powerpc",
        kernel_include: "asm/unistd.h",
        cflags: &["-D__powerpc64__"],
    },
];

/// Look up an architecture by identifier.
pub fn lookup(name: &str) -> Result<&'static Architecture, ExtractError> {
    ARCHITECTURES
        .iter()
        .find(|arch| arch.name == name)
        .ok_or_else(|| ExtractError::UnknownArchitecture {
            name: name.to_string(),
        })
}

/// Identifiers of every registered architecture, in table order.
pub fn names() -> impl Iterator<Item = &'static str> {
    ARCHITECTURES.iter().map(|arch| arch.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known() {
        let arch = lookup("amd64").unwrap();
        assert_eq!(arch.kernel_header_arch, "x86");
        assert_eq!(arch.predefined_macros, &["__x86_64__"]);
        assert_eq!(arch.cflags, &["-m64"]);

        let arch = lookup("ppc64le").unwrap();
        assert_eq!(arch.predefined_macros.len(), 3);
        assert_eq!(arch.kernel_header_arch, "powerpc");
    }

    #[test]
    fn test_lookup_unknown() {
        let err = lookup("mips").unwrap_err();
        assert_eq!(
            err,
            ExtractError::UnknownArchitecture {
                name: "mips".to_string()
            }
        );
        assert!(err.to_string().contains("amd64"));
    }

    #[test]
    fn test_names_unique() {
        let mut all: Vec<_> = names().collect();
        let count = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), count);
        assert!(count >= 5);
    }

    #[test]
    fn test_32bit_targets_force_word_size() {
        assert!(lookup("386").unwrap().cflags.contains(&"-m32"));
        assert!(lookup("arm").unwrap().cflags.contains(&"-m32"));
    }

    #[test]
    fn test_macro_flags() {
        let flags: Vec<_> = lookup("ppc64le").unwrap().macro_flags().collect();
        assert_eq!(flags, vec!["-D__ppc64__", "-D__PPC64__", "-D__powerpc64__"]);
    }
}
