//! Constant requirements gathered from a description.

use std::collections::{BTreeMap, HashSet};

use crate::error::ExtractError;

/// Resolved constants, keyed by symbol name. Iteration is sorted by name.
pub type ConstantMap = BTreeMap<String, u64>;

/// Everything the probe needs to know to evaluate a description's constants.
///
/// Built once with [`ConstantInfoBuilder`] and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstantInfo {
    /// Requested symbol names, in order of first appearance.
    pub names: Vec<String>,
    /// Header files to include, in request order.
    pub includes: Vec<String>,
    /// Include directories relative to the kernel source tree.
    pub incdirs: Vec<String>,
    /// Macros to define before any include.
    pub defines: BTreeMap<String, Option<String>>,
}

impl ConstantInfo {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Accumulates requirements while dropping duplicates.
#[derive(Debug, Default)]
pub struct ConstantInfoBuilder {
    info: ConstantInfo,
    seen_names: HashSet<String>,
    seen_includes: HashSet<String>,
    seen_incdirs: HashSet<String>,
}

impl ConstantInfoBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_name(&mut self, name: &str) {
        if self.seen_names.insert(name.to_string()) {
            self.info.names.push(name.to_string());
        }
    }

    pub fn add_include(&mut self, include: &str) {
        if self.seen_includes.insert(include.to_string()) {
            self.info.includes.push(include.to_string());
        }
    }

    pub fn add_incdir(&mut self, incdir: &str) {
        if self.seen_incdirs.insert(incdir.to_string()) {
            self.info.incdirs.push(incdir.to_string());
        }
    }

    /// Record a macro definition. Repeating an identical definition is fine,
    /// a different value for the same name is not.
    pub fn add_define(&mut self, name: &str, value: Option<&str>) -> Result<(), ExtractError> {
        match self.info.defines.get(name) {
            Some(existing) if existing.as_deref() != value => {
                Err(ExtractError::ConflictingDefine {
                    name: name.to_string(),
                    first: existing.clone(),
                    second: value.map(str::to_string),
                })
            }
            Some(_) => Ok(()),
            None => {
                self.info
                    .defines
                    .insert(name.to_string(), value.map(str::to_string));
                Ok(())
            }
        }
    }

    pub fn build(self) -> ConstantInfo {
        self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_keep_first_appearance_order() {
        let mut builder = ConstantInfoBuilder::new();
        for name in ["O_RDONLY", "EINVAL", "O_RDONLY", "AT_FDCWD", "EINVAL"] {
            builder.add_name(name);
        }
        let info = builder.build();
        assert_eq!(info.names, vec!["O_RDONLY", "EINVAL", "AT_FDCWD"]);
    }

    #[test]
    fn test_includes_and_incdirs_dedup() {
        let mut builder = ConstantInfoBuilder::new();
        builder.add_include("linux/fcntl.h");
        builder.add_include("asm/unistd.h");
        builder.add_include("linux/fcntl.h");
        builder.add_incdir("drivers/net");
        builder.add_incdir("drivers/net");
        let info = builder.build();
        assert_eq!(info.includes, vec!["linux/fcntl.h", "asm/unistd.h"]);
        assert_eq!(info.incdirs, vec!["drivers/net"]);
        assert!(info.is_empty());
    }

    #[test]
    fn test_conflicting_define() {
        let mut builder = ConstantInfoBuilder::new();
        builder.add_define("_GNU_SOURCE", None).unwrap();
        builder.add_define("_GNU_SOURCE", None).unwrap();
        builder.add_define("FOO", Some("1")).unwrap();

        let err = builder.add_define("FOO", Some("2")).unwrap_err();
        assert!(matches!(err, ExtractError::ConflictingDefine { ref name, .. } if name == "FOO"));
    }
}
