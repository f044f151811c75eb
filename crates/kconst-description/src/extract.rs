//! Constant requirement extraction.
//!
//! Walks a parsed [`Description`] and collects every symbol whose numeric
//! value has to come from the kernel headers, together with the includes,
//! include directories and defines needed to evaluate them.

use std::collections::HashSet;

use kconst_types::{ConstantInfo, ConstantInfoBuilder, ExtractError};
use tracing::trace;

use crate::ast::{Description, Node, Type, Value};

/// Prefix of syscall number macros in `asm/unistd.h`.
pub const SYSCALL_PREFIX: &str = "__NR_";

/// Calls with this prefix are executor-implemented and have no syscall number.
pub const PSEUDO_CALL_PREFIX: &str = "syz_";

/// Type names the description language defines itself.
const BUILTIN_TYPES: &[&str] = &[
    "int8", "int16", "int32", "int64", "intptr", "int16be", "int32be", "int64be", "bool8",
    "bool16", "bool32", "bool64", "boolptr", "fd", "ptr", "ptr64", "buffer", "string",
    "stringnoz", "filename", "array", "len", "bytesize", "bytesize2", "bytesize4", "bytesize8",
    "bitsize", "offsetof", "vma", "vma64", "const", "flags", "proc", "csum", "text", "void",
    "fmt", "glob", "opt",
];

/// Identifiers with fixed meaning in argument position (directions, formats,
/// struct attributes, checksum kinds).
const KEYWORDS: &[&str] = &[
    "in", "out", "inout", "dec", "hex", "oct", "packed", "align", "size", "varlen", "parent",
    "inet", "pseudo", "x86_real", "x86_16", "x86_32", "x86_64", "arm64",
];

/// Types whose first argument names a sibling field rather than a value.
const FIELD_REF_TYPES: &[&str] = &[
    "len", "bytesize", "bytesize2", "bytesize4", "bytesize8", "bitsize", "offsetof", "csum",
];

/// Collect the constant requirements of a description.
pub fn extract_requirements(desc: &Description) -> Result<ConstantInfo, ExtractError> {
    let declared: HashSet<&str> = desc.nodes.iter().filter_map(Node::declared_name).collect();
    let mut walker = Walker {
        declared,
        builder: ConstantInfoBuilder::new(),
    };

    for node in &desc.nodes {
        walker.node(node)?;
    }
    Ok(walker.builder.build())
}

/// Syscall number macro for a call name, `None` for pseudo calls.
///
/// `openat$dir` maps to `__NR_openat`.
pub fn syscall_const(call: &str) -> Option<String> {
    let base = call.split('$').next().unwrap_or(call);
    if base.is_empty() || base.starts_with(PSEUDO_CALL_PREFIX) {
        return None;
    }
    Some(format!("{}{}", SYSCALL_PREFIX, base))
}

struct Walker<'a> {
    declared: HashSet<&'a str>,
    builder: ConstantInfoBuilder,
}

impl Walker<'_> {
    fn node(&mut self, node: &Node) -> Result<(), ExtractError> {
        match node {
            Node::Include { file, .. } => self.builder.add_include(file),
            Node::Incdir { dir, .. } => self.builder.add_incdir(dir),
            Node::Define { name, value, .. } => self.builder.add_define(name, value.as_deref())?,
            Node::Resource { base, values, .. } => {
                self.type_args(base);
                self.values(values);
            }
            Node::TypeDef { ty, .. } => self.ty(ty),
            Node::Call { name, args, ret, .. } => {
                if let Some(nr) = syscall_const(name) {
                    trace!(call = %name, "syscall number {}", nr);
                    self.builder.add_name(&nr);
                }
                for arg in args {
                    self.ty(&arg.ty);
                }
                if let Some(ret) = ret {
                    self.ty(ret);
                }
            }
            Node::Flags { values, .. } => self.values(values),
            Node::Struct { fields, attrs, .. } => {
                for field in fields {
                    self.ty(&field.ty);
                }
                for attr in attrs {
                    self.type_args(attr);
                }
            }
        }
        Ok(())
    }

    fn values(&mut self, values: &[Value]) {
        for value in values {
            if let Value::Ident(name) = value {
                self.builder.add_name(name);
            }
        }
    }

    /// A type in head position. The head names a type, never a constant,
    /// unless it is written as a range bound.
    fn ty(&mut self, ty: &Type) {
        if let Some(end) = &ty.range_end {
            self.arg_value(&ty.value);
            self.arg_value(end);
        }
        self.type_args(ty);
    }

    fn type_args(&mut self, ty: &Type) {
        let skip_first = matches!(&ty.value, Value::Ident(head) if FIELD_REF_TYPES.contains(&head.as_str()));
        for (idx, arg) in ty.args.iter().enumerate() {
            if idx == 0 && skip_first {
                continue;
            }
            if arg.args.is_empty() || arg.range_end.is_some() {
                self.arg_value(&arg.value);
            }
            if let Some(end) = &arg.range_end {
                self.arg_value(end);
            }
            self.type_args(arg);
        }
    }

    fn arg_value(&mut self, value: &Value) {
        let Value::Ident(name) = value else {
            return;
        };
        if self.is_type_name(name) {
            return;
        }
        self.builder.add_name(name);
    }

    fn is_type_name(&self, name: &str) -> bool {
        BUILTIN_TYPES.contains(&name) || KEYWORDS.contains(&name) || self.declared.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn extract(src: &str) -> ConstantInfo {
        let desc = parse(src.as_bytes(), "test.txt").unwrap();
        extract_requirements(&desc).unwrap()
    }

    #[test]
    fn test_syscall_const() {
        assert_eq!(syscall_const("openat$dir").as_deref(), Some("__NR_openat"));
        assert_eq!(syscall_const("read").as_deref(), Some("__NR_read"));
        assert_eq!(syscall_const("syz_open_dev$tty"), None);
    }

    #[test]
    fn test_collects_in_first_appearance_order() {
        let info = extract(
            r#"
include <linux/fcntl.h>
include <uapi/linux/errno.h>
incdir <include/uapi>
define _GNU_SOURCE
define FOO_LIMIT 32

resource fd[int32]: -1, AT_FDCWD
open(file ptr[in, filename], flags flags[open_flags], mode const[0]) fd
openat$dir(dirfd fd, file ptr[in, filename], flags flags[open_flags]) fd
open_flags = O_RDONLY, O_WRONLY, O_NONBLOCK, 0x100
read(fd fd, buf buffer[out], count len[buf]) const[EINVAL, int32]
syz_mount_image(fs ptr[in, string["ext4"]])
"#,
        );

        assert_eq!(
            info.names,
            vec![
                "AT_FDCWD",
                "__NR_open",
                "__NR_openat",
                "O_RDONLY",
                "O_WRONLY",
                "O_NONBLOCK",
                "__NR_read",
                "EINVAL",
            ]
        );
        assert_eq!(info.includes, vec!["linux/fcntl.h", "uapi/linux/errno.h"]);
        assert_eq!(info.incdirs, vec!["include/uapi"]);
        assert_eq!(info.defines.get("_GNU_SOURCE"), Some(&None));
        assert_eq!(info.defines.get("FOO_LIMIT"), Some(&Some("32".to_string())));
    }

    #[test]
    fn test_struct_fields_ranges_and_attrs() {
        let info = extract(
            r#"
ifreq {
	name	array[int8, IFNAMSIZ]
	mtu	int32[ETH_MIN_MTU:ETH_MAX_MTU]
	kind	const[ARPHRD_ETHER, int16]
	nested	ptr[out, ifreq]
	fmt	fmt[hex, int32]
} [packed, size[IFREQ_SIZE]]

ifreq_union [
	a	int32
	b	array[int8, IFNAMSIZ]
]
"#,
        );
        assert_eq!(
            info.names,
            vec![
                "IFNAMSIZ",
                "ETH_MIN_MTU",
                "ETH_MAX_MTU",
                "ARPHRD_ETHER",
                "IFREQ_SIZE",
            ]
        );
    }

    #[test]
    fn test_declared_names_are_not_constants() {
        let info = extract(
            r#"
type my_len int32[0:MY_MAX]
resource sock[fd]
socket(domain flags[domains], type my_len) sock
domains = AF_INET, AF_UNIX
ioctl$SIOCGIFMTU(fd sock, cmd const[SIOCGIFMTU], arg ptr[inout, my_len])
"#,
        );
        assert_eq!(
            info.names,
            vec![
                "MY_MAX",
                "__NR_socket",
                "AF_INET",
                "AF_UNIX",
                "__NR_ioctl",
                "SIOCGIFMTU",
            ]
        );
    }

    #[test]
    fn test_empty_description() {
        let info = extract("# nothing but includes\ninclude <linux/types.h>\n");
        assert!(info.is_empty());
        assert_eq!(info.includes, vec!["linux/types.h"]);
    }

    #[test]
    fn test_conflicting_defines_fail() {
        let desc = parse(b"define A 1\ndefine A 2\n", "test.txt").unwrap();
        let err = extract_requirements(&desc).unwrap_err();
        assert!(matches!(err, ExtractError::ConflictingDefine { .. }));
    }
}
