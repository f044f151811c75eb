//! Description syntax tree.

use std::fmt;
use std::sync::Arc;

/// Source position of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pos {
    pub file: Arc<str>,
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

/// A parsed description file: its top-level declarations in source order.
#[derive(Debug, Clone, Default)]
pub struct Description {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
pub enum Node {
    /// `include <linux/fcntl.h>`
    Include { pos: Pos, file: String },
    /// `incdir <drivers/net>`
    Incdir { pos: Pos, dir: String },
    /// `define NAME value`
    Define {
        pos: Pos,
        name: String,
        value: Option<String>,
    },
    /// `resource fd[int32]: -1, AT_FDCWD`
    Resource {
        pos: Pos,
        name: String,
        base: Type,
        values: Vec<Value>,
    },
    /// `type name int32[0:10]`
    TypeDef { pos: Pos, name: String, ty: Type },
    /// `open$variant(file ptr[in, filename], flags flags[open_flags]) fd`
    Call {
        pos: Pos,
        name: String,
        args: Vec<Field>,
        ret: Option<Type>,
    },
    /// `open_flags = O_RDONLY, O_WRONLY`
    Flags {
        pos: Pos,
        name: String,
        values: Vec<Value>,
    },
    /// `name { fields }` or, for unions, `name [ fields ]`, with optional attributes.
    Struct {
        pos: Pos,
        name: String,
        is_union: bool,
        fields: Vec<Field>,
        attrs: Vec<Type>,
    },
}

impl Node {
    pub fn pos(&self) -> &Pos {
        match self {
            Node::Include { pos, .. }
            | Node::Incdir { pos, .. }
            | Node::Define { pos, .. }
            | Node::Resource { pos, .. }
            | Node::TypeDef { pos, .. }
            | Node::Call { pos, .. }
            | Node::Flags { pos, .. }
            | Node::Struct { pos, .. } => pos,
        }
    }

    /// Name this node declares in the type namespace, if any.
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            Node::Resource { name, .. }
            | Node::TypeDef { name, .. }
            | Node::Flags { name, .. }
            | Node::Struct { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub pos: Pos,
    pub name: String,
    pub ty: Type,
}

/// Literal or identifier appearing in a type or value list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Ident(String),
    Int(i128),
    Str(String),
}

/// A type expression: `head`, `head[arg, ...]` or a range `lo:hi`.
#[derive(Debug, Clone)]
pub struct Type {
    pub pos: Pos,
    pub value: Value,
    /// Upper bound when written as `lo:hi`.
    pub range_end: Option<Value>,
    pub args: Vec<Type>,
}
