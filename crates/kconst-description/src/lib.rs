//! Description ingestion.
//!
//! Description files declare syscalls, flag sets, structs and resources. This
//! crate only cares about them as far as constant extraction needs:
//! - [`parser::parse`] turns file contents into a [`Description`]
//! - [`extract::extract_requirements`] pulls the symbol names and the
//!   include/define context out of it
//!
//! # Example
//!
//! ```
//! use kconst_description::{extract_requirements, parse};
//!
//! let desc = parse(b"include <linux/fcntl.h>\nflags = O_RDONLY, O_NONBLOCK\n", "fcntl.txt").unwrap();
//! let info = extract_requirements(&desc).unwrap();
//! assert_eq!(info.names, vec!["O_RDONLY", "O_NONBLOCK"]);
//! ```

pub mod ast;
pub mod extract;
pub mod parser;
pub mod scanner;

pub use ast::{Description, Node};
pub use extract::extract_requirements;
pub use parser::{parse, Diagnostic, ParseError};
