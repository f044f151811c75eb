//! Shared types for the kconst workspace.
//!
//! This crate provides the pieces every stage of the extraction pipeline
//! agrees on:
//! - [`arch`]: the static architecture registry
//! - [`requirements`]: [`ConstantInfo`] and [`ConstantMap`]
//! - [`const_file`]: the byte-stable constant file codec
//! - [`paths`]: output naming and atomic writes

pub mod arch;
pub mod const_file;
pub mod env_utils;
pub mod error;
pub mod paths;
pub mod requirements;

pub use arch::Architecture;
pub use error::ExtractError;
pub use requirements::{ConstantInfo, ConstantInfoBuilder, ConstantMap};
