#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]

//! Node-style module resolution as a bundler plugin.
//!
//! Implements the `node_modules` resolution algorithm for a bundler
//! host: relative and bare specifiers, package manifest entry-point
//! selection with configurable field precedence, browser/syntax
//! override maps, builtin handling, and a deduplicating async
//! filesystem probe layer.

pub mod builtins;
pub mod error;
mod manifest;
pub mod options;
pub mod overrides;
pub mod plugin;
pub mod probe;
pub mod resolve;
mod scan;
mod specifier;
mod walk;

pub use error::Error;
pub use options::{CustomResolveOptions, IdPattern, NodeResolveOptions, DEFAULT_EXTENSIONS};
pub use plugin::{HostOptions, NodeResolvePlugin};
pub use resolve::{Resolution, Resolver, EMPTY_MODULE_ID};
