use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Error type for the node-resolve plugin.
///
/// Configuration variants are raised synchronously at construction and
/// abort the build. `CouldNotResolve` rejects a single import. Probe
/// errors surface unexpected filesystem failures; a plain "not found"
/// is never an error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "the `main_fields` option cannot be combined with the deprecated \
         `module`, `jsnext` or `main` options"
    )]
    ConflictingFieldOptions,

    #[error("`main_fields` must not contain \"syntax\"; use the `syntax` option instead")]
    ReservedMainField,

    #[error("`main_fields` must contain at least one field name")]
    EmptyMainFields,

    #[error(
        "the `skip` option is no longer supported; mark those imports as \
         external through the host instead"
    )]
    RetiredSkipOption,

    #[error("Could not resolve '{specifier}' from {importer}")]
    CouldNotResolve { specifier: String, importer: String },

    #[error("failed to access {path}")]
    Probe {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },
}
