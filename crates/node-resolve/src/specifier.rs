//! Import specifier decomposition.
//!
//! Splits a raw specifier into a package id (joining the two leading
//! segments for scoped packages) or, for `.`-leading specifiers, the
//! absolute candidate path resolved against the importer's parent
//! directory.

use std::path::{Component, Path, PathBuf};

/// A decomposed import specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSpecifier {
    /// Package id for bare specifiers, absolute candidate for relative ones.
    pub id: String,
    /// Whether the specifier started with `.`.
    pub is_relative: bool,
    /// Whether the id names a scoped package (`@scope/name`).
    pub is_scoped: bool,
}

/// Decompose `importee` relative to the file importing it.
#[must_use]
pub fn parse(importee: &str, importer: &Path) -> ParsedSpecifier {
    let mut parts = importee.split(['/', '\\']);
    let first = parts.next().unwrap_or_default();

    if first.starts_with('@') {
        if let Some(second) = parts.next() {
            return ParsedSpecifier {
                id: format!("{first}/{second}"),
                is_relative: false,
                is_scoped: true,
            };
        }
    }

    if first.starts_with('.') {
        let base = importer.parent().unwrap_or_else(|| Path::new("/"));
        return ParsedSpecifier {
            id: normalize_lexically(&base.join(importee))
                .to_string_lossy()
                .into_owned(),
            is_relative: true,
            is_scoped: false,
        };
    }

    ParsedSpecifier {
        id: first.to_string(),
        is_relative: false,
        is_scoped: false,
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
///
/// Resolution candidates often do not exist yet (extension probing runs
/// afterwards), so canonicalization cannot be used here.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
