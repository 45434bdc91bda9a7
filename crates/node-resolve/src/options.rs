//! Plugin configuration and field-precedence construction.

use regex_lite::Regex;
use std::path::PathBuf;

use crate::error::Error;

/// Extensions probed by the resolve walk, in order.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".mjs", ".js", ".json", ".node"];

/// Allow-list entry: an exact package id or a pattern over ids.
#[derive(Debug, Clone)]
pub enum IdPattern {
    Exact(String),
    Pattern(Regex),
}

impl IdPattern {
    #[must_use]
    pub fn matches(&self, id: &str) -> bool {
        match self {
            Self::Exact(s) => s == id,
            Self::Pattern(re) => re.is_match(id),
        }
    }
}

/// Opaque options forwarded to the resolve walk.
#[derive(Debug, Clone, Default)]
pub struct CustomResolveOptions {
    /// Override the directory bare lookups ascend from (defaults to the
    /// importer's parent; also the project root used by `dedupe`).
    pub base_dir: Option<PathBuf>,
    /// Directory name searched for packages (defaults to `node_modules`).
    pub module_directory: Option<String>,
}

/// Configuration accepted by the plugin factory.
#[derive(Debug, Clone, Default)]
pub struct NodeResolveOptions {
    /// Deprecated: include the `module` field (defaults on).
    pub module: Option<bool>,
    /// Deprecated: include the `jsnext:main` field (defaults off).
    pub jsnext: Option<bool>,
    /// Deprecated: include the `main` field (defaults on).
    pub main: Option<bool>,
    /// Explicit ordered field list; mutually exclusive with the
    /// deprecated booleans above.
    pub main_fields: Option<Vec<String>>,
    /// Consult the `browser` field and honor browser override maps.
    pub browser: bool,
    /// Name of a `syntax` field group to prefer (`syntax.<name>`).
    pub syntax: Option<String>,
    /// Extensions probed in order; `None` means [`DEFAULT_EXTENSIONS`].
    pub extensions: Option<Vec<String>>,
    /// Prefer platform builtins over local packages of the same name.
    /// Unset means true, with a one-time advisory on ambiguity.
    pub prefer_builtins: Option<bool>,
    /// Directory jail; resolutions outside it become external.
    pub jail: Option<PathBuf>,
    /// Allow-list of package ids; everything else becomes external.
    pub only: Option<Vec<IdPattern>>,
    /// Package ids forced to resolve from the project root.
    pub dedupe: Vec<String>,
    /// Pass-through for the resolve walk.
    pub custom_resolve_options: Option<CustomResolveOptions>,
    /// Only accept files using module-level import/export syntax.
    pub modules_only: bool,
    /// Retired. Supplying it is a fatal configuration error.
    pub skip: Option<Vec<String>>,
}

/// Build the ordered list of manifest fields to consult.
///
/// Fails on conflicting or empty configurations; see the rules on each
/// option above. Deprecated booleans emit a warning when set at all.
pub fn build_main_fields(options: &NodeResolveOptions) -> Result<Vec<String>, Error> {
    let deprecated = [
        ("module", options.module),
        ("jsnext", options.jsnext),
        ("main", options.main),
    ];
    for (name, value) in deprecated {
        if value.is_some() {
            tracing::warn!(
                target: "node-resolve",
                "the `{name}` option is deprecated; use `main_fields` instead"
            );
        }
    }
    let any_deprecated = deprecated.iter().any(|(_, v)| v.is_some());

    let mut fields = if let Some(list) = &options.main_fields {
        if list.iter().any(|f| f == "syntax") {
            return Err(Error::ReservedMainField);
        }
        if any_deprecated {
            return Err(Error::ConflictingFieldOptions);
        }
        list.clone()
    } else {
        let mut synthesized = Vec::new();
        if options.module != Some(false) {
            synthesized.push("module".to_string());
        }
        if options.jsnext == Some(true) {
            synthesized.push("jsnext:main".to_string());
        }
        if options.main != Some(false) {
            synthesized.push("main".to_string());
        }
        synthesized
    };

    if let Some(syntax) = &options.syntax {
        if !fields.iter().any(|f| f.starts_with("syntax.")) {
            fields.insert(0, format!("syntax.{syntax}"));
        }
    }

    if options.browser && !fields.iter().any(|f| f == "browser") {
        fields.insert(0, "browser".to_string());
    }

    if fields.is_empty() {
        return Err(Error::EmptyMainFields);
    }

    Ok(fields)
}
