//! Resolution core.
//!
//! One `resolve_id` call runs a fixed pipeline: parse the specifier,
//! apply dedupe forcing, consult the override cache, filter against the
//! allow-list, delegate to the resolve walk, then apply the
//! post-resolution policies (override registration, symlink
//! canonicalization, builtin preference, jail containment, modules-only
//! filtering). Each call settles exactly one terminal outcome.

use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::builtins::is_builtin;
use crate::error::Error;
use crate::manifest::PackageFilter;
use crate::options::{self, IdPattern, NodeResolveOptions, DEFAULT_EXTENSIONS};
use crate::overrides::{OverrideCache, OverrideTarget};
use crate::probe::FsProbe;
use crate::scan::has_module_syntax;
use crate::specifier::{self, normalize_lexically};
use crate::walk::{resolve_walk, WalkOptions};

/// Id returned for imports suppressed by an override map. Carries the
/// reserved sentinel byte so no other resolver claims it; the host's
/// loader serves an empty module for it.
pub const EMPTY_MODULE_ID: &str = "\0node-resolve:empty.js";

/// Outcome of one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Resolved to an absolute on-disk path.
    Resolved(PathBuf),
    /// Not handled here; the host treats the import as external.
    External,
    /// Intentionally empty module ([`EMPTY_MODULE_ID`]).
    Empty,
}

/// The resolver behind the plugin: configuration fixed at construction,
/// caches scoped to one bundle-generation pass.
pub struct Resolver {
    fields: Vec<String>,
    extensions: Vec<String>,
    overrides_enabled: bool,
    prefer_builtins: Option<bool>,
    jail: Option<PathBuf>,
    only: Option<Vec<IdPattern>>,
    dedupe: FxHashSet<String>,
    modules_only: bool,
    module_directory: String,
    root: PathBuf,
    probe: FsProbe,
    override_cache: OverrideCache,
    warned_builtins: Mutex<FxHashSet<String>>,
    preserve_symlinks: AtomicBool,
}

impl Resolver {
    /// Validate the configuration and build a resolver.
    ///
    /// Configuration errors are fatal and synchronous.
    pub fn new(options: NodeResolveOptions) -> Result<Self, Error> {
        if options.skip.is_some() {
            return Err(Error::RetiredSkipOption);
        }

        let fields = options::build_main_fields(&options)?;
        let extensions = options.extensions.clone().unwrap_or_else(|| {
            DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect()
        });
        let overrides_enabled = fields
            .iter()
            .any(|f| f == "browser" || f.starts_with("syntax."));

        let custom = options.custom_resolve_options.clone().unwrap_or_default();
        let root = custom
            .base_dir
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
        let module_directory = custom
            .module_directory
            .unwrap_or_else(|| "node_modules".to_string());

        Ok(Self {
            fields,
            extensions,
            overrides_enabled,
            prefer_builtins: options.prefer_builtins,
            jail: options.jail.as_deref().map(normalize_lexically),
            only: options.only,
            dedupe: options.dedupe.into_iter().collect(),
            modules_only: options.modules_only,
            module_directory,
            root,
            probe: FsProbe::new(),
            override_cache: OverrideCache::default(),
            warned_builtins: Mutex::new(FxHashSet::default()),
            preserve_symlinks: AtomicBool::new(false),
        })
    }

    /// Observe the host's symlink-preservation flag.
    pub fn set_preserve_symlinks(&self, preserve: bool) {
        self.preserve_symlinks.store(preserve, Ordering::Relaxed);
    }

    /// Clear every cache at the bundle-generation boundary.
    pub fn clear_caches(&self) {
        self.probe.clear();
        self.override_cache.clear();
    }

    /// Probe layer, for lifecycle diagnostics.
    #[must_use]
    pub fn probe(&self) -> &FsProbe {
        &self.probe
    }

    /// Resolve `importee` as imported from `importer`.
    pub async fn resolve_id(
        &self,
        importee: &str,
        importer: Option<&str>,
    ) -> Result<Resolution, Error> {
        // Sentinel-marked ids belong to another resolver; the entry
        // module has no importer. Both are not handled here.
        if importee.contains('\0') {
            return Ok(Resolution::External);
        }
        let Some(importer) = importer else {
            return Ok(Resolution::External);
        };
        let importer = Path::new(importer);

        let parsed = specifier::parse(importee, importer);
        let mut effective = importee.to_string();
        let mut base_dir = importer
            .parent()
            .unwrap_or_else(|| Path::new("/"))
            .to_path_buf();

        // Dedupe forcing: resolve configured packages from the project
        // root so one instance serves the whole graph.
        if !parsed.is_relative && self.dedupe.contains(&parsed.id) {
            base_dir.clone_from(&self.root);
        }

        // Override consult for imports originating from a file with a
        // known override map.
        if self.overrides_enabled {
            if let Some(map) = self.override_cache.get(importer) {
                match map.lookup(&effective, &base_dir) {
                    Some(OverrideTarget::Suppress) => return Ok(Resolution::Empty),
                    Some(OverrideTarget::Redirect(to)) => effective = to.clone(),
                    None => {}
                }
            }
        }

        // Allow-list filtering over the parsed id.
        if let Some(only) = &self.only {
            if !only.iter().any(|pattern| pattern.matches(&parsed.id)) {
                return Ok(Resolution::External);
            }
        }

        // Delegate to the resolve walk.
        let mut filter = PackageFilter::new(&self.fields, &self.extensions);
        let walk_opts = WalkOptions {
            base_dir: &base_dir,
            extensions: &self.extensions,
            module_directory: &self.module_directory,
        };
        let resolved = resolve_walk(&walk_opts, &self.probe, &mut filter, &effective).await?;

        if filter.disregarded {
            return Ok(Resolution::External);
        }

        let Some(mut resolved) = resolved else {
            if parsed.is_relative {
                return Err(Error::CouldNotResolve {
                    specifier: importee.to_string(),
                    importer: importer.display().to_string(),
                });
            }
            // An unresolvable bare specifier never fails the build.
            return Ok(Resolution::External);
        };

        // Apply an override substitution discovered during delegation:
        // the package's own entry file may be remapped or suppressed.
        let override_map = filter.override_map.take().map(Arc::new);
        if let Some(map) = &override_map {
            match map.get(resolved.to_string_lossy().as_ref()) {
                Some(OverrideTarget::Suppress) => return Ok(Resolution::Empty),
                Some(OverrideTarget::Redirect(to)) => resolved = PathBuf::from(to),
                None => {}
            }
        }

        if !self.preserve_symlinks.load(Ordering::Relaxed) {
            resolved = dunce::canonicalize(&resolved).unwrap_or(resolved);
        }

        // Nested imports from the resolved file inherit its overrides.
        if let Some(map) = override_map {
            if !map.is_empty() {
                self.override_cache.insert(resolved.clone(), map);
            }
        }

        // Builtin preference.
        if resolved.to_str().is_some_and(is_builtin) {
            return Ok(Resolution::External);
        }
        if is_builtin(importee) && self.prefer_builtins.unwrap_or(true) {
            if self.prefer_builtins.is_none() {
                let mut warned = self.warned_builtins.lock().unwrap();
                if warned.insert(importee.to_string()) {
                    tracing::warn!(
                        target: "node-resolve",
                        "preferring built-in module '{importee}' over local \
                         alternative at '{}'; set `prefer_builtins` to false to \
                         disable this behavior, or to true to silence this warning",
                        resolved.display()
                    );
                }
            }
            return Ok(Resolution::External);
        }

        // Jail containment: escapes become external, never errors.
        if let Some(jail) = &self.jail {
            if !resolved.starts_with(jail) {
                return Ok(Resolution::External);
            }
        }

        // Modules-only filtering; a read failure here is fatal.
        if self.modules_only {
            let source = self.probe.read_file(&resolved).await?;
            if !has_module_syntax(&source) {
                return Ok(Resolution::External);
            }
        }

        Ok(Resolution::Resolved(resolved))
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("fields", &self.fields)
            .field("extensions", &self.extensions)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
