//! Package descriptor filtering.
//!
//! Invoked by the resolve walk whenever it reads a `package.json` for a
//! candidate. Selects the entry-point field per the configured
//! precedence, injects it into the conventional `main` slot, and
//! extracts any override map from an object-valued browser/syntax
//! field.

use serde_json::{Map, Value};
use std::path::Path;

use crate::overrides::OverrideMap;

/// Per-resolution filter state threaded through the walk.
///
/// Replaces the shared closure flags of ad-hoc resolvers: one instance
/// per `resolve_id` call, so concurrent resolutions never alias.
#[derive(Debug)]
pub struct PackageFilter<'a> {
    fields: &'a [String],
    extensions: &'a [String],
    /// The last-seen candidate matched no field and the precedence
    /// excludes plain `main`; it must not be accepted.
    pub disregarded: bool,
    /// Override map extracted from a browser/syntax object field.
    pub override_map: Option<OverrideMap>,
}

impl<'a> PackageFilter<'a> {
    #[must_use]
    pub fn new(fields: &'a [String], extensions: &'a [String]) -> Self {
        Self {
            fields,
            extensions,
            disregarded: false,
            override_map: None,
        }
    }

    /// Apply the field precedence to a manifest located at `pkg_dir`.
    ///
    /// The first field holding a string value wins and is written into
    /// the manifest's `main` slot before the walk continues.
    pub fn apply(&mut self, manifest: &mut Map<String, Value>, pkg_dir: &Path) {
        let mut entry: Option<String> = None;
        let mut allows_main = false;

        for field in self.fields {
            if field == "main" {
                allows_main = true;
            }
            if entry.is_none() {
                if let Some(Value::String(s)) = lookup_field(manifest, field) {
                    entry = Some(s.clone());
                }
            }
        }

        self.extract_overrides(manifest, pkg_dir);

        if let Some(entry) = entry {
            manifest.insert("main".to_string(), Value::String(entry));
            self.disregarded = false;
        } else {
            self.disregarded = !allows_main;
        }
    }

    /// Pull an override map out of an object-valued browser/syntax
    /// field without touching entry selection.
    ///
    /// Used directly for subpath imports, where the package-root
    /// manifest contributes overrides but its entry fields do not gate
    /// the import.
    pub fn extract_overrides(&mut self, manifest: &Map<String, Value>, pkg_dir: &Path) {
        if self.override_map.is_some() {
            return;
        }
        for field in self.fields {
            if field != "browser" && !field.starts_with("syntax.") {
                continue;
            }
            if let Some(Value::Object(object)) = lookup_field(manifest, field) {
                self.override_map = Some(OverrideMap::from_manifest_object(
                    object,
                    pkg_dir,
                    self.extensions,
                ));
                break;
            }
        }
    }
}

/// Look up a precedence field, descending into the `syntax` group for
/// namespaced `syntax.<key>` names.
fn lookup_field<'m>(manifest: &'m Map<String, Value>, field: &str) -> Option<&'m Value> {
    if let Some(key) = field.strip_prefix("syntax.") {
        manifest.get("syntax")?.get(key)
    } else {
        manifest.get(field)
    }
}
