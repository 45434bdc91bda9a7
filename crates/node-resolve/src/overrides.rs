//! Manifest-declared import overrides.
//!
//! An object-valued `browser`/`syntax.*` field redirects specific file
//! imports inside a package to alternates, or suppresses them entirely.
//! The extracted map is cached per resolved path so nested imports
//! originating from that file inherit the override context.

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::specifier::normalize_lexically;

/// Replacement for an overridden import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideTarget {
    /// Substitute specifier or absolute path.
    Redirect(String),
    /// Resolve to the intentionally empty module.
    Suppress,
}

/// Mapping from file keys to their replacements.
///
/// Every `.`-leading key is additionally registered under its absolute
/// resolution, and, when it carries no extension, under that absolute
/// path suffixed with each configured extension. Later lookups may thus
/// match the bare specifier or any absolute/extended form.
#[derive(Debug, Clone, Default)]
pub struct OverrideMap {
    entries: FxHashMap<String, OverrideTarget>,
}

impl OverrideMap {
    /// Build a map from an object-valued manifest field.
    #[must_use]
    pub fn from_manifest_object(
        object: &Map<String, Value>,
        pkg_dir: &Path,
        extensions: &[String],
    ) -> Self {
        let mut entries = FxHashMap::default();
        for (key, value) in object {
            let target = match value {
                Value::String(s) if s.starts_with('.') => OverrideTarget::Redirect(
                    normalize_lexically(&pkg_dir.join(s))
                        .to_string_lossy()
                        .into_owned(),
                ),
                Value::String(s) => OverrideTarget::Redirect(s.clone()),
                Value::Bool(false) => OverrideTarget::Suppress,
                _ => continue,
            };

            entries.insert(key.clone(), target.clone());

            if key.starts_with('.') {
                let absolute = normalize_lexically(&pkg_dir.join(key))
                    .to_string_lossy()
                    .into_owned();
                if Path::new(&absolute).extension().is_none() {
                    for ext in extensions {
                        entries.insert(format!("{absolute}{ext}"), target.clone());
                    }
                }
                entries.insert(absolute, target);
            }
        }
        Self { entries }
    }

    /// Exact-key lookup (used against resolved absolute paths).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OverrideTarget> {
        self.entries.get(key)
    }

    /// Consult the map for an import of `importee` from a file in
    /// `importer_dir`.
    ///
    /// Checked in order: the importee as written, its absolute
    /// resolution, then that resolution with `.js` and `.json`.
    #[must_use]
    pub fn lookup(&self, importee: &str, importer_dir: &Path) -> Option<&OverrideTarget> {
        if let Some(target) = self.entries.get(importee) {
            return Some(target);
        }
        let absolute = normalize_lexically(&importer_dir.join(importee))
            .to_string_lossy()
            .into_owned();
        if let Some(target) = self.entries.get(&absolute) {
            return Some(target);
        }
        for ext in [".js", ".json"] {
            if let Some(target) = self.entries.get(&format!("{absolute}{ext}")) {
                return Some(target);
            }
        }
        None
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-resolved-path override maps, shared across one plugin instance
/// and cleared at each bundle-generation boundary.
#[derive(Debug, Default)]
pub struct OverrideCache {
    maps: Mutex<FxHashMap<PathBuf, Arc<OverrideMap>>>,
}

impl OverrideCache {
    /// Override map of the file at `importer`, if one was produced when
    /// that file itself was resolved.
    #[must_use]
    pub fn get(&self, importer: &Path) -> Option<Arc<OverrideMap>> {
        self.maps.lock().unwrap().get(importer).cloned()
    }

    pub fn insert(&self, resolved: PathBuf, map: Arc<OverrideMap>) {
        self.maps.lock().unwrap().insert(resolved, map);
    }

    pub fn clear(&self) {
        self.maps.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extensions() -> Vec<String> {
        vec![".js".to_string(), ".json".to_string()]
    }

    fn map_from(value: serde_json::Value) -> OverrideMap {
        let Value::Object(object) = value else {
            panic!("fixture must be an object");
        };
        OverrideMap::from_manifest_object(&object, Path::new("/pkg"), &extensions())
    }

    #[test]
    fn relative_values_resolve_against_package_root() {
        let map = map_from(json!({ "./a.js": "./b.js" }));
        assert_eq!(
            map.get("./a.js"),
            Some(&OverrideTarget::Redirect("/pkg/b.js".to_string()))
        );
        // Absolute form of the key points at the same replacement.
        assert_eq!(
            map.get("/pkg/a.js"),
            Some(&OverrideTarget::Redirect("/pkg/b.js".to_string()))
        );
    }

    #[test]
    fn extensionless_keys_fan_out_over_extensions() {
        let map = map_from(json!({ "./a": "./b.js" }));
        let expected = OverrideTarget::Redirect("/pkg/b.js".to_string());
        assert_eq!(map.get("/pkg/a"), Some(&expected));
        assert_eq!(map.get("/pkg/a.js"), Some(&expected));
        assert_eq!(map.get("/pkg/a.json"), Some(&expected));
    }

    #[test]
    fn false_becomes_suppress() {
        let map = map_from(json!({ "fs": false }));
        assert_eq!(map.get("fs"), Some(&OverrideTarget::Suppress));
    }

    #[test]
    fn lookup_order_prefers_literal_importee() {
        let map = map_from(json!({ "./a.js": "./b.js", "module-a": "./c.js" }));
        let hit = map.lookup("module-a", Path::new("/pkg/lib"));
        assert_eq!(hit, Some(&OverrideTarget::Redirect("/pkg/c.js".to_string())));

        let hit = map.lookup("../a.js", Path::new("/pkg/lib"));
        assert_eq!(hit, Some(&OverrideTarget::Redirect("/pkg/b.js".to_string())));
    }

    #[test]
    fn lookup_falls_back_to_known_extensions() {
        let map = map_from(json!({ "./a": "./b.js" }));
        let hit = map.lookup("./a", Path::new("/pkg"));
        assert_eq!(hit, Some(&OverrideTarget::Redirect("/pkg/b.js".to_string())));
    }

    #[test]
    fn cache_round_trip_and_clear() {
        let cache = OverrideCache::default();
        let map = Arc::new(map_from(json!({ "./a.js": "./b.js" })));
        cache.insert(PathBuf::from("/pkg/main.js"), Arc::clone(&map));

        assert!(cache.get(Path::new("/pkg/main.js")).is_some());
        assert!(cache.get(Path::new("/pkg/other.js")).is_none());

        cache.clear();
        assert!(cache.get(Path::new("/pkg/main.js")).is_none());
    }
}
