//! The resolve walk.
//!
//! Node-style candidate probing: exact file, file plus each configured
//! extension, directory entry via the manifest hook, directory index,
//! and `node_modules` ascent for bare specifiers. All I/O goes through
//! the probe layer; every manifest read passes through the package
//! filter.

use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::manifest::PackageFilter;
use crate::probe::FsProbe;
use crate::specifier::normalize_lexically;

/// Parameters of one walk invocation.
#[derive(Debug, Clone, Copy)]
pub struct WalkOptions<'a> {
    /// Directory resolution starts from (the importer's parent, unless
    /// dedupe or custom options forced another root).
    pub base_dir: &'a Path,
    /// Extensions probed in order.
    pub extensions: &'a [String],
    /// Directory name searched for packages.
    pub module_directory: &'a str,
}

/// Resolve `importee` to a candidate file, or `None` when nothing
/// matched (or the candidate was disregarded by the filter).
pub async fn resolve_walk(
    opts: &WalkOptions<'_>,
    probe: &FsProbe,
    filter: &mut PackageFilter<'_>,
    importee: &str,
) -> Result<Option<PathBuf>, Error> {
    if is_path_like(importee) {
        let base = if Path::new(importee).is_absolute() {
            normalize_lexically(Path::new(importee))
        } else {
            normalize_lexically(&opts.base_dir.join(importee))
        };
        if let Some(found) = load_as_file(opts, probe, &base).await? {
            return Ok(Some(found));
        }
        return load_as_dir(opts, probe, filter, &base).await;
    }

    resolve_bare(opts, probe, filter, importee).await
}

fn is_path_like(spec: &str) -> bool {
    spec.starts_with('/')
        || spec.starts_with("./")
        || spec.starts_with("../")
        || spec == "."
        || spec == ".."
        || Path::new(spec).is_absolute()
}

/// Split a bare specifier into package name and optional subpath.
fn split_package_specifier(spec: &str) -> (&str, Option<&str>) {
    if spec.starts_with('@') {
        let mut slashes = 0;
        for (i, c) in spec.char_indices() {
            if c == '/' {
                slashes += 1;
                if slashes == 2 {
                    return (&spec[..i], Some(&spec[i + 1..]));
                }
            }
        }
        return (spec, None);
    }

    match spec.find('/') {
        Some(pos) => (&spec[..pos], Some(&spec[pos + 1..])),
        None => (spec, None),
    }
}

fn append_extension(base: &Path, ext: &str) -> PathBuf {
    let mut joined = base.as_os_str().to_os_string();
    joined.push(ext);
    PathBuf::from(joined)
}

/// Exact file, then each configured extension in order.
async fn load_as_file(
    opts: &WalkOptions<'_>,
    probe: &FsProbe,
    base: &Path,
) -> Result<Option<PathBuf>, Error> {
    if probe.is_file(base).await? {
        return Ok(Some(base.to_path_buf()));
    }
    for ext in opts.extensions {
        let candidate = append_extension(base, ext);
        if probe.is_file(&candidate).await? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// `index.<ext>` probing inside a directory.
async fn load_index(
    opts: &WalkOptions<'_>,
    probe: &FsProbe,
    dir: &Path,
) -> Result<Option<PathBuf>, Error> {
    for ext in opts.extensions {
        let candidate = dir.join(format!("index{ext}"));
        if probe.is_file(&candidate).await? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Directory resolution: manifest entry (through the filter), entry as
/// directory, then index files.
async fn load_as_dir(
    opts: &WalkOptions<'_>,
    probe: &FsProbe,
    filter: &mut PackageFilter<'_>,
    dir: &Path,
) -> Result<Option<PathBuf>, Error> {
    let manifest_path = dir.join("package.json");
    if probe.is_file(&manifest_path).await? {
        let content = probe.read_file(&manifest_path).await?;
        if let Ok(Value::Object(mut manifest)) = serde_json::from_str::<Value>(&content) {
            filter.apply(&mut manifest, dir);
            if filter.disregarded {
                return Ok(None);
            }
            if let Some(entry) = manifest.get("main").and_then(Value::as_str) {
                let entry_path = normalize_lexically(&dir.join(entry));
                if let Some(found) = load_as_file(opts, probe, &entry_path).await? {
                    return Ok(Some(found));
                }
                if let Some(found) = load_index(opts, probe, &entry_path).await? {
                    return Ok(Some(found));
                }
            }
        }
    }
    load_index(opts, probe, dir).await
}

/// Bare specifier: ascend from the base directory probing
/// `<ancestor>/<module_directory>/<package>`.
async fn resolve_bare(
    opts: &WalkOptions<'_>,
    probe: &FsProbe,
    filter: &mut PackageFilter<'_>,
    spec: &str,
) -> Result<Option<PathBuf>, Error> {
    let (pkg_name, subpath) = split_package_specifier(spec);

    let mut current = Some(opts.base_dir);
    while let Some(dir) = current {
        let pkg_dir = dir.join(opts.module_directory).join(pkg_name);
        let manifest_path = pkg_dir.join("package.json");

        let manifest = if probe.is_file(&manifest_path).await? {
            let content = probe.read_file(&manifest_path).await?;
            match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            }
        } else {
            None
        };

        if let Some(mut manifest) = manifest {
            match subpath {
                None => {
                    filter.apply(&mut manifest, &pkg_dir);
                    if filter.disregarded {
                        return Ok(None);
                    }
                    if let Some(entry) = manifest.get("main").and_then(Value::as_str) {
                        let entry_path = normalize_lexically(&pkg_dir.join(entry));
                        if let Some(found) = load_as_file(opts, probe, &entry_path).await? {
                            return Ok(Some(found));
                        }
                        if let Some(found) = load_index(opts, probe, &entry_path).await? {
                            return Ok(Some(found));
                        }
                    }
                    if let Some(found) = load_index(opts, probe, &pkg_dir).await? {
                        return Ok(Some(found));
                    }
                }
                Some(sub) => {
                    // The root manifest only contributes overrides here:
                    // entry-field disregard gates entry-point imports,
                    // not imports of a specific file in the package.
                    filter.extract_overrides(&manifest, &pkg_dir);
                    let candidate = normalize_lexically(&pkg_dir.join(sub));
                    if let Some(found) = load_as_file(opts, probe, &candidate).await? {
                        return Ok(Some(found));
                    }
                    if let Some(found) = load_as_dir(opts, probe, filter, &candidate).await? {
                        return Ok(Some(found));
                    }
                }
            }
        } else {
            // Missing or unparseable manifest; the package may still
            // exist as plain files.
            let candidate = match subpath {
                Some(sub) => normalize_lexically(&pkg_dir.join(sub)),
                None => pkg_dir.clone(),
            };
            if let Some(found) = load_as_file(opts, probe, &candidate).await? {
                return Ok(Some(found));
            }
            if let Some(found) = load_index(opts, probe, &candidate).await? {
                return Ok(Some(found));
            }
        }

        current = dir.parent();
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn default_extensions() -> Vec<String> {
        vec![
            ".mjs".to_string(),
            ".js".to_string(),
            ".json".to_string(),
            ".node".to_string(),
        ]
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    async fn walk(
        base_dir: &Path,
        precedence: &[String],
        spec: &str,
    ) -> Result<Option<PathBuf>, Error> {
        let extensions = default_extensions();
        let probe = FsProbe::new();
        let mut filter = PackageFilter::new(precedence, &extensions);
        let opts = WalkOptions {
            base_dir,
            extensions: &extensions,
            module_directory: "node_modules",
        };
        resolve_walk(&opts, &probe, &mut filter, spec).await
    }

    #[test]
    fn splits_package_specifiers() {
        assert_eq!(split_package_specifier("lodash"), ("lodash", None));
        assert_eq!(split_package_specifier("lodash/map"), ("lodash", Some("map")));
        assert_eq!(split_package_specifier("@scope/pkg"), ("@scope/pkg", None));
        assert_eq!(
            split_package_specifier("@scope/pkg/lib/a"),
            ("@scope/pkg", Some("lib/a"))
        );
    }

    #[tokio::test]
    async fn relative_extension_probing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("dep.js"), "export {}").unwrap();

        let precedence = fields(&["module", "main"]);
        let found = walk(dir.path(), &precedence, "./dep").await.unwrap();
        assert_eq!(found, Some(dir.path().join("dep.js")));
    }

    #[tokio::test]
    async fn extension_order_is_respected() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("dep.mjs"), "export {}").unwrap();
        fs::write(dir.path().join("dep.js"), "export {}").unwrap();

        let precedence = fields(&["module", "main"]);
        let found = walk(dir.path(), &precedence, "./dep").await.unwrap();
        assert_eq!(found, Some(dir.path().join("dep.mjs")));
    }

    #[tokio::test]
    async fn directory_index_fallback() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("utils")).unwrap();
        fs::write(dir.path().join("utils/index.js"), "export {}").unwrap();

        let precedence = fields(&["module", "main"]);
        let found = walk(dir.path(), &precedence, "./utils").await.unwrap();
        assert_eq!(found, Some(dir.path().join("utils/index.js")));
    }

    #[tokio::test]
    async fn bare_specifier_uses_entry_field() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("node_modules/dep");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(
            pkg.join("package.json"),
            r#"{ "module": "m.js", "main": "c.js" }"#,
        )
        .unwrap();
        fs::write(pkg.join("m.js"), "export {}").unwrap();
        fs::write(pkg.join("c.js"), "module.exports = {}").unwrap();

        let precedence = fields(&["module", "main"]);
        let found = walk(dir.path(), &precedence, "dep").await.unwrap();
        assert_eq!(found, Some(pkg.join("m.js")));

        let precedence = fields(&["main"]);
        let found = walk(dir.path(), &precedence, "dep").await.unwrap();
        assert_eq!(found, Some(pkg.join("c.js")));
    }

    #[tokio::test]
    async fn bare_specifier_ascends_to_ancestors() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("node_modules/dep");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), r#"{ "main": "c.js" }"#).unwrap();
        fs::write(pkg.join("c.js"), "module.exports = {}").unwrap();

        let nested = dir.path().join("src/deep");
        fs::create_dir_all(&nested).unwrap();

        let precedence = fields(&["module", "main"]);
        let found = walk(&nested, &precedence, "dep").await.unwrap();
        assert_eq!(found, Some(pkg.join("c.js")));
    }

    #[tokio::test]
    async fn scoped_subpath_resolution() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("node_modules/@scope/pkg");
        fs::create_dir_all(pkg.join("lib")).unwrap();
        fs::write(pkg.join("package.json"), r#"{ "main": "c.js" }"#).unwrap();
        fs::write(pkg.join("c.js"), "").unwrap();
        fs::write(pkg.join("lib/a.js"), "export {}").unwrap();

        let precedence = fields(&["module", "main"]);
        let found = walk(dir.path(), &precedence, "@scope/pkg/lib/a")
            .await
            .unwrap();
        assert_eq!(found, Some(pkg.join("lib/a.js")));
    }

    #[tokio::test]
    async fn entry_pointing_at_directory_uses_its_index() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("node_modules/dep");
        fs::create_dir_all(pkg.join("lib")).unwrap();
        fs::write(pkg.join("package.json"), r#"{ "main": "./lib" }"#).unwrap();
        fs::write(pkg.join("lib/index.js"), "export {}").unwrap();

        let precedence = fields(&["module", "main"]);
        let found = walk(dir.path(), &precedence, "dep").await.unwrap();
        assert_eq!(found, Some(pkg.join("lib/index.js")));
    }

    #[tokio::test]
    async fn disregarded_package_is_not_accepted() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("node_modules/legacy");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), r#"{ "main": "c.js" }"#).unwrap();
        fs::write(pkg.join("c.js"), "module.exports = {}").unwrap();
        fs::write(pkg.join("index.js"), "module.exports = {}").unwrap();

        // `module`-only precedence: the index file must not rescue the
        // candidate.
        let precedence = fields(&["module"]);
        let found = walk(dir.path(), &precedence, "legacy").await.unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn subpath_import_ignores_missing_entry_fields() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("node_modules/legacy");
        fs::create_dir_all(pkg.join("lib")).unwrap();
        fs::write(pkg.join("package.json"), r#"{ "main": "c.js" }"#).unwrap();
        fs::write(pkg.join("c.js"), "module.exports = {}").unwrap();
        fs::write(pkg.join("lib/util.js"), "module.exports = {}").unwrap();

        // The root manifest has no `module` field, but that only gates
        // entry-point imports.
        let precedence = fields(&["module"]);
        let found = walk(dir.path(), &precedence, "legacy/lib/util.js")
            .await
            .unwrap();
        assert_eq!(found, Some(pkg.join("lib/util.js")));
    }

    #[tokio::test]
    async fn invalid_manifest_falls_back_to_index() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("node_modules/broken");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), "{ not json").unwrap();
        fs::write(pkg.join("index.js"), "export {}").unwrap();

        let precedence = fields(&["module", "main"]);
        let found = walk(dir.path(), &precedence, "broken").await.unwrap();
        assert_eq!(found, Some(pkg.join("index.js")));
    }

    #[tokio::test]
    async fn missing_candidate_resolves_to_none() {
        let dir = tempdir().unwrap();
        let precedence = fields(&["module", "main"]);
        assert_eq!(walk(dir.path(), &precedence, "./ghost").await.unwrap(), None);
        assert_eq!(walk(dir.path(), &precedence, "ghost").await.unwrap(), None);
    }
}
