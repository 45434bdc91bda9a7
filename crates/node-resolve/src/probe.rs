//! Cached, de-duplicated filesystem probes.
//!
//! `is_file` and `read_file` are backed by at most one in-flight
//! operation per unique path: the shared future is registered under the
//! map lock, before any await point, so concurrent callers for the same
//! path always join the same I/O request. Results stay cached until
//! [`FsProbe::clear`] at the bundle-generation boundary.

use futures::future::{BoxFuture, FutureExt, Shared};
use rustc_hash::FxHashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::Error;

/// A filesystem failure observed by a probe.
///
/// Cloneable so every waiter on a shared in-flight probe receives it.
#[derive(Debug, Clone)]
pub struct ProbeError {
    path: PathBuf,
    source: Arc<io::Error>,
}

impl ProbeError {
    fn new(path: PathBuf, source: io::Error) -> Self {
        Self {
            path,
            source: Arc::new(source),
        }
    }

    /// The path whose probe failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to access {}: {}", self.path.display(), self.source)
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<ProbeError> for Error {
    fn from(err: ProbeError) -> Self {
        Error::Probe {
            path: err.path,
            source: err.source,
        }
    }
}

type FileFuture = Shared<BoxFuture<'static, Result<bool, ProbeError>>>;
type ContentFuture = Shared<BoxFuture<'static, Result<Arc<str>, ProbeError>>>;

/// Probe layer with per-path request de-duplication.
#[derive(Default)]
pub struct FsProbe {
    files: Mutex<FxHashMap<PathBuf, FileFuture>>,
    contents: Mutex<FxHashMap<PathBuf, ContentFuture>>,
    issued: AtomicU64,
}

impl FsProbe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `path` exists and is a regular file.
    ///
    /// Not-found is a negative result, not an error. Any other I/O
    /// failure propagates to every waiter and evicts the entry so a
    /// later call retries.
    pub async fn is_file(&self, path: &Path) -> Result<bool, ProbeError> {
        let fut = {
            let mut files = self.files.lock().unwrap();
            if let Some(existing) = files.get(path) {
                existing.clone()
            } else {
                self.issued.fetch_add(1, Ordering::Relaxed);
                let owned = path.to_path_buf();
                let fut = async move {
                    match tokio::fs::metadata(&owned).await {
                        Ok(meta) => Ok(meta.is_file()),
                        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
                        Err(e) => Err(ProbeError::new(owned, e)),
                    }
                }
                .boxed()
                .shared();
                files.insert(path.to_path_buf(), fut.clone());
                fut
            }
        };

        let result = fut.await;
        if result.is_err() {
            self.files.lock().unwrap().remove(path);
        }
        result
    }

    /// Read the contents of `path`.
    ///
    /// Errors (including not-found) propagate to every waiter and evict
    /// the entry.
    pub async fn read_file(&self, path: &Path) -> Result<Arc<str>, ProbeError> {
        let fut = {
            let mut contents = self.contents.lock().unwrap();
            if let Some(existing) = contents.get(path) {
                existing.clone()
            } else {
                self.issued.fetch_add(1, Ordering::Relaxed);
                let owned = path.to_path_buf();
                let fut = async move {
                    match tokio::fs::read_to_string(&owned).await {
                        Ok(text) => Ok(Arc::from(text.as_str())),
                        Err(e) => Err(ProbeError::new(owned, e)),
                    }
                }
                .boxed()
                .shared();
                contents.insert(path.to_path_buf(), fut.clone());
                fut
            }
        };

        let result = fut.await;
        if result.is_err() {
            self.contents.lock().unwrap().remove(path);
        }
        result
    }

    /// Drop both caches. Called at every bundle-generation boundary.
    pub fn clear(&self) {
        self.files.lock().unwrap().clear();
        self.contents.lock().unwrap().clear();
    }

    /// Number of underlying filesystem operations issued so far.
    ///
    /// Diagnostics counter; one increment per unique in-flight request.
    #[must_use]
    pub fn io_count(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for FsProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsProbe")
            .field("issued", &self.io_count())
            .finish_non_exhaustive()
    }
}
