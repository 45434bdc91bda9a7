//! Bundler plugin surface.
//!
//! Thin hook adapter over [`Resolver`]: the host drives `options`,
//! `resolve_id` and `generate_bundle`; everything else lives in the
//! resolution core.

use crate::error::Error;
use crate::options::NodeResolveOptions;
use crate::resolve::{Resolution, Resolver};

/// Host-side settings observed at the `options` hook.
#[derive(Debug, Clone, Default)]
pub struct HostOptions {
    /// Keep symlinked paths as-is instead of canonicalizing them.
    pub preserve_symlinks: bool,
}

/// The node-resolve plugin.
#[derive(Debug)]
pub struct NodeResolvePlugin {
    resolver: Resolver,
}

impl NodeResolvePlugin {
    /// Build the plugin, validating its configuration up front.
    pub fn new(options: NodeResolveOptions) -> Result<Self, Error> {
        Ok(Self {
            resolver: Resolver::new(options)?,
        })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        "node-resolve"
    }

    /// `options` hook: pick up host settings before the build starts.
    pub fn options(&self, host: &HostOptions) {
        self.resolver.set_preserve_symlinks(host.preserve_symlinks);
    }

    /// `resolveId` hook.
    pub async fn resolve_id(
        &self,
        importee: &str,
        importer: Option<&str>,
    ) -> Result<Resolution, Error> {
        self.resolver.resolve_id(importee, importer).await
    }

    /// `generateBundle` hook: drop cached filesystem and override state
    /// so a watch-mode rebuild observes fresh contents.
    pub fn generate_bundle(&self) {
        self.resolver.clear_caches();
    }

    /// Filesystem operations issued since construction or the last
    /// cache clear served a miss.
    #[must_use]
    pub fn probe_io_count(&self) -> u64 {
        self.resolver.probe().io_count()
    }
}
