//! Platform builtin module names.
//!
//! Builtins resolve to bare names rather than on-disk paths, so the
//! resolver treats them as external. The set is fixed and loaded once.

use rustc_hash::FxHashSet;
use std::sync::OnceLock;

const NODE_BUILTINS: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

static BUILTIN_SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();

/// Whether `name` is a platform builtin module.
#[must_use]
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_SET
        .get_or_init(|| NODE_BUILTINS.iter().copied().collect())
        .contains(name)
}
