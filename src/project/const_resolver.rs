//! Cross-file constant resolution.
//!
//! When a namespaced name is not known to the registry, the semantic walker
//! asks this resolver which source files could define it, based on the
//! conventional name→path mapping (`Foo::BarBaz` → `foo/bar_baz`, with a
//! dashed fallback for gem-style flat layouts). The resolver never parses
//! anything; disambiguation and loading are the caller's responsibility.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Resolver configuration rejected at construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configured base path exists but is not a directory.
    #[error("search path is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Maps an unresolved namespaced name to candidate defining files.
///
/// The directory set is fixed at construction (no mutators), so the
/// once-built file inventory and the per-name scan cache stay valid for the
/// resolver's whole lifetime. Both caches use the double-checked locking
/// idiom, which lets one resolver be shared across sequential runs.
pub struct ConstantResolver {
    directories: Vec<PathBuf>,
    ignore: Vec<PathBuf>,
    inventory: RwLock<Option<Arc<Vec<PathBuf>>>>,
    cache: RwLock<FxHashMap<SmolStr, Arc<[PathBuf]>>>,
}

impl ConstantResolver {
    /// Create a resolver over the given base search directories.
    ///
    /// Fails fast when a configured path exists but is not a directory.
    /// Paths that do not exist are dropped (an empty directory list means
    /// every scan returns empty). Files under any `ignore` prefix are
    /// excluded from scans.
    pub fn new(
        directories: impl IntoIterator<Item = PathBuf>,
        ignore: Vec<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let mut kept = Vec::new();
        for dir in directories {
            if dir.exists() {
                if !dir.is_dir() {
                    return Err(ConfigError::NotADirectory(dir));
                }
                kept.push(dir);
            } else {
                debug!(path = %dir.display(), "skipping missing search directory");
            }
        }

        // Normalize ignore prefixes so they compare against the
        // canonicalized inventory paths.
        let ignore = ignore
            .into_iter()
            .map(|path| std::fs::canonicalize(&path).unwrap_or(path))
            .collect();

        Ok(Self {
            directories: kept,
            ignore,
            inventory: RwLock::new(None),
            cache: RwLock::new(FxHashMap::default()),
        })
    }

    /// Create a resolver over the conventional source roots (`lib`, `src`,
    /// `app`) that exist under a project root.
    pub fn for_project(root: &Path, ignore: Vec<PathBuf>) -> Result<Self, ConfigError> {
        let roots = ["lib", "src", "app"]
            .into_iter()
            .map(|name| root.join(name))
            .filter(|path| path.is_dir());
        Self::new(roots, ignore)
    }

    /// The configured (existing) base directories.
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Candidate files for a namespaced name, shortest-path-first.
    ///
    /// Results are deduplicated, ignore-filtered, and memoized per name for
    /// the resolver's lifetime. Multiple matches are all returned, sorted;
    /// picking one is the caller's job.
    pub fn scan(&self, name: &str) -> Arc<[PathBuf]> {
        {
            let cache = self.cache.read();
            if let Some(hit) = cache.get(name) {
                return hit.clone();
            }
        }

        let mut matches = self.collect_matches(&candidate_path(name, false));
        if matches.is_empty() {
            matches = self.collect_matches(&candidate_path(name, true));
        }

        matches.sort_by(|a, b| {
            let a_len = a.components().count();
            let b_len = b.components().count();
            a_len.cmp(&b_len).then_with(|| a.cmp(b))
        });
        matches.dedup();

        debug!(name, count = matches.len(), "constant path scan");

        let result: Arc<[PathBuf]> = matches.into();
        let mut cache = self.cache.write();
        cache
            .entry(SmolStr::new(name))
            .or_insert_with(|| result.clone())
            .clone()
    }

    fn collect_matches(&self, candidate: &[String]) -> Vec<PathBuf> {
        if candidate.is_empty() {
            return Vec::new();
        }
        self.inventory()
            .iter()
            .filter(|path| path_matches(path, candidate))
            .cloned()
            .collect()
    }

    /// The once-built inventory of every file under the base directories.
    fn inventory(&self) -> Arc<Vec<PathBuf>> {
        {
            let inventory = self.inventory.read();
            if let Some(built) = inventory.as_ref() {
                return built.clone();
            }
        }

        let mut inventory = self.inventory.write();
        if let Some(built) = inventory.as_ref() {
            return built.clone();
        }

        let mut files = Vec::new();
        for dir in &self.directories {
            for entry in WalkDir::new(dir).into_iter().filter_map(Result::ok) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.into_path();
                let absolute = std::fs::canonicalize(&path).unwrap_or(path);
                if self.ignore.iter().any(|prefix| absolute.starts_with(prefix)) {
                    continue;
                }
                files.push(absolute);
            }
        }
        debug!(files = files.len(), "built constant path inventory");

        let built = Arc::new(files);
        *inventory = Some(built.clone());
        built
    }
}

/// Derive the candidate relative path segments for a namespaced name.
///
/// Primary convention: every segment lowercased with underscore word
/// boundaries, one path component per namespace segment. Dashed fallback:
/// intermediate segments collapse into a single dash-joined component
/// (`DevKit::Scanner` → `dev-kit/scanner` style gem layouts).
fn candidate_path(name: &str, dashed: bool) -> Vec<String> {
    let segments: Vec<String> = name
        .split("::")
        .filter(|s| !s.is_empty())
        .map(underscore)
        .collect();

    if segments.is_empty() {
        return Vec::new();
    }

    if dashed && segments.len() > 1 {
        if let Some((last, init)) = segments.split_last() {
            return vec![init.join("-"), last.clone()];
        }
    }

    segments
}

/// Lowercase-underscore a namespace segment: `BarBaz` → `bar_baz`.
fn underscore(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 4);
    let mut prev_lower = false;
    for ch in segment.chars() {
        if ch.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower = false;
        } else {
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
            out.push(ch);
        }
    }
    out
}

/// Does `path`'s stem end with the candidate components at a full
/// path-segment boundary? Never a substring match.
fn path_matches(path: &Path, candidate: &[String]) -> bool {
    let mut components: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    let Some(file_name) = components.pop() else {
        return false;
    };
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _ext)) => stem.to_owned(),
        None => file_name,
    };
    components.push(stem);

    if candidate.len() > components.len() {
        return false;
    }
    components
        .iter()
        .rev()
        .zip(candidate.iter().rev())
        .all(|(have, want)| have == want)
}
