//! Package cache on the local filesystem.
//!
//! One file per package, named from the package's short name. A
//! zero-length file marks a blacklisted package: it exists but will never
//! be loaded or overwritten.

use shared_types::PackageName;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::CacheError;
use crate::ports::PackageCache;

const PACKAGE_EXTENSION: &str = "pkg";

#[derive(Debug, Clone)]
pub struct FsPackageCache {
    root: PathBuf,
}

impl FsPackageCache {
    /// Open (creating if needed) a cache rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| CacheError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, package: &PackageName) -> PathBuf {
        self.root.join(package.file_name())
    }

    /// Refuse `package` from now on.
    pub fn blacklist(&self, package: &PackageName) -> Result<(), CacheError> {
        let path = self.path_for(package);
        fs::File::create(&path).map_err(|source| CacheError::Io { path, source })?;
        info!(package = %package.full(), "package blacklisted");
        Ok(())
    }

    fn is_blacklisted_file(path: &Path) -> bool {
        fs::metadata(path).map(|m| m.len() == 0).unwrap_or(false)
    }
}

impl PackageCache for FsPackageCache {
    fn exists(&self, package: &PackageName) -> bool {
        fs::metadata(self.path_for(package))
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }

    fn install(&self, source: &Path, package: &PackageName) -> Result<(), CacheError> {
        let target = self.path_for(package);
        if Self::is_blacklisted_file(&target) {
            return Err(CacheError::Blacklisted(package.full().to_string()));
        }

        let bytes = fs::read(source).map_err(|e| CacheError::Io {
            path: source.to_path_buf(),
            source: e,
        })?;
        if bytes.is_empty() {
            return Err(CacheError::Empty(package.full().to_string()));
        }

        // Stage next to the target so the final rename never crosses devices.
        let io_err = |source: std::io::Error| CacheError::Io {
            path: target.clone(),
            source,
        };
        let mut staged = tempfile::NamedTempFile::new_in(&self.root).map_err(io_err)?;
        staged.write_all(&bytes).map_err(io_err)?;
        staged
            .persist(&target)
            .map_err(|e| io_err(e.error))?;

        debug!(package = %package.full(), path = %target.display(), "package installed");
        Ok(())
    }

    fn load(&self, package: &PackageName) -> Result<Vec<u8>, CacheError> {
        let path = self.path_for(package);
        let bytes = fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                CacheError::NotFound(package.full().to_string())
            } else {
                CacheError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        if bytes.is_empty() {
            return Err(CacheError::Blacklisted(package.full().to_string()));
        }
        Ok(bytes)
    }

    fn blacklisted(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension().and_then(|e| e.to_str()) == Some(PACKAGE_EXTENSION)
                    && Self::is_blacklisted_file(path)
            })
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        names.sort();
        names
    }
}
