use std::path::{Path, PathBuf};

/// Where a store file lives and whether it is already there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: PathBuf,
    /// A store file already exists at `path`.
    pub exists: bool,
    /// The parent directory of `path` must be created before opening.
    pub create_dirs: bool,
}

/// Maps a proposed store file name to a location on disk.
pub trait PathResolver: Send + Sync + 'static {
    fn resolve(&self, proposed: &str) -> ResolvedPath;
}

/// Resolves file names against one data directory. Absolute names are used as given.
#[derive(Debug, Clone)]
pub struct DataDirResolver {
    root: PathBuf,
}

impl DataDirResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PathResolver for DataDirResolver {
    fn resolve(&self, proposed: &str) -> ResolvedPath {
        let path = self.root.join(proposed);
        if path.is_file() {
            return ResolvedPath {
                path,
                exists: true,
                create_dirs: false,
            };
        }
        let create_dirs = path
            .parent()
            .is_some_and(|dir| !dir.as_os_str().is_empty() && !dir.is_dir());
        ResolvedPath {
            path,
            exists: false,
            create_dirs,
        }
    }
}
