use std::{
    cell::Cell,
    ffi::OsStr,
    ops::Deref,
    path::{Path, PathBuf},
};

thread_local! {
    static SCRATCH_PATH: Cell<PathBuf> = const { Cell::new(PathBuf::new()) };
}

/// A path buffer borrowed from a per-thread cache, so walking every device directory does
/// not allocate a fresh `PathBuf` per file.
#[derive(Debug)]
pub(crate) struct ScratchPath {
    path: PathBuf,
}

impl ScratchPath {
    #[must_use]
    pub fn take(base: &Path) -> Self {
        let mut path = SCRATCH_PATH.take();
        path.clear();
        path.push(base);
        ScratchPath { path }
    }

    /// Replace everything after the base with `name`.
    pub fn set_entry(&mut self, base: &Path, name: &OsStr) {
        let storage = self.path.as_mut_os_string();
        storage.clear();
        storage.push(base);
        self.path.push(name);
    }

    /// Append `name` until the returned guard is dropped.
    pub fn child(&mut self, name: impl AsRef<OsStr>) -> ChildPath<'_> {
        self.path.push(name.as_ref());
        ChildPath {
            path: &mut self.path,
        }
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.path.clone()
    }
}

impl Deref for ScratchPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.path
    }
}

impl Drop for ScratchPath {
    fn drop(&mut self) {
        SCRATCH_PATH.replace(core::mem::take(&mut self.path));
    }
}

pub(crate) struct ChildPath<'p> {
    path: &'p mut PathBuf,
}

impl Deref for ChildPath<'_> {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        self.path
    }
}

impl Drop for ChildPath<'_> {
    fn drop(&mut self) {
        self.path.pop();
    }
}
