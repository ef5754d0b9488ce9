use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

/// Throwaway directory laid out like `/sys/bus/pci/devices`.
pub(crate) struct SysfsTree {
    dir: TempDir,
}

impl SysfsTree {
    pub fn new() -> Self {
        SysfsTree {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Create a device directory with `vendor` and `device` files.
    pub fn device(&self, name: &str, vendor: &str, device: &str) -> PathBuf {
        let path = self.root().join(name);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("vendor"), format!("{vendor}\n")).unwrap();
        fs::write(path.join("device"), format!("{device}\n")).unwrap();
        path
    }

    /// Create `resourceN` with `size` bytes.
    pub fn bar(&self, device: &Path, bar: u8, size: usize) {
        fs::write(device.join(format!("resource{bar}")), vec![0u8; size]).unwrap();
    }

    pub fn resource(&self, device: &Path, content: &str) {
        fs::write(device.join("resource"), content).unwrap();
    }
}
