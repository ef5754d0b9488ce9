//! Locate PCI devices in the Linux sysfs tree by vendor and device id and read the base
//! address and size of their BARs.
//!
//! ```no_run
//! use pciinfo::{Config, DeviceIdentity, PciInfo};
//!
//! let pci = PciInfo::new(Config::default());
//! let id = DeviceIdentity::new("0x110A", "0x4080")?;
//! let device = pci.find(&id, 256)?.into_unique(&id)?;
//! for bar in pci.bar_exists(&device).bars() {
//!     let addr = pci.bar_physical_address(&device, bar.get())?;
//!     let size = pci.bar_size(&device, bar.get())?;
//!     println!("BAR{bar}: {addr:#010x} ({size} bytes)");
//! }
//! # Ok::<(), pciinfo::PciInfoError>(())
//! ```

mod config;
mod error;
mod parse;
pub mod pci;
mod scratch_path;
#[cfg(test)]
mod test_util;
mod types;

use std::path::{Path, PathBuf};

pub use config::{Config, SYS_BUS_PCI_DEVICES, SizeSource};
pub use error::{PciInfoError, Result};
pub use pci::{PciResource, ResourceFlags, ResourceKind};
pub use types::{BAR_COUNT, BarIndex, BarSet, DeviceIdentity, DevicePath, MatchResult};

/// Entry point for all lookups. Holds only configuration; every call reads sysfs again, so
/// hot-plugged or removed devices are always seen as they are now.
#[derive(Debug, Clone, Default)]
pub struct PciInfo {
    config: Config,
}

impl PciInfo {
    #[must_use]
    pub fn new(config: Config) -> Self {
        PciInfo { config }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Look for the device with the given ids. A unique match whose path is longer than
    /// `path_capacity` bytes fails with [`PciInfoError::BufferTooSmall`].
    pub fn find(&self, identity: &DeviceIdentity, path_capacity: usize) -> Result<MatchResult> {
        pci::find(&self.config, identity, path_capacity)
    }

    /// Path of the `resourceN` entry of the unique device matching `identity`.
    pub fn bar_path(
        &self,
        identity: &DeviceIdentity,
        bar: u8,
        path_capacity: usize,
    ) -> Result<PathBuf> {
        let bar = BarIndex::try_from(bar)?;
        let device = self.find(identity, path_capacity)?.into_unique(identity)?;
        let path = device.resource_entry(bar);
        Ok(DevicePath::bounded(path, path_capacity)?.into_path_buf())
    }

    /// Slots whose `resourceN` entry is a non-empty regular file, by the same size source as
    /// [`PciInfo::bar_size`].
    pub fn bar_exists(&self, device: impl AsRef<Path>) -> BarSet {
        pci::bar_exists(&self.config, device.as_ref())
    }

    /// Size of BAR `bar` in bytes, 0 when the slot is not populated or its entry is not a
    /// regular file. Symlinks are followed.
    pub fn bar_size(&self, device: impl AsRef<Path>, bar: u8) -> Result<u64> {
        pci::bar_size(&self.config, device.as_ref(), BarIndex::try_from(bar)?)
    }

    /// Physical base address of BAR `bar`, the first column of line `bar` of the device's
    /// `resource` file.
    pub fn bar_physical_address(&self, device: impl AsRef<Path>, bar: u8) -> Result<u64> {
        pci::bar_physical_address(&self.config, device.as_ref(), BarIndex::try_from(bar)?)
    }

    /// Every line of the device's `resource` file, including ROM and bridge windows.
    pub fn resources(&self, device: impl AsRef<Path>) -> Result<Vec<PciResource>> {
        pci::resources(&self.config, device.as_ref())
    }
}
