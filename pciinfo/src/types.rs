use crate::error::{PciInfoError, Result};
use bitflags::bitflags;
use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
};

/// Number of BAR slots a type 0 PCI header exposes
pub const BAR_COUNT: u8 = 6;

/// Vendor/device pair to look for, as hex text (e.g. `0x110A`, `110a`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    vendor: String,
    device: String,
}

impl DeviceIdentity {
    pub fn new(vendor: impl Into<String>, device: impl Into<String>) -> Result<Self> {
        let (vendor, device) = (vendor.into(), device.into());
        if vendor.trim().is_empty() || device.trim().is_empty() {
            return Err(PciInfoError::EmptyIdentifier);
        }
        Ok(DeviceIdentity { vendor, device })
    }
    pub fn vendor(&self) -> &str {
        &self.vendor
    }
    pub fn device(&self) -> &str {
        &self.device
    }
}

impl Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vid={} did={}", self.vendor, self.device)
    }
}

/// Directory of exactly one device below the sysfs PCI root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePath(PathBuf);

impl DevicePath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DevicePath(path.into())
    }

    /// Like [`DevicePath::new`], but refuses paths longer than `capacity` bytes instead of
    /// cutting them short.
    pub fn bounded(path: impl Into<PathBuf>, capacity: usize) -> Result<Self> {
        let path = path.into();
        let needed = path.as_os_str().len();
        if needed > capacity {
            return Err(PciInfoError::BufferTooSmall { needed, capacity });
        }
        Ok(DevicePath(path))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }

    /// Path of the numbered `resourceN` entry for `bar`.
    pub fn resource_entry(&self, bar: BarIndex) -> PathBuf {
        self.0.join(bar.resource_file_name())
    }
}

impl AsRef<Path> for DevicePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BarIndex(u8);

impl BarIndex {
    pub fn new(bar: u8) -> Result<Self> {
        if bar >= BAR_COUNT {
            return Err(PciInfoError::InvalidIndex(bar));
        }
        Ok(BarIndex(bar))
    }
    pub fn all() -> impl Iterator<Item = BarIndex> {
        (0..BAR_COUNT).map(BarIndex)
    }
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
    pub fn resource_file_name(self) -> String {
        format!("resource{}", self.0)
    }
}

impl TryFrom<u8> for BarIndex {
    type Error = PciInfoError;

    fn try_from(bar: u8) -> Result<Self> {
        BarIndex::new(bar)
    }
}

impl Display for BarIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

bitflags! {
    /// Populated BAR slots of one device
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct BarSet: u8 {
        const BAR0 = 1 << 0;
        const BAR1 = 1 << 1;
        const BAR2 = 1 << 2;
        const BAR3 = 1 << 3;
        const BAR4 = 1 << 4;
        const BAR5 = 1 << 5;
    }
}

impl BarSet {
    #[must_use]
    pub fn of(bar: BarIndex) -> Self {
        BarSet::from_bits_truncate(1 << bar.get())
    }
    #[must_use]
    pub fn has(self, bar: BarIndex) -> bool {
        self.contains(BarSet::of(bar))
    }
    pub fn bars(self) -> impl Iterator<Item = BarIndex> {
        BarIndex::all().filter(move |&bar| self.has(bar))
    }
}

/// Outcome of looking a vendor/device pair up. Only a unique match carries a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Unique(DevicePath),
    NoMatch,
    Ambiguous { count: usize },
}

impl MatchResult {
    pub fn path(&self) -> Option<&DevicePath> {
        match self {
            MatchResult::Unique(path) => Some(path),
            MatchResult::NoMatch | MatchResult::Ambiguous { .. } => None,
        }
    }

    /// Turn anything but a unique match into an error naming `identity`.
    pub fn into_unique(self, identity: &DeviceIdentity) -> Result<DevicePath> {
        match self {
            MatchResult::Unique(path) => Ok(path),
            MatchResult::NoMatch => Err(PciInfoError::DeviceNotFound {
                vendor: identity.vendor().to_string(),
                device: identity.device().to_string(),
            }),
            MatchResult::Ambiguous { count } => Err(PciInfoError::Ambiguous {
                vendor: identity.vendor().to_string(),
                device: identity.device().to_string(),
                count,
            }),
        }
    }
}
