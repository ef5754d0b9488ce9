use std::{path::PathBuf, time::Duration};

pub const SYS_BUS_PCI_DEVICES: &str = "/sys/bus/pci/devices";

/// How [`crate::PciInfo::bar_size`] obtains the size of a `resourceN` entry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SizeSource {
    /// Ask the filesystem for the entry's length directly. Symlinks are followed and
    /// anything but a regular file counts as zero bytes.
    #[default]
    Metadata,
    /// Run `ls -dlL` on the entry and read the size column. Matches what older tooling did
    /// on kernels where the size was only visible through a listing. Only regular files
    /// (after following symlinks) have a size.
    Listing,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one subdirectory per PCI device
    pub root: PathBuf,
    /// Emit per-device diagnostics while resolving and reading resources
    pub verbose: bool,
    pub size_source: SizeSource,
    /// Upper bound for a single `ls` invocation in [`SizeSource::Listing`] mode
    pub listing_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            root: PathBuf::from(SYS_BUS_PCI_DEVICES),
            verbose: false,
            size_source: SizeSource::Metadata,
            listing_timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
    #[must_use]
    pub fn with_size_source(mut self, size_source: SizeSource) -> Self {
        self.size_source = size_source;
        self
    }
    #[must_use]
    pub fn with_listing_timeout(mut self, timeout: Duration) -> Self {
        self.listing_timeout = timeout;
        self
    }
}
