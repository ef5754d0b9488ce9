use std::{io, path::PathBuf, time::Duration};

pub type Result<T, E = PciInfoError> = core::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum PciInfoError {
    /// A required file could not be opened
    #[error("Failed to open {}: {source}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The device root itself could not be listed. Kept apart from "no device" so a
    /// permission problem does not look like an empty bus.
    #[error("PCI device root {} is not readable: {source}", path.display())]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("No PCI device with vendor={vendor} and device={device}")]
    DeviceNotFound { vendor: String, device: String },
    #[error("{count} PCI devices match vendor={vendor} and device={device}")]
    Ambiguous {
        vendor: String,
        device: String,
        count: usize,
    },
    #[error("BAR index {0} exceeds max of 5")]
    InvalidIndex(u8),
    #[error("{} has {lines} line(s), BAR {bar} not present", path.display())]
    ShortFile { path: PathBuf, lines: usize, bar: u8 },
    #[error("Device path needs {needed} bytes but only {capacity} are available")]
    BufferTooSmall { needed: usize, capacity: usize },
    #[error("Vendor and device identifiers must not be empty")]
    EmptyIdentifier,
    #[error("Line {line} of {} is not a valid resource entry", path.display())]
    MalformedResource { path: PathBuf, line: usize },
    #[error("Listing {} did not finish within {timeout:?}", path.display())]
    ListingTimeout { path: PathBuf, timeout: Duration },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
