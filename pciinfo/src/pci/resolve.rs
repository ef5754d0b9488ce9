use crate::{
    config::Config,
    error::{PciInfoError, Result},
    parse::ids_match,
    scratch_path::ScratchPath,
    types::{DeviceIdentity, DevicePath, MatchResult},
};
use arrayvec::ArrayVec;
use nix::{fcntl::OFlag, sys::stat::Mode};
use std::{
    ffi::OsStr,
    fs,
    io::{self, ErrorKind},
    os::unix::ffi::OsStrExt,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// Largest id file we accept. sysfs writes `0x1234\n`; anything longer is not an id.
const ID_FILE_CAPACITY: usize = 32;

/// Matches seen so far. The count decides the outcome, `last` is only meaningful when the
/// count ends up being one.
#[derive(Debug, Default)]
struct MatchTally {
    count: usize,
    last: Option<PathBuf>,
}

impl MatchTally {
    fn record(&mut self, path: PathBuf) {
        self.count += 1;
        self.last = Some(path);
    }

    fn finish(self, capacity: usize) -> Result<MatchResult> {
        match (self.count, self.last) {
            (0, _) | (_, None) => Ok(MatchResult::NoMatch),
            (1, Some(path)) => Ok(MatchResult::Unique(DevicePath::bounded(path, capacity)?)),
            (count, Some(_)) => Ok(MatchResult::Ambiguous { count }),
        }
    }
}

/// Read a small sysfs id file into a fixed buffer. Files that do not fit are an error, never
/// a shortened id.
fn read_id_file(path: &Path) -> io::Result<ArrayVec<u8, ID_FILE_CAPACITY>> {
    let mut file = fs::File::open(path)?;
    let mut buf = ArrayVec::new();
    io::copy(&mut file, &mut buf)?;
    Ok(buf)
}

/// Outcome of comparing one id file against the wanted id.
enum IdCheck {
    Match,
    Mismatch,
    /// File vanished or could not be read, the device is skipped
    Unreadable,
}

fn check_id(path: &Path, wanted: &str, config: &Config) -> IdCheck {
    match read_id_file(path) {
        Ok(content) if ids_match(&content, wanted.as_bytes()) => IdCheck::Match,
        Ok(_) => IdCheck::Mismatch,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            // Device removed while we were scanning, or not a device directory
            if config.verbose {
                debug!("{} disappeared during scan", path.display());
            }
            IdCheck::Unreadable
        }
        Err(err) => {
            warn!("Failed to read {}: {err}", path.display());
            IdCheck::Unreadable
        }
    }
}

/// Scan `config.root` for the device with the given vendor and device id.
#[tracing::instrument(level = "trace", skip(config), fields(root = %config.root.display()))]
pub(crate) fn find(
    config: &Config,
    identity: &DeviceIdentity,
    path_capacity: usize,
) -> Result<MatchResult> {
    let root = config.root.as_path();
    let dir = nix::dir::Dir::open(
        root,
        OFlag::O_RDONLY | OFlag::O_DIRECTORY | OFlag::O_CLOEXEC,
        Mode::empty(),
    )
    .map_err(|errno| PciInfoError::RootUnavailable {
        path: root.to_path_buf(),
        source: errno.into(),
    })?;

    let mut tally = MatchTally::default();
    let mut dev_path = ScratchPath::take(root);
    for entry in dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(errno) => {
                return Err(PciInfoError::RootUnavailable {
                    path: root.to_path_buf(),
                    source: errno.into(),
                });
            }
        };
        let name = entry.file_name().to_bytes();
        if matches!(name, b"." | b"..") {
            continue;
        }
        dev_path.set_entry(root, OsStr::from_bytes(name));

        let vendor = check_id(&dev_path.child("vendor"), identity.vendor(), config);
        if !matches!(vendor, IdCheck::Match) {
            continue;
        }
        let device = check_id(&dev_path.child("device"), identity.device(), config);
        if !matches!(device, IdCheck::Match) {
            continue;
        }
        if config.verbose {
            debug!("{identity} in '{}'", dev_path.display());
        }
        tally.record(dev_path.to_path_buf());
    }
    if config.verbose && tally.count != 1 {
        debug!("{identity}: {} matching devices", tally.count);
    }
    tally.finish(path_capacity)
}
