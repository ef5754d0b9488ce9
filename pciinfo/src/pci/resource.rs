use super::{flags::ResourceFlags, listing::listed_size};
use crate::{
    config::{Config, SizeSource},
    error::{PciInfoError, Result},
    parse::{resource_line, start_column},
    types::{BarIndex, BarSet},
};
use bstr::io::BufReadExt;
use std::{
    fs::{self, File},
    io::{BufReader, ErrorKind},
    path::{Path, PathBuf},
};
use tracing::debug;

/// One line of a device's `resource` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciResource {
    /// Line number. 0-5 are the BARs, the lines after them hold the expansion ROM and
    /// bridge windows.
    pub index: usize,
    pub start: u64,
    pub end: u64,
    pub flags: ResourceFlags,
}

impl PciResource {
    /// Window length in bytes, 0 for an unassigned slot.
    #[must_use]
    pub fn size(&self) -> u64 {
        if self.start == 0 && self.end == 0 {
            return 0;
        }
        self.end.saturating_sub(self.start).saturating_add(1)
    }
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.size() != 0
    }
}

fn open_descriptor(device: &Path) -> Result<(PathBuf, BufReader<File>)> {
    let path = device.join("resource");
    match File::open(&path) {
        Ok(file) => Ok((path, BufReader::new(file))),
        Err(source) => Err(PciInfoError::NotFound { path, source }),
    }
}

#[tracing::instrument(level = "trace", skip(config))]
pub(crate) fn bar_size(config: &Config, device: &Path, bar: BarIndex) -> Result<u64> {
    let entry = device.join(bar.resource_file_name());
    let size = match config.size_source {
        SizeSource::Metadata => match fs::metadata(&entry) {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => 0,
            Err(err) if err.kind() == ErrorKind::NotFound => 0,
            Err(source) => return Err(PciInfoError::Io { path: entry, source }),
        },
        SizeSource::Listing => listed_size(&entry, config.listing_timeout)?,
    };
    if config.verbose {
        debug!("BAR{bar}: {size} bytes");
    }
    Ok(size)
}

#[tracing::instrument(level = "trace", skip(config))]
pub(crate) fn bar_exists(config: &Config, device: &Path) -> BarSet {
    BarIndex::all()
        .filter(|&bar| match bar_size(config, device, bar) {
            Ok(size) => size != 0,
            Err(err) => {
                debug!("Treating BAR{bar} as absent: {err}");
                false
            }
        })
        .fold(BarSet::empty(), |set, bar| set | BarSet::of(bar))
}

#[tracing::instrument(level = "trace", skip(config))]
pub(crate) fn bar_physical_address(config: &Config, device: &Path, bar: BarIndex) -> Result<u64> {
    let (path, mut reader) = open_descriptor(device)?;
    let target = usize::from(bar.get());
    let mut lines = 0;
    let mut line_at_bar = None;
    reader
        .for_byte_line(|line| {
            if lines == target {
                line_at_bar = Some(line.to_vec());
                return Ok(false);
            }
            lines += 1;
            Ok(true)
        })
        .map_err(|source| PciInfoError::Io {
            path: path.clone(),
            source,
        })?;
    let Some(line) = line_at_bar else {
        return Err(PciInfoError::ShortFile {
            path,
            lines,
            bar: bar.get(),
        });
    };
    let (_, address) = start_column(&line).map_err(|_| PciInfoError::MalformedResource {
        path: path.clone(),
        line: target,
    })?;
    if config.verbose {
        debug!("BAR{bar} at {address:#010x}");
    }
    Ok(address)
}

#[tracing::instrument(level = "trace", skip(config))]
pub(crate) fn resources(config: &Config, device: &Path) -> Result<Vec<PciResource>> {
    let (path, mut reader) = open_descriptor(device)?;
    let mut out = Vec::new();
    let mut malformed = None;
    reader
        .for_byte_line(|line| {
            let index = out.len();
            match resource_line(line) {
                Ok((_, (start, end, flags))) => {
                    out.push(PciResource {
                        index,
                        start,
                        end,
                        flags: ResourceFlags::from_bits_retain(flags),
                    });
                    Ok(true)
                }
                Err(_) => {
                    malformed = Some(index);
                    Ok(false)
                }
            }
        })
        .map_err(|source| PciInfoError::Io {
            path: path.clone(),
            source,
        })?;
    if let Some(line) = malformed {
        return Err(PciInfoError::MalformedResource { path, line });
    }
    if config.verbose {
        debug!("{} resource lines in {}", out.len(), path.display());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::SysfsTree;

    fn bar(index: u8) -> BarIndex {
        BarIndex::new(index).unwrap()
    }

    #[test]
    fn physical_address_reads_the_line_of_the_bar() {
        let tree = SysfsTree::new();
        let dev = tree.device("0000:03:0d.0", "0x110a", "0x4080");
        tree.resource(&dev, "1000 1fff 200\n2000 2fff 200\n3000 3fff 200\n");
        let config = Config::default();
        assert_eq!(bar_physical_address(&config, &dev, bar(0)).unwrap(), 0x1000);
        assert_eq!(bar_physical_address(&config, &dev, bar(1)).unwrap(), 0x2000);
        assert_eq!(bar_physical_address(&config, &dev, bar(2)).unwrap(), 0x3000);
    }

    #[test]
    fn physical_address_past_end_is_short_file() {
        let tree = SysfsTree::new();
        let dev = tree.device("0000:03:0d.0", "0x110a", "0x4080");
        tree.resource(&dev, "1000 1fff 200\n2000 2fff 200\n3000 3fff 200\n");
        let err = bar_physical_address(&Config::default(), &dev, bar(3)).unwrap_err();
        assert!(matches!(err, PciInfoError::ShortFile { lines: 3, bar: 3, .. }));
    }

    #[test]
    fn physical_address_without_descriptor_is_not_found() {
        let tree = SysfsTree::new();
        let dev = tree.device("0000:03:0d.0", "0x110a", "0x4080");
        let err = bar_physical_address(&Config::default(), &dev, bar(0)).unwrap_err();
        assert!(matches!(err, PciInfoError::NotFound { .. }));
    }

    #[test]
    fn physical_address_of_garbage_line_is_malformed() {
        let tree = SysfsTree::new();
        let dev = tree.device("0000:03:0d.0", "0x110a", "0x4080");
        tree.resource(&dev, "0x1000 0x1fff 0x200\nnot an address\n");
        let err = bar_physical_address(&Config::default(), &dev, bar(1)).unwrap_err();
        assert!(matches!(err, PciInfoError::MalformedResource { line: 1, .. }));
    }

    #[test]
    fn sizes_come_from_numbered_entries() {
        let tree = SysfsTree::new();
        let dev = tree.device("0000:03:0d.0", "0x110a", "0x4080");
        tree.bar(&dev, 0, 4096);
        tree.bar(&dev, 2, 256);
        let config = Config::default();
        assert_eq!(bar_size(&config, &dev, bar(0)).unwrap(), 4096);
        assert_eq!(bar_size(&config, &dev, bar(1)).unwrap(), 0);
        assert_eq!(bar_size(&config, &dev, bar(2)).unwrap(), 256);
        assert_eq!(bar_size(&config, &dev, bar(5)).unwrap(), 0);
        // Same answer on repeated reads
        assert_eq!(bar_size(&config, &dev, bar(0)).unwrap(), 4096);
    }

    #[test]
    fn listing_and_metadata_agree() {
        let tree = SysfsTree::new();
        let dev = tree.device("0000:03:0d.0", "0x110a", "0x4080");
        tree.bar(&dev, 1, 8192);
        let config = Config::default().with_size_source(SizeSource::Listing);
        assert_eq!(bar_size(&config, &dev, bar(1)).unwrap(), 8192);
        assert_eq!(bar_size(&config, &dev, bar(4)).unwrap(), 0);
    }

    #[test]
    fn only_bar0_present() {
        let tree = SysfsTree::new();
        let dev = tree.device("0000:03:0d.0", "0x110a", "0x4080");
        tree.bar(&dev, 0, 32768);
        tree.resource(&dev, "0x0000000000001000 0x0000000000008fff 0x0000000000040200\n");
        assert_eq!(bar_exists(&Config::default(), &dev), BarSet::BAR0);
    }

    #[test]
    fn empty_entries_do_not_count_as_present() {
        let tree = SysfsTree::new();
        let dev = tree.device("0000:03:0d.0", "0x110a", "0x4080");
        tree.bar(&dev, 1, 0);
        tree.bar(&dev, 3, 16);
        tree.bar(&dev, 5, 16);
        assert_eq!(
            bar_exists(&Config::default(), &dev),
            BarSet::BAR3 | BarSet::BAR5
        );
    }

    // Device with BAR0 and BAR5 populated, BAR1 empty, BAR2 a symlink to a file, BAR3 a
    // directory and BAR4 a dangling symlink.
    fn mixed_entries(tree: &SysfsTree) -> PathBuf {
        let dev = tree.device("0000:03:0d.0", "0x110a", "0x4080");
        tree.bar(&dev, 0, 4096);
        tree.bar(&dev, 1, 0);
        let target = tree.root().join("bar2-backing");
        fs::write(&target, vec![0u8; 512]).unwrap();
        std::os::unix::fs::symlink(&target, dev.join("resource2")).unwrap();
        fs::create_dir(dev.join("resource3")).unwrap();
        fs::write(dev.join("resource3").join("inner"), vec![0u8; 777]).unwrap();
        std::os::unix::fs::symlink(tree.root().join("gone"), dev.join("resource4")).unwrap();
        tree.bar(&dev, 5, 16);
        dev
    }

    #[test]
    fn non_file_entries_have_no_size_under_either_source() {
        let tree = SysfsTree::new();
        let dev = mixed_entries(&tree);
        for source in [SizeSource::Metadata, SizeSource::Listing] {
            let config = Config::default().with_size_source(source);
            let sizes: Vec<u64> = BarIndex::all()
                .map(|bar| bar_size(&config, &dev, bar).unwrap())
                .collect();
            assert_eq!(sizes, [4096, 0, 512, 0, 0, 16], "{source:?}");
        }
    }

    #[test]
    fn presence_does_not_depend_on_size_source() {
        let tree = SysfsTree::new();
        let dev = mixed_entries(&tree);
        let by_metadata = bar_exists(&Config::default(), &dev);
        let by_listing = bar_exists(
            &Config::default().with_size_source(SizeSource::Listing),
            &dev,
        );
        assert_eq!(by_metadata, BarSet::BAR0 | BarSet::BAR2 | BarSet::BAR5);
        assert_eq!(by_listing, by_metadata);
    }

    #[test]
    fn resources_parse_every_line() {
        let tree = SysfsTree::new();
        let dev = tree.device("0000:03:0d.0", "0x110a", "0x4080");
        tree.resource(
            &dev,
            "0x00000000fe000000 0x00000000fe7fffff 0x0000000000040200\n\
             0x0000000000000000 0x0000000000000000 0x0000000000000000\n\
             0x000000000000e000 0x000000000000e07f 0x0000000000040101\n",
        );
        let found = resources(&Config::default(), &dev).unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].size(), 0x80_0000);
        assert!(!found[1].is_populated());
        assert_eq!(found[2].index, 2);
        assert_eq!(found[2].size(), 0x80);
        assert_eq!(found[2].flags.kind(), crate::pci::ResourceKind::Io);
    }

    #[test]
    fn resources_reject_truncated_lines() {
        let tree = SysfsTree::new();
        let dev = tree.device("0000:03:0d.0", "0x110a", "0x4080");
        tree.resource(&dev, "0x1000 0x1fff 0x200\n0x2000\n");
        assert!(matches!(
            resources(&Config::default(), &dev),
            Err(PciInfoError::MalformedResource { line: 1, .. })
        ));
    }
}
