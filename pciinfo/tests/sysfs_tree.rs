use pciinfo::{BarSet, Config, DeviceIdentity, MatchResult, PciInfo, PciInfoError};
use std::{fs, path::PathBuf};
use tempfile::TempDir;

fn make_device(root: &TempDir, name: &str, vendor: &str, device: &str) -> PathBuf {
    let path = root.path().join(name);
    fs::create_dir(&path).unwrap();
    fs::write(path.join("vendor"), format!("{vendor}\n")).unwrap();
    fs::write(path.join("device"), format!("{device}\n")).unwrap();
    path
}

fn pci_for(root: &TempDir) -> PciInfo {
    PciInfo::new(Config::default().with_root(root.path()))
}

#[test]
fn finds_the_one_device_with_matching_device_id() {
    let root = tempfile::tempdir().unwrap();
    let wanted = make_device(&root, "0000:03:0d.0", "0x110a", "0x4080");
    make_device(&root, "0000:04:0d.0", "0x110a", "0x4091");
    let pci = pci_for(&root);
    let id = DeviceIdentity::new("0x110A", "0x4080").unwrap();
    let found = pci.find(&id, 256).unwrap();
    assert_eq!(found.path().unwrap().as_path(), wanted);
}

#[test]
fn full_device_report() {
    let root = tempfile::tempdir().unwrap();
    let dev = make_device(&root, "0000:03:0d.0", "0x110a", "0x4080");
    fs::write(dev.join("resource0"), vec![0u8; 32768]).unwrap();
    fs::write(dev.join("resource2"), vec![0u8; 256]).unwrap();
    fs::write(
        dev.join("resource"),
        "0x00000000f7c00000 0x00000000f7c07fff 0x0000000000040200\n\
         0x0000000000000000 0x0000000000000000 0x0000000000000000\n\
         0x000000000000e000 0x000000000000e0ff 0x0000000000040101\n\
         0x0000000000000000 0x0000000000000000 0x0000000000000000\n\
         0x0000000000000000 0x0000000000000000 0x0000000000000000\n\
         0x0000000000000000 0x0000000000000000 0x0000000000000000\n",
    )
    .unwrap();

    let pci = pci_for(&root);
    let id = DeviceIdentity::new("0x110a", "0x4080").unwrap();
    let device = pci.find(&id, 256).unwrap().into_unique(&id).unwrap();

    let present = pci.bar_exists(&device);
    assert_eq!(present, BarSet::BAR0 | BarSet::BAR2);
    assert_eq!(pci.bar_physical_address(&device, 0).unwrap(), 0xf7c0_0000);
    assert_eq!(pci.bar_physical_address(&device, 2).unwrap(), 0xe000);
    assert_eq!(pci.bar_physical_address(&device, 5).unwrap(), 0);
    assert_eq!(pci.bar_size(&device, 0).unwrap(), 32768);
    assert_eq!(pci.bar_size(&device, 1).unwrap(), 0);
    assert_eq!(pci.bar_size(&device, 5).unwrap(), 0);

    let resources = pci.resources(&device).unwrap();
    let populated: Vec<usize> = resources
        .iter()
        .filter(|r| r.is_populated())
        .map(|r| r.index)
        .collect();
    assert_eq!(populated, [0, 2]);
    assert_eq!(resources[0].size(), 32768);
}

#[test]
fn out_of_range_bars_are_rejected() {
    let root = tempfile::tempdir().unwrap();
    let dev = make_device(&root, "0000:03:0d.0", "0x110a", "0x4080");
    let pci = pci_for(&root);
    assert!(matches!(pci.bar_size(&dev, 6), Err(PciInfoError::InvalidIndex(6))));
    assert!(pci.bar_size(&dev, 5).is_ok());
    assert!(matches!(
        pci.bar_physical_address(&dev, 9),
        Err(PciInfoError::InvalidIndex(9))
    ));
}

#[test]
fn bar_path_points_at_numbered_entry() {
    let root = tempfile::tempdir().unwrap();
    let dev = make_device(&root, "0000:03:0d.0", "0x110a", "0x4080");
    let pci = pci_for(&root);
    let id = DeviceIdentity::new("0x110a", "0x4080").unwrap();
    assert_eq!(pci.bar_path(&id, 3, 256).unwrap(), dev.join("resource3"));

    let missing = DeviceIdentity::new("0x110a", "0xffff").unwrap();
    assert!(matches!(
        pci.bar_path(&missing, 0, 256),
        Err(PciInfoError::DeviceNotFound { .. })
    ));

    // Device directory fits, the resource entry appended to it does not
    let capacity = dev.as_os_str().len();
    assert!(matches!(
        pci.bar_path(&id, 0, capacity),
        Err(PciInfoError::BufferTooSmall { .. })
    ));
}

#[test]
fn removed_device_is_no_longer_found() {
    let root = tempfile::tempdir().unwrap();
    let dev = make_device(&root, "0000:03:0d.0", "0x110a", "0x4080");
    let pci = pci_for(&root);
    let id = DeviceIdentity::new("0x110a", "0x4080").unwrap();
    assert!(matches!(pci.find(&id, 256).unwrap(), MatchResult::Unique(_)));
    fs::remove_dir_all(dev).unwrap();
    assert_eq!(pci.find(&id, 256).unwrap(), MatchResult::NoMatch);
}
