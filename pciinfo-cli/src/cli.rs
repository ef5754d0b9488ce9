use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
/// Find PCI devices in sysfs and show where their BARs live.
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,
    /// Directory containing one entry per PCI device
    #[clap(
        long,
        env = "PCIINFO_SYSFS_ROOT",
        default_value = pciinfo::SYS_BUS_PCI_DEVICES,
        global = true
    )]
    pub sysfs_root: PathBuf,
    /// How BAR sizes are read
    #[clap(long, value_enum, default_value_t = SizeSourceArg::Metadata, global = true)]
    pub size_source: SizeSourceArg,
    /// Give up on a single `ls` call after this many milliseconds (listing size source only)
    #[clap(long, default_value_t = 5000, global = true)]
    pub listing_timeout_ms: u64,
    /// Longest device path accepted, in bytes
    #[clap(long, default_value_t = 256, global = true)]
    pub path_capacity: usize,
    /// Make logging output more verbose. By default, only logs at the ERROR level are printed,
    /// but this can be changed by setting the RUST_LOG variable(e.g. `RUST_LOG=debug pciinfo ...`)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(clap::Args, Debug)]
pub struct DeviceArgs {
    /// Vendor identification of the PCI device, e.g. 0x110A
    pub vendor: String,
    /// Device identification of the PCI device, e.g. 0x4080
    pub device: String,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Print the sysfs path of the device
    Find(DeviceArgs),
    /// Print physical addresses and sizes of all BARs
    Bars(DeviceArgs),
    /// Print the path of one BAR's resource file
    BarPath {
        #[clap(flatten)]
        device: DeviceArgs,
        /// BAR number, 0 to 5
        bar: u8,
    },
    /// Print shell variable assignments describing the device's BARs
    Env {
        #[clap(flatten)]
        device: DeviceArgs,
        /// Prefix of every variable name
        #[clap(long, default_value = "PCI")]
        prefix: String,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum SizeSourceArg {
    Metadata,
    Listing,
}

impl From<SizeSourceArg> for pciinfo::SizeSource {
    fn from(arg: SizeSourceArg) -> Self {
        match arg {
            SizeSourceArg::Metadata => pciinfo::SizeSource::Metadata,
            SizeSourceArg::Listing => pciinfo::SizeSource::Listing,
        }
    }
}
