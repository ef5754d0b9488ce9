mod cli;
mod report;

use clap::Parser;
use pciinfo::{BarIndex, Config, DeviceIdentity, DevicePath, PciInfo};
use report::{Cell, ReportRow, print_error, print_rows};
use std::{process::ExitCode, time::Duration};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, fmt::format::FmtSpan, prelude::*};

use cli::{Args, Command, DeviceArgs};

fn resolve(pci: &PciInfo, args: &DeviceArgs, capacity: usize) -> pciinfo::Result<DevicePath> {
    let identity = DeviceIdentity::new(&args.vendor, &args.device)?;
    pci.find(&identity, capacity)?.into_unique(&identity)
}

fn bar_rows(pci: &PciInfo, device: &DevicePath) -> Vec<ReportRow> {
    let present = pci.bar_exists(device);
    let resources = if pci.config().verbose {
        pci.resources(device)
            .inspect_err(|err| warn!("Could not decode resource flags: {err}"))
            .unwrap_or_default()
    } else {
        Vec::new()
    };
    let mut rows = vec![ReportRow::device(device)];
    for bar in BarIndex::all() {
        let mut row = ReportRow::bar(bar);
        let address = pci.bar_physical_address(device, bar.get());
        match address {
            Ok(address) if present.has(bar) => {
                row.push(Cell::plain(format!("{address:#010x}")));
            }
            Ok(_) => row.push(Cell::unused()),
            Err(err) => {
                warn!("BAR{bar}: {err}");
                row.push(Cell::unused());
            }
        }
        let size = pci.bar_size(device, bar.get()).unwrap_or_else(|err| {
            warn!("BAR{bar}: {err}");
            0
        });
        row.push(Cell::plain(format!(" {size:>12} Byte")));
        if let Some(resource) = resources.get(usize::from(bar.get()))
            && resource.is_populated()
        {
            row.push(Cell::dimmed(format!(" [{}]", resource.flags.describe())));
        }
        rows.push(row);
    }
    rows
}

fn env_lines(pci: &PciInfo, device: &DevicePath, prefix: &str) -> pciinfo::Result<Vec<String>> {
    let mut lines = vec![format!("{prefix}_PATH={device}")];
    for bar in pci.bar_exists(device).bars() {
        let address = pci.bar_physical_address(device, bar.get())?;
        let size = pci.bar_size(device, bar.get())?;
        lines.push(format!("{prefix}_BAR{bar}_ADDR={address:#010x}"));
        lines.push(format!("{prefix}_BAR{bar}_SIZE={size}"));
    }
    Ok(lines)
}

fn run(args: &Args) -> pciinfo::Result<()> {
    let config = Config::default()
        .with_root(&args.sysfs_root)
        .with_verbose(args.verbose > 0)
        .with_size_source(args.size_source.into())
        .with_listing_timeout(Duration::from_millis(args.listing_timeout_ms));
    let pci = PciInfo::new(config);
    let capacity = args.path_capacity;
    match &args.command {
        Command::Find(device) => {
            let path = resolve(&pci, device, capacity)?;
            print_rows(&[ReportRow::device(&path)]);
        }
        Command::Bars(device) => {
            let path = resolve(&pci, device, capacity)?;
            print_rows(&bar_rows(&pci, &path));
        }
        Command::BarPath { device, bar } => {
            let identity = DeviceIdentity::new(&device.vendor, &device.device)?;
            let path = pci.bar_path(&identity, *bar, capacity)?;
            println!("{}", path.display());
        }
        Command::Env { device, prefix } => {
            let path = resolve(&pci, device, capacity)?;
            for line in env_lines(&pci, &path, prefix)? {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_span_events(match args.verbose {
                    0 => FmtSpan::NONE,
                    1 => FmtSpan::CLOSE,
                    2.. => FmtSpan::FULL,
                })
                .with_timer(tracing_subscriber::fmt::time::uptime())
                .pretty(),
        )
        .with(EnvFilter::from_default_env())
        .init();

    if !nix::unistd::Uid::effective().is_root() {
        warn!("Not running as root, some resource entries may be unreadable");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error(&err);
            ExitCode::FAILURE
        }
    }
}
