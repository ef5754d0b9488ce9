use bitflags::bitflags;
// Bit values from the linux kernel include/linux/ioport.h

bitflags! {
    /// Third column of a sysfs `resource` line
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct ResourceFlags: u64 {
        /// PCI/ISA I/O ports
        const IO = 0x0000_0100;
        const MEM = 0x0000_0200;
        /// Register offsets
        const REG = 0x0000_0300;
        const IRQ = 0x0000_0400;
        const DMA = 0x0000_0800;
        const BUS = 0x0000_1000;
        /// No side effects
        const PREFETCH = 0x0000_2000;
        const READONLY = 0x0000_4000;
        const CACHEABLE = 0x0000_8000;
        const RANGELENGTH = 0x0001_0000;
        const SHADOWABLE = 0x0002_0000;
        /// Size indicates alignment
        const SIZEALIGN = 0x0004_0000;
        /// Start field is alignment
        const STARTALIGN = 0x0008_0000;
        const MEM_64 = 0x0010_0000;
        /// Forwarded by bridge
        const WINDOW = 0x0020_0000;
        /// Resource is software muxed
        const MUXED = 0x0040_0000;
        /// Userland may not map this resource
        const EXCLUSIVE = 0x0800_0000;
        const DISABLED = 0x1000_0000;
        /// No address assigned yet
        const UNSET = 0x2000_0000;
        const AUTO = 0x4000_0000;
        /// Driver has marked this resource busy
        const BUSY = 0x8000_0000;
        // Bus specific bits and ROM control bits share the low byte
        const _ = !0;
    }
}

/// Coarse kind of a resource window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Io,
    Memory,
    Other,
}

impl ResourceFlags {
    const TYPE_BITS: u64 = 0x0000_1f00;

    #[must_use]
    pub fn kind(self) -> ResourceKind {
        match self.bits() & Self::TYPE_BITS {
            bits if bits == Self::IO.bits() => ResourceKind::Io,
            bits if bits == Self::MEM.bits() => ResourceKind::Memory,
            _ => ResourceKind::Other,
        }
    }

    /// Short human readable summary, e.g. `mem 64-bit prefetchable`.
    #[must_use]
    pub fn describe(self) -> String {
        let mut out = String::from(match self.kind() {
            ResourceKind::Io => "io",
            ResourceKind::Memory => "mem",
            ResourceKind::Other => "other",
        });
        for (flag, name) in [
            (Self::MEM_64, " 64-bit"),
            (Self::PREFETCH, " prefetchable"),
            (Self::READONLY, " read-only"),
            (Self::DISABLED, " disabled"),
            (Self::UNSET, " unset"),
        ] {
            if self.contains(flag) {
                out.push_str(name);
            }
        }
        out
    }
}
