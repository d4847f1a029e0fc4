//! Shared definitions for the cartridge-facing parts of the NES memory map.
//!
//! Only the ranges a cartridge can claim live here; the CPU/PPU internals
//! (stack page, OAM, palette) are owned by their respective devices.

/// CPU memory map details.
pub mod cpu {
    /// Number of addressable CPU bytes (`$0000-$FFFF`).
    pub const ADDRESS_SPACE: usize = 0x1_0000;

    /// PRG RAM window start address (`$6000`).
    pub const PRG_RAM_START: u16 = 0x6000;
    /// PRG RAM window end address (inclusive).
    pub const PRG_RAM_END: u16 = 0x7FFF;
    /// Size of the standard 8 KiB work RAM window.
    pub const PRG_RAM_WINDOW: usize = 0x2000;
    /// PRG ROM window start address (`$8000`).
    pub const PRG_ROM_START: u16 = 0x8000;
    /// Final CPU-visible address (`$FFFF`).
    pub const CPU_ADDR_END: u16 = 0xFFFF;
}

/// PPU address space as seen from the cartridge connector.
pub mod ppu {
    /// Pattern table space ($0000-$1FFF = 8 KiB), provided by CHR ROM/RAM.
    pub const CHR_SIZE: usize = 0x2000;
    /// Last pattern-table address (inclusive).
    pub const CHR_END: u16 = 0x1FFF;

    /// Base address of nametable 0.
    pub const NAMETABLE_BASE: u16 = 0x2000;
    /// Size of a single nametable in bytes.
    pub const NAMETABLE_SIZE: u16 = 0x0400;
    /// Last nametable address before the palette region (inclusive).
    pub const NAMETABLE_END: u16 = 0x3EFF;
    /// Nametable RAM backing all four logical screens: the console's 2 KiB
    /// CIRAM plus the 2 KiB a four-screen board adds.
    pub const NAMETABLE_RAM_SIZE: usize = 0x1000;

    /// Address mask applied to every PPU access (16 KiB space).
    pub const VRAM_MIRROR_MASK: u16 = 0x3FFF;
}
