//! Address-line swizzles for boards that wire their register selector to
//! different CPU pins.
//!
//! Each function moves the two wired pins into A0/A1 so register decoding can
//! always read `addr & 0x3`. They are pure bit permutations: the page nibble
//! (`$8xxx`, `$9xxx`, ...) and every pin not involved pass through untouched.
//! Except for [`a1_a2`], each is built from disjoint bit transpositions and is
//! its own inverse.

use crate::cartridge::pcb::PcbClass;

/// Selector on A0 (low) and A1 (high): the identity.
#[inline]
pub const fn a0_a1(addr: u16) -> u16 {
    addr
}

/// Selector on A1 (low) and A0 (high).
#[inline]
pub const fn a1_a0(addr: u16) -> u16 {
    (addr & !0x0003) | ((addr & 0x0001) << 1) | ((addr >> 1) & 0x0001)
}

/// Selector on A1 (low) and A2 (high). A1 is both a source and a destination
/// here, so this is a three-bit rotation; [`a1_a2_inverse`] undoes it.
#[inline]
pub const fn a1_a2(addr: u16) -> u16 {
    (addr & !0x0007) | ((addr >> 1) & 0x0003) | ((addr & 0x0001) << 2)
}

#[inline]
pub const fn a1_a2_inverse(addr: u16) -> u16 {
    (addr & !0x0007) | ((addr >> 2) & 0x0001) | ((addr & 0x0003) << 1)
}

/// Selector on A2 (low) and A3 (high).
#[inline]
pub const fn a2_a3(addr: u16) -> u16 {
    (addr & !0x000F) | ((addr >> 2) & 0x0003) | ((addr & 0x0003) << 2)
}

/// Selector on A3 (low) and A2 (high).
#[inline]
pub const fn a3_a2(addr: u16) -> u16 {
    let low = addr & 0x000F;
    let reversed =
        ((low & 0x1) << 3) | ((low & 0x2) << 1) | ((low & 0x4) >> 1) | ((low & 0x8) >> 3);
    (addr & !0x000F) | reversed
}

/// Selector on A6 (low) and A7 (high).
#[inline]
pub const fn a6_a7(addr: u16) -> u16 {
    (addr & !0x00C3) | ((addr >> 6) & 0x0003) | ((addr & 0x0003) << 6)
}

/// ORs two candidate wirings together for dumps that don't say which board
/// they came from. Games only ever drive one pair, the other reads as zero.
#[inline]
const fn either(addr: u16, first: u16, second: u16) -> u16 {
    (addr & 0xFF00) | ((first | second) & 0x0003)
}

/// The swizzle a board applies to every register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Swizzle {
    A0A1,
    A1A0,
    A1A2,
    A2A3,
    A3A2,
    A6A7,
    /// VRC4a or VRC4c.
    A1A2OrA6A7,
    /// VRC2b or VRC4e.
    A0A1OrA2A3,
    /// VRC4b or VRC4d.
    A1A0OrA3A2,
}

impl Swizzle {
    pub fn for_pcb(pcb: PcbClass) -> Swizzle {
        match pcb {
            PcbClass::Vrc2a | PcbClass::Vrc2c | PcbClass::Vrc4b | PcbClass::Vrc6b => Swizzle::A1A0,
            PcbClass::Vrc2b | PcbClass::Vrc4f | PcbClass::Vrc6a => Swizzle::A0A1,
            PcbClass::Vrc4a => Swizzle::A1A2,
            PcbClass::Vrc4c => Swizzle::A6A7,
            PcbClass::Vrc4d => Swizzle::A3A2,
            PcbClass::Vrc4e => Swizzle::A2A3,
            PcbClass::Vrc4a4c => Swizzle::A1A2OrA6A7,
            PcbClass::Vrc2b4e => Swizzle::A0A1OrA2A3,
            PcbClass::Vrc4b4d => Swizzle::A1A0OrA3A2,
            PcbClass::Nrom
            | PcbClass::Uxrom
            | PcbClass::Cnrom
            | PcbClass::Axrom
            | PcbClass::Mmc1
            | PcbClass::Snrom
            | PcbClass::Surom
            | PcbClass::Sorom
            | PcbClass::Sxrom
            | PcbClass::Serom
            | PcbClass::Unknown => Swizzle::A0A1,
        }
    }

    #[inline]
    pub const fn apply(self, addr: u16) -> u16 {
        match self {
            Swizzle::A0A1 => a0_a1(addr),
            Swizzle::A1A0 => a1_a0(addr),
            Swizzle::A1A2 => a1_a2(addr),
            Swizzle::A2A3 => a2_a3(addr),
            Swizzle::A3A2 => a3_a2(addr),
            Swizzle::A6A7 => a6_a7(addr),
            Swizzle::A1A2OrA6A7 => either(addr, a1_a2(addr), a6_a7(addr)),
            Swizzle::A0A1OrA2A3 => either(addr, a0_a1(addr), a2_a3(addr)),
            Swizzle::A1A0OrA3A2 => either(addr, a1_a0(addr), a3_a2(addr)),
        }
    }

    /// The 2-bit register selector after swizzling.
    #[inline]
    pub const fn select(self, addr: u16) -> u8 {
        (self.apply(addr) & 0x0003) as u8
    }
}
