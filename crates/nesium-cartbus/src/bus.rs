//! Per-address dispatch tables for the CPU and PPU buses.
//!
//! Every address owns one [`BusSlot`]: a read route and a write route, each a
//! handler kind plus the owner it acts on and a 16-bit parameter computed at
//! install time (usually the offset inside a bank window). Accesses index the
//! table directly; nothing branches on address ranges once a map is applied.
//!
//! | Bus | Slots      | Covers                                    |
//! |-----|------------|-------------------------------------------|
//! | CPU | `0x10000`  | `$0000-$FFFF`                             |
//! | PPU | `0x2000`   | `$0000-$1FFF` pattern tables (cartridge)  |
//!
//! Slots are never empty: the default route reads the floating bus value and
//! drops writes. Handlers themselves are executed by [`crate::Board`], which
//! owns the devices the routes name.

use std::{fmt, ops::RangeInclusive};

use crate::{cartridge::mapper::Port, memory};

pub mod open_bus;

pub use open_bus::OpenBus;

pub const CPU_BUS_SIZE: usize = memory::cpu::ADDRESS_SPACE;
pub const PPU_BUS_SIZE: usize = memory::ppu::CHR_SIZE;

/// CPU-side dispatch table.
pub type CpuBus = AddressBus<CPU_BUS_SIZE>;
/// Cartridge-visible PPU dispatch table.
pub type PpuBus = AddressBus<PPU_BUS_SIZE>;

/// Handle for a non-cartridge device (RAM, PPU registers, APU, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u8);

/// Who a route acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Owner {
    #[default]
    None,
    /// The inserted cartridge.
    Cartridge,
    /// A host device resolved through [`crate::Peripherals`].
    Device(DeviceId),
}

/// Bank granularities used by the supported boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "savestate-serde",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum BankSize {
    K1,
    K2,
    K4,
    K8,
    K16,
    K32,
}

impl BankSize {
    pub const ALL: [BankSize; 6] = [
        BankSize::K1,
        BankSize::K2,
        BankSize::K4,
        BankSize::K8,
        BankSize::K16,
        BankSize::K32,
    ];

    pub const fn bytes(self) -> usize {
        match self {
            BankSize::K1 => 0x0400,
            BankSize::K2 => 0x0800,
            BankSize::K4 => 0x1000,
            BankSize::K8 => 0x2000,
            BankSize::K16 => 0x4000,
            BankSize::K32 => 0x8000,
        }
    }

    pub(crate) const fn tier(self) -> usize {
        self as usize
    }
}

/// What happens when a slot is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReadHandler {
    /// Returns the floating bus value.
    #[default]
    OpenBus,
    /// Delegates to the device named by the route owner.
    Device,
    /// `prg[param]`; param is already wrapped to the image.
    PrgDirect,
    /// `prg[param + fixed_offset]`.
    PrgFixed,
    /// `prg[(param + bank(slot) * size) % len]`.
    PrgBank { slot: u8, size: BankSize },
    /// Work RAM at `param`, if the board enables it.
    PrgRam,
    /// CHR ROM/RAM at `param`.
    ChrDirect,
    /// CHR ROM/RAM through CHR bank register `slot`.
    ChrBank { slot: u8, size: BankSize },
}

/// What happens when a slot is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WriteHandler {
    #[default]
    Ignore,
    Device,
    PrgRam,
    ChrDirect,
    ChrBank { slot: u8, size: BankSize },
    /// A mapper register; param carries the CPU address the chip decodes.
    Register(Port),
}

/// A handler bound to an owner and its install-time parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Route<H> {
    pub handler: H,
    pub owner: Owner,
    pub param: u16,
}

impl<H> Route<H> {
    pub const fn new(handler: H, owner: Owner, param: u16) -> Self {
        Self {
            handler,
            owner,
            param,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BusSlot {
    pub read: Route<ReadHandler>,
    pub write: Route<WriteHandler>,
}

impl BusSlot {
    pub const OPEN: BusSlot = BusSlot {
        read: Route::new(ReadHandler::OpenBus, Owner::None, 0),
        write: Route::new(WriteHandler::Ignore, Owner::None, 0),
    };
}

/// Fixed-size dispatch table with one slot per address.
#[derive(Clone)]
pub struct AddressBus<const N: usize> {
    slots: Box<[BusSlot]>,
}

impl<const N: usize> AddressBus<N> {
    pub fn new() -> Self {
        Self {
            slots: vec![BusSlot::OPEN; N].into_boxed_slice(),
        }
    }

    #[inline]
    fn index(addr: u16) -> usize {
        addr as usize % N
    }

    #[inline]
    pub fn slot(&self, addr: u16) -> &BusSlot {
        &self.slots[Self::index(addr)]
    }

    pub fn set_read_func(&mut self, addr: u16, handler: ReadHandler, owner: Owner, param: u16) {
        self.slots[Self::index(addr)].read = Route::new(handler, owner, param);
    }

    pub fn set_write_func(&mut self, addr: u16, handler: WriteHandler, owner: Owner, param: u16) {
        self.slots[Self::index(addr)].write = Route::new(handler, owner, param);
    }

    /// Installs `handler` over an inclusive range, computing each slot's param
    /// from its address.
    pub fn set_read_range(
        &mut self,
        range: RangeInclusive<u16>,
        handler: ReadHandler,
        owner: Owner,
        param: impl Fn(u16) -> u16,
    ) {
        for addr in range {
            self.set_read_func(addr, handler, owner, param(addr));
        }
    }

    pub fn set_write_range(
        &mut self,
        range: RangeInclusive<u16>,
        handler: WriteHandler,
        owner: Owner,
        param: impl Fn(u16) -> u16,
    ) {
        for addr in range {
            self.set_write_func(addr, handler, owner, param(addr));
        }
    }

    /// Returns every route held by `owner` to open bus. Returns how many
    /// routes were released.
    pub fn release(&mut self, owner: Owner) -> usize {
        let mut released = 0;
        for slot in self.slots.iter_mut() {
            if slot.read.owner == owner {
                slot.read = BusSlot::OPEN.read;
                released += 1;
            }
            if slot.write.owner == owner {
                slot.write = BusSlot::OPEN.write;
                released += 1;
            }
        }
        released
    }

    /// Returns every slot to open bus.
    pub fn clear(&mut self) {
        self.slots.fill(BusSlot::OPEN);
    }

    pub fn len(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        N == 0
    }
}

impl<const N: usize> Default for AddressBus<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for AddressBus<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let claimed = self.slots.iter().filter(|s| **s != BusSlot::OPEN).count();
        f.debug_struct("AddressBus")
            .field("slots", &N)
            .field("claimed", &claimed)
            .finish()
    }
}
