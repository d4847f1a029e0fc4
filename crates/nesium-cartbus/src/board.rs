//! The cartridge slot and everything wired to it.
//!
//! [`Board`] owns both dispatch tables, the console's 4 KiB of nametable RAM
//! and the inserted [`Cartridge`]. Every access fetches one slot and runs its
//! handler against the owner the slot names: the cartridge, a host device
//! through [`Peripherals`], or nobody (the floating bus).

use std::ops::RangeInclusive;

use crate::{
    bus::{CpuBus, DeviceId, OpenBus, Owner, PpuBus, ReadHandler, Route, WriteHandler},
    cartridge::{Cartridge, NametableMap, RomImage},
    config::LoadConfig,
    irq::{Interruptable, IrqLine, IrqSource},
    memory::ppu as ppu_mem,
};

/// Host devices reachable through `Owner::Device` routes (RAM, PPU/APU
/// registers, controllers).
pub trait Peripherals {
    /// `None` leaves the data bus floating.
    fn read(&mut self, device: DeviceId, param: u16) -> Option<u8>;

    fn write(&mut self, device: DeviceId, param: u16, value: u8);
}

/// A host with nothing attached.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Unmapped;

impl Peripherals for Unmapped {
    fn read(&mut self, _device: DeviceId, _param: u16) -> Option<u8> {
        None
    }

    fn write(&mut self, _device: DeviceId, _param: u16, _value: u8) {}
}

#[derive(Debug)]
pub struct Board<P: Peripherals = Unmapped, I: Interruptable = IrqLine> {
    cpu_bus: CpuBus,
    ppu_bus: PpuBus,
    nametables: NametableMap,
    nametable_ram: Box<[u8]>,
    cpu_open_bus: OpenBus,
    ppu_open_bus: OpenBus,
    cartridge: Option<Cartridge>,
    peripherals: P,
    irq: I,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// An empty slot with no host devices.
    pub fn new() -> Self {
        Self::with_host(Unmapped, IrqLine::new())
    }
}

impl<P: Peripherals, I: Interruptable> Board<P, I> {
    pub fn with_host(peripherals: P, irq: I) -> Self {
        Self {
            cpu_bus: CpuBus::new(),
            ppu_bus: PpuBus::new(),
            nametables: NametableMap::default(),
            nametable_ram: vec![0; ppu_mem::NAMETABLE_RAM_SIZE].into_boxed_slice(),
            cpu_open_bus: OpenBus::new(),
            ppu_open_bus: OpenBus::new(),
            cartridge: None,
            peripherals,
            irq,
        }
    }

    /// Builds a cartridge from `rom` and plugs it in.
    pub fn load_rom(&mut self, rom: RomImage, config: &LoadConfig) -> Option<Cartridge> {
        self.insert_cartridge(Cartridge::init_with_rom(rom, config))
    }

    /// Plugs `cartridge` in and maps it, handing back whatever was inserted
    /// before. Host device routes are left in place.
    pub fn insert_cartridge(&mut self, cartridge: Cartridge) -> Option<Cartridge> {
        self.release_cartridge_irq();
        let previous = self.cartridge.replace(cartridge);
        self.apply_map();
        previous
    }

    pub fn eject(&mut self) -> Option<Cartridge> {
        self.release_cartridge_irq();
        self.release_cartridge_routes();
        self.cartridge.take()
    }

    /// The outgoing mapper's counter leaves with it; nothing could acknowledge
    /// a line it still held.
    fn release_cartridge_irq(&mut self) {
        if self.irq.irq_asserted(IrqSource::MAPPER) {
            tracing::debug!("releasing mapper irq held by outgoing cartridge");
        }
        self.irq.clear_irq(IrqSource::MAPPER);
    }

    /// Re-installs the cartridge's routes from scratch.
    pub fn apply_map(&mut self) {
        self.release_cartridge_routes();
        if let Some(cartridge) = &self.cartridge {
            cartridge.apply_map(&mut self.cpu_bus, &mut self.ppu_bus, &mut self.nametables);
        }
    }

    fn release_cartridge_routes(&mut self) {
        let released =
            self.cpu_bus.release(Owner::Cartridge) + self.ppu_bus.release(Owner::Cartridge);
        if released > 0 {
            tracing::debug!(released, "cartridge routes released");
        }
    }

    /// Routes CPU reads over `range` to a host device. `param` maps each
    /// address to the value the device sees.
    pub fn map_device_read(
        &mut self,
        range: RangeInclusive<u16>,
        device: DeviceId,
        param: impl Fn(u16) -> u16,
    ) {
        self.cpu_bus
            .set_read_range(range, ReadHandler::Device, Owner::Device(device), param);
    }

    pub fn map_device_write(
        &mut self,
        range: RangeInclusive<u16>,
        device: DeviceId,
        param: impl Fn(u16) -> u16,
    ) {
        self.cpu_bus
            .set_write_range(range, WriteHandler::Device, Owner::Device(device), param);
    }

    fn run_read(&mut self, route: Route<ReadHandler>) -> Option<u8> {
        match (route.handler, route.owner) {
            (ReadHandler::OpenBus, _) => None,
            (ReadHandler::Device, Owner::Device(id)) => self.peripherals.read(id, route.param),
            (ReadHandler::Device, _) => None,
            (_, Owner::Cartridge) => self.cartridge.as_ref().and_then(|cart| cart.read(&route)),
            _ => None,
        }
    }

    fn run_write(&mut self, route: Route<WriteHandler>, value: u8) {
        match (route.handler, route.owner) {
            (WriteHandler::Ignore, _) => {}
            (WriteHandler::Device, Owner::Device(id)) => {
                self.peripherals.write(id, route.param, value)
            }
            (WriteHandler::Device, _) => {}
            (_, Owner::Cartridge) => {
                if let Some(cartridge) = self.cartridge.as_mut() {
                    cartridge.write(&route, value, &mut self.irq);
                    self.nametables.remap(cartridge.mirroring());
                }
            }
            _ => {}
        }
    }

    pub fn cpu_read(&mut self, addr: u16) -> u8 {
        let route = self.cpu_bus.slot(addr).read;
        match self.run_read(route) {
            Some(value) => {
                self.cpu_open_bus.latch(value);
                value
            }
            None => self.cpu_open_bus.sample(),
        }
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        self.cpu_open_bus.latch(value);
        let route = self.cpu_bus.slot(addr).write;
        self.run_write(route, value);
    }

    /// PPU access to `$0000-$3EFF`. Palette RAM belongs to the PPU itself and
    /// floats here.
    pub fn ppu_read(&mut self, addr: u16) -> u8 {
        let addr = addr & ppu_mem::VRAM_MIRROR_MASK;
        let driven = match addr {
            0..=ppu_mem::CHR_END => {
                let route = self.ppu_bus.slot(addr).read;
                self.run_read(route)
            }
            ppu_mem::NAMETABLE_BASE..=ppu_mem::NAMETABLE_END => {
                Some(self.nametable_ram[self.nametables.resolve(addr)])
            }
            _ => None,
        };
        match driven {
            Some(value) => {
                self.ppu_open_bus.latch(value);
                value
            }
            None => self.ppu_open_bus.sample(),
        }
    }

    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        let addr = addr & ppu_mem::VRAM_MIRROR_MASK;
        self.ppu_open_bus.latch(value);
        match addr {
            0..=ppu_mem::CHR_END => {
                let route = self.ppu_bus.slot(addr).write;
                self.run_write(route, value);
            }
            ppu_mem::NAMETABLE_BASE..=ppu_mem::NAMETABLE_END => {
                let idx = self.nametables.resolve(addr);
                self.nametable_ram[idx] = value;
            }
            _ => {}
        }
    }

    /// One CPU cycle.
    pub fn tick(&mut self) {
        if let Some(cartridge) = self.cartridge.as_mut() {
            cartridge.tick(&mut self.irq);
        }
    }

    /// Soft reset: cartridge registers back to power-on, memories kept.
    pub fn reset(&mut self) {
        if let Some(cartridge) = self.cartridge.as_mut() {
            cartridge.reset(&mut self.irq);
            self.nametables.remap(cartridge.mirroring());
        }
        self.cpu_open_bus.reset();
        self.ppu_open_bus.reset();
    }

    pub fn irq_line(&self) -> bool {
        self.irq.irq_line()
    }

    pub fn cartridge(&self) -> Option<&Cartridge> {
        self.cartridge.as_ref()
    }

    pub fn cartridge_mut(&mut self) -> Option<&mut Cartridge> {
        self.cartridge.as_mut()
    }

    pub fn cpu_bus(&self) -> &CpuBus {
        &self.cpu_bus
    }

    pub fn ppu_bus(&self) -> &PpuBus {
        &self.ppu_bus
    }

    pub fn nametables(&self) -> &NametableMap {
        &self.nametables
    }

    pub fn nametable_ram(&self) -> &[u8] {
        &self.nametable_ram
    }

    pub fn peripherals(&self) -> &P {
        &self.peripherals
    }

    pub fn peripherals_mut(&mut self) -> &mut P {
        &mut self.peripherals
    }

    pub fn irq(&self) -> &I {
        &self.irq
    }

    pub fn irq_mut(&mut self) -> &mut I {
        &mut self.irq
    }
}
