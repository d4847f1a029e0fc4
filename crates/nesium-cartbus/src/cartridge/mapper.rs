//! Mapper scaffolding shared by every board.
//!
//! [`MapperCore`] owns the cartridge memories and the bank registers the bus
//! routes read through; each board wraps one and adds its own register
//! protocol via the [`Mapper`] trait. Register values are stored as written
//! (after masking to the implemented bits) and reduced modulo the bank count
//! only when an access converts them into an offset, so any value a program
//! writes stays in bounds.

use std::{borrow::Cow, fmt, ops::RangeInclusive};

use crate::{
    bus::{BankSize, CpuBus, Owner, PpuBus, ReadHandler, Route, WriteHandler},
    cartridge::{
        mirroring::{MirrorMode, NametableMap},
        pcb::PcbClass,
        rom::{RomImage, RomInfo},
    },
    irq::Interruptable,
    memory::{cpu as cpu_mem, ppu as ppu_mem},
};

pub mod chr_storage;
pub mod mapper0;
pub mod mapper1;
pub mod mapper2;
pub mod mapper23;
pub mod mapper24;
pub mod mapper3;
pub mod mapper7;

pub use chr_storage::ChrStorage;
pub use mapper0::Mapper0;
pub use mapper1::Mapper1;
pub use mapper2::Mapper2;
pub use mapper3::Mapper3;
pub use mapper7::Mapper7;
pub use mapper23::Mapper23;
pub use mapper24::Mapper24;

pub const PRG_BANK_SLOTS: usize = 4;
pub const CHR_BANK_SLOTS: usize = 8;

/// Register handlers a board can bind to CPU addresses. The route param is
/// the CPU address written, which the board decodes (and swizzles) itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    /// Single register decoded over the whole ROM window (UxROM, CNROM, AxROM).
    BankSelect,
    /// MMC1 `$8000-$FFFF`: serial port; A13/A14 pick the register the fifth
    /// write lands in.
    Mmc1Serial,
    /// VRC2/4 `$8000`: PRG bank at `$8000` (or `$C000` in swap mode).
    VrcPrg0,
    /// VRC2/4 `$9000`: mirroring, PRG swap mode.
    VrcControl,
    /// VRC2/4 `$A000`: PRG bank at `$A000`.
    VrcPrg1,
    /// VRC2/4 `$B000-$E003`: CHR register pair `n` (0 = `$B000`).
    VrcChr(u8),
    /// VRC4 `$F000-$F003`: IRQ latch, control, acknowledge.
    VrcIrq,
    /// VRC6 `$8000-$8003`: 16 KiB PRG bank.
    Vrc6Prg16,
    /// VRC6 `$C000-$C003`: 8 KiB PRG bank.
    Vrc6Prg8,
    /// VRC6 `$B003`: PPU banking style, mirroring, work RAM enable.
    Vrc6Control,
    /// VRC6 `$D000-$E003`: 1 KiB CHR registers.
    Vrc6Chr,
    /// VRC6 `$F000-$F002`: IRQ latch, control, acknowledge.
    Vrc6Irq,
    /// VRC6 `$9000-$B002`: expansion audio, accepted and dropped.
    Vrc6Audio,
}

/// Behaviour each board adds on top of [`MapperCore`].
pub trait Mapper: fmt::Debug {
    fn core(&self) -> &MapperCore;

    fn core_mut(&mut self) -> &mut MapperCore;

    /// Installs the board's routes. Routes may only depend on state fixed at
    /// load time; everything a register controls is read through the core.
    fn apply_map(&self, cpu: &mut CpuBus, ppu: &mut PpuBus, nametables: &mut NametableMap);

    fn write_register(&mut self, port: Port, addr: u16, value: u8, irq: &mut dyn Interruptable);

    /// One CPU cycle.
    fn tick(&mut self, _irq: &mut dyn Interruptable) {}

    fn reset(&mut self, _irq: &mut dyn Interruptable) {
        self.core_mut().reset_registers();
    }

    fn name(&self) -> Cow<'static, str>;
}

fn bank_counts(len: usize) -> [usize; 6] {
    BankSize::ALL.map(|size| (len / size.bytes()).max(1))
}

#[derive(Debug, Clone)]
pub struct MapperCore {
    prg: Box<[u8]>,
    chr: ChrStorage,
    prg_ram: Box<[u8]>,
    prg_ram_enabled: bool,
    /// 8 KiB page of work RAM seen at `$6000`.
    prg_ram_bank: u16,
    prg_banks: [u16; PRG_BANK_SLOTS],
    chr_banks: [u16; CHR_BANK_SLOTS],
    prg_bank_counts: [usize; 6],
    chr_bank_counts: [usize; 6],
    /// Byte offset of the last bank of the fixed window.
    fixed_offset: usize,
    mirroring: MirrorMode,
    info: RomInfo,
    pcb: PcbClass,
}

impl MapperCore {
    pub fn new(rom: RomImage, pcb: PcbClass, prg_ram_size: usize) -> Self {
        let (prg, chr_rom, info) = rom.into_parts();
        let chr = ChrStorage::select(chr_rom, info.chr_ram_size);

        Self {
            prg_bank_counts: bank_counts(prg.len()),
            chr_bank_counts: bank_counts(chr.len()),
            prg,
            chr,
            prg_ram: vec![0; prg_ram_size].into_boxed_slice(),
            prg_ram_enabled: true,
            prg_ram_bank: 0,
            prg_banks: [0; PRG_BANK_SLOTS],
            chr_banks: [0; CHR_BANK_SLOTS],
            fixed_offset: 0,
            mirroring: info.mirroring,
            info,
            pcb,
        }
    }

    pub fn info(&self) -> &RomInfo {
        &self.info
    }

    pub fn pcb(&self) -> PcbClass {
        self.pcb
    }

    pub fn prg(&self) -> &[u8] {
        &self.prg
    }

    pub fn chr(&self) -> &ChrStorage {
        &self.chr
    }

    pub fn prg_ram(&self) -> &[u8] {
        &self.prg_ram
    }

    pub fn prg_ram_mut(&mut self) -> &mut [u8] {
        &mut self.prg_ram
    }

    pub fn prg_bank_count(&self, size: BankSize) -> usize {
        self.prg_bank_counts[size.tier()]
    }

    pub fn chr_bank_count(&self, size: BankSize) -> usize {
        self.chr_bank_counts[size.tier()]
    }

    pub fn prg_bank(&self, slot: usize) -> u16 {
        self.prg_banks[slot % PRG_BANK_SLOTS]
    }

    pub fn set_prg_bank(&mut self, slot: usize, bank: u16) {
        self.prg_banks[slot % PRG_BANK_SLOTS] = bank;
    }

    pub fn chr_bank(&self, slot: usize) -> u16 {
        self.chr_banks[slot % CHR_BANK_SLOTS]
    }

    pub fn set_chr_bank(&mut self, slot: usize, bank: u16) {
        self.chr_banks[slot % CHR_BANK_SLOTS] = bank;
    }

    pub fn mirroring(&self) -> MirrorMode {
        self.mirroring
    }

    pub fn set_mirroring(&mut self, mode: MirrorMode) {
        if self.mirroring != mode {
            tracing::trace!(from = ?self.mirroring, to = ?mode, "mirroring changed");
            self.mirroring = mode;
        }
    }

    pub fn prg_ram_enabled(&self) -> bool {
        self.prg_ram_enabled
    }

    pub fn set_prg_ram_enabled(&mut self, enabled: bool) {
        self.prg_ram_enabled = enabled;
    }

    pub fn prg_ram_bank(&self) -> u16 {
        self.prg_ram_bank
    }

    pub fn set_prg_ram_bank(&mut self, bank: u16) {
        self.prg_ram_bank = bank;
    }

    /// Pins the fixed window to the last `size` bytes of PRG. Images smaller
    /// than one bank get offset 0.
    pub fn set_fixed_bank(&mut self, size: BankSize) {
        self.fixed_offset = self.prg.len().max(size.bytes()) - size.bytes();
    }

    pub fn fixed_offset(&self) -> usize {
        self.fixed_offset
    }

    /// Route param for `offset` bytes into the fixed window.
    pub fn fixed_param(&self, offset: u16) -> u16 {
        let span = (self.prg.len() - self.fixed_offset).max(1);
        (offset as usize % span) as u16
    }

    /// Route param for `offset` bytes into a directly mapped window.
    pub fn direct_param(&self, offset: u16) -> u16 {
        (offset as usize % self.prg.len().max(1)) as u16
    }

    /// Power-on register state.
    pub fn reset_registers(&mut self) {
        self.prg_banks = [0; PRG_BANK_SLOTS];
        self.chr_banks = [0; CHR_BANK_SLOTS];
        self.mirroring = self.info.mirroring;
        self.prg_ram_enabled = true;
        self.prg_ram_bank = 0;
    }

    // --- reads and writes -------------------------------------------------

    pub fn read_prg_direct(&self, param: u16) -> u8 {
        self.prg[param as usize % self.prg.len()]
    }

    pub fn read_prg_fixed(&self, param: u16) -> u8 {
        self.prg[(param as usize + self.fixed_offset) % self.prg.len()]
    }

    pub fn read_prg_bank(&self, slot: u8, size: BankSize, param: u16) -> u8 {
        let bank = self.prg_bank(slot as usize) as usize % self.prg_bank_count(size);
        let offset = param as usize + bank * size.bytes();
        self.prg[offset % self.prg.len()]
    }

    fn prg_ram_index(&self, param: u16) -> usize {
        let base = self.prg_ram_bank as usize * cpu_mem::PRG_RAM_WINDOW;
        (base + param as usize) % self.prg_ram.len()
    }

    pub fn read_prg_ram(&self, param: u16) -> Option<u8> {
        if !self.prg_ram_enabled || self.prg_ram.is_empty() {
            return None;
        }
        Some(self.prg_ram[self.prg_ram_index(param)])
    }

    pub fn write_prg_ram(&mut self, param: u16, value: u8) {
        if !self.prg_ram_enabled || self.prg_ram.is_empty() {
            return;
        }
        let idx = self.prg_ram_index(param);
        self.prg_ram[idx] = value;
    }

    fn chr_base(&self, slot: u8, size: BankSize) -> usize {
        let bank = self.chr_bank(slot as usize) as usize % self.chr_bank_count(size);
        bank * size.bytes()
    }

    pub fn read_chr_bank(&self, slot: u8, size: BankSize, param: u16) -> Option<u8> {
        self.chr.read_indexed(self.chr_base(slot, size), param as usize)
    }

    pub fn write_chr_bank(&mut self, slot: u8, size: BankSize, param: u16, value: u8) {
        let base = self.chr_base(slot, size);
        self.chr.write_indexed(base, param as usize, value);
    }

    /// Executes a cartridge read route. `None` leaves the bus floating.
    pub fn read_route(&self, route: &Route<ReadHandler>) -> Option<u8> {
        let param = route.param;
        match route.handler {
            ReadHandler::PrgDirect => Some(self.read_prg_direct(param)),
            ReadHandler::PrgFixed => Some(self.read_prg_fixed(param)),
            ReadHandler::PrgBank { slot, size } => Some(self.read_prg_bank(slot, size, param)),
            ReadHandler::PrgRam => self.read_prg_ram(param),
            ReadHandler::ChrDirect => self.chr.read_indexed(0, param as usize),
            ReadHandler::ChrBank { slot, size } => self.read_chr_bank(slot, size, param),
            ReadHandler::OpenBus | ReadHandler::Device => None,
        }
    }

    /// Executes a cartridge write route other than a register write.
    pub fn write_route(&mut self, route: &Route<WriteHandler>, value: u8) {
        let param = route.param;
        match route.handler {
            WriteHandler::PrgRam => self.write_prg_ram(param, value),
            WriteHandler::ChrDirect => self.chr.write_indexed(0, param as usize, value),
            WriteHandler::ChrBank { slot, size } => self.write_chr_bank(slot, size, param, value),
            WriteHandler::Ignore | WriteHandler::Device | WriteHandler::Register(_) => {}
        }
    }

    // --- route installers -------------------------------------------------

    /// Work RAM at `$6000-$7FFF`, when the board has any.
    pub fn map_prg_ram(&self, cpu: &mut CpuBus) {
        if self.prg_ram.is_empty() {
            return;
        }
        let range = cpu_mem::PRG_RAM_START..=cpu_mem::PRG_RAM_END;
        cpu.set_read_range(range.clone(), ReadHandler::PrgRam, Owner::Cartridge, |a| {
            a - cpu_mem::PRG_RAM_START
        });
        cpu.set_write_range(range, WriteHandler::PrgRam, Owner::Cartridge, |a| {
            a - cpu_mem::PRG_RAM_START
        });
    }

    /// PRG mapped straight through, mirrored when smaller than the window.
    pub fn map_prg_direct(&self, cpu: &mut CpuBus, range: RangeInclusive<u16>) {
        let base = *range.start();
        cpu.set_read_range(range, ReadHandler::PrgDirect, Owner::Cartridge, |a| {
            self.direct_param(a - base)
        });
    }

    /// The fixed window; call [`MapperCore::set_fixed_bank`] first.
    pub fn map_prg_fixed(&self, cpu: &mut CpuBus, range: RangeInclusive<u16>) {
        let base = *range.start();
        cpu.set_read_range(range, ReadHandler::PrgFixed, Owner::Cartridge, |a| {
            self.fixed_param(a - base)
        });
    }

    /// A swappable window read through PRG bank register `slot`.
    pub fn map_prg_bank(
        &self,
        cpu: &mut CpuBus,
        range: RangeInclusive<u16>,
        slot: u8,
        size: BankSize,
    ) {
        let base = *range.start();
        let handler = ReadHandler::PrgBank { slot, size };
        cpu.set_read_range(range, handler, Owner::Cartridge, |a| a - base);
    }

    pub fn map_registers(&self, cpu: &mut CpuBus, range: RangeInclusive<u16>, port: Port) {
        cpu.set_write_range(range, WriteHandler::Register(port), Owner::Cartridge, |a| a);
    }

    /// The whole 8 KiB pattern space without banking.
    pub fn map_chr_direct(&self, ppu: &mut PpuBus) {
        let range = 0..=ppu_mem::CHR_END;
        ppu.set_read_range(range.clone(), ReadHandler::ChrDirect, Owner::Cartridge, |a| a);
        if self.chr.is_ram() {
            ppu.set_write_range(range, WriteHandler::ChrDirect, Owner::Cartridge, |a| a);
        }
    }

    /// Pattern space split into `size` windows, window `n` read through CHR
    /// bank register `n`.
    pub fn map_chr_banks(&self, ppu: &mut PpuBus, size: BankSize) {
        let bytes = size.bytes() as u16;
        let writable = self.chr.is_ram();
        for addr in 0..=ppu_mem::CHR_END {
            let slot = (addr / bytes) as u8;
            let param = addr % bytes;
            ppu.set_read_func(addr, ReadHandler::ChrBank { slot, size }, Owner::Cartridge, param);
            if writable {
                let handler = WriteHandler::ChrBank { slot, size };
                ppu.set_write_func(addr, handler, Owner::Cartridge, param);
            }
        }
    }

    /// Writes the current mirroring mode into the nametable decode.
    pub fn apply_controllable_mirror_map(&self, nametables: &mut NametableMap) {
        nametables.remap(self.mirroring);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::rom::RomInfo;

    fn core_with_prg(len: usize) -> MapperCore {
        let prg: Vec<u8> = (0..len).map(|i| (i / 0x400) as u8 ^ i as u8).collect();
        let rom = RomImage::new(prg, Vec::new(), RomInfo::new(0)).expect("valid image");
        MapperCore::new(rom, PcbClass::Nrom, 0)
    }

    #[test]
    fn bank_counts_never_drop_to_zero() {
        let core = core_with_prg(3);
        for size in BankSize::ALL {
            assert_eq!(core.prg_bank_count(size), 1);
        }
        let core = core_with_prg(0x6000);
        assert_eq!(core.prg_bank_count(BankSize::K8), 3);
        assert_eq!(core.prg_bank_count(BankSize::K16), 1);
    }

    #[test]
    fn fixed_offset_degenerates_for_small_images() {
        let mut core = core_with_prg(0x1000);
        core.set_fixed_bank(BankSize::K16);
        assert_eq!(core.fixed_offset(), 0);
        assert_eq!(core.fixed_param(0x1234), 0x0234);

        let mut core = core_with_prg(0x20000);
        core.set_fixed_bank(BankSize::K16);
        assert_eq!(core.fixed_offset(), 0x1C000);
        assert_eq!(core.fixed_param(0x3FFF), 0x3FFF);
        assert_eq!(core.read_prg_fixed(0x3FFF), core.prg()[0x1FFFF]);
    }

    #[test]
    fn bank_register_wraps_at_conversion() {
        let mut core = core_with_prg(0x8000);
        core.set_prg_bank(0, 0xFFFF);
        // 4 banks of 8 KiB: 0xFFFF % 4 = 3.
        assert_eq!(core.read_prg_bank(0, BankSize::K8, 0x10), core.prg()[0x6010]);
        assert_eq!(core.prg_bank(0), 0xFFFF);
    }

    #[test]
    fn chr_ram_is_default_when_no_chr_rom() {
        let mut core = core_with_prg(0x4000);
        core.set_chr_bank(1, 1);
        core.write_chr_bank(1, BankSize::K1, 0x10, 0x42);
        assert_eq!(core.chr().as_ram().map(|ram| ram[0x410]), Some(0x42));
        assert_eq!(core.read_chr_bank(1, BankSize::K1, 0x10), Some(0x42));
    }

    #[test]
    fn declared_chr_ram_size_sets_bank_count() {
        let info = RomInfo::new(0).with_chr_ram_size(0x8000);
        let rom = RomImage::new(vec![0; 0x4000], Vec::new(), info).expect("valid image");
        let core = MapperCore::new(rom, PcbClass::Nrom, 0);
        assert_eq!(core.chr().len(), 0x8000);
        assert_eq!(core.chr_bank_count(BankSize::K4), 8);
    }

    #[test]
    fn prg_ram_bank_pages_work_ram() {
        let rom = RomImage::new(vec![0; 0x4000], Vec::new(), RomInfo::new(1)).expect("valid image");
        let mut core = MapperCore::new(rom, PcbClass::Sxrom, 0x8000);
        core.set_prg_ram_bank(3);
        core.write_prg_ram(0x0010, 0x5A);
        assert_eq!(core.prg_ram()[0x6010], 0x5A);
        core.set_prg_ram_bank(0);
        assert_eq!(core.read_prg_ram(0x0010), Some(0));

        core.set_prg_ram_bank(2);
        core.reset_registers();
        assert_eq!(core.prg_ram_bank(), 0);
    }

    #[test]
    fn disabled_prg_ram_floats() {
        let rom = RomImage::new(vec![0; 0x4000], Vec::new(), RomInfo::new(0)).expect("valid image");
        let mut core = MapperCore::new(rom, PcbClass::Nrom, 0x2000);
        core.write_prg_ram(0x10, 0x99);
        assert_eq!(core.read_prg_ram(0x10), Some(0x99));
        core.set_prg_ram_enabled(false);
        core.write_prg_ram(0x10, 0x11);
        assert_eq!(core.read_prg_ram(0x10), None);
        core.set_prg_ram_enabled(true);
        assert_eq!(core.read_prg_ram(0x10), Some(0x99));
    }

    #[test]
    fn chr_windows_follow_bank_size() {
        let core = core_with_prg(0x4000);
        let mut ppu = PpuBus::new();
        core.map_chr_banks(&mut ppu, BankSize::K2);
        let slot = ppu.slot(0x1C05);
        assert_eq!(
            slot.read.handler,
            ReadHandler::ChrBank {
                slot: 3,
                size: BankSize::K2
            }
        );
        assert_eq!(slot.read.param, 0x0405);
        assert!(matches!(slot.write.handler, WriteHandler::ChrBank { slot: 3, .. }));
    }
}
