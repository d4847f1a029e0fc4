//! Mapper 1 – Nintendo MMC1 (SxROM boards).
//!
//! The chip has a single 5-bit serial port. Each write to `$8000-$FFFF`
//! shifts bit 0 in; the fifth write commits the value to the register picked
//! by A13/A14 of that write. A write with bit 7 set clears the shift and
//! forces PRG mode 3.
//!
//! | Area | Address range     | Behaviour                                        | IRQ/Audio |
//! |------|-------------------|--------------------------------------------------|-----------|
//! | CPU  | `$6000-$7FFF`     | Work RAM, chip-enable via PRG bit 4              | None      |
//! | CPU  | `$8000-$BFFF`     | 16 KiB bank (first bank in mode 2)               | None      |
//! | CPU  | `$C000-$FFFF`     | 16 KiB bank (last bank in mode 3)                | None      |
//! | CPU  | `$8000-$9FFF`     | Control: `CPPMM` CHR mode, PRG mode, mirroring   | None      |
//! | CPU  | `$A000-$BFFF`     | CHR bank 0                                       | None      |
//! | CPU  | `$C000-$DFFF`     | CHR bank 1                                       | None      |
//! | CPU  | `$E000-$FFFF`     | PRG bank, bit 4 disables work RAM                | None      |
//! | PPU  | `$0000-$1FFF`     | One 8 KiB or two 4 KiB CHR banks                 | None      |
//! | PPU  | `$2000-$3EFF`     | Single-screen A / B, vertical, horizontal        | None      |
//!
//! Boards that spend CHR register bits elsewhere:
//!
//! * SNROM: bit 4 disables work RAM.
//! * SUROM, SXROM: bit 4 is PRG A18, the 256 KiB half both PRG windows see.
//! * SOROM: bit 3 pages 16 KiB of work RAM. SXROM: bits 2-3 page 32 KiB.
//! * SEROM and kin leave PRG unbanked and never decode `$E000-$FFFF`.

use std::borrow::Cow;

use crate::{
    bus::{BankSize, CpuBus, PpuBus},
    cartridge::{
        mapper::{Mapper, MapperCore, Port},
        mirroring::{MirrorMode, NametableMap},
        pcb::PcbClass,
        rom::RomImage,
    },
    irq::Interruptable,
    memory::cpu as cpu_mem,
};

const SHIFT_RESET_BIT: u8 = 0x80;
const SHIFT_WIDTH: u8 = 5;
const REGISTER_MASK: u8 = 0x1F;

/// PRG mode 3, the state a reset write forces.
const CONTROL_PRG_MODE_3: u8 = 0x0C;
const CONTROL_CHR_4K: u8 = 0x10;

const PRG_SELECT_MASK: u8 = 0x0F;
const PRG_RAM_DISABLE: u8 = 0x10;
const CHR_HIGH_BIT: u8 = 0x10;

/// 16 KiB banks in one 256 KiB half of a SUROM/SXROM image.
const OUTER_PRG_BANKS: u16 = 16;

const SXROM_WORK_RAM: usize = 32 * 1024;
const SOROM_WORK_RAM: usize = 16 * 1024;

#[derive(Debug, Clone)]
pub struct Mapper1 {
    core: MapperCore,

    shift: u8,
    shift_count: u8,

    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,
}

impl Mapper1 {
    pub fn new(rom: RomImage, pcb: PcbClass, prg_ram_size: usize) -> Self {
        // Every SxROM board that decodes `$6000` carries at least 8 KiB.
        let board_ram = match pcb {
            PcbClass::Sxrom => SXROM_WORK_RAM,
            PcbClass::Sorom => SOROM_WORK_RAM,
            _ => cpu_mem::PRG_RAM_WINDOW,
        };
        let core = MapperCore::new(rom, pcb, prg_ram_size.max(board_ram));

        let mut mapper = Self {
            core,
            shift: 0,
            shift_count: 0,
            control: 0,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
        };
        mapper.power_on_init();
        mapper
    }

    fn power_on_init(&mut self) {
        self.core.reset_registers();
        self.control = CONTROL_PRG_MODE_3;
        self.chr_bank0 = 0;
        self.chr_bank1 = 0;
        self.prg_bank = 0;
        self.shift = 0;
        self.shift_count = 0;
        self.sync();
    }

    pub fn control(&self) -> u8 {
        self.control
    }

    pub fn shift_count(&self) -> u8 {
        self.shift_count
    }

    fn chr_4k_mode(&self) -> bool {
        self.control & CONTROL_CHR_4K != 0
    }

    /// First 16 KiB bank of the half PRG A18 selects.
    fn outer_prg_base(&self) -> u16 {
        match self.core.pcb() {
            PcbClass::Surom | PcbClass::Sxrom if self.chr_bank0 & CHR_HIGH_BIT != 0 => {
                OUTER_PRG_BANKS
            }
            _ => 0,
        }
    }

    fn sync(&mut self) {
        self.core.set_mirroring(match self.control & 0x03 {
            0 => MirrorMode::SingleScreenA,
            1 => MirrorMode::SingleScreenB,
            2 => MirrorMode::Vertical,
            _ => MirrorMode::Horizontal,
        });
        self.sync_prg();
        self.sync_chr();
        self.sync_prg_ram();
    }

    fn sync_prg(&mut self) {
        let outer = self.outer_prg_base();
        let bank = (self.prg_bank & PRG_SELECT_MASK) as u16;
        let banks = (self.core.prg_bank_count(BankSize::K16) as u16).min(OUTER_PRG_BANKS);
        let last = outer + banks - 1;

        let (low, high) = match (self.control >> 2) & 0x03 {
            0 | 1 => {
                let even = outer | (bank & !1);
                (even, even + 1)
            }
            2 => (outer, outer | bank),
            _ => (outer | bank, last),
        };
        self.core.set_prg_bank(0, low);
        self.core.set_prg_bank(1, high);
    }

    fn sync_chr(&mut self) {
        let (low, high) = if self.chr_4k_mode() {
            (self.chr_bank0 as u16, self.chr_bank1 as u16)
        } else {
            let even = (self.chr_bank0 & !1) as u16;
            (even, even | 1)
        };
        self.core.set_chr_bank(0, low);
        self.core.set_chr_bank(1, high);
    }

    fn sync_prg_ram(&mut self) {
        let mut enabled = self.prg_bank & PRG_RAM_DISABLE == 0;
        match self.core.pcb() {
            PcbClass::Snrom => {
                // In 8 KiB mode the second CHR register never reaches the pins.
                let chr1_clear = !self.chr_4k_mode() || self.chr_bank1 & CHR_HIGH_BIT == 0;
                enabled &= self.chr_bank0 & CHR_HIGH_BIT == 0 && chr1_clear;
            }
            PcbClass::Sorom => self.core.set_prg_ram_bank(((self.chr_bank0 >> 3) & 0x01) as u16),
            PcbClass::Sxrom => self.core.set_prg_ram_bank(((self.chr_bank0 >> 2) & 0x03) as u16),
            _ => {}
        }
        self.core.set_prg_ram_enabled(enabled);
    }

    fn commit(&mut self, addr: u16, value: u8) {
        match (addr >> 13) & 0x03 {
            0 => self.control = value,
            1 => self.chr_bank0 = value,
            2 => self.chr_bank1 = value,
            _ => self.prg_bank = value,
        }
        tracing::trace!(addr, value, "mmc1 register committed");
        self.sync();
    }

    fn write_serial(&mut self, addr: u16, value: u8) {
        if value & SHIFT_RESET_BIT != 0 {
            // Bank registers keep their values.
            self.shift = 0;
            self.shift_count = 0;
            self.control |= CONTROL_PRG_MODE_3;
            self.sync();
            return;
        }

        self.shift = (self.shift >> 1) | ((value & 0x01) << 4);
        self.shift_count += 1;
        if self.shift_count == SHIFT_WIDTH {
            let committed = self.shift & REGISTER_MASK;
            self.shift = 0;
            self.shift_count = 0;
            self.commit(addr, committed);
        }
    }
}

impl Mapper for Mapper1 {
    fn core(&self) -> &MapperCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MapperCore {
        &mut self.core
    }

    fn apply_map(&self, cpu: &mut CpuBus, ppu: &mut PpuBus, nametables: &mut NametableMap) {
        let core = &self.core;
        core.map_prg_ram(cpu);

        if core.pcb() == PcbClass::Serom {
            core.map_prg_direct(cpu, cpu_mem::PRG_ROM_START..=cpu_mem::CPU_ADDR_END);
            core.map_registers(cpu, cpu_mem::PRG_ROM_START..=0xDFFF, Port::Mmc1Serial);
        } else {
            core.map_prg_bank(cpu, cpu_mem::PRG_ROM_START..=0xBFFF, 0, BankSize::K16);
            core.map_prg_bank(cpu, 0xC000..=cpu_mem::CPU_ADDR_END, 1, BankSize::K16);
            let registers = cpu_mem::PRG_ROM_START..=cpu_mem::CPU_ADDR_END;
            core.map_registers(cpu, registers, Port::Mmc1Serial);
        }

        core.map_chr_banks(ppu, BankSize::K4);
        core.apply_controllable_mirror_map(nametables);
    }

    fn write_register(&mut self, port: Port, addr: u16, value: u8, _irq: &mut dyn Interruptable) {
        if port == Port::Mmc1Serial {
            self.write_serial(addr, value);
        }
    }

    fn reset(&mut self, _irq: &mut dyn Interruptable) {
        self.power_on_init();
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.core.pcb().name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cartridge::rom::RomInfo, irq::IrqLine};

    /// PRG filled with its 16 KiB bank number, CHR ROM with its 4 KiB bank
    /// number (CHR RAM when `chr_banks` is zero).
    fn mmc1(pcb: PcbClass, prg_banks: usize, chr_banks: usize) -> Mapper1 {
        let prg: Vec<u8> = (0..prg_banks * 0x4000).map(|i| (i / 0x4000) as u8).collect();
        let chr: Vec<u8> = (0..chr_banks * 0x1000).map(|i| (i / 0x1000) as u8).collect();
        let rom = RomImage::new(prg, chr, RomInfo::new(1)).expect("valid image");
        Mapper1::new(rom, pcb, 0)
    }

    fn serial(mapper: &mut Mapper1, addr: u16, value: u8) {
        let mut line = IrqLine::new();
        for bit in 0..5 {
            mapper.write_register(Port::Mmc1Serial, addr, value >> bit, &mut line);
        }
    }

    fn prg_at(mapper: &Mapper1, slot: u8) -> u8 {
        mapper.core().read_prg_bank(slot, BankSize::K16, 0)
    }

    fn chr_at(mapper: &Mapper1, slot: u8) -> Option<u8> {
        mapper.core().read_chr_bank(slot, BankSize::K4, 0)
    }

    #[test]
    fn power_on_fixes_last_bank_at_c000() {
        let mapper = mmc1(PcbClass::Mmc1, 8, 4);
        assert_eq!(mapper.control(), CONTROL_PRG_MODE_3);
        assert_eq!(prg_at(&mapper, 0), 0);
        assert_eq!(prg_at(&mapper, 1), 7);
    }

    #[test]
    fn fifth_write_commits_to_register_selected_by_a13_a14() {
        let mut mapper = mmc1(PcbClass::Mmc1, 8, 4);
        let mut line = IrqLine::new();
        for _ in 0..4 {
            mapper.write_register(Port::Mmc1Serial, 0x8000, 0x01, &mut line);
        }
        assert_eq!(mapper.shift_count(), 4);
        // Only the address of the last write matters.
        mapper.write_register(Port::Mmc1Serial, 0xE000, 0x00, &mut line);
        assert_eq!(mapper.shift_count(), 0);
        assert_eq!(mapper.prg_bank, 0x0F);
        assert_eq!(mapper.control(), CONTROL_PRG_MODE_3);
    }

    #[test]
    fn reset_bit_clears_shift_and_forces_mode_3() {
        let mut mapper = mmc1(PcbClass::Mmc1, 8, 4);
        let mut line = IrqLine::new();
        serial(&mut mapper, 0x8000, 0x02);
        assert_eq!(mapper.control(), 0x02);

        mapper.write_register(Port::Mmc1Serial, 0x8000, 0x01, &mut line);
        mapper.write_register(Port::Mmc1Serial, 0x8000, 0x80, &mut line);
        assert_eq!(mapper.shift_count(), 0);
        assert_eq!(mapper.control(), 0x0E);
        assert_eq!(mapper.core().mirroring(), MirrorMode::Vertical);
    }

    #[test]
    fn control_selects_mirroring() {
        let mut mapper = mmc1(PcbClass::Mmc1, 2, 2);
        for (value, mode) in [
            (0x0C, MirrorMode::SingleScreenA),
            (0x0D, MirrorMode::SingleScreenB),
            (0x0E, MirrorMode::Vertical),
            (0x0F, MirrorMode::Horizontal),
        ] {
            serial(&mut mapper, 0x8000, value);
            assert_eq!(mapper.core().mirroring(), mode);
        }
    }

    #[test]
    fn prg_modes() {
        let mut mapper = mmc1(PcbClass::Mmc1, 8, 4);
        serial(&mut mapper, 0xE000, 5);
        assert_eq!((prg_at(&mapper, 0), prg_at(&mapper, 1)), (5, 7));

        // 32 KiB mode drops the low bit.
        serial(&mut mapper, 0x8000, 0x00);
        assert_eq!((prg_at(&mapper, 0), prg_at(&mapper, 1)), (4, 5));

        serial(&mut mapper, 0x8000, 0x08);
        assert_eq!((prg_at(&mapper, 0), prg_at(&mapper, 1)), (0, 5));
    }

    #[test]
    fn chr_modes() {
        let mut mapper = mmc1(PcbClass::Mmc1, 2, 8);
        serial(&mut mapper, 0xA000, 3);
        serial(&mut mapper, 0xC000, 6);
        // 8 KiB mode: bank 0 with its low bit cleared, CHR bank 1 ignored.
        assert_eq!((chr_at(&mapper, 0), chr_at(&mapper, 1)), (Some(2), Some(3)));

        serial(&mut mapper, 0x8000, CONTROL_CHR_4K | CONTROL_PRG_MODE_3);
        assert_eq!((chr_at(&mapper, 0), chr_at(&mapper, 1)), (Some(3), Some(6)));
    }

    #[test]
    fn prg_bit4_disables_work_ram() {
        let mut mapper = mmc1(PcbClass::Mmc1, 8, 4);
        assert!(mapper.core().prg_ram_enabled());
        serial(&mut mapper, 0xE000, PRG_RAM_DISABLE);
        assert!(!mapper.core().prg_ram_enabled());
        serial(&mut mapper, 0xE000, 0);
        assert!(mapper.core().prg_ram_enabled());
    }

    #[test]
    fn snrom_chr_bit4_disables_work_ram() {
        let mut mapper = mmc1(PcbClass::Snrom, 8, 0);
        serial(&mut mapper, 0xA000, CHR_HIGH_BIT);
        assert!(!mapper.core().prg_ram_enabled());
        serial(&mut mapper, 0xA000, 0);
        assert!(mapper.core().prg_ram_enabled());

        // CHR bank 1 only counts in 4 KiB mode.
        serial(&mut mapper, 0xC000, CHR_HIGH_BIT);
        assert!(mapper.core().prg_ram_enabled());
        serial(&mut mapper, 0x8000, CONTROL_CHR_4K | CONTROL_PRG_MODE_3);
        assert!(!mapper.core().prg_ram_enabled());
    }

    #[test]
    fn surom_chr_bit4_selects_prg_half() {
        let mut mapper = mmc1(PcbClass::Surom, 32, 0);
        assert_eq!((prg_at(&mapper, 0), prg_at(&mapper, 1)), (0, 15));

        serial(&mut mapper, 0xA000, CHR_HIGH_BIT);
        serial(&mut mapper, 0xE000, 2);
        assert_eq!((prg_at(&mapper, 0), prg_at(&mapper, 1)), (18, 31));

        serial(&mut mapper, 0xA000, 0);
        assert_eq!((prg_at(&mapper, 0), prg_at(&mapper, 1)), (2, 15));
    }

    #[test]
    fn other_boards_ignore_chr_bit4_for_prg() {
        let mut mapper = mmc1(PcbClass::Mmc1, 16, 0);
        serial(&mut mapper, 0xA000, CHR_HIGH_BIT);
        assert_eq!(prg_at(&mapper, 1), 15);
    }

    #[test]
    fn sorom_pages_work_ram_with_chr_bit3() {
        let mut mapper = mmc1(PcbClass::Sorom, 16, 0);
        assert_eq!(mapper.core().prg_ram().len(), SOROM_WORK_RAM);

        serial(&mut mapper, 0xA000, 0x08);
        assert_eq!(mapper.core().prg_ram_bank(), 1);
        mapper.core_mut().write_prg_ram(0x0000, 0x77);
        assert_eq!(mapper.core().prg_ram()[0x2000], 0x77);
    }

    #[test]
    fn sxrom_pages_work_ram_and_prg_half_together() {
        let mut mapper = mmc1(PcbClass::Sxrom, 32, 0);
        assert_eq!(mapper.core().prg_ram().len(), SXROM_WORK_RAM);

        serial(&mut mapper, 0xA000, CHR_HIGH_BIT | 0x0C);
        assert_eq!(mapper.core().prg_ram_bank(), 3);
        assert_eq!(prg_at(&mapper, 1), 31);
    }

    #[test]
    fn reset_restores_power_on_state() {
        let mut mapper = mmc1(PcbClass::Sxrom, 32, 0);
        let mut line = IrqLine::new();
        serial(&mut mapper, 0xA000, CHR_HIGH_BIT | 0x04);
        serial(&mut mapper, 0x8000, 0x02);
        mapper.write_register(Port::Mmc1Serial, 0x8000, 0x01, &mut line);

        mapper.reset(&mut line);
        assert_eq!(mapper.shift_count(), 0);
        assert_eq!(mapper.control(), CONTROL_PRG_MODE_3);
        assert_eq!(mapper.core().prg_ram_bank(), 0);
        assert_eq!((prg_at(&mapper, 0), prg_at(&mapper, 1)), (0, 15));
    }
}
