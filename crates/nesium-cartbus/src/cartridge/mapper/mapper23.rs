//! Mappers 21/22/23/25 – Konami VRC2 / VRC4 family.
//!
//! All seven boards share one register file: 8 KiB PRG banking, eight 1 KiB
//! CHR banks, mapper-controlled mirroring and (VRC4 only) an IRQ counter and
//! a PRG swap mode. They differ only in which CPU address lines reach the
//! chip's register selector; [`Swizzle`] folds every wiring back onto A0/A1
//! before a write is decoded. Plain iNES dumps (submapper 0) get a combined
//! wiring that accepts both candidate boards.
//!
//! | Area | Address range     | Behaviour                                        | IRQ/Audio |
//! |------|-------------------|--------------------------------------------------|-----------|
//! | CPU  | `$6000-$7FFF`     | Work RAM (VRC4 always, VRC2 when declared)       | None      |
//! | CPU  | `$8000-$9FFF`     | 8 KiB bank R0 (second-last bank in swap mode)    | None      |
//! | CPU  | `$A000-$BFFF`     | 8 KiB bank R1                                    | None      |
//! | CPU  | `$C000-$DFFF`     | Second-last 8 KiB bank (R0 in swap mode)         | None      |
//! | CPU  | `$E000-$FFFF`     | Last 8 KiB bank, fixed                           | None      |
//! | CPU  | `$9000-$9003`     | Mirroring; VRC4 `$9002` bit 1 = PRG swap mode    | None      |
//! | CPU  | `$B000-$E003`     | CHR bank low/high nibbles, two banks per page    | None      |
//! | CPU  | `$F000-$F003`     | IRQ latch low/high, control, acknowledge         | VRC4 IRQ  |
//! | PPU  | `$0000-$1FFF`     | Eight 1 KiB CHR banks                            | None      |
//! | PPU  | `$2000-$3EFF`     | V / H / single-screen A / single-screen B        | None      |

use std::borrow::Cow;

use crate::{
    bus::{BankSize, CpuBus, PpuBus},
    cartridge::{
        mapper::{Mapper, MapperCore, Port},
        mirroring::{MirrorMode, NametableMap},
        pcb::PcbClass,
        rom::RomImage,
        swizzle::Swizzle,
    },
    irq::{Interruptable, IrqCounter},
    memory::cpu as cpu_mem,
};

/// PRG-ROM banking granularity (8 KiB).
const PRG_BANK_SIZE_8K: u16 = 0x2000;
/// Register pages are 4 KiB apart.
const REGISTER_PAGE: u16 = 0x1000;

const PRG_SELECT_MASK: u8 = 0x1F;
const CHR_LOW_MASK: u8 = 0x0F;
const VRC2_CHR_HIGH_MASK: u8 = 0x0F;
const VRC4_CHR_HIGH_MASK: u8 = 0x1F;
const VRC4_SWAP_MODE_BIT: u8 = 0x02;

/// Work RAM a VRC4 board gets when the header doesn't say.
const VRC4_DEFAULT_WRAM: usize = cpu_mem::PRG_RAM_WINDOW;

#[derive(Debug, Clone)]
pub struct Mapper23 {
    core: MapperCore,
    swizzle: Swizzle,
    /// VRC2 boards: no IRQ, no swap mode, 1-bit mirroring.
    vrc2: bool,

    prg_bank_8000: u8,
    prg_bank_a000: u8,
    prg_mode_swap: bool,

    chr_low_regs: [u8; 8],
    chr_high_regs: [u8; 8],

    /// Present on VRC4 boards only.
    irq: Option<IrqCounter>,
}

impl Mapper23 {
    pub fn new(rom: RomImage, pcb: PcbClass, prg_ram_size: usize) -> Self {
        let vrc2 = pcb.is_vrc2();
        let prg_ram_size = if !vrc2 && prg_ram_size == 0 {
            VRC4_DEFAULT_WRAM
        } else {
            prg_ram_size
        };

        let mut core = MapperCore::new(rom, pcb, prg_ram_size);
        core.set_fixed_bank(BankSize::K8);

        let mut mapper = Self {
            core,
            swizzle: Swizzle::for_pcb(pcb),
            vrc2,
            prg_bank_8000: 0,
            prg_bank_a000: 0,
            prg_mode_swap: false,
            chr_low_regs: [0; 8],
            chr_high_regs: [0; 8],
            irq: (!vrc2).then(IrqCounter::new),
        };
        mapper.sync_prg();
        mapper
    }

    pub fn swizzle(&self) -> Swizzle {
        self.swizzle
    }

    pub fn prg_mode_swap(&self) -> bool {
        self.prg_mode_swap
    }

    pub fn irq(&self) -> Option<&IrqCounter> {
        self.irq.as_ref()
    }

    fn second_last_bank(&self) -> u16 {
        self.core.prg_bank_count(BankSize::K8).saturating_sub(2) as u16
    }

    /// Writes the raw PRG registers into the window slots for the current
    /// swap mode.
    fn sync_prg(&mut self) {
        let second_last = self.second_last_bank();
        let (low, high) = if self.prg_mode_swap {
            (second_last, self.prg_bank_8000 as u16)
        } else {
            (self.prg_bank_8000 as u16, second_last)
        };
        self.core.set_prg_bank(0, low);
        self.core.set_prg_bank(1, self.prg_bank_a000 as u16);
        self.core.set_prg_bank(2, high);
    }

    fn sync_chr(&mut self, reg: usize) {
        let page = ((self.chr_high_regs[reg] as u16) << 4) | self.chr_low_regs[reg] as u16;
        // VRC2a leaves CHR A10 unconnected; the register value is shifted.
        let page = if self.core.pcb() == PcbClass::Vrc2a {
            page >> 1
        } else {
            page
        };
        self.core.set_chr_bank(reg, page);
    }

    fn set_mirroring_from_value(&mut self, value: u8) {
        let mask = if self.vrc2 { 0x01 } else { 0x03 };
        self.core.set_mirroring(match value & mask {
            0 => MirrorMode::Vertical,
            1 => MirrorMode::Horizontal,
            2 => MirrorMode::SingleScreenA,
            _ => MirrorMode::SingleScreenB,
        });
    }

    fn write_control(&mut self, select: u8, value: u8) {
        if self.vrc2 || select < 2 {
            self.set_mirroring_from_value(value);
            return;
        }
        // Bit 0 would gate work RAM on some VRC4 boards; the board keeps it
        // mapped regardless.
        self.prg_mode_swap = value & VRC4_SWAP_MODE_BIT != 0;
        self.sync_prg();
    }

    fn write_chr(&mut self, page: u8, select: u8, value: u8) {
        let reg = (page as usize * 2 + (select as usize >> 1)) % 8;
        if select & 0x01 == 0 {
            self.chr_low_regs[reg] = value & CHR_LOW_MASK;
        } else {
            let mask = if self.vrc2 {
                VRC2_CHR_HIGH_MASK
            } else {
                VRC4_CHR_HIGH_MASK
            };
            self.chr_high_regs[reg] = value & mask;
        }
        self.sync_chr(reg);
    }

    fn write_irq(&mut self, select: u8, value: u8, sink: &mut dyn Interruptable) {
        let Some(irq) = self.irq.as_mut() else {
            return;
        };
        match select {
            0 => irq.set_latch_low_nibble(value),
            1 => irq.set_latch_high_nibble(value),
            2 => irq.set_control(value, sink),
            _ => irq.acknowledge(sink),
        }
    }
}

impl Mapper for Mapper23 {
    fn core(&self) -> &MapperCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MapperCore {
        &mut self.core
    }

    fn apply_map(&self, cpu: &mut CpuBus, ppu: &mut PpuBus, nametables: &mut NametableMap) {
        let core = &self.core;
        core.map_prg_ram(cpu);

        for slot in 0..3u8 {
            let base = cpu_mem::PRG_ROM_START + slot as u16 * PRG_BANK_SIZE_8K;
            core.map_prg_bank(cpu, base..=base + (PRG_BANK_SIZE_8K - 1), slot, BankSize::K8);
        }
        core.map_prg_fixed(cpu, 0xE000..=cpu_mem::CPU_ADDR_END);

        core.map_registers(cpu, 0x8000..=0x8FFF, Port::VrcPrg0);
        core.map_registers(cpu, 0x9000..=0x9FFF, Port::VrcControl);
        core.map_registers(cpu, 0xA000..=0xAFFF, Port::VrcPrg1);
        for page in 0..4u8 {
            let base = 0xB000 + page as u16 * REGISTER_PAGE;
            core.map_registers(cpu, base..=base + (REGISTER_PAGE - 1), Port::VrcChr(page));
        }
        if self.irq.is_some() {
            core.map_registers(cpu, 0xF000..=cpu_mem::CPU_ADDR_END, Port::VrcIrq);
        }

        core.map_chr_banks(ppu, BankSize::K1);
        core.apply_controllable_mirror_map(nametables);
    }

    fn write_register(&mut self, port: Port, addr: u16, value: u8, irq: &mut dyn Interruptable) {
        let select = self.swizzle.select(addr);
        match port {
            Port::VrcPrg0 => {
                self.prg_bank_8000 = value & PRG_SELECT_MASK;
                self.sync_prg();
            }
            Port::VrcControl => self.write_control(select, value),
            Port::VrcPrg1 => {
                self.prg_bank_a000 = value & PRG_SELECT_MASK;
                self.sync_prg();
            }
            Port::VrcChr(page) => self.write_chr(page, select, value),
            Port::VrcIrq => self.write_irq(select, value, irq),
            _ => {}
        }
    }

    fn tick(&mut self, irq: &mut dyn Interruptable) {
        if let Some(counter) = self.irq.as_mut() {
            counter.tick(irq);
        }
    }

    fn reset(&mut self, irq: &mut dyn Interruptable) {
        self.core.reset_registers();
        self.prg_bank_8000 = 0;
        self.prg_bank_a000 = 0;
        self.prg_mode_swap = false;
        self.chr_low_regs = [0; 8];
        self.chr_high_regs = [0; 8];
        self.sync_prg();
        if let Some(counter) = self.irq.as_mut() {
            counter.reset(irq);
        }
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.core.pcb().name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cartridge::rom::RomInfo,
        irq::{IrqLine, IrqSource},
    };

    /// 16 × 8 KiB PRG, each byte its bank number; 32 × 1 KiB CHR likewise.
    fn vrc(pcb: PcbClass) -> Mapper23 {
        let prg: Vec<u8> = (0..16 * 0x2000).map(|i| (i / 0x2000) as u8).collect();
        let chr: Vec<u8> = (0..32 * 0x400).map(|i| (i / 0x400) as u8).collect();
        let rom = RomImage::new(prg, chr, RomInfo::new(23)).expect("valid image");
        Mapper23::new(rom, pcb, 0)
    }

    fn prg_at(mapper: &Mapper23, slot: u8) -> u8 {
        mapper.core().read_prg_bank(slot, BankSize::K8, 0)
    }

    #[test]
    fn power_on_layout_fixes_last_two_banks() {
        let mapper = vrc(PcbClass::Vrc4f);
        assert_eq!(prg_at(&mapper, 2), 14);
        assert_eq!(mapper.core().read_prg_fixed(0), 15);
    }

    #[test]
    fn swap_mode_moves_r0_to_c000() {
        let mut mapper = vrc(PcbClass::Vrc4f);
        let mut line = IrqLine::new();
        mapper.write_register(Port::VrcPrg0, 0x8000, 5, &mut line);
        mapper.write_register(Port::VrcPrg1, 0xA000, 0x27, &mut line);
        assert_eq!(prg_at(&mapper, 0), 5);
        assert_eq!(prg_at(&mapper, 1), 7);

        mapper.write_register(Port::VrcControl, 0x9002, VRC4_SWAP_MODE_BIT, &mut line);
        assert!(mapper.prg_mode_swap());
        assert_eq!(prg_at(&mapper, 0), 14);
        assert_eq!(prg_at(&mapper, 2), 5);
    }

    #[test]
    fn vrc2_has_no_swap_mode_or_irq() {
        let mut mapper = vrc(PcbClass::Vrc2b);
        let mut line = IrqLine::new();
        mapper.write_register(Port::VrcControl, 0x9002, 0x03, &mut line);
        assert!(!mapper.prg_mode_swap());
        // VRC2 mirroring is one bit wide: 3 & 1 = horizontal.
        assert_eq!(mapper.core().mirroring(), MirrorMode::Horizontal);
        assert!(mapper.irq().is_none());
    }

    #[test]
    fn vrc4_mirroring_uses_two_bits() {
        let mut mapper = vrc(PcbClass::Vrc4f);
        let mut line = IrqLine::new();
        for (value, mode) in [
            (0, MirrorMode::Vertical),
            (1, MirrorMode::Horizontal),
            (2, MirrorMode::SingleScreenA),
            (3, MirrorMode::SingleScreenB),
        ] {
            mapper.write_register(Port::VrcControl, 0x9000, value, &mut line);
            assert_eq!(mapper.core().mirroring(), mode);
        }
    }

    #[test]
    fn chr_nibbles_combine_through_swizzle() {
        // VRC4e wires the selector to A2/A3.
        let mut mapper = vrc(PcbClass::Vrc4e);
        let mut line = IrqLine::new();
        // $C000 page, selector 2/3 = second bank of the page (register 3).
        mapper.write_register(Port::VrcChr(1), 0xC008, 0x05, &mut line);
        mapper.write_register(Port::VrcChr(1), 0xC00C, 0x01, &mut line);
        assert_eq!(mapper.core().chr_bank(3), 0x15);
        // 0x15 % 32 = 21.
        assert_eq!(mapper.core().read_chr_bank(3, BankSize::K1, 0), Some(21));
    }

    #[test]
    fn vrc2a_drops_chr_a10() {
        let mut mapper = vrc(PcbClass::Vrc2a);
        let mut line = IrqLine::new();
        mapper.write_register(Port::VrcChr(0), 0xB000, 0x06, &mut line);
        assert_eq!(mapper.core().chr_bank(0), 0x03);
    }

    #[test]
    fn irq_registers_drive_counter() {
        let mut mapper = vrc(PcbClass::Vrc4f);
        let mut line = IrqLine::new();
        mapper.write_register(Port::VrcIrq, 0xF000, 0x02, &mut line);
        mapper.write_register(Port::VrcIrq, 0xF001, 0x00, &mut line);
        mapper.write_register(Port::VrcIrq, 0xF002, 0x06, &mut line);

        for _ in 0..2 {
            mapper.tick(&mut line);
            assert!(!line.irq_line());
        }
        mapper.tick(&mut line);
        assert!(line.irq_asserted(IrqSource::MAPPER));

        mapper.write_register(Port::VrcIrq, 0xF003, 0x00, &mut line);
        assert!(!line.irq_line());
    }

    #[test]
    fn vrc4_gets_default_work_ram() {
        assert_eq!(vrc(PcbClass::Vrc4f).core().prg_ram().len(), VRC4_DEFAULT_WRAM);
        assert!(vrc(PcbClass::Vrc2b).core().prg_ram().is_empty());
    }
}
