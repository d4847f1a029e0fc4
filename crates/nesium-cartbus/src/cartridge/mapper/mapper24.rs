//! Mappers 24/26 – Konami VRC6a / VRC6b.
//!
//! VRC6b is VRC6a with A0 and A1 swapped on the register selector. The
//! expansion audio registers are decoded so that writes land somewhere, but
//! the channels themselves are not modelled here.
//!
//! | Area | Address range     | Behaviour                                          | IRQ/Audio     |
//! |------|-------------------|----------------------------------------------------|---------------|
//! | CPU  | `$6000-$7FFF`     | 8 KiB work RAM, gated by `$B003` bit 7             | None          |
//! | CPU  | `$8000-$BFFF`     | 16 KiB switchable PRG bank (`$8000`)               | None          |
//! | CPU  | `$C000-$DFFF`     | 8 KiB switchable PRG bank (`$C000`)                | None          |
//! | CPU  | `$E000-$FFFF`     | Last 8 KiB PRG bank, fixed                         | None          |
//! | CPU  | `$9000-$B002`     | Pulse / sawtooth registers                         | Audio (dropped) |
//! | CPU  | `$B003`           | PPU banking style, mirroring, work RAM enable      | None          |
//! | CPU  | `$D000-$E003`     | Eight CHR registers                                | None          |
//! | CPU  | `$F000-$F002`     | IRQ latch, control, acknowledge                    | IRQ           |
//! | PPU  | `$0000-$1FFF`     | Eight 1 KiB slots fed according to the style       | None          |
//! | PPU  | `$2000-$3EFF`     | From `$B003`, including four-screen                | None          |
//!
//! `$B003` layout: `W.AN MMSS`. `SS` is the banking style, `A` the A10 rule
//! (2 KiB slots use `R & !1` / `R | 1` when set, the same bank twice when
//! clear), `MM` and `N` select mirroring and `W` enables work RAM.

use std::borrow::Cow;

use crate::{
    bus::{BankSize, CpuBus, Owner, PpuBus, WriteHandler},
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

const PRG16_SELECT_MASK: u8 = 0x0F;
const PRG8_SELECT_MASK: u8 = 0x1F;

const STYLE_MASK: u8 = 0x03;
const A10_RULE_BIT: u8 = 0x20;
const WRAM_ENABLE_BIT: u8 = 0x80;

/// Smallest work RAM a VRC6 board carries.
const MIN_WRAM: usize = cpu_mem::PRG_RAM_WINDOW;

/// Keeps the page and selector bits of a swizzled register address.
const REGISTER_DECODE_MASK: u16 = 0xF003;

#[derive(Debug, Clone)]
pub struct Mapper24 {
    core: MapperCore,
    swizzle: Swizzle,
    /// Raw `$D000-$E003` writes; the slot banks are derived from these.
    chr_regs: [u8; 8],
    b003: u8,
    irq: IrqCounter,
}

/// Nametable arrangement selected by a `$B003` value.
fn decode_mirroring(value: u8) -> MirrorMode {
    if value & A10_RULE_BIT != 0 {
        match value & STYLE_MASK {
            0 => match (value >> 2) & 0x03 {
                0 => MirrorMode::Vertical,
                1 => MirrorMode::Horizontal,
                2 => MirrorMode::SingleScreenA,
                _ => MirrorMode::SingleScreenB,
            },
            1 => MirrorMode::FourScreen,
            _ if value & 0x04 == 0 => MirrorMode::Vertical,
            _ => MirrorMode::Horizontal,
        }
    } else {
        match value & 0x0F {
            0x1 | 0x5 | 0x9 | 0xD => MirrorMode::FourScreen,
            0x2..=0x4 | 0xA..=0xC => MirrorMode::Vertical,
            _ => MirrorMode::Horizontal,
        }
    }
}

impl Mapper24 {
    pub fn new(rom: RomImage, pcb: PcbClass, prg_ram_size: usize) -> Self {
        let mut core = MapperCore::new(rom, pcb, prg_ram_size.max(MIN_WRAM));
        core.set_fixed_bank(BankSize::K8);
        core.set_prg_ram_enabled(false);

        Self {
            core,
            swizzle: Swizzle::for_pcb(pcb),
            chr_regs: [0; 8],
            b003: 0,
            irq: IrqCounter::new(),
        }
    }

    pub fn banking_style(&self) -> u8 {
        self.b003 & STYLE_MASK
    }

    pub fn irq(&self) -> &IrqCounter {
        &self.irq
    }

    fn decode(&self, addr: u16) -> u16 {
        self.swizzle.apply(addr) & REGISTER_DECODE_MASK
    }

    /// Recomputes the eight 1 KiB slot banks from the raw registers.
    fn sync_chr(&mut self) {
        let (and, or) = if self.b003 & A10_RULE_BIT != 0 {
            (0xFE, 0x01)
        } else {
            (0xFF, 0x00)
        };
        let r = self.chr_regs;
        let slots = match self.banking_style() {
            0 => r,
            1 => [
                r[0] & and,
                r[0] | or,
                r[1] & and,
                r[1] | or,
                r[2] & and,
                r[2] | or,
                r[3] & and,
                r[3] | or,
            ],
            _ => [
                r[0],
                r[1],
                r[2],
                r[3],
                r[4] & and,
                r[4] | or,
                r[5] & and,
                r[5] | or,
            ],
        };
        for (slot, bank) in slots.into_iter().enumerate() {
            self.core.set_chr_bank(slot, bank as u16);
        }
    }

    fn write_control(&mut self, value: u8) {
        self.b003 = value;
        self.core.set_mirroring(decode_mirroring(value));
        self.core.set_prg_ram_enabled(value & WRAM_ENABLE_BIT != 0);
        self.sync_chr();
    }

    fn write_chr(&mut self, decoded: u16, value: u8) {
        let page = (decoded >> 12).saturating_sub(0xD) as usize;
        let reg = (page * 4 + (decoded & 0x03) as usize) % 8;
        self.chr_regs[reg] = value;
        self.sync_chr();
    }

    fn write_irq(&mut self, decoded: u16, value: u8, sink: &mut dyn Interruptable) {
        match decoded & 0x03 {
            0 => self.irq.set_latch(value),
            1 => self.irq.set_control(value, sink),
            2 => self.irq.acknowledge(sink),
            _ => {}
        }
    }
}

impl Mapper for Mapper24 {
    fn core(&self) -> &MapperCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MapperCore {
        &mut self.core
    }

    fn apply_map(&self, cpu: &mut CpuBus, ppu: &mut PpuBus, nametables: &mut NametableMap) {
        let core = &self.core;
        core.map_prg_ram(cpu);
        core.map_prg_bank(cpu, cpu_mem::PRG_ROM_START..=0xBFFF, 0, BankSize::K16);
        core.map_prg_bank(cpu, 0xC000..=0xDFFF, 1, BankSize::K8);
        core.map_prg_fixed(cpu, 0xE000..=cpu_mem::CPU_ADDR_END);

        for addr in cpu_mem::PRG_ROM_START..=cpu_mem::CPU_ADDR_END {
            let port = match self.decode(addr) {
                0x8000..=0x8003 => Port::Vrc6Prg16,
                0x9000..=0x9003 | 0xA000..=0xA003 | 0xB000..=0xB002 => Port::Vrc6Audio,
                0xB003 => Port::Vrc6Control,
                0xC000..=0xC003 => Port::Vrc6Prg8,
                0xD000..=0xE003 => Port::Vrc6Chr,
                0xF000..=0xF002 => Port::Vrc6Irq,
                _ => continue,
            };
            cpu.set_write_func(addr, WriteHandler::Register(port), Owner::Cartridge, addr);
        }

        core.map_chr_banks(ppu, BankSize::K1);
        core.apply_controllable_mirror_map(nametables);
    }

    fn write_register(&mut self, port: Port, addr: u16, value: u8, irq: &mut dyn Interruptable) {
        let decoded = self.decode(addr);
        match port {
            Port::Vrc6Prg16 => self.core.set_prg_bank(0, (value & PRG16_SELECT_MASK) as u16),
            Port::Vrc6Prg8 => self.core.set_prg_bank(1, (value & PRG8_SELECT_MASK) as u16),
            Port::Vrc6Control => self.write_control(value),
            Port::Vrc6Chr => self.write_chr(decoded, value),
            Port::Vrc6Irq => self.write_irq(decoded, value, irq),
            _ => {}
        }
    }

    fn tick(&mut self, irq: &mut dyn Interruptable) {
        self.irq.tick(irq);
    }

    fn reset(&mut self, irq: &mut dyn Interruptable) {
        self.core.reset_registers();
        self.core.set_prg_ram_enabled(false);
        self.chr_regs = [0; 8];
        self.b003 = 0;
        self.irq.reset(irq);
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.core.pcb().name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bus::ReadHandler,
        cartridge::rom::RomInfo,
        irq::{IrqLine, IrqSource},
    };

    /// 16 × 8 KiB PRG and 64 × 1 KiB CHR, each byte its bank number.
    fn vrc6(pcb: PcbClass) -> Mapper24 {
        let prg: Vec<u8> = (0..16 * 0x2000).map(|i| (i / 0x2000) as u8).collect();
        let chr: Vec<u8> = (0..64 * 0x400).map(|i| (i / 0x400) as u8).collect();
        let rom = RomImage::new(prg, chr, RomInfo::new(24)).expect("valid image");
        Mapper24::new(rom, pcb, 0)
    }

    fn slot_banks(mapper: &Mapper24) -> [u16; 8] {
        std::array::from_fn(|slot| mapper.core().chr_bank(slot))
    }

    fn load_chr_regs(mapper: &mut Mapper24, line: &mut IrqLine) {
        for (i, addr) in [0xD000, 0xD001, 0xD002, 0xD003, 0xE000, 0xE001, 0xE002, 0xE003]
            .into_iter()
            .enumerate()
        {
            mapper.write_register(Port::Vrc6Chr, addr, 0x10 + i as u8 * 2, line);
        }
    }

    #[test]
    fn prg_windows_and_fixed_bank() {
        let mut mapper = vrc6(PcbClass::Vrc6a);
        let mut line = IrqLine::new();
        mapper.write_register(Port::Vrc6Prg16, 0x8000, 0x13, &mut line);
        mapper.write_register(Port::Vrc6Prg8, 0xC000, 0x2B, &mut line);
        // 16 KiB bank 3 covers 8 KiB banks 6 and 7.
        assert_eq!(mapper.core().read_prg_bank(0, BankSize::K16, 0x0000), 6);
        assert_eq!(mapper.core().read_prg_bank(0, BankSize::K16, 0x2000), 7);
        assert_eq!(mapper.core().read_prg_bank(1, BankSize::K8, 0x0000), 11);
        assert_eq!(mapper.core().read_prg_fixed(0), 15);
    }

    #[test]
    fn style_zero_uses_registers_directly() {
        let mut mapper = vrc6(PcbClass::Vrc6a);
        let mut line = IrqLine::new();
        load_chr_regs(&mut mapper, &mut line);
        assert_eq!(slot_banks(&mapper), [0x10, 0x12, 0x14, 0x16, 0x18, 0x1A, 0x1C, 0x1E]);
    }

    #[test]
    fn style_one_pairs_registers_with_a10_rule() {
        let mut mapper = vrc6(PcbClass::Vrc6a);
        let mut line = IrqLine::new();
        load_chr_regs(&mut mapper, &mut line);

        mapper.write_register(Port::Vrc6Control, 0xB003, 0x21, &mut line);
        assert_eq!(slot_banks(&mapper), [0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17]);

        // Without the rule both halves show the same bank.
        mapper.write_register(Port::Vrc6Control, 0xB003, 0x01, &mut line);
        assert_eq!(slot_banks(&mapper), [0x10, 0x10, 0x12, 0x12, 0x14, 0x14, 0x16, 0x16]);
    }

    #[test]
    fn style_two_mixes_1k_and_2k_slots() {
        let mut mapper = vrc6(PcbClass::Vrc6a);
        let mut line = IrqLine::new();
        load_chr_regs(&mut mapper, &mut line);
        mapper.write_register(Port::Vrc6Control, 0xB003, 0x22, &mut line);
        assert_eq!(slot_banks(&mapper), [0x10, 0x12, 0x14, 0x16, 0x18, 0x19, 0x1A, 0x1B]);
        assert_eq!(mapper.core().read_chr_bank(5, BankSize::K1, 0), Some(0x19));
    }

    #[test]
    fn b003_mirroring_table() {
        for (value, mode) in [
            (0x20, MirrorMode::Vertical),
            (0x24, MirrorMode::Horizontal),
            (0x28, MirrorMode::SingleScreenA),
            (0x2C, MirrorMode::SingleScreenB),
            (0x21, MirrorMode::FourScreen),
            (0x26, MirrorMode::Horizontal),
            (0x2B, MirrorMode::Vertical),
            (0x00, MirrorMode::Horizontal),
            (0x05, MirrorMode::FourScreen),
            (0x03, MirrorMode::Vertical),
            (0x07, MirrorMode::Horizontal),
            (0x0C, MirrorMode::Vertical),
            (0x0E, MirrorMode::Horizontal),
        ] {
            assert_eq!(decode_mirroring(value), mode, "value {value:#04x}");
        }
    }

    #[test]
    fn wram_follows_b003_bit7() {
        let mut mapper = vrc6(PcbClass::Vrc6a);
        let mut line = IrqLine::new();
        assert_eq!(mapper.core().prg_ram().len(), MIN_WRAM);
        assert_eq!(mapper.core().read_prg_ram(0), None);

        mapper.write_register(Port::Vrc6Control, 0xB003, 0x80, &mut line);
        mapper.core_mut().write_prg_ram(0x20, 0x5A);
        assert_eq!(mapper.core().read_prg_ram(0x20), Some(0x5A));
    }

    #[test]
    fn vrc6b_swaps_selector_pins() {
        let mapper = vrc6(PcbClass::Vrc6b);
        let mut cpu = CpuBus::new();
        let mut ppu = PpuBus::new();
        let mut nt = NametableMap::default();
        mapper.apply_map(&mut cpu, &mut ppu, &mut nt);

        assert_eq!(cpu.slot(0xB003).write.handler, WriteHandler::Register(Port::Vrc6Control));
        assert_eq!(cpu.slot(0xF001).write.handler, WriteHandler::Register(Port::Vrc6Irq));
        assert_eq!(cpu.slot(0xF002).write.handler, WriteHandler::Register(Port::Vrc6Irq));
        // Selector 3 on the IRQ page decodes to nothing.
        assert_eq!(cpu.slot(0xF003).write.handler, WriteHandler::Ignore);
        assert_eq!(cpu.slot(0xE000).read.handler, ReadHandler::PrgFixed);
    }

    #[test]
    fn irq_fires_through_f_page() {
        let mut mapper = vrc6(PcbClass::Vrc6b);
        let mut line = IrqLine::new();
        // VRC6b: $F002 is selector 1 (control), $F001 selector 2 (acknowledge).
        mapper.write_register(Port::Vrc6Irq, 0xF000, 0x01, &mut line);
        mapper.write_register(Port::Vrc6Irq, 0xF002, 0x06, &mut line);
        mapper.tick(&mut line);
        assert!(!line.irq_line());
        mapper.tick(&mut line);
        assert!(line.irq_asserted(IrqSource::MAPPER));
        mapper.write_register(Port::Vrc6Irq, 0xF001, 0x00, &mut line);
        assert!(!line.irq_line());
    }
}
