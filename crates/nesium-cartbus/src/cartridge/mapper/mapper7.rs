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

// Mapper 7 – AxROM single-screen 32 KiB PRG banking.
//
// | Area | Address range     | Behaviour                                      | IRQ/Audio |
// |------|-------------------|------------------------------------------------|-----------|
// | CPU  | `$6000-$7FFF`     | Optional PRG-RAM                               | None      |
// | CPU  | `$8000-$FFFF`     | 32 KiB switchable PRG-ROM bank (AxROM style)   | None      |
// | CPU  | `$8000-$FFFF`     | `xxxM xPPP`: bank select + nametable page      | None      |
// | PPU  | `$0000-$1FFF`     | CHR ROM/RAM (no mapper-side CHR banking)       | None      |
// | PPU  | `$2000-$3EFF`     | Single-screen mirroring (lower/upper via data) | None      |

const PRG_SELECT_MASK: u8 = 0x07;
const MIRROR_PAGE_BIT: u8 = 0x10;

/// NES 2.0 submapper 2 (AOROM): the only AxROM board with bus conflicts.
const SUBMAPPER_BUS_CONFLICTS: u16 = 2;

#[derive(Debug, Clone)]
pub struct Mapper7 {
    core: MapperCore,
    bus_conflicts: bool,
}

impl Mapper7 {
    pub fn new(rom: RomImage, pcb: PcbClass, prg_ram_size: usize) -> Self {
        let bus_conflicts = rom.info().submapper == SUBMAPPER_BUS_CONFLICTS;
        let mut core = MapperCore::new(rom, pcb, prg_ram_size);
        // Boards power up showing the lower page.
        core.set_mirroring(MirrorMode::SingleScreenA);
        Self {
            core,
            bus_conflicts,
        }
    }

    pub fn selected_bank(&self) -> u16 {
        self.core.prg_bank(0)
    }
}

impl Mapper for Mapper7 {
    fn core(&self) -> &MapperCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MapperCore {
        &mut self.core
    }

    fn apply_map(&self, cpu: &mut CpuBus, ppu: &mut PpuBus, nametables: &mut NametableMap) {
        let rom = cpu_mem::PRG_ROM_START..=cpu_mem::CPU_ADDR_END;
        self.core.map_prg_ram(cpu);
        self.core.map_prg_bank(cpu, rom.clone(), 0, BankSize::K32);
        self.core.map_registers(cpu, rom, Port::BankSelect);
        self.core.map_chr_direct(ppu);
        self.core.apply_controllable_mirror_map(nametables);
    }

    fn write_register(&mut self, port: Port, addr: u16, value: u8, _irq: &mut dyn Interruptable) {
        if port != Port::BankSelect {
            return;
        }
        let value = if self.bus_conflicts {
            value
                & self
                    .core
                    .read_prg_bank(0, BankSize::K32, addr - cpu_mem::PRG_ROM_START)
        } else {
            value
        };

        self.core.set_prg_bank(0, (value & PRG_SELECT_MASK) as u16);
        self.core.set_mirroring(if value & MIRROR_PAGE_BIT != 0 {
            MirrorMode::SingleScreenB
        } else {
            MirrorMode::SingleScreenA
        });
    }

    fn reset(&mut self, _irq: &mut dyn Interruptable) {
        self.core.reset_registers();
        self.core.set_mirroring(MirrorMode::SingleScreenA);
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("AxROM")
    }
}
